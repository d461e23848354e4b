#![allow(dead_code)]

use std::cell::RefCell;
use std::path::Path;

use camino::Utf8PathBuf;
use flate2::Compression;
use flate2::write::GzEncoder;
use std::io::Write;

use ocean_sync::error::OceanError;
use ocean_sync::http::{FetchRequest, HttpFetcher};

/// Serves canned bodies for URLs containing a key; anything else is a 404.
#[derive(Default)]
pub struct MockFetcher {
    routes: Vec<(String, Vec<u8>)>,
    pub calls: RefCell<Vec<FetchRequest>>,
}

impl MockFetcher {
    pub fn route(mut self, needle: &str, body: impl Into<Vec<u8>>) -> Self {
        self.routes.push((needle.to_string(), body.into()));
        self
    }
}

impl HttpFetcher for MockFetcher {
    fn fetch_to_file(&self, request: &FetchRequest, destination: &Path) -> Result<u64, OceanError> {
        self.calls.borrow_mut().push(request.clone());
        let body = self
            .routes
            .iter()
            .find(|(needle, _)| request.url.contains(needle.as_str()))
            .map(|(_, body)| body.clone())
            .ok_or_else(|| OceanError::HttpStatus {
                status: 404,
                url: request.url.clone(),
            })?;
        std::fs::write(destination, &body).map_err(|err| OceanError::Filesystem(err.to_string()))?;
        Ok(body.len() as u64)
    }
}

pub fn gzip(bytes: &[u8]) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(bytes).unwrap();
    encoder.finish().unwrap()
}

pub fn utf8_dir(path: &Path) -> Utf8PathBuf {
    Utf8PathBuf::from_path_buf(path.to_path_buf()).unwrap()
}

pub fn read_csv(path: &Utf8PathBuf) -> (Vec<String>, Vec<Vec<String>>) {
    let mut reader = csv::Reader::from_path(path.as_std_path()).unwrap();
    let headers = reader.headers().unwrap().iter().map(str::to_string).collect();
    let rows = reader
        .records()
        .map(|record| record.unwrap().iter().map(str::to_string).collect())
        .collect();
    (headers, rows)
}

pub const NOAA_CSV: &str = "time,latitude,longitude,analysed_sst\n\
UTC,degrees_north,degrees_east,kelvin\n\
2026-10-14T09:00:00Z,32.0,-120.0,289.0\n\
2026-10-14T09:00:00Z,32.01,-119.99,291.0\n\
2026-10-14T09:00:00Z,,-119.98,290.0\n";

pub const ARGO_INDEX: &str = "# Title : Bio-Profile directory file of the Argo GDAC\n\
# Date of update : 20261018\n\
aoml/1900722/profiles/BD1900722_001.nc 20061022021500 -40.316 73.389 I 846 AO 20181219120507\n\
aoml/1900722/profiles/BD1900722_002.nc 2006102X021500 -40.021 73.518 I 846 AO 20181219120507\n\
aoml/1900722/profiles/BD1900722_003.nc 20061111023000 n/a 74.002 I 846 AO 20181219120507\n";

pub const NCEI_STATIONS: &str = "ACW00011604  17.1167  -61.7833   10.1    ST JOHNS COOLIDGE FLD                  \n\
US1AKAB0015  61.2257 -149.7670   74.1 AK ANCHORAGE 0.8 NE                     \n\
BADLINE0001   ------  -10.0000    1.0 XX BROKEN ROW\n";
