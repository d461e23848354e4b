use std::collections::BTreeMap;

use camino::{Utf8Path, Utf8PathBuf};
use chrono::{Days, NaiveDate};

use crate::config::{Credentials, Endpoints};
use crate::copernicus;
use crate::domain::{BoundingBox, RawPayload, SourceTag};
use crate::error::OceanError;
use crate::events::{EventSink, EventStatus};
use crate::fs_util::{first_line, gunzip_replace};
use crate::http::{DEFAULT_TIMEOUT, FetchRequest, HttpFetcher, INDEX_TIMEOUT};

/// Days between "now" and the newest gridded SST the provider has published.
pub const NOAA_LATENCY_DAYS: u64 = 3;

pub const ARGO_INDEX_NAME: &str = "argo_bio_profile_index.txt";
pub const NCEI_STATIONS_NAME: &str = "ghcnd_stations.txt";

/// `(start, end)` of the NOAA query: end lags `today` by the provider latency.
pub fn noaa_date_range(today: NaiveDate, days_back: u32) -> (NaiveDate, NaiveDate) {
    let end = today - Days::new(NOAA_LATENCY_DAYS);
    let start = end - Days::new(u64::from(days_back));
    (start, end)
}

pub fn erddap_url(
    endpoints: &Endpoints,
    region: &BoundingBox,
    start: NaiveDate,
    end: NaiveDate,
) -> String {
    format!(
        "{base}/griddap/{dataset}.csv?analysed_sst[({start}):1:({end})][({lat_min:?}):1:({lat_max:?})][({lon_min:?}):1:({lon_max:?})]",
        base = endpoints.noaa_erddap_base.trim_end_matches('/'),
        dataset = endpoints.noaa_sst_dataset,
        start = start.format("%Y-%m-%dT00:00:00Z"),
        end = end.format("%Y-%m-%dT00:00:00Z"),
        lat_min = region.lat_min,
        lat_max = region.lat_max,
        lon_min = region.lon_min,
        lon_max = region.lon_max,
    )
}

pub fn noaa_file_name(start: NaiveDate, end: NaiveDate) -> String {
    format!(
        "noaa_sst_{}_{}.csv",
        start.format("%Y%m%d"),
        end.format("%Y%m%d")
    )
}

/// Performs one retrieval per source and leaves the raw files in `raw_dir`.
pub struct Retriever<F> {
    fetcher: F,
    raw_dir: Utf8PathBuf,
    endpoints: Endpoints,
    region: BoundingBox,
    credentials: BTreeMap<SourceTag, Credentials>,
}

impl<F: HttpFetcher> Retriever<F> {
    pub fn new(
        fetcher: F,
        raw_dir: impl Into<Utf8PathBuf>,
        endpoints: Endpoints,
        region: BoundingBox,
    ) -> Self {
        Self {
            fetcher,
            raw_dir: raw_dir.into(),
            endpoints,
            region,
            credentials: BTreeMap::new(),
        }
    }

    pub fn with_credentials(mut self, source: SourceTag, credentials: Credentials) -> Self {
        self.credentials.insert(source, credentials);
        self
    }

    pub fn raw_dir(&self) -> &Utf8Path {
        &self.raw_dir
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// Failures are reported to `sink` and yield an empty list for that source.
    pub fn retrieve(
        &self,
        source: SourceTag,
        days_back: u32,
        today: NaiveDate,
        sink: &dyn EventSink,
    ) -> Vec<RawPayload> {
        let operation = match source {
            SourceTag::Noaa | SourceTag::Copernicus => "SST_SCRAPING",
            SourceTag::Argo => "INDEX_SCRAPING",
            SourceTag::Ncei => "STATIONS_SCRAPING",
        };
        sink.log(source.label(), operation, EventStatus::Started, "");

        let result = match source {
            SourceTag::Noaa => self.fetch_noaa(days_back, today, sink),
            SourceTag::Copernicus => self.synthesize_copernicus(today),
            SourceTag::Argo => self.fetch_argo(sink),
            SourceTag::Ncei => self.fetch_ncei(sink),
        };

        match result {
            Ok((payload, details)) => {
                sink.log(source.label(), operation, EventStatus::Success, &details);
                vec![payload]
            }
            Err(err) => {
                sink.log(source.label(), operation, EventStatus::Error, &err.to_string());
                Vec::new()
            }
        }
    }

    fn request(&self, source: SourceTag, url: String, timeout: std::time::Duration) -> FetchRequest {
        let auth = self
            .credentials
            .get(&source)
            .and_then(Credentials::basic_auth);
        FetchRequest::get(url, timeout).with_basic_auth(auth)
    }

    /// Downloads into a temp file beside `destination` and renames on success.
    fn download(&self, request: &FetchRequest, destination: &Utf8Path) -> Result<u64, OceanError> {
        std::fs::create_dir_all(self.raw_dir.as_std_path())
            .map_err(|err| OceanError::Filesystem(err.to_string()))?;
        let temp = tempfile::Builder::new()
            .prefix("ocean-sync-download")
            .tempfile_in(self.raw_dir.as_std_path())
            .map_err(|err| OceanError::Filesystem(err.to_string()))?;
        let written = self.fetcher.fetch_to_file(request, temp.path())?;
        temp.persist(destination.as_std_path())
            .map_err(|err| OceanError::Filesystem(err.to_string()))?;
        Ok(written)
    }

    fn preview(&self, source: SourceTag, operation: &str, path: &Utf8Path, sink: &dyn EventSink) {
        let details = match first_line(path.as_std_path()) {
            Ok(Some(line)) => format!("First line: {}", line.chars().take(100).collect::<String>()),
            Ok(None) => "Empty file".to_string(),
            Err(err) => format!("Cannot preview: {err}"),
        };
        sink.log(source.label(), operation, EventStatus::Info, &details);
    }

    fn fetch_noaa(
        &self,
        days_back: u32,
        today: NaiveDate,
        sink: &dyn EventSink,
    ) -> Result<(RawPayload, String), OceanError> {
        let (start, end) = noaa_date_range(today, days_back);
        let url = erddap_url(&self.endpoints, &self.region, start, end);
        sink.log(
            "NOAA",
            "REQUEST",
            EventStatus::Info,
            &format!("Fetching: {}", url.chars().take(100).collect::<String>()),
        );

        let path = self.raw_dir.join(noaa_file_name(start, end));
        let request = self.request(SourceTag::Noaa, url, DEFAULT_TIMEOUT);
        let written = self.download(&request, &path)?;
        self.preview(SourceTag::Noaa, "PREVIEW", &path, sink);
        Ok((
            RawPayload::from_path(path),
            format!("Downloaded {written} bytes"),
        ))
    }

    fn synthesize_copernicus(&self, today: NaiveDate) -> Result<(RawPayload, String), OceanError> {
        let target_date = today - Days::new(NOAA_LATENCY_DAYS);
        let path = self.raw_dir.join(copernicus::file_name(target_date));
        let rows = copernicus::write_synthetic(&path, target_date, copernicus::SYNTHETIC_SEED)?;
        Ok((
            RawPayload::from_path(path),
            format!("Generated {rows} sample rows"),
        ))
    }

    fn fetch_argo(&self, sink: &dyn EventSink) -> Result<(RawPayload, String), OceanError> {
        let url = format!(
            "{}/argo_bio-profile_index.txt.gz",
            self.endpoints.argo_gdac_base.trim_end_matches('/')
        );
        sink.log("ARGO", "REQUEST", EventStatus::Info, &format!("Downloading: {url}"));

        let compressed = self.raw_dir.join(format!("{ARGO_INDEX_NAME}.gz"));
        let request = self.request(SourceTag::Argo, url, INDEX_TIMEOUT);
        self.download(&request, &compressed)?;

        let path = self.raw_dir.join(ARGO_INDEX_NAME);
        let written = gunzip_replace(compressed.as_std_path(), path.as_std_path())?;
        self.preview(SourceTag::Argo, "INDEX_SCRAPING", &path, sink);
        Ok((
            RawPayload::from_path(path),
            format!("Downloaded {written} bytes"),
        ))
    }

    fn fetch_ncei(&self, sink: &dyn EventSink) -> Result<(RawPayload, String), OceanError> {
        let url = format!(
            "{}/ghcnd-stations.txt",
            self.endpoints.ncei_ghcn_base.trim_end_matches('/')
        );
        sink.log("NCEI", "REQUEST", EventStatus::Info, &format!("Downloading: {url}"));

        let path = self.raw_dir.join(NCEI_STATIONS_NAME);
        let request = self.request(SourceTag::Ncei, url, INDEX_TIMEOUT);
        let written = self.download(&request, &path)?;
        self.preview(SourceTag::Ncei, "STATIONS_SCRAPING", &path, sink);
        Ok((
            RawPayload::from_path(path),
            format!("Downloaded {written} bytes"),
        ))
    }
}
