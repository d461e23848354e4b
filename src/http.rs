use std::fs::File;
use std::path::Path;
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue, USER_AGENT};

use crate::error::OceanError;

pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
pub const INDEX_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub url: String,
    pub timeout: Duration,
    pub basic_auth: Option<(String, String)>,
}

impl FetchRequest {
    pub fn get(url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            url: url.into(),
            timeout,
            basic_auth: None,
        }
    }

    pub fn with_basic_auth(mut self, auth: Option<(String, String)>) -> Self {
        self.basic_auth = auth;
        self
    }
}

/// One outbound GET whose body is streamed to `destination`.
pub trait HttpFetcher {
    /// Returns the number of bytes written. Makes exactly one attempt.
    fn fetch_to_file(&self, request: &FetchRequest, destination: &Path) -> Result<u64, OceanError>;
}

#[derive(Clone)]
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    pub fn new() -> Result<Self, OceanError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("ocean-sync/{}", env!("CARGO_PKG_VERSION")))
                .map_err(|err| OceanError::Transport(err.to_string()))?,
        );
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/json, text/csv, */*"),
        );
        let client = Client::builder()
            .default_headers(headers)
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .map_err(|err| OceanError::Transport(err.to_string()))?;
        Ok(Self { client })
    }
}

impl HttpFetcher for HttpClient {
    fn fetch_to_file(&self, request: &FetchRequest, destination: &Path) -> Result<u64, OceanError> {
        let mut builder = self.client.get(&request.url).timeout(request.timeout);
        if let Some((user, pass)) = &request.basic_auth {
            builder = builder.basic_auth(user, Some(pass));
        }
        let mut response = builder
            .send()
            .map_err(|err| OceanError::Transport(err.to_string()))?;
        if !response.status().is_success() {
            return Err(OceanError::HttpStatus {
                status: response.status().as_u16(),
                url: request.url.clone(),
            });
        }
        let mut file =
            File::create(destination).map_err(|err| OceanError::Filesystem(err.to_string()))?;
        response
            .copy_to(&mut file)
            .map_err(|err| OceanError::Transport(err.to_string()))
    }
}
