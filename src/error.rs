use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum OceanError {
    #[error("request failed: {0}")]
    Transport(String),

    #[error("{url} returned status {status}")]
    HttpStatus { status: u16, url: String },

    #[error("decompression failed: {0}")]
    Decompression(String),

    #[error("failed to parse {file}: {message}")]
    Parse { file: String, message: String },

    #[error("no rows survived normalization: {0}")]
    EmptyResult(String),

    #[error("run aborted: {0}")]
    RunAbort(String),

    #[error("filesystem error: {0}")]
    Filesystem(String),

    #[error("failed to read settings file at {0}")]
    ConfigRead(PathBuf),

    #[error("failed to parse JSON settings: {0}")]
    ConfigParse(String),

    #[error("invalid setting: {0}")]
    InvalidSetting(String),

    #[error("unknown data source: {0}")]
    UnknownSource(String),
}

impl OceanError {
    pub fn parse(file: impl Into<String>, message: impl Into<String>) -> Self {
        OceanError::Parse {
            file: file.into(),
            message: message.into(),
        }
    }

    /// Warnings are reported but never count as a failed file.
    pub fn is_warning(&self) -> bool {
        matches!(self, OceanError::EmptyResult(_))
    }
}
