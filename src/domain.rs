use std::fmt;
use std::str::FromStr;

use camino::{Utf8Path, Utf8PathBuf};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::OceanError;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum SourceTag {
    Noaa,
    Copernicus,
    Argo,
    Ncei,
}

impl SourceTag {
    pub const ALL: [SourceTag; 4] = [
        SourceTag::Noaa,
        SourceTag::Copernicus,
        SourceTag::Argo,
        SourceTag::Ncei,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SourceTag::Noaa => "noaa",
            SourceTag::Copernicus => "copernicus",
            SourceTag::Argo => "argo",
            SourceTag::Ncei => "ncei",
        }
    }

    /// Label used in pipeline events.
    pub fn label(&self) -> &'static str {
        match self {
            SourceTag::Noaa => "NOAA",
            SourceTag::Copernicus => "COPERNICUS",
            SourceTag::Argo => "ARGO",
            SourceTag::Ncei => "NCEI",
        }
    }
}

impl fmt::Display for SourceTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SourceTag {
    type Err = OceanError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "noaa" => Ok(SourceTag::Noaa),
            "copernicus" => Ok(SourceTag::Copernicus),
            "argo" => Ok(SourceTag::Argo),
            "ncei" => Ok(SourceTag::Ncei),
            _ => Err(OceanError::UnknownSource(value.to_string())),
        }
    }
}

/// Infers the provider of a raw file from its name.
///
/// Matching is case-insensitive substring search. A name that matches several
/// providers resolves in priority order: `noaa`/`jpl`, then `copernicus`, then
/// `argo`, then `ghcnd`/`stations`. `None` means the file is of unknown origin.
pub fn classify_filename(name: &str) -> Option<SourceTag> {
    let lower = name.to_lowercase();
    if lower.contains("noaa") || lower.contains("jpl") {
        Some(SourceTag::Noaa)
    } else if lower.contains("copernicus") {
        Some(SourceTag::Copernicus)
    } else if lower.contains("argo") {
        Some(SourceTag::Argo)
    } else if lower.contains("ghcnd") || lower.contains("stations") {
        Some(SourceTag::Ncei)
    } else {
        None
    }
}

/// A raw provider file on disk, handed from retrieval to normalization once.
#[derive(Debug, PartialEq, Eq)]
pub struct RawPayload {
    source: Option<SourceTag>,
    path: Utf8PathBuf,
}

impl RawPayload {
    pub fn from_path(path: impl Into<Utf8PathBuf>) -> Self {
        let path = path.into();
        let source = path.file_name().and_then(classify_filename);
        Self { source, path }
    }

    pub fn source(&self) -> Option<SourceTag> {
        self.source
    }

    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    pub fn file_name(&self) -> &str {
        self.path.file_name().unwrap_or(self.path.as_str())
    }

    /// File name with its final extension stripped.
    pub fn stem(&self) -> &str {
        self.path.file_stem().unwrap_or_else(|| self.file_name())
    }

    pub fn read_to_string(&self) -> Result<String, OceanError> {
        let bytes = std::fs::read(self.path.as_std_path())
            .map_err(|err| OceanError::Filesystem(format!("read {}: {err}", self.path)))?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub lat_min: f64,
    pub lat_max: f64,
    pub lon_min: f64,
    pub lon_max: f64,
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self {
            lat_min: 32.0,
            lat_max: 35.0,
            lon_min: -120.0,
            lon_max: -115.0,
        }
    }
}

impl BoundingBox {
    pub fn validate(&self) -> Result<(), OceanError> {
        let lat_ok = (-90.0..=90.0).contains(&self.lat_min)
            && (-90.0..=90.0).contains(&self.lat_max)
            && self.lat_min <= self.lat_max;
        let lon_ok = (-180.0..=180.0).contains(&self.lon_min)
            && (-180.0..=180.0).contains(&self.lon_max)
            && self.lon_min <= self.lon_max;
        if !lat_ok || !lon_ok {
            return Err(OceanError::InvalidSetting(format!(
                "region [{}, {}] x [{}, {}] is not a valid bounding box",
                self.lat_min, self.lat_max, self.lon_min, self.lon_max
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn classify_is_case_insensitive() {
        assert_eq!(classify_filename("NOAA_SST.csv"), Some(SourceTag::Noaa));
        assert_eq!(classify_filename("ArGo_index.txt"), Some(SourceTag::Argo));
        assert_eq!(classify_filename("readme.md"), None);
    }

    #[test]
    fn parse_source_tag() {
        assert_eq!("NCEI".parse::<SourceTag>().unwrap(), SourceTag::Ncei);
        let err = "modis".parse::<SourceTag>().unwrap_err();
        assert_matches!(err, OceanError::UnknownSource(_));
    }

    #[test]
    fn payload_stem_strips_last_extension() {
        let payload = RawPayload::from_path("/tmp/raw/ghcnd_stations.txt");
        assert_eq!(payload.source(), Some(SourceTag::Ncei));
        assert_eq!(payload.stem(), "ghcnd_stations");
    }
}
