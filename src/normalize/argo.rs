use std::sync::OnceLock;

use chrono::NaiveDateTime;
use regex::Regex;

use crate::domain::{RawPayload, SourceTag};
use crate::error::OceanError;
use crate::record::{CanonicalRecordSet, Column, PartialRecord, coerce_f64, non_empty};

use super::Normalizer;

const ARGO_DATE_FORMAT: &str = "%Y%m%d%H%M%S";
const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

// file, date, latitude, longitude, ocean, profile_type, institution, date_update
const DATE: usize = 1;
const LATITUDE: usize = 2;
const LONGITUDE: usize = 3;
const OCEAN: usize = 4;
const PROFILE_TYPE: usize = 5;
const INSTITUTION: usize = 6;

/// Whitespace-separated Argo GDAC profile index.
#[derive(Debug, Clone, Copy, Default)]
pub struct ArgoNormalizer;

fn date_token() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d{14}$").expect("static regex"))
}

/// Parses a `YYYYMMDDHHMMSS` token; anything else is `None`.
pub fn parse_argo_date(token: &str) -> Option<NaiveDateTime> {
    if !date_token().is_match(token) {
        return None;
    }
    NaiveDateTime::parse_from_str(token, ARGO_DATE_FORMAT).ok()
}

fn parse_line(line: &str) -> PartialRecord {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    let token = |idx: usize| tokens.get(idx).copied().unwrap_or("");
    PartialRecord {
        timestamp: parse_argo_date(token(DATE))
            .map(|date| date.format(TIMESTAMP_FORMAT).to_string()),
        latitude: coerce_f64(token(LATITUDE)),
        longitude: coerce_f64(token(LONGITUDE)),
        ocean: non_empty(token(OCEAN)),
        profile_type: non_empty(token(PROFILE_TYPE)),
        institution: non_empty(token(INSTITUTION)),
        // profile payloads are not downloaded, so temperature stays null
        temperature: None,
        ..Default::default()
    }
}

impl Normalizer for ArgoNormalizer {
    fn source(&self) -> SourceTag {
        SourceTag::Argo
    }

    fn normalize(&self, payload: RawPayload) -> Result<CanonicalRecordSet, OceanError> {
        let content = payload.read_to_string()?;
        let rows = content
            .lines()
            .filter(|line| {
                let trimmed = line.trim_start();
                !trimmed.is_empty() && !trimmed.starts_with('#')
            })
            .map(parse_line)
            .collect();
        let columns = vec![
            Column::Timestamp,
            Column::Latitude,
            Column::Longitude,
            Column::Ocean,
            Column::ProfileType,
            Column::Institution,
            Column::TemperatureCelsius,
        ];
        Ok(CanonicalRecordSet::from_partials(
            SourceTag::Argo,
            payload.stem(),
            columns,
            rows,
        ))
    }
}
