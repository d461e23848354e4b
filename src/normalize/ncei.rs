use chrono::NaiveDate;

use crate::domain::{RawPayload, SourceTag};
use crate::error::OceanError;
use crate::record::{CanonicalRecordSet, Column, PartialRecord, coerce_f64, non_empty};

use super::Normalizer;

/// Byte spans of `ghcnd-stations.txt`: id, latitude, longitude, elevation,
/// state, name.
pub const NCEI_COLUMN_SPANS: [(usize, usize); 6] =
    [(0, 11), (12, 20), (21, 30), (31, 37), (38, 40), (41, 71)];

/// Fixed-width GHCN-Daily station metadata.
#[derive(Debug, Clone, Copy)]
pub struct NceiNormalizer {
    processing_date: NaiveDate,
}

impl NceiNormalizer {
    pub fn new(processing_date: NaiveDate) -> Self {
        Self { processing_date }
    }
}

/// Trimmed text of `line[start..end]`, clamped to the line length.
fn span(line: &[u8], (start, end): (usize, usize)) -> String {
    let end = end.min(line.len());
    if start >= end {
        return String::new();
    }
    String::from_utf8_lossy(&line[start..end]).trim().to_string()
}

fn parse_line(line: &[u8], timestamp: &str) -> PartialRecord {
    let [id, lat, lon, elev, state, name] = NCEI_COLUMN_SPANS.map(|cols| span(line, cols));
    PartialRecord {
        station_id: non_empty(&id),
        timestamp: Some(timestamp.to_string()),
        latitude: coerce_f64(&lat),
        longitude: coerce_f64(&lon),
        elevation_m: coerce_f64(&elev),
        country: non_empty(&state.chars().take(2).collect::<String>()),
        station_name: non_empty(&name),
        ..Default::default()
    }
}

impl Normalizer for NceiNormalizer {
    fn source(&self) -> SourceTag {
        SourceTag::Ncei
    }

    fn normalize(&self, payload: RawPayload) -> Result<CanonicalRecordSet, OceanError> {
        let bytes = std::fs::read(payload.path().as_std_path())
            .map_err(|err| OceanError::Filesystem(format!("read {}: {err}", payload.path())))?;
        let timestamp = self.processing_date.format("%Y-%m-%d").to_string();
        let rows = bytes
            .split(|byte| *byte == b'\n')
            .map(|line| line.strip_suffix(b"\r").unwrap_or(line))
            .filter(|line| !line.iter().all(u8::is_ascii_whitespace))
            .map(|line| parse_line(line, &timestamp))
            .collect();
        let columns = vec![
            Column::StationId,
            Column::Timestamp,
            Column::Latitude,
            Column::Longitude,
            Column::ElevationM,
            Column::Country,
            Column::StationName,
        ];
        Ok(CanonicalRecordSet::from_partials(
            SourceTag::Ncei,
            payload.stem(),
            columns,
            rows,
        ))
    }
}
