use crate::domain::{RawPayload, SourceTag};
use crate::error::OceanError;
use crate::record::{
    CanonicalRecordSet, Column, PartialRecord, coerce_f64, correct_kelvin, non_empty,
};

use super::Normalizer;

/// Comma-separated gridded SST exports (ERDDAP `griddap` CSV).
#[derive(Debug, Clone, Copy, Default)]
pub struct NoaaNormalizer;

/// Comma-separated Copernicus SST tables. Missing canonical columns become
/// nulls, so a file with no usable column yields an empty set.
#[derive(Debug, Clone, Copy, Default)]
pub struct CopernicusNormalizer;

/// Raw keywords that identify each canonical column, checked in this order.
struct HeaderRules {
    time: &'static [&'static str],
    temperature: &'static [&'static str],
}

const NOAA_RULES: HeaderRules = HeaderRules {
    time: &["time"],
    temperature: &["sst", "analysed"],
};

const COPERNICUS_RULES: HeaderRules = HeaderRules {
    time: &["time", "date"],
    temperature: &["sst", "temp", "analysed"],
};

/// Raw column index for each canonical column, `None` when not recoverable.
#[derive(Debug, Default, PartialEq, Eq)]
struct ColumnMap {
    timestamp: Option<usize>,
    latitude: Option<usize>,
    longitude: Option<usize>,
    temperature: Option<usize>,
}

impl ColumnMap {
    fn infer<'a>(headers: impl IntoIterator<Item = &'a str>, rules: &HeaderRules) -> Self {
        let mut map = ColumnMap::default();
        for (idx, header) in headers.into_iter().enumerate() {
            let lower = header.to_lowercase();
            let slot = if rules.time.iter().any(|word| lower.contains(word)) {
                &mut map.timestamp
            } else if lower.contains("lat") {
                &mut map.latitude
            } else if lower.contains("lon") {
                &mut map.longitude
            } else if rules.temperature.iter().any(|word| lower.contains(word)) {
                &mut map.temperature
            } else {
                continue;
            };
            slot.get_or_insert(idx);
        }
        map
    }

    fn is_empty(&self) -> bool {
        *self == ColumnMap::default()
    }
}

fn read_rows(
    payload: &RawPayload,
    rules: &HeaderRules,
) -> Result<(ColumnMap, Vec<PartialRecord>), OceanError> {
    let file = payload.file_name().to_string();
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(payload.path().as_std_path())
        .map_err(|err| OceanError::parse(&file, err.to_string()))?;
    let headers = reader
        .headers()
        .map_err(|err| OceanError::parse(&file, err.to_string()))?
        .clone();
    let map = ColumnMap::infer(headers.iter(), rules);

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result.map_err(|err| OceanError::parse(&file, err.to_string()))?;
        let field = |idx: Option<usize>| idx.and_then(|i| record.get(i)).unwrap_or("");
        rows.push(PartialRecord {
            timestamp: non_empty(field(map.timestamp)),
            latitude: coerce_f64(field(map.latitude)),
            longitude: coerce_f64(field(map.longitude)),
            temperature: coerce_f64(field(map.temperature)),
            ..Default::default()
        });
    }
    Ok((map, rows))
}

fn temperature_column(converted: bool) -> Column {
    if converted {
        Column::SstCelsius
    } else {
        Column::SeaSurfaceTemperature
    }
}

impl Normalizer for NoaaNormalizer {
    fn source(&self) -> SourceTag {
        SourceTag::Noaa
    }

    fn normalize(&self, payload: RawPayload) -> Result<CanonicalRecordSet, OceanError> {
        let (map, mut rows) = read_rows(&payload, &NOAA_RULES)?;
        if map.is_empty() {
            return Err(OceanError::parse(
                payload.file_name(),
                "no recognizable columns found",
            ));
        }
        if map.latitude.is_none() || map.longitude.is_none() {
            return Err(OceanError::parse(
                payload.file_name(),
                "latitude and longitude columns are required",
            ));
        }

        let converted = map.temperature.is_some() && correct_kelvin(&mut rows);
        let mut columns = Vec::with_capacity(4);
        if map.timestamp.is_some() {
            columns.push(Column::Timestamp);
        }
        columns.push(Column::Latitude);
        columns.push(Column::Longitude);
        if map.temperature.is_some() {
            columns.push(temperature_column(converted));
        }

        Ok(CanonicalRecordSet::from_partials(
            SourceTag::Noaa,
            payload.stem(),
            columns,
            rows,
        ))
    }
}

impl Normalizer for CopernicusNormalizer {
    fn source(&self) -> SourceTag {
        SourceTag::Copernicus
    }

    fn normalize(&self, payload: RawPayload) -> Result<CanonicalRecordSet, OceanError> {
        let (_, mut rows) = read_rows(&payload, &COPERNICUS_RULES)?;
        // converted values keep the raw column name
        correct_kelvin(&mut rows);
        let columns = vec![
            Column::Timestamp,
            Column::Latitude,
            Column::Longitude,
            Column::SeaSurfaceTemperature,
        ];
        Ok(CanonicalRecordSet::from_partials(
            SourceTag::Copernicus,
            payload.stem(),
            columns,
            rows,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn infer_noaa_headers() {
        let map = ColumnMap::infer(["time", "latitude", "longitude", "analysed_sst"], &NOAA_RULES);
        assert_eq!(map.timestamp, Some(0));
        assert_eq!(map.latitude, Some(1));
        assert_eq!(map.longitude, Some(2));
        assert_eq!(map.temperature, Some(3));
    }

    #[test]
    fn copernicus_accepts_date_and_temp_synonyms() {
        let map = ColumnMap::infer(["obs_date", "LAT", "LON", "water_temp"], &COPERNICUS_RULES);
        assert_eq!(map.timestamp, Some(0));
        assert_eq!(map.temperature, Some(3));

        let noaa = ColumnMap::infer(["obs_date", "LAT", "LON", "water_temp"], &NOAA_RULES);
        assert_eq!(noaa.timestamp, None);
        assert_eq!(noaa.temperature, None);
    }

    #[test]
    fn first_matching_header_wins() {
        let map = ColumnMap::infer(["lat", "latitude_qc", "lon"], &NOAA_RULES);
        assert_eq!(map.latitude, Some(0));
    }

    #[test]
    fn unrelated_headers_map_to_nothing() {
        assert!(ColumnMap::infer(["station", "depth"], &NOAA_RULES).is_empty());
    }
}
