mod common;

use assert_matches::assert_matches;
use chrono::NaiveDate;

use ocean_sync::copernicus;
use ocean_sync::domain::{RawPayload, SourceTag};
use ocean_sync::error::OceanError;
use ocean_sync::normalize::{Normalizer, normalizer_for, parse_argo_date};
use ocean_sync::record::Column;

use common::{ARGO_INDEX, NCEI_STATIONS, NOAA_CSV, utf8_dir};

fn payload(dir: &tempfile::TempDir, name: &str, content: &str) -> RawPayload {
    let path = utf8_dir(dir.path()).join(name);
    std::fs::write(path.as_std_path(), content).unwrap();
    RawPayload::from_path(path)
}

fn processing_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
}

fn normalize(payload: RawPayload) -> Result<ocean_sync::record::CanonicalRecordSet, OceanError> {
    let source = payload.source().expect("classified payload");
    normalizer_for(source, processing_date()).normalize(payload)
}

#[test]
fn noaa_kelvin_is_converted_and_renamed() {
    let temp = tempfile::tempdir().unwrap();
    let set = normalize(payload(&temp, "noaa_sst_20261014_20261016.csv", NOAA_CSV)).unwrap();

    assert_eq!(set.source, SourceTag::Noaa);
    assert_eq!(set.stem, "noaa_sst_20261014_20261016");
    assert_eq!(
        set.headers(),
        vec!["timestamp", "latitude", "longitude", "sst_celsius"]
    );
    // units row and the row without latitude are gone
    assert_eq!(set.len(), 2);
    assert_eq!(set.records[0].timestamp.as_deref(), Some("2026-10-14T09:00:00Z"));
    assert_eq!(set.records[0].latitude, 32.0);
    assert!((set.records[0].temperature.unwrap() - (289.0 - 273.15)).abs() < 1e-9);
    assert!((set.records[1].temperature.unwrap() - (291.0 - 273.15)).abs() < 1e-9);
}

#[test]
fn noaa_celsius_is_left_alone() {
    let temp = tempfile::tempdir().unwrap();
    let csv = "time,lat,lon,sst\n2026-10-14,10.0,20.0,18.5\n2026-10-14,11.0,21.0,19.5\n";
    let set = normalize(payload(&temp, "jpl_sst.csv", csv)).unwrap();
    assert_eq!(set.columns.last(), Some(&Column::SeaSurfaceTemperature));
    assert_eq!(set.records[0].temperature, Some(18.5));
}

#[test]
fn noaa_keeps_only_recovered_columns() {
    let temp = tempfile::tempdir().unwrap();
    let csv = "latitude,longitude\n1.5,2.5\n";
    let set = normalize(payload(&temp, "noaa_positions.csv", csv)).unwrap();
    assert_eq!(set.headers(), vec!["latitude", "longitude"]);
    assert_eq!(set.row(0), vec!["1.5", "2.5"]);
}

#[test]
fn noaa_without_known_columns_is_parse_error() {
    let temp = tempfile::tempdir().unwrap();
    let err = normalize(payload(&temp, "noaa_bad.csv", "station,depth\nA,1\n")).unwrap_err();
    assert_matches!(err, OceanError::Parse { .. });

    let err = normalize(payload(&temp, "noaa_nocoords.csv", "time,sst\nx,1\n")).unwrap_err();
    assert_matches!(err, OceanError::Parse { .. });
}

#[test]
fn copernicus_synthesizes_missing_columns() {
    let temp = tempfile::tempdir().unwrap();
    let csv = "obs_date,lat,lon\n2026-10-16,40.0,-10.0\n";
    let set = normalize(payload(&temp, "copernicus_partial.csv", csv)).unwrap();
    assert_eq!(
        set.headers(),
        vec!["timestamp", "latitude", "longitude", "sea_surface_temperature"]
    );
    assert_eq!(set.row(0), vec!["2026-10-16", "40", "-10", ""]);
}

#[test]
fn copernicus_without_known_columns_is_empty_not_an_error() {
    let temp = tempfile::tempdir().unwrap();
    let set = normalize(payload(&temp, "copernicus_odd.csv", "station,depth\nA,1\n")).unwrap();
    assert!(set.is_empty());
    assert_eq!(
        set.headers(),
        vec!["timestamp", "latitude", "longitude", "sea_surface_temperature"]
    );
}

#[test]
fn copernicus_kelvin_is_converted_in_place() {
    let temp = tempfile::tempdir().unwrap();
    let csv = "time,latitude,longitude,analysed_sst\n2026-10-16T12:00:00Z,40.0,-10.0,290.0\n";
    let set = normalize(payload(&temp, "copernicus_x.csv", csv)).unwrap();
    assert_eq!(
        set.headers(),
        vec!["timestamp", "latitude", "longitude", "sea_surface_temperature"]
    );
    assert!((set.records[0].temperature.unwrap() - 16.85).abs() < 1e-9);
}

#[test]
fn copernicus_synthetic_grid_normalizes_to_celsius() {
    let temp = tempfile::tempdir().unwrap();
    let date = NaiveDate::from_ymd_opt(2026, 10, 16).unwrap();
    let path = utf8_dir(temp.path()).join(copernicus::file_name(date));
    copernicus::write_synthetic(&path, date, copernicus::SYNTHETIC_SEED).unwrap();

    let set = normalize(RawPayload::from_path(path)).unwrap();
    assert_eq!(set.len(), 400);
    assert_eq!(set.columns.last(), Some(&Column::SeaSurfaceTemperature));
    assert!(set.records.iter().all(|record| {
        let celsius = record.temperature.unwrap();
        (9.999..=25.001).contains(&celsius)
    }));
}

#[test]
fn argo_keeps_bad_dates_and_drops_bad_coordinates() {
    let temp = tempfile::tempdir().unwrap();
    let set = normalize(payload(&temp, "argo_bio_profile_index.txt", ARGO_INDEX)).unwrap();

    assert_eq!(
        set.headers(),
        vec![
            "timestamp",
            "latitude",
            "longitude",
            "ocean",
            "profile_type",
            "institution",
            "temperature_celsius"
        ]
    );
    assert_eq!(set.len(), 2);
    assert_eq!(set.records[0].timestamp.as_deref(), Some("2006-10-22T02:15:00"));
    assert_eq!(set.records[1].timestamp, None);
    assert_eq!(set.records[1].latitude, -40.021);
    assert_eq!(
        set.row(0),
        vec!["2006-10-22T02:15:00", "-40.316", "73.389", "I", "846", "AO", ""]
    );
}

#[test]
fn argo_date_token_parses_to_calendar_time() {
    let parsed = parse_argo_date("20240229235959").unwrap();
    assert_eq!(parsed.to_string(), "2024-02-29 23:59:59");
    assert_eq!(parse_argo_date("20230229000000"), None);
    assert_eq!(parse_argo_date(""), None);
}

#[test]
fn ncei_fixed_width_fields() {
    let temp = tempfile::tempdir().unwrap();
    let set = normalize(payload(&temp, "ghcnd_stations.txt", NCEI_STATIONS)).unwrap();

    assert_eq!(
        set.headers(),
        vec![
            "station_id",
            "timestamp",
            "latitude",
            "longitude",
            "elevation_m",
            "country",
            "station_name"
        ]
    );
    assert_eq!(set.len(), 2);
    let anchorage = &set.records[1];
    assert_eq!(anchorage.station_id.as_deref(), Some("US1AKAB0015"));
    assert_eq!(anchorage.latitude, 61.2257);
    assert_eq!(anchorage.longitude, -149.767);
    assert_eq!(anchorage.elevation_m, Some(74.1));
    assert_eq!(anchorage.country.as_deref(), Some("AK"));
    assert_eq!(anchorage.station_name.as_deref(), Some("ANCHORAGE 0.8 NE"));
    assert_eq!(anchorage.timestamp.as_deref(), Some("2026-10-19"));
    assert_eq!(set.records[0].country, None);
}

#[test]
fn persisted_coordinates_are_never_null() {
    let temp = tempfile::tempdir().unwrap();
    let sets = vec![
        normalize(payload(&temp, "noaa_a.csv", NOAA_CSV)).unwrap(),
        normalize(payload(&temp, "argo_a.txt", ARGO_INDEX)).unwrap(),
        normalize(payload(&temp, "ghcnd_a.txt", NCEI_STATIONS)).unwrap(),
    ];
    for set in sets {
        let lat = set.columns.iter().position(|c| *c == Column::Latitude).unwrap();
        let lon = set.columns.iter().position(|c| *c == Column::Longitude).unwrap();
        for index in 0..set.len() {
            let row = set.row(index);
            let lat: f64 = row[lat].parse().unwrap();
            let lon: f64 = row[lon].parse().unwrap();
            assert!((-90.0..=90.0).contains(&lat));
            assert!((-180.0..=180.0).contains(&lon));
        }
    }
}
