use camino::Utf8Path;
use chrono::NaiveDate;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;

use crate::error::OceanError;
use crate::store::write_bytes_atomic;

pub const SYNTHETIC_SEED: u64 = 42;
pub const GRID_SIDE: usize = 20;
pub const LAT_RANGE: (f64, f64) = (35.0, 45.0);
pub const LON_RANGE: (f64, f64) = (-15.0, -5.0);
const CELSIUS_RANGE: (f64, f64) = (10.0, 25.0);
const KELVIN_OFFSET: f64 = 273.15;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SyntheticRow {
    pub time: String,
    pub latitude: f64,
    pub longitude: f64,
    pub analysed_sst: f64,
}

/// `count` evenly spaced values from `start` to `end` inclusive.
fn linspace(start: f64, end: f64, count: usize) -> Vec<f64> {
    match count {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (count - 1) as f64;
            (0..count)
                .map(|i| {
                    if i == count - 1 {
                        end
                    } else {
                        start + step * i as f64
                    }
                })
                .collect()
        }
    }
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (value * scale).round() / scale
}

/// Stand-in for the Copernicus Marine product: a regular grid with a seeded
/// Kelvin temperature field, row-major by latitude, then longitude. The same
/// date and seed always give the same rows.
pub fn synthesize(target_date: NaiveDate, seed: u64) -> Vec<SyntheticRow> {
    let mut rng = StdRng::seed_from_u64(seed);
    let time = target_date.format("%Y-%m-%dT12:00:00Z").to_string();
    let latitudes = linspace(LAT_RANGE.0, LAT_RANGE.1, GRID_SIDE);
    let longitudes = linspace(LON_RANGE.0, LON_RANGE.1, GRID_SIDE);

    let mut rows = Vec::with_capacity(GRID_SIDE * GRID_SIDE);
    for lat in &latitudes {
        for lon in &longitudes {
            let celsius: f64 = rng.gen_range(CELSIUS_RANGE.0..CELSIUS_RANGE.1);
            rows.push(SyntheticRow {
                time: time.clone(),
                latitude: round_to(*lat, 2),
                longitude: round_to(*lon, 2),
                analysed_sst: round_to(KELVIN_OFFSET + celsius, 3),
            });
        }
    }
    rows
}

pub fn to_csv(rows: &[SyntheticRow]) -> Result<Vec<u8>, OceanError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for row in rows {
        writer
            .serialize(row)
            .map_err(|err| OceanError::Filesystem(err.to_string()))?;
    }
    writer
        .into_inner()
        .map_err(|err| OceanError::Filesystem(err.to_string()))
}

pub fn file_name(target_date: NaiveDate) -> String {
    format!("copernicus_sst_{}.csv", target_date.format("%Y%m%d"))
}

/// Writes the synthetic grid for `target_date`; returns the row count.
pub fn write_synthetic(
    destination: &Utf8Path,
    target_date: NaiveDate,
    seed: u64,
) -> Result<usize, OceanError> {
    let rows = synthesize(target_date, seed);
    write_bytes_atomic(destination, &to_csv(&rows)?)?;
    Ok(rows.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linspace_hits_both_ends() {
        let values = linspace(35.0, 45.0, 20);
        assert_eq!(values.len(), 20);
        assert_eq!(values[0], 35.0);
        assert_eq!(values[19], 45.0);
        assert_eq!(round_to(values[1], 2), 35.53);
    }

    #[test]
    fn grid_is_kelvin_and_within_bounds() {
        let date = NaiveDate::from_ymd_opt(2026, 10, 16).unwrap();
        let rows = synthesize(date, SYNTHETIC_SEED);
        assert_eq!(rows.len(), GRID_SIDE * GRID_SIDE);
        assert!(rows.iter().all(|row| (283.15..=298.15).contains(&row.analysed_sst)));
        assert_eq!(rows[0].time, "2026-10-16T12:00:00Z");
        assert_eq!(rows[1].longitude, -14.47);
    }
}
