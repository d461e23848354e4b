use crate::domain::SourceTag;

/// Mean temperature above which a column is taken to be in Kelvin.
pub const KELVIN_MEAN_THRESHOLD: f64 = 200.0;
pub const KELVIN_OFFSET: f64 = 273.15;

/// An output column of the canonical schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    Timestamp,
    Latitude,
    Longitude,
    SeaSurfaceTemperature,
    SstCelsius,
    TemperatureCelsius,
    StationId,
    StationName,
    ElevationM,
    Country,
    Ocean,
    ProfileType,
    Institution,
}

impl Column {
    pub fn header(&self) -> &'static str {
        match self {
            Column::Timestamp => "timestamp",
            Column::Latitude => "latitude",
            Column::Longitude => "longitude",
            Column::SeaSurfaceTemperature => "sea_surface_temperature",
            Column::SstCelsius => "sst_celsius",
            Column::TemperatureCelsius => "temperature_celsius",
            Column::StationId => "station_id",
            Column::StationName => "station_name",
            Column::ElevationM => "elevation_m",
            Column::Country => "country",
            Column::Ocean => "ocean",
            Column::ProfileType => "profile_type",
            Column::Institution => "institution",
        }
    }

    /// Renders this column of `record` as a CSV field; nulls are empty.
    pub fn render(&self, record: &CanonicalRecord) -> String {
        match self {
            Column::Timestamp => text(&record.timestamp),
            Column::Latitude => record.latitude.to_string(),
            Column::Longitude => record.longitude.to_string(),
            Column::SeaSurfaceTemperature | Column::SstCelsius | Column::TemperatureCelsius => {
                number(record.temperature)
            }
            Column::StationId => text(&record.station_id),
            Column::StationName => text(&record.station_name),
            Column::ElevationM => number(record.elevation_m),
            Column::Country => text(&record.country),
            Column::Ocean => text(&record.ocean),
            Column::ProfileType => text(&record.profile_type),
            Column::Institution => text(&record.institution),
        }
    }
}

fn text(value: &Option<String>) -> String {
    value.clone().unwrap_or_default()
}

fn number(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// One persisted observation. Coordinates are never null.
#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalRecord {
    pub timestamp: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub temperature: Option<f64>,
    pub station_id: Option<String>,
    pub station_name: Option<String>,
    pub elevation_m: Option<f64>,
    pub country: Option<String>,
    pub ocean: Option<String>,
    pub profile_type: Option<String>,
    pub institution: Option<String>,
}

/// A parsed row before the coordinate filter.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PartialRecord {
    pub timestamp: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub temperature: Option<f64>,
    pub station_id: Option<String>,
    pub station_name: Option<String>,
    pub elevation_m: Option<f64>,
    pub country: Option<String>,
    pub ocean: Option<String>,
    pub profile_type: Option<String>,
    pub institution: Option<String>,
}

impl PartialRecord {
    /// Returns `None` when either coordinate is missing.
    pub fn into_record(self) -> Option<CanonicalRecord> {
        Some(CanonicalRecord {
            latitude: self.latitude?,
            longitude: self.longitude?,
            timestamp: self.timestamp,
            temperature: self.temperature,
            station_id: self.station_id,
            station_name: self.station_name,
            elevation_m: self.elevation_m,
            country: self.country,
            ocean: self.ocean,
            profile_type: self.profile_type,
            institution: self.institution,
        })
    }
}

/// Records of one raw file, in the order they were parsed.
#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalRecordSet {
    pub source: SourceTag,
    pub stem: String,
    pub columns: Vec<Column>,
    pub records: Vec<CanonicalRecord>,
}

impl CanonicalRecordSet {
    /// Builds a set, dropping rows without both coordinates.
    pub fn from_partials(
        source: SourceTag,
        stem: impl Into<String>,
        columns: Vec<Column>,
        rows: Vec<PartialRecord>,
    ) -> Self {
        Self {
            source,
            stem: stem.into(),
            columns,
            records: rows
                .into_iter()
                .filter_map(PartialRecord::into_record)
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn headers(&self) -> Vec<&'static str> {
        self.columns.iter().map(Column::header).collect()
    }

    pub fn row(&self, index: usize) -> Vec<String> {
        let record = &self.records[index];
        self.columns.iter().map(|col| col.render(record)).collect()
    }
}

/// Parses a numeric field. Blank, malformed and non-finite values are null.
pub fn coerce_f64(raw: &str) -> Option<f64> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
}

pub fn non_empty(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Converts every temperature from Kelvin to Celsius when the mean of the
/// non-null values exceeds [`KELVIN_MEAN_THRESHOLD`]. Returns whether the
/// conversion was applied.
pub fn correct_kelvin(rows: &mut [PartialRecord]) -> bool {
    let (sum, count) = rows
        .iter()
        .filter_map(|row| row.temperature)
        .fold((0.0, 0usize), |(sum, count), value| (sum + value, count + 1));
    if count == 0 || sum / count as f64 <= KELVIN_MEAN_THRESHOLD {
        return false;
    }
    for row in rows.iter_mut() {
        if let Some(value) = row.temperature.as_mut() {
            *value -= KELVIN_OFFSET;
        }
    }
    true
}
