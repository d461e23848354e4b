use std::cell::{Cell, RefCell};
use std::fmt;

use camino::{Utf8Path, Utf8PathBuf};
use chrono::{DateTime, Local};
use serde::Serialize;

use crate::error::OceanError;
use crate::store::write_bytes_atomic;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EventStatus {
    Started,
    Info,
    Success,
    Warning,
    Error,
}

impl fmt::Display for EventStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            EventStatus::Started => "STARTED",
            EventStatus::Info => "INFO",
            EventStatus::Success => "SUCCESS",
            EventStatus::Warning => "WARNING",
            EventStatus::Error => "ERROR",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PipelineEvent {
    pub timestamp: DateTime<Local>,
    pub source: String,
    pub operation: String,
    pub status: EventStatus,
    pub details: String,
}

impl PipelineEvent {
    pub fn new(source: &str, operation: &str, status: EventStatus, details: &str) -> Self {
        Self {
            timestamp: Local::now(),
            source: source.to_string(),
            operation: operation.to_string(),
            status,
            details: details.to_string(),
        }
    }
}

/// Receives `(source, operation, status, details)` events from every stage.
pub trait EventSink {
    fn record(&self, event: PipelineEvent);

    /// Persists accumulated events. Only the first call has an effect.
    fn flush(&self) -> Result<(), OceanError>;

    fn log(&self, source: &str, operation: &str, status: EventStatus, details: &str) {
        self.record(PipelineEvent::new(source, operation, status, details));
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RunLogOptions {
    pub save_csv: bool,
    pub save_metadata: bool,
}

impl Default for RunLogOptions {
    fn default() -> Self {
        Self {
            save_csv: true,
            save_metadata: true,
        }
    }
}

/// Event sink for one run: mirrors events to `tracing` and writes the CSV log
/// and JSON metadata into the logs directory on flush.
pub struct RunLog {
    session_id: String,
    logs_dir: Utf8PathBuf,
    options: RunLogOptions,
    entries: RefCell<Vec<PipelineEvent>>,
    flushed: Cell<bool>,
}

#[derive(Debug, Serialize)]
struct RunMetadata<'a> {
    session_id: &'a str,
    execution_date: String,
    total_entries: usize,
    error_count: usize,
    success_count: usize,
    log_files: LogFiles,
}

#[derive(Debug, Serialize)]
struct LogFiles {
    csv_log: String,
    json_metadata: String,
}

#[derive(Debug, Serialize)]
struct CsvRow<'a> {
    timestamp: String,
    source: &'a str,
    operation: &'a str,
    status: EventStatus,
    details: &'a str,
}

impl RunLog {
    pub fn new(logs_dir: impl Into<Utf8PathBuf>, options: RunLogOptions) -> Self {
        let log = Self {
            session_id: Local::now().format("%Y%m%d_%H%M%S").to_string(),
            logs_dir: logs_dir.into(),
            options,
            entries: RefCell::new(Vec::new()),
            flushed: Cell::new(false),
        };
        log.log(
            "SYSTEM",
            "INITIALIZATION",
            EventStatus::Started,
            "Pipeline logger initialized",
        );
        log
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn csv_log_path(&self) -> Utf8PathBuf {
        self.logs_dir
            .join(format!("pipeline_{}_log.csv", self.session_id))
    }

    pub fn metadata_path(&self) -> Utf8PathBuf {
        self.logs_dir
            .join(format!("pipeline_{}_metadata.json", self.session_id))
    }

    pub fn entries(&self) -> Vec<PipelineEvent> {
        self.entries.borrow().clone()
    }

    pub fn is_flushed(&self) -> bool {
        self.flushed.get()
    }

    fn count(&self, status: EventStatus) -> usize {
        self.entries
            .borrow()
            .iter()
            .filter(|event| event.status == status)
            .count()
    }

    fn write_csv(&self, path: &Utf8Path) -> Result<(), OceanError> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        for event in self.entries.borrow().iter() {
            writer
                .serialize(CsvRow {
                    timestamp: event.timestamp.to_rfc3339(),
                    source: &event.source,
                    operation: &event.operation,
                    status: event.status,
                    details: &event.details,
                })
                .map_err(|err| OceanError::Filesystem(err.to_string()))?;
        }
        let bytes = writer
            .into_inner()
            .map_err(|err| OceanError::Filesystem(err.to_string()))?;
        write_bytes_atomic(path, &bytes)
    }

    fn write_metadata(&self, path: &Utf8Path) -> Result<(), OceanError> {
        let metadata = RunMetadata {
            session_id: &self.session_id,
            execution_date: Local::now().to_rfc3339(),
            total_entries: self.entries.borrow().len(),
            error_count: self.count(EventStatus::Error),
            success_count: self.count(EventStatus::Success),
            log_files: LogFiles {
                csv_log: self.csv_log_path().to_string(),
                json_metadata: path.to_string(),
            },
        };
        let bytes = serde_json::to_vec_pretty(&metadata)
            .map_err(|err| OceanError::Filesystem(err.to_string()))?;
        write_bytes_atomic(path, &bytes)
    }
}

impl EventSink for RunLog {
    fn record(&self, event: PipelineEvent) {
        let message = if event.details.is_empty() {
            format!("{} | {} | {}", event.source, event.operation, event.status)
        } else {
            format!(
                "{} | {} | {} | {}",
                event.source, event.operation, event.status, event.details
            )
        };
        match event.status {
            EventStatus::Error => tracing::error!("{message}"),
            EventStatus::Warning => tracing::warn!("{message}"),
            _ => tracing::info!("{message}"),
        }
        self.entries.borrow_mut().push(event);
    }

    fn flush(&self) -> Result<(), OceanError> {
        if self.flushed.replace(true) {
            return Ok(());
        }
        if self.options.save_csv && !self.entries.borrow().is_empty() {
            self.write_csv(&self.csv_log_path())?;
        }
        if self.options.save_metadata {
            self.write_metadata(&self.metadata_path())?;
        }
        Ok(())
    }
}
