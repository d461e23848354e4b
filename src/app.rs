use std::collections::BTreeMap;
use std::time::Instant;

use camino::Utf8PathBuf;
use chrono::{Local, NaiveDate, Utc};
use serde::Serialize;

use crate::config::ResolvedSettings;
use crate::domain::{RawPayload, SourceTag};
use crate::error::OceanError;
use crate::events::{EventSink, EventStatus};
use crate::http::HttpFetcher;
use crate::normalize::normalizer_for;
use crate::retrieve::Retriever;
use crate::store::Layout;
use crate::writer::ChunkedWriter;

/// Output files produced per source during one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct OutputManifest(BTreeMap<SourceTag, Vec<Utf8PathBuf>>);

impl OutputManifest {
    pub fn new() -> Self {
        Self(
            SourceTag::ALL
                .iter()
                .map(|source| (*source, Vec::new()))
                .collect(),
        )
    }

    fn extend(&mut self, source: SourceTag, files: Vec<Utf8PathBuf>) {
        self.0.entry(source).or_default().extend(files);
    }

    pub fn files(&self, source: SourceTag) -> &[Utf8PathBuf] {
        self.0.get(&source).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn total_files(&self) -> usize {
        self.0.values().map(Vec::len).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&SourceTag, &Vec<Utf8PathBuf>)> {
        self.0.iter()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub success: bool,
    pub raw_files: usize,
    pub processed_files: usize,
    pub max_rows_per_file: usize,
    pub elapsed_ms: u128,
    pub manifest: OutputManifest,
    pub failure: Option<String>,
}

/// Run-level dates, injectable so runs can be reproduced.
#[derive(Debug, Clone, Copy)]
pub struct RunClock {
    /// Anchor for retrieval windows.
    pub today: NaiveDate,
    /// Date stamped on rows whose source has no observation time.
    pub processing_date: NaiveDate,
}

impl RunClock {
    pub fn now() -> Self {
        Self {
            today: Utc::now().date_naive(),
            processing_date: Local::now().date_naive(),
        }
    }
}

/// Flushes the sink when dropped, so early returns and panics still persist events.
struct FlushGuard<'a> {
    sink: &'a dyn EventSink,
}

impl Drop for FlushGuard<'_> {
    fn drop(&mut self) {
        if let Err(err) = self.sink.flush() {
            tracing::error!("failed to save run logs: {err}");
        }
    }
}

pub struct Pipeline<F> {
    layout: Layout,
    settings: ResolvedSettings,
    retriever: Retriever<F>,
    writer: ChunkedWriter,
}

impl<F: HttpFetcher> Pipeline<F> {
    pub fn new(layout: Layout, settings: ResolvedSettings, retriever: Retriever<F>) -> Self {
        let writer = ChunkedWriter::new(settings.max_rows_per_file);
        Self {
            layout,
            settings,
            retriever,
            writer,
        }
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// Explicit sources win; otherwise every source enabled in the settings.
    pub fn resolve_sources(&self, explicit: Option<&[SourceTag]>) -> Vec<SourceTag> {
        match explicit {
            Some(list) if !list.is_empty() => {
                let mut sources = Vec::with_capacity(list.len());
                for source in list {
                    if !sources.contains(source) {
                        sources.push(*source);
                    }
                }
                sources
            }
            _ => self.settings.enabled_sources(),
        }
    }

    /// Runs collection then processing. Never fails; the outcome is in the report.
    /// `sink` is flushed exactly once before this returns.
    pub fn run(
        &self,
        sources: Option<&[SourceTag]>,
        clock: RunClock,
        sink: &dyn EventSink,
    ) -> RunReport {
        let _guard = FlushGuard { sink };
        let started = Instant::now();
        let mut raw_files = 0;

        let outcome = self.execute(sources, clock, sink, &mut raw_files);
        let (success, manifest, failure) = match outcome {
            Ok(manifest) => (true, manifest, None),
            Err(err) => {
                if !matches!(err, OceanError::RunAbort(_)) {
                    sink.log("PIPELINE", "EXECUTION", EventStatus::Error, &err.to_string());
                }
                (false, OutputManifest::new(), Some(err.to_string()))
            }
        };

        RunReport {
            success,
            raw_files,
            processed_files: manifest.total_files(),
            max_rows_per_file: self.writer.max_rows().get(),
            elapsed_ms: started.elapsed().as_millis(),
            manifest,
            failure,
        }
    }

    fn execute(
        &self,
        sources: Option<&[SourceTag]>,
        clock: RunClock,
        sink: &dyn EventSink,
        raw_count: &mut usize,
    ) -> Result<OutputManifest, OceanError> {
        self.layout.ensure()?;

        let payloads = self.collect(sources, clock, sink);
        *raw_count = payloads.len();
        if payloads.is_empty() {
            sink.log(
                "PIPELINE",
                "DATA_COLLECTION",
                EventStatus::Error,
                "No data collected",
            );
            return Err(OceanError::RunAbort(
                "no raw files were collected from any source".to_string(),
            ));
        }

        Ok(self.process_all(payloads, clock.processing_date, sink))
    }

    /// Retrieves every source in turn; failed sources contribute nothing.
    pub fn collect(
        &self,
        sources: Option<&[SourceTag]>,
        clock: RunClock,
        sink: &dyn EventSink,
    ) -> Vec<RawPayload> {
        let mut payloads = Vec::new();
        for source in self.resolve_sources(sources) {
            let days_back = self.settings.days_back(source);
            payloads.extend(self.retriever.retrieve(source, days_back, clock.today, sink));
        }
        payloads
    }

    /// Normalizes and writes every payload. A failing file is logged and skipped.
    pub fn process_all(
        &self,
        payloads: Vec<RawPayload>,
        processing_date: NaiveDate,
        sink: &dyn EventSink,
    ) -> OutputManifest {
        let mut manifest = OutputManifest::new();
        for payload in payloads {
            let name = payload.file_name().to_string();
            sink.log(
                "PROCESSOR",
                "FILE_PROCESSING",
                EventStatus::Started,
                &format!("Processing: {name}"),
            );
            let Some(source) = payload.source() else {
                sink.log(
                    "PROCESSOR",
                    "FILE_PROCESSING",
                    EventStatus::Warning,
                    &format!("Unknown file type: {name}"),
                );
                continue;
            };

            match self.process_file(source, payload, processing_date, sink) {
                Ok(files) => {
                    sink.log(
                        source.label(),
                        "PROCESSING",
                        EventStatus::Success,
                        &format!("Created {} file(s)", files.len()),
                    );
                    manifest.extend(source, files);
                }
                Err(err) if err.is_warning() => {
                    sink.log(source.label(), "PROCESSING", EventStatus::Warning, &err.to_string());
                }
                Err(err) => {
                    sink.log(
                        source.label(),
                        "PROCESSING",
                        EventStatus::Error,
                        &format!("Failed to process {name}: {err}"),
                    );
                }
            }
        }
        manifest
    }

    fn process_file(
        &self,
        source: SourceTag,
        payload: RawPayload,
        processing_date: NaiveDate,
        sink: &dyn EventSink,
    ) -> Result<Vec<Utf8PathBuf>, OceanError> {
        sink.log(source.label(), "PROCESSING", EventStatus::Started, "");
        let set = normalizer_for(source, processing_date).normalize(payload)?;
        sink.log(
            source.label(),
            "DATA_PREVIEW",
            EventStatus::Info,
            &format!("Shape: {} rows, {} columns", set.len(), set.columns.len()),
        );
        sink.log(
            source.label(),
            "DATA_PREVIEW",
            EventStatus::Info,
            &format!("Columns: {:?}", set.headers()),
        );
        self.writer
            .write(&set, &self.layout.source_dir(source), sink)
    }
}
