use std::io::{self, Write};

use serde::Serialize;

use crate::app::RunReport;
use crate::store::Layout;

#[derive(Debug, Clone, Copy)]
pub enum OutputMode {
    Interactive,
    NonInteractive,
}

pub struct JsonOutput;

impl JsonOutput {
    pub fn print_report(report: &RunReport) -> io::Result<()> {
        Self::print_json(report)
    }

    fn print_json<T: Serialize>(value: &T) -> io::Result<()> {
        let json = serde_json::to_string_pretty(value).map_err(io::Error::other)?;
        let mut stdout = io::stdout();
        stdout.write_all(json.as_bytes())?;
        stdout.write_all(b"\n")?;
        Ok(())
    }
}

pub fn render_summary(report: &RunReport, layout: &Layout) -> String {
    let rule = "=".repeat(70);
    let mut lines = vec![
        rule.clone(),
        "EXECUTION SUMMARY".to_string(),
        rule.clone(),
        format!("Execution Time: {:.2} seconds", report.elapsed_ms as f64 / 1000.0),
        format!("Raw Files Collected: {}", report.raw_files),
        format!("Processed Files Created: {}", report.processed_files),
        format!("Max Rows per File: {}", report.max_rows_per_file),
        String::new(),
        "Breakdown by Source:".to_string(),
    ];
    for (source, files) in report.manifest.iter() {
        if !files.is_empty() {
            lines.push(format!(
                "  {}: {} file(s)",
                source.as_str().to_uppercase(),
                files.len()
            ));
        }
    }
    if let Some(failure) = &report.failure {
        lines.push(String::new());
        lines.push(format!("Failure: {failure}"));
    }
    lines.push(String::new());
    lines.push(format!("Project Directory: {}", layout.base()));
    lines.push(format!("Raw Data: {}", layout.raw_dir()));
    lines.push(format!("Processed Data: {}", layout.processed_dir()));
    lines.push(format!("Logs: {}", layout.logs_dir()));
    lines.push(rule);
    lines.join("\n")
}
