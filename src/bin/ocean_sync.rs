use std::num::NonZeroUsize;
use std::process::ExitCode;

use camino::Utf8PathBuf;
use clap::Parser;
use miette::IntoDiagnostic;
use tracing_subscriber::EnvFilter;

use ocean_sync::app::{Pipeline, RunClock};
use ocean_sync::config::{ConfigLoader, Credentials};
use ocean_sync::domain::SourceTag;
use ocean_sync::events::{RunLog, RunLogOptions};
use ocean_sync::http::HttpClient;
use ocean_sync::output::{JsonOutput, OutputMode, render_summary};
use ocean_sync::retrieve::Retriever;
use ocean_sync::store::Layout;

#[derive(Parser)]
#[command(name = "ocean-sync")]
#[command(about = "Fetch ocean observation data and normalize it into chunked CSV files")]
#[command(version, author)]
struct Cli {
    /// Project directory (defaults to ./oceanDataPipeline)
    #[arg(long)]
    path: Option<Utf8PathBuf>,

    /// Sources to collect (default: every source enabled in settings.json)
    #[arg(long, value_enum, num_args = 1..)]
    sources: Vec<SourceTag>,

    /// Override processing.chunk_size
    #[arg(long)]
    max_rows: Option<NonZeroUsize>,

    /// Print the run report as JSON instead of a summary
    #[arg(long)]
    non_interactive: bool,
}

fn main() -> ExitCode {
    match run() {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(report) => {
            eprintln!("{report:?}");
            ExitCode::from(1)
        }
    }
}

fn run() -> miette::Result<bool> {
    let cli = Cli::parse();
    let output_mode = if cli.non_interactive {
        OutputMode::NonInteractive
    } else {
        OutputMode::Interactive
    };

    let layout = match cli.path {
        Some(path) => Layout::with_base(path),
        None => Layout::new().into_diagnostic()?,
    };
    layout.ensure().into_diagnostic()?;
    let mut settings = ConfigLoader::load(&layout).into_diagnostic()?;
    if let Some(max_rows) = cli.max_rows {
        settings.max_rows_per_file = max_rows;
    }

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(settings.logging.level.to_lowercase()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let mut retriever = Retriever::new(
        HttpClient::new().into_diagnostic()?,
        layout.raw_dir(),
        settings.endpoints.clone(),
        settings.region,
    );
    for source in SourceTag::ALL {
        retriever = retriever.with_credentials(
            source,
            Credentials::lookup(source, &layout.dotenv_path()),
        );
    }

    let sink = RunLog::new(
        layout.logs_dir(),
        RunLogOptions {
            save_csv: settings.logging.save_csv,
            save_metadata: settings.logging.save_metadata,
        },
    );
    let pipeline = Pipeline::new(layout, settings, retriever);
    let explicit = (!cli.sources.is_empty()).then_some(cli.sources.as_slice());
    let report = pipeline.run(explicit, RunClock::now(), &sink);

    match output_mode {
        OutputMode::NonInteractive => JsonOutput::print_report(&report).into_diagnostic()?,
        OutputMode::Interactive => {
            println!("{}", render_summary(&report, pipeline.layout()));
            if report.success {
                println!("Pipeline completed successfully");
            } else {
                println!("Pipeline completed with errors");
            }
        }
    }
    Ok(report.success)
}
