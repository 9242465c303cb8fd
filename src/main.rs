//! Zone Analytics - occupancy, flow and dwell-time statistics for tracked persons
//!
//! Loads a per-frame detection export (CSV), runs the analytics engine and
//! writes the result as JSON.
//!
//! Module structure:
//! - `domain/` - Core types (DetectionEvent, EventTable, Visit, errors)
//! - `io/` - CSV loading and report output
//! - `services/` - Aggregators, result assembly and chart projection
//! - `infra/` - Configuration and logging

use clap::Parser;
use serde::Serialize;
use std::path::PathBuf;
use tracing::{error, info};
use zone_analytics::infra::{logging, Config};
use zone_analytics::io::{load_csv_path, ReportWriter};
use zone_analytics::services::{analyze_with, project_for_visualization, AnalysisResult, ChartBundle};

/// Zone Analytics - occupancy, flow and dwell-time statistics
#[derive(Parser, Debug)]
#[command(name = "zone-analytics", version, about)]
struct Args {
    /// Path to TOML configuration file [default: $CONFIG_FILE, then config/dev.toml]
    #[arg(short, long)]
    config: Option<String>,

    /// CSV event export to analyze
    #[arg(short, long)]
    input: PathBuf,

    /// Write the report here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Also emit chart-ready series
    #[arg(long)]
    charts: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    log_json: bool,
}

/// Report written when charts are requested
#[derive(Serialize)]
struct ReportWithCharts<'a> {
    analysis: &'a AnalysisResult,
    charts: ChartBundle,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    logging::init(args.log_json);

    info!(version = env!("CARGO_PKG_VERSION"), "zone_analytics_starting");

    let mut config = Config::load(args.config.as_deref());
    if args.charts {
        config = config.with_charts(true);
    }

    info!(
        config_file = %config.config_file(),
        input = %args.input.display(),
        delimiter = %char::from(config.delimiter()),
        unknown_label = %config.unknown_label(),
        parallel = config.parallel(),
        charts = config.charts(),
        "config_loaded"
    );

    let table = load_csv_path(&args.input, &config.loader_options()).inspect_err(|e| {
        error!(error = %e, "event_table_load_failed");
    })?;

    let result = analyze_with(&table, &config.analysis_options()).inspect_err(|e| {
        error!(error = %e, "analysis_failed");
    })?;

    let writer = ReportWriter::new(config.pretty());
    if config.charts() {
        let report = ReportWithCharts { analysis: &result, charts: project_for_visualization(&result) };
        emit(&writer, &report, args.output.as_deref())?;
    } else {
        emit(&writer, &result, args.output.as_deref())?;
    }

    info!("zone_analytics_done");
    Ok(())
}

fn emit<T: Serialize>(writer: &ReportWriter, report: &T, output: Option<&std::path::Path>) -> anyhow::Result<()> {
    match output {
        Some(path) => writer.write_file(report, path),
        None => writer.write_stdout(report),
    }
}
