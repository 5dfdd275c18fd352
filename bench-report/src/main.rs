// Copyright 2025 Sushanth (https://github.com/sushanthpy)
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Benchmark report generator
//!
//! Usage:
//!   bench-report                                   # results/ + results-rpc/ -> ../docs/results_new.json
//!   bench-report -o docs/results.json --table      # custom output, print per-run table
//!   bench-report --source logs --source rpc:rpc    # explicit sources, second one distributed
//!   bench-report --config report.toml --csv out.csv

use bench_report::discover::discover_logs;
use bench_report::report::{self, load_system_info, now_iso};
use bench_report::{merge, scan, ReportConfig, ReportDocument, ReportResult, SourceSpec};
use clap::Parser;
use serde_json::{Map, Value};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "bench-report", about = "Merge benchmark logs into a multi-run JSON report")]
#[command(version)]
struct Cli {
    /// Config file (.toml, .yaml or .yml).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output JSON report.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Log directory as DIR or DIR:rpc. Repeatable; replaces configured sources.
    #[arg(long = "source")]
    sources: Vec<SourceSpec>,

    /// System-info JSON passed through into every run.
    #[arg(long)]
    system_info: Option<PathBuf>,

    /// Also export all benchmarks as CSV.
    #[arg(long)]
    csv: Option<PathBuf>,

    /// Print a per-run summary table.
    #[arg(long)]
    table: bool,

    /// Enable debug logging.
    #[arg(short, long)]
    debug: bool,
}

impl Cli {
    fn apply(&self, config: &mut ReportConfig) {
        if let Some(ref output) = self.output {
            config.output = output.clone();
        }
        if !self.sources.is_empty() {
            config.sources = self.sources.clone();
        }
        if let Some(ref path) = self.system_info {
            config.system_info = Some(path.clone());
        }
        if let Some(ref path) = self.csv {
            config.csv = Some(path.clone());
        }
    }
}

fn init_tracing(debug: bool) {
    let default = if debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() -> ReportResult<()> {
    let cli = Cli::parse();
    init_tracing(cli.debug);

    let mut config = match cli.config {
        Some(ref path) => ReportConfig::load(path)?,
        None => ReportConfig::default(),
    };
    cli.apply(&mut config);
    config.validate()?;

    let logs = discover_logs(&config.sources, &config.extension);
    let scanned = scan(&logs);
    tracing::info!(
        files = scanned.files_parsed,
        skipped = scanned.files_skipped,
        runs = scanned.runs.len(),
        benchmarks = scanned.total_benchmarks(),
        "scan complete"
    );

    let system_info = config
        .system_info_path()
        .map(|path| load_system_info(&path))
        .unwrap_or_else(|| Value::Object(Map::new()));

    let mut doc = ReportDocument::load_or_new(&config.output, &config.schema_version);
    let summary = merge(&mut doc, scanned, &system_info, &now_iso())?;
    doc.save(&config.output)?;

    report::print_summary(&config.output, &summary);
    if cli.table {
        report::print_runs_table(&doc);
    }
    if let Some(ref path) = config.csv {
        report::export_csv(&doc, path)?;
    }

    Ok(())
}
