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

//! Persisted report document: load, save, summaries and CSV export.

use crate::error::{ReportError, ReportResult};
use crate::ingest::{BenchmarkRecord, BuildInfo};
use colored::Colorize;
use comfy_table::{modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL, Cell, Color, Table};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Schema version written into a fresh document.
pub const SCHEMA_VERSION: &str = "1.0";

// ────────────────────────────────────────────────────────────────────────────────
// Document types
// ────────────────────────────────────────────────────────────────────────────────

/// Top-level report: run id -> run entry.
///
/// Runs are kept as raw JSON so entries written by older versions survive a
/// merge byte for byte. Unknown top-level keys are preserved as well.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportDocument {
    #[serde(default)]
    pub schema_version: String,
    pub runs: BTreeMap<String, Value>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// Aggregate of one benchmark session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunEntry {
    pub system_info: Value,
    pub benchmarks: Vec<BenchmarkRecord>,
    pub generated_at: String,
    pub llamacpp_builds: Vec<BuildInfo>,
    pub environments: Vec<String>,
}

impl ReportDocument {
    pub fn new(schema_version: &str) -> Self {
        Self {
            schema_version: schema_version.to_string(),
            runs: BTreeMap::new(),
            extra: BTreeMap::new(),
        }
    }

    /// Load the document at `path`.
    ///
    /// A missing, unreadable or malformed file (including one without a
    /// `runs` object) yields a fresh document; this never fails. A
    /// `schema_version` that is absent or not a string is replaced by
    /// `schema_version`.
    pub fn load_or_new(path: &Path, schema_version: &str) -> Self {
        if !path.exists() {
            return Self::new(schema_version);
        }
        match Self::read(path, schema_version) {
            Ok(doc) => doc,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "existing report unusable, starting fresh");
                Self::new(schema_version)
            }
        }
    }

    fn read(path: &Path, schema_version: &str) -> ReportResult<Self> {
        let content = fs::read_to_string(path)?;
        let Value::Object(mut top) = serde_json::from_str::<Value>(&content)? else {
            return Err(ReportError::Config("report is not a JSON object".into()));
        };
        let runs = match top.remove("runs") {
            Some(Value::Object(runs)) => runs.into_iter().collect(),
            _ => return Err(ReportError::Config("report has no `runs` object".into())),
        };
        let schema_version = match top.remove("schema_version") {
            Some(Value::String(version)) if !version.is_empty() => version,
            _ => schema_version.to_string(),
        };
        Ok(Self {
            schema_version,
            runs,
            extra: top.into_iter().collect(),
        })
    }

    /// Render as key-sorted, two-space indented JSON with a trailing newline.
    pub fn to_json_string(&self) -> ReportResult<String> {
        let value = sort_keys(serde_json::to_value(self)?);
        let mut out = serde_json::to_string_pretty(&value)?;
        out.push('\n');
        Ok(out)
    }

    /// Save to `path`, creating parent directories.
    pub fn save(&self, path: &Path) -> ReportResult<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, self.to_json_string()?)?;
        Ok(())
    }
}

/// Recursively rebuild every object with its keys in lexicographic order.
/// Array order is kept.
pub fn sort_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            Value::Object(
                entries
                    .into_iter()
                    .map(|(k, v)| (k, sort_keys(v)))
                    .collect::<Map<String, Value>>(),
            )
        }
        Value::Array(items) => Value::Array(items.into_iter().map(sort_keys).collect()),
        other => other,
    }
}

/// Current UTC time as `YYYY-MM-DDTHH:MM:SSZ`.
pub fn now_iso() -> String {
    chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

/// Load the opaque system-info document. Anything unreadable becomes `{}`.
pub fn load_system_info(path: &Path) -> Value {
    let parsed = fs::read_to_string(path)
        .ok()
        .and_then(|content| serde_json::from_str::<Value>(&content).ok());
    match parsed {
        Some(value) => value,
        None => {
            tracing::debug!(path = %path.display(), "no usable system info");
            Value::Object(Map::new())
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────────
// Terminal output
// ────────────────────────────────────────────────────────────────────────────────

/// Counters reported after a merge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeSummary {
    pub new_runs: usize,
    pub replaced_runs: usize,
    pub total_benchmarks: usize,
    pub total_runs: usize,
}

/// Plain-text summary for the invoking shell.
pub fn print_summary(path: &Path, summary: &MergeSummary) {
    println!("Wrote {}", path.display());
    println!("  New runs added: {}", summary.new_runs);
    println!("  Total benchmarks processed: {}", summary.total_benchmarks);
    println!("  Total runs in file: {}", summary.total_runs);
}

fn str_list(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(|v| v.as_str().map(str::to_string)).collect())
        .unwrap_or_default()
}

fn build_list(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .map(|b| {
                    format!(
                        "{} ({})",
                        b.get("hash").and_then(Value::as_str).unwrap_or("?"),
                        b.get("number").and_then(Value::as_str).unwrap_or("?")
                    )
                })
                .collect()
        })
        .unwrap_or_default()
}

/// Print one row per run in the document.
pub fn print_runs_table(doc: &ReportDocument) {
    println!("\n{}", format!("━━━ runs (schema {}) ━━━", doc.schema_version).bold().cyan());

    let mut table = Table::new();
    table.load_preset(UTF8_FULL).apply_modifier(UTF8_ROUND_CORNERS);
    table.set_header(vec!["Run", "Benchmarks", "Errors", "Environments", "Builds", "Generated"]);

    for (run_id, entry) in &doc.runs {
        let benchmarks = entry.get("benchmarks").and_then(Value::as_array);
        let total = benchmarks.map_or(0, Vec::len);
        let errors = benchmarks.map_or(0, |b| {
            b.iter()
                .filter(|r| r.get("error").and_then(Value::as_bool).unwrap_or(false))
                .count()
        });
        let errors_cell = if errors > 0 {
            Cell::new(errors).fg(Color::Red)
        } else {
            Cell::new(errors)
        };

        table.add_row(vec![
            Cell::new(run_id),
            Cell::new(total),
            errors_cell,
            Cell::new(str_list(entry.get("environments")).join(", ")),
            Cell::new(build_list(entry.get("llamacpp_builds")).join(", ")),
            Cell::new(entry.get("generated_at").and_then(Value::as_str).unwrap_or("-")),
        ]);
    }

    println!("{table}");
}

// ────────────────────────────────────────────────────────────────────────────────
// CSV export
// ────────────────────────────────────────────────────────────────────────────────

const CSV_FIELDS: [&str; 13] = [
    "model",
    "model_clean",
    "env",
    "fa",
    "context",
    "test",
    "tps_mean",
    "tps_std",
    "error_type",
    "quant",
    "params_b",
    "file_size_gib",
    "rpc",
];

fn csv_cell(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// Flatten every benchmark of every run into one CSV row.
pub fn export_csv(doc: &ReportDocument, path: &Path) -> ReportResult<()> {
    let mut wtr = csv::Writer::from_path(path)?;

    let mut header = vec!["run_id"];
    header.extend(CSV_FIELDS);
    wtr.write_record(&header)?;

    for (run_id, entry) in &doc.runs {
        let Some(benchmarks) = entry.get("benchmarks").and_then(Value::as_array) else {
            continue;
        };
        for bench in benchmarks {
            let mut row = vec![run_id.clone()];
            row.extend(CSV_FIELDS.iter().map(|f| csv_cell(bench.get(*f))));
            wtr.write_record(&row)?;
        }
    }

    wtr.flush()?;
    tracing::info!(path = %path.display(), "CSV exported");
    Ok(())
}
