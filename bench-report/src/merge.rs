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

//! Multi-run merge engine.
//!
//! Scanning folds parsed logs into per-run accumulators; merging writes each
//! non-empty accumulator into the persisted document, replacing any entry
//! with the same run id wholesale and leaving every other run untouched.
//!
//! Replacement is deliberate: the latest full scan of a run wins. Re-scanning
//! only a subset of a run's logs therefore drops the benchmarks of the logs
//! that were left out.

use crate::error::ReportResult;
use crate::ingest::{build_records, BenchmarkRecord, BuildInfo, LogInput};
use crate::report::{MergeSummary, ReportDocument, RunEntry};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};

/// Everything one scan learned about a run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunAccumulator {
    pub benchmarks: Vec<BenchmarkRecord>,
    pub builds: BTreeSet<BuildInfo>,
    pub environments: BTreeSet<String>,
}

impl RunAccumulator {
    pub fn is_empty(&self) -> bool {
        self.benchmarks.is_empty()
    }

    /// Finalize into a persisted entry; sets become sorted lists.
    pub fn into_entry(self, system_info: &Value, generated_at: &str) -> RunEntry {
        RunEntry {
            system_info: system_info.clone(),
            benchmarks: self.benchmarks,
            generated_at: generated_at.to_string(),
            llamacpp_builds: self.builds.into_iter().collect(),
            environments: self.environments.into_iter().collect(),
        }
    }
}

/// In-memory result of scanning a set of logs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScanResult {
    pub runs: BTreeMap<String, RunAccumulator>,
    pub files_parsed: usize,
    pub files_skipped: usize,
}

impl ScanResult {
    pub fn total_benchmarks(&self) -> usize {
        self.runs.values().map(|r| r.benchmarks.len()).sum()
    }
}

/// Parse every log and group its records by run id. Pure: the result only
/// depends on the logs and their order.
pub fn scan<'a, I>(logs: I) -> ScanResult
where
    I: IntoIterator<Item = &'a LogInput>,
{
    let mut result = ScanResult::default();

    for log in logs {
        let Some(parsed) = build_records(log) else {
            tracing::debug!(stem = %log.stem, "not a benchmark log, skipping");
            result.files_skipped += 1;
            continue;
        };
        result.files_parsed += 1;

        let acc = result.runs.entry(parsed.run_id).or_default();
        if !parsed.env.is_empty() {
            acc.environments.insert(parsed.env);
        }
        if let Some(build) = parsed.build {
            acc.builds.insert(build);
        }
        acc.benchmarks.extend(parsed.records);
    }

    result
}

/// Merge a scan into `doc`. Empty runs are ignored.
pub fn merge(
    doc: &mut ReportDocument,
    scan: ScanResult,
    system_info: &Value,
    generated_at: &str,
) -> ReportResult<MergeSummary> {
    let mut summary = MergeSummary::default();

    for (run_id, acc) in scan.runs {
        if acc.is_empty() {
            continue;
        }
        summary.total_benchmarks += acc.benchmarks.len();

        let entry = serde_json::to_value(acc.into_entry(system_info, generated_at))?;
        match doc.runs.insert(run_id.clone(), entry) {
            Some(_) => {
                summary.replaced_runs += 1;
                tracing::info!(run_id = %run_id, "replaced run");
            }
            None => {
                summary.new_runs += 1;
                tracing::info!(run_id = %run_id, "added run");
            }
        }
    }

    summary.total_runs = doc.runs.len();
    Ok(summary)
}
