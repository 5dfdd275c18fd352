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

//! Benchmark log consolidation.
//!
//! This crate provides:
//! - Extraction of benchmark records from llama-bench style logs
//! - Run identification from embedded metadata or filenames
//! - Non-destructive merge of runs into a versioned, key-sorted JSON report
//! - Log discovery, configuration, summaries and CSV export around that core

pub mod config;
pub mod discover;
pub mod error;
pub mod ingest;
pub mod merge;
pub mod report;

pub use config::{ReportConfig, SourceSpec};
pub use error::{ReportError, ReportResult};
pub use ingest::{BenchmarkRecord, LogInput};
pub use merge::{merge, scan, RunAccumulator, ScanResult};
pub use report::{MergeSummary, ReportDocument, RunEntry};
