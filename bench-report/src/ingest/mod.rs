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

//! Log-to-record extraction.
//!
//! This module provides:
//! - `BENCHMARK_META` annotation and fingerprint parsing
//! - Markdown results table parsing with a variable column set
//! - Field classifiers (quantization, params, size, env, errors, throughput)
//! - Filename flag decoding and run id resolution
//! - Record building for one log file

pub mod classify;
pub mod filename;
pub mod meta;
pub mod record;
pub mod run_id;
pub mod table;

pub use classify::ErrorType;
pub use filename::FileFlags;
pub use meta::{BenchMeta, BuildInfo, ModelFingerprint, ToolboxInfo};
pub use record::{build_records, BenchmarkRecord, LogInput, ParsedLog};
pub use run_id::{resolve_run_id, RunIdSource, FALLBACK_RUN_ID};
pub use table::{parse_table, Column, TableRow};
