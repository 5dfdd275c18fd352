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

//! Benchmark records built from one log file.

use super::classify::{
    canonicalize_env, classify_error, extract_quant, params_from_name, parse_params_b,
    parse_size_gib, parse_throughput, split_env, strip_shard_suffix, ErrorType,
};
use super::filename::FileFlags;
use super::meta::{BenchMeta, BuildInfo, ModelFingerprint, ToolboxInfo};
use super::run_id::{resolve_run_id, RunIdSource};
use super::table::{parse_table, Column, TableRow};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

static BUILD_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)build:\s*([0-9a-f]{7,})\s*\((\d+)\)").expect("static regex must compile")
});

/// Tests whose presence means the log holds real performance data.
pub const THROUGHPUT_TESTS: [&str; 2] = ["pp512", "tg128"];

/// One measurement: one test of one configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkRecord {
    pub model: String,
    pub model_clean: String,
    pub env: String,
    pub env_base: String,
    pub env_variant: Option<String>,
    pub fa: bool,
    pub context: String,
    pub context_tokens: Option<u64>,
    pub test: Option<String>,
    pub tps_mean: Option<f64>,
    pub tps_std: Option<f64>,
    pub error: bool,
    pub error_type: Option<ErrorType>,
    pub params_b: Option<f64>,
    pub file_size_gib: Option<f64>,
    pub name_params_b: Option<f64>,
    pub quant: Option<String>,
    pub rpc: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_id: Option<ModelFingerprint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub toolbox: Option<ToolboxInfo>,
}

/// A log file handed to the builder by the discovery layer.
#[derive(Debug, Clone)]
pub struct LogInput {
    /// File name without directory or extension.
    pub stem: String,
    pub text: String,
    /// The source directory only holds distributed (RPC) runs.
    pub rpc_source: bool,
}

impl LogInput {
    pub fn new(stem: impl Into<String>, text: impl Into<String>, rpc_source: bool) -> Self {
        Self {
            stem: stem.into(),
            text: text.into(),
            rpc_source,
        }
    }
}

/// Result of building records for one log.
#[derive(Debug, Clone)]
pub struct ParsedLog {
    pub run_id: String,
    pub run_id_source: RunIdSource,
    /// Canonical environment; empty when the filename left it blank.
    pub env: String,
    pub build: Option<BuildInfo>,
    pub records: Vec<BenchmarkRecord>,
}

/// Last `build: <hash> (<number>)` line in the log.
pub fn last_build(text: &str) -> Option<BuildInfo> {
    BUILD_RE.captures_iter(text).last().map(|caps| BuildInfo {
        hash: caps[1].to_string(),
        number: caps[2].to_string(),
    })
}

fn has_throughput_rows(rows: &[TableRow]) -> bool {
    rows.iter().any(|row| {
        let name = row.test_name();
        THROUGHPUT_TESTS.iter().any(|test| *test == name)
    })
}

/// File-level fields shared by every record of one log.
struct FileContext {
    model_raw: String,
    model_clean: String,
    env: String,
    env_base: String,
    env_variant: Option<String>,
    fa: bool,
    context: String,
    context_tokens: Option<u64>,
    rpc: bool,
    error_type: Option<ErrorType>,
    quant: Option<String>,
    model_id: Option<ModelFingerprint>,
    toolbox: Option<ToolboxInfo>,
}

impl FileContext {
    fn record(&self, row: Option<&TableRow>) -> BenchmarkRecord {
        let cell = |col| row.and_then(|r| r.get(col));

        let throughput = cell(Column::Throughput).and_then(parse_throughput);
        let params_b = cell(Column::Params).and_then(parse_params_b);
        let fa = cell(Column::FlashAttn)
            .and_then(|v| v.parse::<i64>().ok())
            .map_or(self.fa, |v| v == 1);

        BenchmarkRecord {
            model: self.model_raw.clone(),
            model_clean: self.model_clean.clone(),
            env: self.env.clone(),
            env_base: self.env_base.clone(),
            env_variant: self.env_variant.clone(),
            fa,
            context: self.context.clone(),
            context_tokens: self.context_tokens,
            test: row.map(TableRow::test_name),
            tps_mean: throughput.map(|t| t.mean),
            tps_std: throughput.map(|t| t.std),
            error: self.error_type.is_some(),
            error_type: self.error_type,
            params_b,
            file_size_gib: cell(Column::Size).and_then(parse_size_gib),
            name_params_b: params_b.or_else(|| params_from_name(&self.model_clean)),
            quant: self.quant.clone(),
            rpc: self.rpc,
            model_id: self.model_id.clone(),
            toolbox: self.toolbox.clone(),
        }
    }
}

/// Build the benchmark records for one log.
///
/// Returns `None` when the stem does not follow the filename contract. A log
/// without a results table still yields one record, with null test and
/// throughput, carrying the error classification.
pub fn build_records(log: &LogInput) -> Option<ParsedLog> {
    let flags = FileFlags::parse(&log.stem)?;
    let meta = BenchMeta::parse(&log.text);
    let (run_id, run_id_source) = resolve_run_id(&meta, &log.stem);

    let env = canonicalize_env(&flags.env);
    let (env_base, env_variant) = split_env(&env);
    let model_clean = strip_shard_suffix(&flags.model_raw);

    let build = last_build(&log.text);
    let mut toolbox = meta.toolbox();
    if let Some(tb) = toolbox.as_mut() {
        tb.llamacpp_build = build.clone();
    }

    let rows = parse_table(&log.text);
    let error_type = if has_throughput_rows(&rows) {
        None
    } else {
        classify_error(&log.text)
    };

    let ctx = FileContext {
        quant: extract_quant(&model_clean),
        model_raw: flags.model_raw,
        model_clean,
        env: env.clone(),
        env_base,
        env_variant,
        fa: flags.fa,
        context: flags.context,
        context_tokens: flags.context_tokens,
        rpc: log.rpc_source || flags.rpc,
        error_type,
        model_id: meta.fingerprint(),
        toolbox,
    };

    let records = if rows.is_empty() {
        vec![ctx.record(None)]
    } else {
        rows.iter().map(|row| ctx.record(Some(row))).collect()
    };

    tracing::debug!(
        stem = %log.stem,
        run_id = %run_id,
        run_id_source = ?run_id_source,
        annotated = !meta.is_empty(),
        rows = rows.len(),
        error = ?error_type,
        "parsed log"
    );

    Some(ParsedLog {
        run_id,
        run_id_source,
        env,
        build,
        records,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const GOOD_LOG: &str = "\
# BENCHMARK_META: run_id=4242_1706284800
# BENCHMARK_META: toolbox_name=llama-rocm-7.1.1
# BENCHMARK_META: toolbox_id=deadbeef
# BENCHMARK_META: toolbox_created=2025-11-02T10:00:00Z
# BENCHMARK_META: model_fingerprint=abc123:1048576:1700000000
build: 1111111 (5000)
| model                          |       size |     params | backend    | ngl | fa |            test |                  t/s |
| ------------------------------ | ---------: | ---------: | ---------- | --: | -: | --------------: | -------------------: |
| qwen3moe 30B.A3B Q8_0          |  30.25 GiB |    30.53 B | ROCm       |  99 |  0 |           pp512 |      1012.34 ± 5.10 |
| qwen3moe 30B.A3B Q8_0          |  30.25 GiB |    30.53 B | ROCm       |  99 |  0 |           tg128 |        61.08 ± 0.11 |

build: cd6983d5 (6119)
";

    #[test]
    fn test_one_record_per_row() {
        let log = LogInput::new("Qwen3-30B-A3B-Q8_0__rocm7_1_1-rocwmma__fa1", GOOD_LOG, false);
        let parsed = build_records(&log).unwrap();
        assert_eq!(parsed.run_id, "4242_1706284800");
        assert_eq!(parsed.run_id_source, RunIdSource::Metadata);
        assert_eq!(parsed.env, "rocm7.1.1-rocwmma");
        assert_eq!(parsed.records.len(), 2);

        let pp = &parsed.records[0];
        assert_eq!(pp.test.as_deref(), Some("pp512"));
        assert_eq!(pp.tps_mean, Some(1012.34));
        assert_eq!(pp.tps_std, Some(5.10));
        assert_eq!(pp.env_base, "rocm7.1.1");
        assert_eq!(pp.env_variant.as_deref(), Some("rocwmma"));
        assert_eq!(pp.params_b, Some(30.53));
        assert_eq!(pp.name_params_b, Some(30.53));
        assert_eq!(pp.file_size_gib, Some(30.25));
        assert_eq!(pp.quant.as_deref(), Some("Q8_0"));
        assert!(!pp.error);
        assert!(pp.error_type.is_none());
        // Table column beats the __fa1 filename flag.
        assert!(!pp.fa);

        let tg = &parsed.records[1];
        assert_eq!(tg.test.as_deref(), Some("tg128"));
        assert_eq!(tg.model, pp.model);
        assert_eq!(tg.env, pp.env);
    }

    #[test]
    fn test_last_build_wins_and_attaches_to_toolbox() {
        let log = LogInput::new("m__env", GOOD_LOG, false);
        let parsed = build_records(&log).unwrap();
        let build = parsed.build.unwrap();
        assert_eq!(build.hash, "cd6983d5");
        assert_eq!(build.number, "6119");

        let tb = parsed.records[0].toolbox.as_ref().unwrap();
        assert_eq!(tb.name, "llama-rocm-7.1.1");
        assert_eq!(tb.container_id.as_deref(), Some("deadbeef"));
        assert_eq!(tb.llamacpp_build.as_ref().unwrap().number, "6119");

        let fp = parsed.records[0].model_id.as_ref().unwrap();
        assert_eq!(fp.size_bytes, 1_048_576);
    }

    #[test]
    fn test_build_without_toolbox() {
        let log = LogInput::new("m__env", "build: abcdef0 (42)\n", false);
        let parsed = build_records(&log).unwrap();
        assert_eq!(parsed.build.unwrap().number, "42");
        assert!(parsed.records[0].toolbox.is_none());
    }

    #[test]
    fn test_error_log_yields_single_record() {
        let text = "llama_model_load: error loading model\nHW Exception by GPU node-1 (Agent handle: 0x1)\n";
        let log = LogInput::new("gpt-oss-120b-mxfp4-00001-of-00003__vulkan_radv__fa1", text, false);
        let parsed = build_records(&log).unwrap();
        assert_eq!(parsed.run_id, "unknown_run");
        assert_eq!(parsed.records.len(), 1);

        let rec = &parsed.records[0];
        assert!(rec.test.is_none());
        assert!(rec.tps_mean.is_none());
        assert!(rec.tps_std.is_none());
        assert!(rec.error);
        assert_eq!(rec.error_type, Some(ErrorType::Hang));
        assert_eq!(rec.model_clean, "gpt-oss-120b-mxfp4");
        assert_eq!(rec.quant.as_deref(), Some("MXFP4"));
        assert!(rec.fa);
        assert!(rec.params_b.is_none());
        assert_eq!(rec.name_params_b, None);
    }

    #[test]
    fn test_perf_rows_suppress_error_classification() {
        let text = "\
| model | test | t/s |
| --- | --- | --- |
| m | tg128 | 10.00 ± 0.20 |

GPU Hang detected on teardown
";
        let parsed = build_records(&LogInput::new("m__env", text, false)).unwrap();
        assert!(!parsed.records[0].error);
        assert!(parsed.records[0].error_type.is_none());
    }

    #[test]
    fn test_unrecognized_tests_allow_error_classification() {
        let text = "\
| model | test | t/s |
| --- | --- | --- |
| m | pp8192 | 10.00 ± 0.20 |

error: something broke
";
        let parsed = build_records(&LogInput::new("m__env", text, false)).unwrap();
        assert_eq!(parsed.records.len(), 1);
        assert_eq!(parsed.records[0].error_type, Some(ErrorType::Runtime));
        assert_eq!(parsed.records[0].test.as_deref(), Some("pp8192"));
    }

    #[test]
    fn test_silent_unknown_log() {
        let parsed = build_records(&LogInput::new("m__env", "nothing useful\n", false)).unwrap();
        let rec = &parsed.records[0];
        assert!(!rec.error);
        assert!(rec.error_type.is_none());
        assert!(rec.test.is_none());
    }

    #[test]
    fn test_rpc_is_logical_or() {
        let text = "| model | test | t/s |\n|---|---|---|\n| m | pp512 | 1 ± 0 |\n";
        assert!(build_records(&LogInput::new("m__env", text, true)).unwrap().records[0].rpc);
        assert!(build_records(&LogInput::new("m__env__rpc", text, false)).unwrap().records[0].rpc);
        assert!(!build_records(&LogInput::new("m__env", text, false)).unwrap().records[0].rpc);
    }

    #[test]
    fn test_fa_falls_back_to_filename_without_column() {
        let text = "| model | test | t/s |\n|---|---|---|\n| m | pp512 | 1 ± 0 |\n";
        let parsed = build_records(&LogInput::new("m__env__fa1", text, false)).unwrap();
        assert!(parsed.records[0].fa);
    }

    #[test]
    fn test_unparseable_fa_cell_falls_back_to_filename() {
        let text = "\
| model | fa | test | t/s |
|---|---|---|---|
| m | yes | pp512 | 1 ± 0 |
| m |  | tg128 | 2 ± 0 |
| m | 0 | pp512 | 3 ± 0 |
";
        let parsed = build_records(&LogInput::new("m__env__fa1", text, false)).unwrap();
        let fa: Vec<bool> = parsed.records.iter().map(|r| r.fa).collect();
        assert_eq!(fa, [true, true, false]);

        let parsed = build_records(&LogInput::new("m__env", text, false)).unwrap();
        let fa: Vec<bool> = parsed.records.iter().map(|r| r.fa).collect();
        assert_eq!(fa, [false, false, false]);
    }

    #[test]
    fn test_hblt0_applies_before_canonicalization() {
        let parsed = build_records(&LogInput::new("m__rocm7_1_1__hblt0", "", false)).unwrap();
        assert_eq!(parsed.env, "rocm7.1.1-hblt0");
        assert_eq!(parsed.records[0].env_variant.as_deref(), Some("hblt0"));
    }

    #[test]
    fn test_shard_files_share_model_clean() {
        let a = build_records(&LogInput::new("modelX-00001-of-00004__envA", "", false)).unwrap();
        let b = build_records(&LogInput::new("modelX-00002-of-00004__envA", "", false)).unwrap();
        assert_eq!(a.records[0].model_clean, "modelX");
        assert_eq!(b.records[0].model_clean, "modelX");
        assert_ne!(a.records[0].model, b.records[0].model);
    }

    #[test]
    fn test_bad_stem_is_skipped() {
        assert!(build_records(&LogInput::new("system_info", "", false)).is_none());
    }

    #[test]
    fn test_record_serializes_nulls_but_omits_optional_blocks() {
        let parsed = build_records(&LogInput::new("m__env", "", false)).unwrap();
        let value = serde_json::to_value(&parsed.records[0]).unwrap();
        let obj = value.as_object().unwrap();
        assert!(obj["test"].is_null());
        assert!(obj["error_type"].is_null());
        assert_eq!(obj["context"], "default");
        assert!(!obj.contains_key("model_id"));
        assert!(!obj.contains_key("toolbox"));
    }
}
