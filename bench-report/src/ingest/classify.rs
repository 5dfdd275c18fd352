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

//! Field classifiers: pure string-in, option-out extractors.
//!
//! Each classifier tolerates empty or unmatched input by returning `None`.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;

struct Patterns {
    load_err: Regex,
    hang_err: Regex,
    runtime_err: Regex,
    throughput: Regex,
    quant: Regex,
    params: Regex,
    gib: Regex,
    name_b: Regex,
    shard: Regex,
}

static PATTERNS: LazyLock<Patterns> = LazyLock::new(Patterns::new);

impl Patterns {
    fn new() -> Self {
        Self {
            load_err: Regex::new(r"(?i)failed to load model|Device memory allocation.*failed|⚠️\s*Fail")
                .expect("static regex must compile"),
            hang_err: Regex::new(r"(?i)GPU Hang|HW Exception").expect("static regex must compile"),
            runtime_err: Regex::new(r"(?i)error:|exit \d+|runtime error|⚠️\s*Runtime Error")
                .expect("static regex must compile"),
            throughput: Regex::new(r"([\d.]+)\s*±\s*([\d.]+)").expect("static regex must compile"),
            quant: Regex::new(r"(?i)(Q\d+_[A-Z0-9_]+|BF16|F16|F32|mxfp\d+)")
                .expect("static regex must compile"),
            params: Regex::new(r"(?i)([\d.,]+)\s*B").expect("static regex must compile"),
            gib: Regex::new(r"(?i)([\d.,]+)\s*GiB").expect("static regex must compile"),
            // Case-sensitive: "30B" in a model name, not "b" inside a word.
            name_b: Regex::new(r"(\d+(?:\.\d+)?)B").expect("static regex must compile"),
            shard: Regex::new(r"(?i)-000\d+-of-000\d+").expect("static regex must compile"),
        }
    }
}

/// Why a log produced no performance rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorType {
    /// Model failed to load or ran out of device memory.
    Load,
    /// GPU hang or hardware exception.
    Hang,
    /// Any other reported error or nonzero exit.
    Runtime,
}

impl ErrorType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Load => "load",
            Self::Hang => "hang",
            Self::Runtime => "runtime",
        }
    }
}

impl fmt::Display for ErrorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify a log by error pattern. Load beats hang beats runtime.
pub fn classify_error(text: &str) -> Option<ErrorType> {
    let p = &*PATTERNS;
    if p.load_err.is_match(text) {
        Some(ErrorType::Load)
    } else if p.hang_err.is_match(text) {
        Some(ErrorType::Hang)
    } else if p.runtime_err.is_match(text) {
        Some(ErrorType::Runtime)
    } else {
        None
    }
}

/// `mean ± stddev` throughput pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Throughput {
    pub mean: f64,
    pub std: f64,
}

/// Extract `mean ± stddev`. Both halves must parse.
pub fn parse_throughput(field: &str) -> Option<Throughput> {
    let caps = PATTERNS.throughput.captures(field)?;
    Some(Throughput {
        mean: caps[1].parse().ok()?,
        std: caps[2].parse().ok()?,
    })
}

/// First quantization tag in `model`, uppercased.
pub fn extract_quant(model: &str) -> Option<String> {
    PATTERNS
        .quant
        .captures(model)
        .map(|caps| caps[1].to_uppercase())
}

fn parse_grouped(num: &str) -> Option<f64> {
    num.replace(',', "").parse().ok()
}

/// Parameter count in billions from a `params` cell such as `30.53 B`.
pub fn parse_params_b(field: &str) -> Option<f64> {
    let caps = PATTERNS.params.captures(field)?;
    parse_grouped(&caps[1])
}

/// File size from a `size` cell such as `1,024.50 GiB`.
pub fn parse_size_gib(field: &str) -> Option<f64> {
    let caps = PATTERNS.gib.captures(field)?;
    parse_grouped(&caps[1])
}

/// Parameter count embedded in a model name, e.g. `Qwen3-30B-A3B` -> 30.
pub fn params_from_name(model: &str) -> Option<f64> {
    let caps = PATTERNS.name_b.captures(model)?;
    caps[1].parse().ok()
}

/// Drop the `-0000N-of-0000M` shard infix so all shards share one name.
pub fn strip_shard_suffix(model: &str) -> String {
    PATTERNS.shard.replace_all(model, "").into_owned()
}

/// Raw environment prefixes and their canonical names, checked in order.
const ENV_CANON: &[(&str, &str)] = &[
    ("rocm7_1_1", "rocm7.1.1"),
    ("rocm7_alpha", "rocm7-nightlies"),
    ("rocm-7alpha", "rocm7-nightlies"),
];

/// Rewrite a known environment prefix, keeping any `-variant` suffix.
pub fn canonicalize_env(env: &str) -> String {
    for (raw, canon) in ENV_CANON {
        if env == *raw {
            return (*canon).to_string();
        }
        if let Some(rest) = env.strip_prefix(raw) {
            if rest.starts_with('-') {
                return format!("{canon}{rest}");
            }
        }
    }
    env.to_string()
}

/// Split on the first hyphen: `rocm6_4_2-rocwmma` -> (`rocm6_4_2`, `rocwmma`).
pub fn split_env(env: &str) -> (String, Option<String>) {
    match env.split_once('-') {
        Some((base, variant)) => (base.to_string(), Some(variant.to_string())),
        None => (env.to_string(), None),
    }
}
