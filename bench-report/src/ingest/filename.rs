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

//! Log filename contract:
//! `<model>__<env>[__fa1][__hblt0][__longctx<N>][__rpc][__<runid>].log`
//!
//! Optional segments may appear in any order; unknown ones are ignored.

use regex::Regex;
use std::sync::LazyLock;

/// Segment separator inside a log file stem.
pub const SEGMENT_SEP: &str = "__";

/// Suffix appended to the environment by the `hblt0` flag.
pub const HALF_BANDWIDTH_SUFFIX: &str = "-hblt0";

static LONGCTX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)longctx(\d+)").expect("static regex must compile"));

static RUN_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+_\d+$").expect("static regex must compile"));

/// Everything the filename says about a log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileFlags {
    /// Model name exactly as it appears before the first separator.
    pub model_raw: String,
    /// Environment, with `-hblt0` applied but not yet canonicalized.
    pub env: String,
    pub fa: bool,
    pub context: String,
    pub context_tokens: Option<u64>,
    pub rpc: bool,
}

impl FileFlags {
    /// Decode a file stem (name without extension).
    ///
    /// Returns `None` when the stem has no `__` separator; such files are not
    /// benchmark logs.
    pub fn parse(stem: &str) -> Option<Self> {
        let mut parts = stem.split(SEGMENT_SEP);
        let model_raw = parts.next()?.to_string();
        let mut env = parts.next()?.to_string();

        let mut fa = false;
        let mut context = "default".to_string();
        let mut context_tokens = None;
        let mut rpc = false;

        for raw in parts {
            let suffix = raw.to_lowercase();
            match suffix.as_str() {
                "fa1" => fa = true,
                "hblt0" => env.push_str(HALF_BANDWIDTH_SUFFIX),
                "rpc" => rpc = true,
                s if s.starts_with("longctx") => {
                    context_tokens = LONGCTX_RE
                        .captures(s)
                        .and_then(|caps| caps[1].parse().ok());
                    context = suffix;
                }
                _ => {}
            }
        }

        Some(Self {
            model_raw,
            env,
            fa,
            context,
            context_tokens,
            rpc,
        })
    }
}

/// Run id encoded as the last segment (`<pid>_<unix-ts>`), used by logs
/// written before the harness embedded it as metadata.
pub fn run_id_from_stem(stem: &str) -> Option<&str> {
    let mut parts = stem.split(SEGMENT_SEP);
    parts.next()?;
    parts.last().filter(|last| RUN_ID_RE.is_match(last))
}
