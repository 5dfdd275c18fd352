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

//! `# BENCHMARK_META: key=value` annotations and model fingerprints.

use chrono::DateTime;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::LazyLock;

static META_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^#\s*BENCHMARK_META:\s*(\w+)=(.+)$").expect("static regex must compile")
});

/// Flat view over the annotations found in one log.
///
/// Later annotations with the same key replace earlier ones.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BenchMeta {
    values: HashMap<String, String>,
}

impl BenchMeta {
    /// Scan `text` for metadata annotations.
    pub fn parse(text: &str) -> Self {
        let mut values = HashMap::new();
        for caps in META_RE.captures_iter(text) {
            values.insert(caps[1].to_string(), caps[2].trim().to_string());
        }
        Self { values }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Embedded run id, if the harness wrote one.
    pub fn run_id(&self) -> Option<&str> {
        self.get("run_id").filter(|v| !v.is_empty())
    }

    /// Decoded `model_fingerprint`, if present and well formed.
    pub fn fingerprint(&self) -> Option<ModelFingerprint> {
        self.get("model_fingerprint").and_then(ModelFingerprint::decode)
    }

    /// Container the benchmark ran in. Requires `toolbox_name`.
    pub fn toolbox(&self) -> Option<ToolboxInfo> {
        let name = self.get("toolbox_name").filter(|v| !v.is_empty())?;
        Some(ToolboxInfo {
            name: name.to_string(),
            container_id: self.get("toolbox_id").map(str::to_string),
            created_iso: self.get("toolbox_created").map(str::to_string),
            llamacpp_build: None,
        })
    }
}

/// Content-identity stamp of a model file: `hash:size:mtime`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelFingerprint {
    pub partial_hash: String,
    pub size_bytes: i64,
    pub mtime_unix: i64,
    pub mtime_iso: String,
}

impl ModelFingerprint {
    /// Decode `hash:size:mtime`. Anything else, including the literal
    /// `unknown`, yields `None`.
    pub fn decode(raw: &str) -> Option<Self> {
        if raw.is_empty() || raw == "unknown" {
            return None;
        }
        let parts: Vec<&str> = raw.split(':').collect();
        let [hash, size, mtime] = parts.as_slice() else {
            return None;
        };
        let size_bytes = size.trim().parse::<i64>().ok()?;
        let mtime_unix = mtime.trim().parse::<i64>().ok()?;
        Some(Self {
            partial_hash: (*hash).to_string(),
            size_bytes,
            mtime_unix,
            mtime_iso: iso_utc(mtime_unix)?,
        })
    }
}

/// Build of llama.cpp reported by a `build: <hash> (<number>)` line.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BuildInfo {
    pub hash: String,
    pub number: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolboxInfo {
    pub name: String,
    pub container_id: Option<String>,
    pub created_iso: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub llamacpp_build: Option<BuildInfo>,
}

/// Format unix seconds as `YYYY-MM-DDTHH:MM:SSZ`.
pub fn iso_utc(unix_secs: i64) -> Option<String> {
    DateTime::from_timestamp(unix_secs, 0).map(|dt| dt.format("%Y-%m-%dT%H:%M:%SZ").to_string())
}
