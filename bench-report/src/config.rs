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

//! Report configuration parsing.

use crate::error::{ReportError, ReportResult};
use crate::report::SCHEMA_VERSION;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// A directory of logs plus whether every run in it is distributed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceSpec {
    pub dir: PathBuf,
    #[serde(default)]
    pub rpc: bool,
}

impl SourceSpec {
    pub fn new(dir: impl Into<PathBuf>, rpc: bool) -> Self {
        Self {
            dir: dir.into(),
            rpc,
        }
    }
}

impl FromStr for SourceSpec {
    type Err = String;

    /// `DIR` or `DIR:rpc`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err("source directory must not be empty".to_string());
        }
        match s.rsplit_once(':') {
            Some((dir, "rpc")) if !dir.is_empty() => Ok(Self::new(dir, true)),
            _ => Ok(Self::new(s, false)),
        }
    }
}

/// Complete report configuration. Every field has a default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Report document to merge into.
    pub output: PathBuf,
    /// Schema version stamped on a fresh document.
    pub schema_version: String,
    /// Log directories, scanned in order.
    pub sources: Vec<SourceSpec>,
    /// Log file extension, without the dot.
    pub extension: String,
    /// System-info document; defaults to `system_info.json` in the first source.
    pub system_info: Option<PathBuf>,
    /// Optional flat CSV export of the final document.
    pub csv: Option<PathBuf>,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            output: PathBuf::from("../docs/results_new.json"),
            schema_version: SCHEMA_VERSION.to_string(),
            sources: vec![
                SourceSpec::new("results", false),
                SourceSpec::new("results-rpc", true),
            ],
            extension: "log".to_string(),
            system_info: None,
            csv: None,
        }
    }
}

impl ReportConfig {
    /// Load from a `.toml`, `.yaml` or `.yml` file.
    pub fn load(path: &Path) -> ReportResult<Self> {
        let content = fs::read_to_string(path)?;
        let config: Self = match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => toml::from_str(&content)?,
            Some("yaml" | "yml") => serde_yaml::from_str(&content)?,
            _ => return Err(ReportError::UnsupportedConfig(path.to_path_buf())),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> ReportResult<()> {
        if self.extension.is_empty() || self.extension.starts_with('.') {
            return Err(ReportError::Config(format!(
                "extension must be non-empty and given without a dot, got {:?}",
                self.extension
            )));
        }
        if self.schema_version.is_empty() {
            return Err(ReportError::Config("schema_version must not be empty".into()));
        }
        Ok(())
    }

    /// Where to look for the system-info document, if anywhere.
    pub fn system_info_path(&self) -> Option<PathBuf> {
        self.system_info.clone().or_else(|| {
            self.sources
                .first()
                .map(|s| s.dir.join("system_info.json"))
        })
    }
}
