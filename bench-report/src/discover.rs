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

//! Log discovery: lists and reads the logs of each configured source.

use crate::config::SourceSpec;
use crate::ingest::filename::SEGMENT_SEP;
use crate::ingest::LogInput;
use std::fs;
use std::path::{Path, PathBuf};

fn list_logs(dir: &Path, extension: &str) -> Vec<(PathBuf, String)> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::debug!(dir = %dir.display(), error = %e, "source directory not readable");
            return Vec::new();
        }
    };

    let suffix = format!(".{extension}");
    let mut found: Vec<(PathBuf, String)> = entries
        .filter_map(Result::ok)
        .filter(|entry| entry.path().is_file())
        .filter_map(|entry| {
            let name = entry.file_name().into_string().ok()?;
            let stem = name.strip_suffix(&suffix)?.to_string();
            Some((entry.path(), stem))
        })
        .collect();
    found.sort();
    found
}

/// Read every benchmark log under `sources`, in source order and then
/// lexicographic path order. Unreadable files are logged and skipped.
pub fn discover_logs(sources: &[SourceSpec], extension: &str) -> Vec<LogInput> {
    let mut logs = Vec::new();

    for source in sources {
        for (path, stem) in list_logs(&source.dir, extension) {
            if !stem.contains(SEGMENT_SEP) {
                continue;
            }
            match fs::read(&path) {
                Ok(bytes) => {
                    let text = String::from_utf8_lossy(&bytes).into_owned();
                    logs.push(LogInput::new(stem, text, source.rpc));
                }
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "failed to read log, skipping");
                }
            }
        }
    }

    tracing::debug!(count = logs.len(), "discovered logs");
    logs
}
