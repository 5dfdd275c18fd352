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

//! Run identifier resolution.

use super::filename::run_id_from_stem;
use super::meta::BenchMeta;

/// Run id used when neither metadata nor filename carries one.
pub const FALLBACK_RUN_ID: &str = "unknown_run";

/// Where a run id came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunIdSource {
    Metadata,
    Filename,
    Fallback,
}

/// Resolve the run id for one log: metadata first, then the filename, then
/// [`FALLBACK_RUN_ID`].
pub fn resolve_run_id(meta: &BenchMeta, stem: &str) -> (String, RunIdSource) {
    if let Some(id) = meta.run_id() {
        return (id.to_string(), RunIdSource::Metadata);
    }
    if let Some(id) = run_id_from_stem(stem) {
        return (id.to_string(), RunIdSource::Filename);
    }
    (FALLBACK_RUN_ID.to_string(), RunIdSource::Fallback)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metadata_wins() {
        let meta = BenchMeta::parse("# BENCHMARK_META: run_id=777_1700000000\n");
        let (id, src) = resolve_run_id(&meta, "m__env__12345_1706284800");
        assert_eq!(id, "777_1700000000");
        assert_eq!(src, RunIdSource::Metadata);
    }

    #[test]
    fn test_filename_fallback() {
        let meta = BenchMeta::parse("");
        let (id, src) = resolve_run_id(&meta, "m__env__12345_1706284800");
        assert_eq!(id, "12345_1706284800");
        assert_eq!(src, RunIdSource::Filename);
    }

    #[test]
    fn test_sentinel_fallback() {
        let meta = BenchMeta::parse("");
        let (id, src) = resolve_run_id(&meta, "m__env__fa1");
        assert_eq!(id, FALLBACK_RUN_ID);
        assert_eq!(src, RunIdSource::Fallback);
    }
}
