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

//! Markdown results table emitted by llama-bench.
//!
//! ```text
//! | model                  |       size |     params | backend | ngl | fa |  test |           t/s |
//! | ---------------------- | ---------: | ---------: | ------- | --: | -: | ----: | ------------: |
//! | qwen3moe 30B.A3B Q8_0  |  30.25 GiB |    30.53 B | ROCm    |  99 |  1 | pp512 | 1012.34 ± 5.1 |
//! ```
//!
//! The column set varies between harness versions (`fa` in particular comes
//! and goes), so rows are keyed by [`Column`] rather than by position.
//! Columns outside the known set are ignored.

use std::collections::BTreeMap;
use std::fmt;

/// Known table columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Column {
    Model,
    Size,
    Params,
    Backend,
    Ngl,
    Threads,
    FlashAttn,
    Test,
    Throughput,
}

impl Column {
    /// Map a normalized (trimmed, lowercased) header cell to a column.
    pub fn from_header(name: &str) -> Option<Self> {
        let col = match name {
            "model" => Self::Model,
            "size" => Self::Size,
            "params" => Self::Params,
            "backend" => Self::Backend,
            "ngl" => Self::Ngl,
            "threads" => Self::Threads,
            "fa" => Self::FlashAttn,
            "test" => Self::Test,
            "t/s" => Self::Throughput,
            _ => return None,
        };
        Some(col)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Model => "model",
            Self::Size => "size",
            Self::Params => "params",
            Self::Backend => "backend",
            Self::Ngl => "ngl",
            Self::Threads => "threads",
            Self::FlashAttn => "fa",
            Self::Test => "test",
            Self::Throughput => "t/s",
        }
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One data row, keyed by the columns its header declared.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableRow {
    cells: BTreeMap<Column, String>,
}

impl TableRow {
    pub fn get(&self, col: Column) -> Option<&str> {
        self.cells.get(&col).map(String::as_str)
    }

    pub fn has(&self, col: Column) -> bool {
        self.cells.contains_key(&col)
    }

    /// Lowercased test name (`pp512`, `tg128`, ...), empty when absent.
    pub fn test_name(&self) -> String {
        self.get(Column::Test).unwrap_or_default().to_lowercase()
    }
}

impl FromIterator<(Column, String)> for TableRow {
    fn from_iter<I: IntoIterator<Item = (Column, String)>>(iter: I) -> Self {
        Self {
            cells: iter.into_iter().collect(),
        }
    }
}

fn split_cells(line: &str) -> Vec<&str> {
    line.trim()
        .trim_matches('|')
        .split('|')
        .map(str::trim)
        .collect()
}

fn is_separator(line: &str) -> bool {
    line.strip_prefix('|')
        .map(|rest| rest.trim_start().starts_with('-'))
        .unwrap_or(false)
}

fn is_header(line: &str) -> bool {
    line.starts_with('|')
        && line[1..].contains('|')
        && split_cells(line)
            .first()
            .is_some_and(|first| first.eq_ignore_ascii_case("model"))
}

/// Column index for a header line; duplicate names resolve to the right-most
/// cell. Also returns the header width.
fn parse_header(line: &str) -> (Vec<(Column, usize)>, usize) {
    let names = split_cells(line);
    let mut index: BTreeMap<Column, usize> = BTreeMap::new();
    for (idx, name) in names.iter().enumerate() {
        if let Some(col) = Column::from_header(&name.to_lowercase()) {
            index.insert(col, idx);
        }
    }
    (index.into_iter().collect(), names.len())
}

/// Parse the first results table in `text`.
///
/// Returns an empty vector when there is no header; callers treat that as an
/// unstructured (usually failed) run. Rows with fewer cells than the header
/// are dropped. The table ends at the first blank line after a parsed row.
pub fn parse_table(text: &str) -> Vec<TableRow> {
    let mut lines = text.lines();
    let Some(header) = lines.by_ref().find(|line| is_header(line)) else {
        return Vec::new();
    };
    let (columns, width) = parse_header(header);
    let mut rows = Vec::new();

    for line in lines {
        if line.trim().is_empty() {
            if rows.is_empty() {
                continue;
            }
            break;
        }
        if is_separator(line) || is_header(line) || !line.starts_with('|') {
            continue;
        }

        let cells = split_cells(line);
        if cells.len() < width {
            continue;
        }
        rows.push(
            columns
                .iter()
                .map(|&(col, idx)| (col, cells[idx].to_string()))
                .collect(),
        );
    }

    rows
}

#[cfg(test)]
mod tests {
    use super::*;

    const WITH_FA: &str = "\
ggml_vulkan: Found 1 Vulkan devices:
| model                          |       size |     params | backend    | ngl | fa | mmap |            test |                  t/s |
| ------------------------------ | ---------: | ---------: | ---------- | --: | -: | ---: | --------------: | -------------------: |
| qwen3moe 30B.A3B Q8_0          |  30.25 GiB |    30.53 B | RPC,Vulkan |  99 |  1 |    0 |           pp512 |        512.17 ± 3.21 |
| qwen3moe 30B.A3B Q8_0          |  30.25 GiB |    30.53 B | RPC,Vulkan |  99 |  1 |    0 |           tg128 |         61.08 ± 0.11 |

build: cd6983d5 (6119)
";

    const WITHOUT_FA: &str = "\
| model                          |       size |     params | backend    | ngl | mmap |            test |                  t/s |
| ------------------------------ | ---------: | ---------: | ---------- | --: | ---: | --------------: | -------------------: |
| qwen3moe 30B.A3B Q8_0          |  30.25 GiB |    30.53 B | RPC,Vulkan |  99 |    0 |           pp512 |        512.17 ± 3.21 |
| qwen3moe 30B.A3B Q8_0          |  30.25 GiB |    30.53 B | RPC,Vulkan |  99 |    0 |           tg128 |         61.08 ± 0.11 |
";

    #[test]
    fn test_parse_table_with_fa() {
        let rows = parse_table(WITH_FA);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get(Column::FlashAttn), Some("1"));
        assert_eq!(rows[0].test_name(), "pp512");
        assert_eq!(rows[1].get(Column::Throughput), Some("61.08 ± 0.11"));
        assert_eq!(rows[1].get(Column::Size), Some("30.25 GiB"));
    }

    #[test]
    fn test_parse_table_without_fa_matches_except_fa() {
        let with = parse_table(WITH_FA);
        let without = parse_table(WITHOUT_FA);
        assert_eq!(with.len(), without.len());
        for (a, b) in with.iter().zip(&without) {
            assert!(!b.has(Column::FlashAttn));
            for col in [Column::Model, Column::Size, Column::Params, Column::Test, Column::Throughput] {
                assert_eq!(a.get(col), b.get(col), "column {col}");
            }
        }
    }

    #[test]
    fn test_no_header_is_empty() {
        let log = "main: error: failed to load model 'x.gguf'\n| not | a | table |\n";
        assert!(parse_table(log).is_empty());
    }

    #[test]
    fn test_short_rows_are_skipped() {
        let log = "\
| model | test | t/s |
| --- | --- | --- |
| m | pp512 |
| m | tg128 | 10.0 ± 0.5 |
";
        let rows = parse_table(log);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].test_name(), "tg128");
    }

    #[test]
    fn test_header_is_case_insensitive() {
        let log = "| Model | TEST | T/S |\n|---|---|---|\n| m | PP512 | 1 ± 0 |\n";
        let rows = parse_table(log);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].test_name(), "pp512");
    }

    #[test]
    fn test_blank_line_ends_table() {
        let log = "\
| model | test | t/s |
| --- | --- | --- |

| m | pp512 | 1 ± 0 |

| m | tg128 | 2 ± 0 |
";
        let rows = parse_table(log);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].test_name(), "pp512");
    }

    #[test]
    fn test_unknown_columns_ignored() {
        let log = "| model | n_batch | test | t/s |\n|--|--|--|--|\n| m | 512 | pp512 | 3 ± 1 |\n";
        let rows = parse_table(log);
        assert_eq!(rows[0].get(Column::Test), Some("pp512"));
        assert_eq!(rows[0].get(Column::Throughput), Some("3 ± 1"));
    }
}
