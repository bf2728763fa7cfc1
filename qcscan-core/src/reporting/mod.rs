//! Tabular output of pass results.
//!
//! Each result type maps to one small CSV table. The CLI decides file names
//! and where they go; this module only owns the row layout.

pub mod summary;

pub use summary::{
    bars_detection_table, bars_evaluation_table, content_table, failures_table, summary_table,
};

use crate::error::CoreResult;
use std::fs;
use std::path::Path;

/// Rows of string cells, written as CSV.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_row<I, S>(&mut self, cells: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.rows.push(cells.into_iter().map(Into::into).collect());
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn to_csv(&self) -> String {
        let mut out = String::new();
        for row in &self.rows {
            let line: Vec<String> = row.iter().map(|cell| escape_csv_field(cell)).collect();
            out.push_str(&line.join(","));
            out.push('\n');
        }
        out
    }

    pub fn write_csv(&self, path: &Path) -> CoreResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, self.to_csv())?;
        log::debug!("Wrote {}", path.display());
        Ok(())
    }
}

fn escape_csv_field(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// Share of `count` in `total` as text, floored to two decimals.
///
/// Whole extremes print without decimals (`"0"`, `"100"`); a share too small
/// to show at two decimals prints as `"0"`.
#[must_use]
pub fn format_percentage(count: u64, total: u64) -> String {
    if total == 0 {
        return "0".to_string();
    }
    // Integer hundredths of a percent keep the floor exact
    let hundredths = u128::from(count) * 10_000 / u128::from(total);
    match hundredths {
        0 => "0".to_string(),
        10_000 => "100".to_string(),
        h => format!("{}.{:02}", h / 100, h % 100),
    }
}
