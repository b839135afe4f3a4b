//! Row-level diff of two sheets keyed by one column

use std::collections::BTreeMap;

use super::{Sheet, SpreadsheetError};

/// A key present in both sheets whose rows differ
#[derive(Debug, Clone, PartialEq)]
pub struct ModifiedRow {
    pub key: String,
    pub left: Vec<String>,
    pub right: Vec<String>,
}

/// Differences between a left and a right sheet
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TableDiff {
    /// Keys only in the left sheet, with their rows
    pub removed: Vec<(String, Vec<String>)>,
    /// Keys only in the right sheet, with their rows
    pub added: Vec<(String, Vec<String>)>,
    pub modified: Vec<ModifiedRow>,
    pub unchanged: usize,
    pub total_left: usize,
    pub total_right: usize,
}

/// Data rows keyed by the text of column `key_col`; empty keys are skipped
/// and later duplicates replace earlier ones
fn keyed_rows(sheet: &Sheet, key_col: usize) -> BTreeMap<String, Vec<String>> {
    (1..sheet.row_count())
        .map(|row| sheet.row_text(row))
        .filter_map(|row| {
            let key = row.get(key_col).cloned().unwrap_or_default();
            (!key.is_empty()).then_some((key, row))
        })
        .collect()
}

/// Compare two sheets on the 1-based `key_column`
///
/// Results are ordered by key.
pub fn compare_sheets(left: &Sheet, right: &Sheet, key_column: usize) -> Result<TableDiff, SpreadsheetError> {
    if key_column == 0 {
        return Err(SpreadsheetError::ColumnNotFound(
            "key column must be 1 or greater".to_string(),
        ));
    }

    let left_rows = keyed_rows(left, key_column - 1);
    let right_rows = keyed_rows(right, key_column - 1);

    let mut diff = TableDiff {
        total_left: left_rows.len(),
        total_right: right_rows.len(),
        ..TableDiff::default()
    };

    for (key, row) in &left_rows {
        match right_rows.get(key) {
            None => diff.removed.push((key.clone(), row.clone())),
            Some(other) if other != row => diff.modified.push(ModifiedRow {
                key: key.clone(),
                left: row.clone(),
                right: other.clone(),
            }),
            Some(_) => diff.unchanged += 1,
        }
    }

    diff.added = right_rows
        .into_iter()
        .filter(|(key, _)| !left_rows.contains_key(key))
        .collect();

    Ok(diff)
}
