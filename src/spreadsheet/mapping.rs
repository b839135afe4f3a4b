//! Column mapping between two sheets
//!
//! Suggestions are heuristic: exact header matches, then shared keyword
//! groups, then the column at the same position.

use std::fmt;

use serde_json::Value;

use super::{Data, Sheet, SpreadsheetError, MAX_COLUMNS};

/// Keyword groups; two headers match when both contain a keyword of one group
const KEYWORD_GROUPS: &[(&str, &[&str])] = &[
    ("path keywords", &["path", "file", "location"]),
    ("status keywords", &["dlt", "status", "category", "type"]),
    ("component keywords", &["component", "name", "package", "module"]),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confidence {
    High,
    Medium,
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Confidence::High => write!(f, "high"),
            Confidence::Medium => write!(f, "medium"),
        }
    }
}

/// Suggested target for one source column (columns are 1-based)
#[derive(Debug, Clone, PartialEq)]
pub struct MappingSuggestion {
    pub source_column: usize,
    pub source_header: String,
    pub target_column: Option<usize>,
    pub target_header: Option<String>,
    pub confidence: Option<Confidence>,
    pub reason: String,
}

fn shared_group(source: &str, target: &str) -> Option<&'static str> {
    KEYWORD_GROUPS
        .iter()
        .find(|(_, keywords)| {
            keywords.iter().any(|k| source.contains(k)) && keywords.iter().any(|k| target.contains(k))
        })
        .map(|(group, _)| *group)
}

/// Suggest a target column for every source column
pub fn suggest_mappings(source: &[String], target: &[String]) -> Vec<MappingSuggestion> {
    let target_lower: Vec<String> = target.iter().map(|h| h.to_lowercase()).collect();

    source
        .iter()
        .enumerate()
        .map(|(src_idx, src_header)| {
            let src_lower = src_header.to_lowercase();

            // An exact header match anywhere wins over keyword groups, so a
            // target named like the source is never passed over for an
            // earlier keyword hit
            let matched = target_lower
                .iter()
                .position(|t| *t == src_lower)
                .map(|idx| (idx, Confidence::High, "header names match".to_string()))
                .or_else(|| {
                    target_lower.iter().enumerate().find_map(|(idx, t)| {
                        shared_group(&src_lower, t)
                            .map(|group| (idx, Confidence::High, format!("shared {}", group)))
                    })
                })
                .or_else(|| {
                    (src_idx < target.len())
                        .then(|| (src_idx, Confidence::Medium, "same position".to_string()))
                });

            match matched {
                Some((idx, confidence, reason)) => MappingSuggestion {
                    source_column: src_idx + 1,
                    source_header: src_header.clone(),
                    target_column: Some(idx + 1),
                    target_header: Some(target[idx].clone()),
                    confidence: Some(confidence),
                    reason,
                },
                None => MappingSuggestion {
                    source_column: src_idx + 1,
                    source_header: src_header.clone(),
                    target_column: None,
                    target_header: None,
                    confidence: None,
                    reason: "no matching target column".to_string(),
                },
            }
        })
        .collect()
}

fn column_number(value: &Value, what: &str) -> Result<usize, SpreadsheetError> {
    let number = match value {
        Value::Number(n) => n.as_u64().map(|n| n as usize),
        Value::String(s) => s.trim().parse::<usize>().ok(),
        _ => None,
    };

    match number {
        Some(n) if (1..=MAX_COLUMNS).contains(&n) => Ok(n),
        _ => Err(SpreadsheetError::InvalidMapping(format!(
            "{} column must be an integer from 1 to {}, got {}",
            what, MAX_COLUMNS, value
        ))),
    }
}

/// Parse `{"<source column>": "<target column>", ...}` (1-based)
///
/// Accepts the object itself or a JSON string holding it. Rules come back
/// ordered by source column.
pub fn parse_mapping_rules(rules: &Value) -> Result<Vec<(usize, usize)>, SpreadsheetError> {
    let parsed;
    let object = match rules {
        Value::Object(map) => map,
        Value::String(text) => {
            parsed = serde_json::from_str::<Value>(text)
                .map_err(|e| SpreadsheetError::InvalidMapping(format!("not valid JSON: {}", e)))?;
            parsed.as_object().ok_or_else(|| {
                SpreadsheetError::InvalidMapping("expected a JSON object".to_string())
            })?
        }
        _ => {
            return Err(SpreadsheetError::InvalidMapping(
                "expected a JSON object".to_string(),
            ))
        }
    };

    if object.is_empty() {
        return Err(SpreadsheetError::InvalidMapping("no rules given".to_string()));
    }

    let mut pairs = object
        .iter()
        .map(|(source, target)| {
            Ok((
                column_number(&Value::String(source.clone()), "source")?,
                column_number(target, "target")?,
            ))
        })
        .collect::<Result<Vec<_>, SpreadsheetError>>()?;

    pairs.sort_unstable();
    Ok(pairs)
}

/// Replace the target's data rows with mapped copies of the source's
///
/// Rules naming column 0 or a column past the xlsx limit are ignored.
/// Returns the number of rows written.
pub fn apply_mapping(source: &Sheet, target: &mut Sheet, rules: &[(usize, usize)]) -> usize {
    let columns = 1..=MAX_COLUMNS;
    let rules: Vec<(usize, usize)> = rules
        .iter()
        .copied()
        .filter(|(from, to)| columns.contains(from) && columns.contains(to))
        .collect();

    let width = rules
        .iter()
        .map(|&(_, to)| to)
        .max()
        .unwrap_or(0)
        .max(target.width());

    let rows: Vec<Vec<Data>> = source
        .data_rows()
        .iter()
        .map(|src_row| {
            let mut row = vec![Data::Empty; width];
            for &(from, to) in &rules {
                if let Some(value) = src_row.get(from - 1) {
                    row[to - 1] = value.clone();
                }
            }
            row
        })
        .collect();

    let copied = rows.len();
    target.replace_data(rows);
    copied
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_suggestions_for_reordered_columns() {
        let source = strings(&["Package Name", "Component Location", "DLT Category"]);
        let target = strings(&["File Path", "DLT Status", "Component Name"]);

        let suggestions = suggest_mappings(&source, &target);
        let targets: Vec<Option<usize>> = suggestions.iter().map(|s| s.target_column).collect();
        assert_eq!(targets, vec![Some(3), Some(1), Some(2)]);
        assert!(suggestions.iter().all(|s| s.confidence == Some(Confidence::High)));
        assert_eq!(suggestions[1].reason, "shared path keywords");
    }

    #[test]
    fn test_exact_match_wins_over_keywords() {
        let source = strings(&["Name"]);
        let target = strings(&["Module", "name"]);
        let suggestions = suggest_mappings(&source, &target);
        assert_eq!(suggestions[0].target_column, Some(2));
        assert_eq!(suggestions[0].reason, "header names match");
    }

    #[test]
    fn test_positional_and_missing_fallbacks() {
        let source = strings(&["Alpha", "Beta", "Gamma"]);
        let target = strings(&["One", "Two"]);
        let suggestions = suggest_mappings(&source, &target);

        assert_eq!(suggestions[0].target_column, Some(1));
        assert_eq!(suggestions[0].confidence, Some(Confidence::Medium));
        assert_eq!(suggestions[2].target_column, None);
        assert_eq!(suggestions[2].target_header, None);
    }

    #[test]
    fn test_parse_rules_from_string_and_object() {
        let from_string = parse_mapping_rules(&json!(r#"{"2": "1", "1": "3", "3": 2}"#)).unwrap();
        assert_eq!(from_string, vec![(1, 3), (2, 1), (3, 2)]);

        let from_object = parse_mapping_rules(&json!({"10": 1, "2": "4"})).unwrap();
        assert_eq!(from_object, vec![(2, 4), (10, 1)]);
    }

    #[test]
    fn test_parse_rules_rejects_invalid_input() {
        assert!(parse_mapping_rules(&json!("not json")).is_err());
        assert!(parse_mapping_rules(&json!("[1, 2]")).is_err());
        assert!(parse_mapping_rules(&json!({})).is_err());
        assert!(parse_mapping_rules(&json!({"0": "1"})).is_err());
        assert!(parse_mapping_rules(&json!({"a": "1"})).is_err());
        assert!(parse_mapping_rules(&json!({"1": -2})).is_err());
        assert!(parse_mapping_rules(&json!(5)).is_err());
    }

    #[test]
    fn test_parse_rules_rejects_columns_past_xlsx_limit() {
        assert_eq!(parse_mapping_rules(&json!({"16384": 1})).unwrap(), vec![(16384, 1)]);
        for rules in [
            json!({"1": "1000000000000"}),
            json!({"1": 16385}),
            json!({"70000": "1"}),
        ] {
            let err = parse_mapping_rules(&rules).unwrap_err();
            assert!(matches!(err, SpreadsheetError::InvalidMapping(_)), "{}", rules);
        }
    }

    #[test]
    fn test_apply_mapping_ignores_out_of_range_rules() {
        let source = Sheet::from_strings("src", &[&["a"], &["1"]]);
        let mut target = Sheet::from_strings("dst", &[&["x", "y"]]);

        let copied = apply_mapping(&source, &mut target, &[(1, 2), (1, usize::MAX), (0, 1)]);
        assert_eq!(copied, 1);
        assert_eq!(target.width(), 2);
        assert_eq!(target.row_text(1), vec!["", "1"]);
    }

    #[test]
    fn test_apply_mapping_keeps_target_header() {
        let source = Sheet::from_strings(
            "src",
            &[
                &["Package Name", "Component Location", "DLT Category"],
                &["React Router", "/src/router.js", "Open Source"],
                &["Chart.js", "/src/chart.css", ""],
            ],
        );
        let mut target = Sheet::from_strings(
            "dst",
            &[
                &["File Path", "DLT Status", "Component Name"],
                &["/old.js", "Old", "Old Component"],
            ],
        );

        let copied = apply_mapping(&source, &mut target, &[(1, 3), (2, 1), (3, 2)]);
        assert_eq!(copied, 2);
        assert_eq!(target.row_count(), 3);
        assert_eq!(target.row_text(0), vec!["File Path", "DLT Status", "Component Name"]);
        assert_eq!(target.row_text(1), vec!["/src/router.js", "Open Source", "React Router"]);
        assert_eq!(target.row_text(2), vec!["/src/chart.css", "", "Chart.js"]);
    }

    #[test]
    fn test_apply_mapping_widens_target() {
        let source = Sheet::from_strings("src", &[&["a"], &["1"]]);
        let mut target = Sheet::from_strings("dst", &[&["x"]]);

        apply_mapping(&source, &mut target, &[(1, 3), (5, 1)]);
        assert_eq!(target.width(), 3);
        assert_eq!(target.row_text(1), vec!["", "", "1"]);
    }
}
