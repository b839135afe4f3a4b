/// Tool for comparing two Excel files row by row
///
/// This module implements the compare_excel_files MCP tool.

use std::path::PathBuf;

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::Deserialize;

use super::{input_schema, run_blocking, ColumnRef};
use crate::mcp::{RegistryError, ToolArguments, ToolDefinition, ToolError, ToolHandler, ToolOutput, ToolRegistry};
use crate::spreadsheet::{compare_sheets, TableDiff, Workbook};

const SHOWN_REMOVED: usize = 5;
const SHOWN_ADDED: usize = 5;
const SHOWN_MODIFIED: usize = 3;

fn default_key_column() -> ColumnRef {
    ColumnRef::Name("1".to_string())
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct CompareParams {
    /// Path to the first (reference) .xlsx file
    pub file1: String,
    /// Path to the second .xlsx file
    pub file2: String,
    /// Column identifying a row: 1-based index or header name of file1
    #[serde(default = "default_key_column")]
    pub key_column: ColumnRef,
}

fn render(params: &CompareParams, key_header: &str, diff: &TableDiff) -> String {
    let mut lines = vec![
        format!("🔍 Comparing {} with {} on '{}'", params.file1, params.file2, key_header),
        String::new(),
    ];

    if !diff.removed.is_empty() {
        lines.push(format!("➖ Only in {} ({}):", params.file1, diff.removed.len()));
        lines.extend(
            diff.removed
                .iter()
                .take(SHOWN_REMOVED)
                .map(|(_, row)| format!("  {}", row.join(" | "))),
        );
    }

    if !diff.added.is_empty() {
        lines.push(format!("➕ Only in {} ({}):", params.file2, diff.added.len()));
        lines.extend(
            diff.added
                .iter()
                .take(SHOWN_ADDED)
                .map(|(_, row)| format!("  {}", row.join(" | "))),
        );
    }

    if !diff.modified.is_empty() {
        lines.push(format!("✏️ Modified ({}):", diff.modified.len()));
        for modified in diff.modified.iter().take(SHOWN_MODIFIED) {
            lines.push(format!("  {}", modified.key));
            lines.push(format!("    before: {}", modified.left.join(" | ")));
            lines.push(format!("    after:  {}", modified.right.join(" | ")));
        }
    }

    if diff.removed.is_empty() && diff.added.is_empty() && diff.modified.is_empty() {
        lines.push("✅ No differences".to_string());
    }

    lines.push(String::new());
    lines.push("Summary:".to_string());
    lines.push(format!("  removed_count: {}", diff.removed.len()));
    lines.push(format!("  new_count: {}", diff.added.len()));
    lines.push(format!("  modified_count: {}", diff.modified.len()));
    lines.push(format!("  unchanged_count: {}", diff.unchanged));
    lines.push(format!("  total_file1: {}", diff.total_left));
    lines.push(format!("  total_file2: {}", diff.total_right));

    lines.join("\n")
}

pub struct CompareExcelFiles;

impl CompareExcelFiles {
    pub fn definition() -> ToolDefinition {
        ToolDefinition::new(
            "compare_excel_files",
            "Compare the first sheets of two Excel files keyed by one column and report removed, new and modified rows",
            input_schema::<CompareParams>(),
        )
    }
}

#[async_trait]
impl ToolHandler for CompareExcelFiles {
    async fn call(&self, arguments: ToolArguments) -> Result<ToolOutput, ToolError> {
        let params: CompareParams = arguments.parse()?;

        run_blocking(move || {
            let left = Workbook::load(&PathBuf::from(&params.file1))?;
            let right = Workbook::load(&PathBuf::from(&params.file2))?;
            let left_sheet = left.first_sheet();

            let key_col = left_sheet.resolve_column(&params.key_column.to_string())?;
            let key_header = left_sheet.headers().swap_remove(key_col);
            let diff = compare_sheets(left_sheet, right.first_sheet(), key_col + 1)?;

            Ok(ToolOutput::Text(render(&params, &key_header, &diff)))
        })
        .await
    }
}

pub fn register(registry: &mut ToolRegistry) -> Result<(), RegistryError> {
    registry.register(CompareExcelFiles::definition(), CompareExcelFiles)
}
