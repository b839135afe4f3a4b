//! Column mapping tools: `smart_column_mapping` and `copy_data_by_mapping`

use std::path::PathBuf;

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::Value;
use tracing::info;

use super::{input_schema, run_blocking};
use crate::mcp::{RegistryError, ToolArguments, ToolDefinition, ToolError, ToolHandler, ToolOutput, ToolRegistry};
use crate::spreadsheet::{apply_mapping, parse_mapping_rules, suggest_mappings, Sheet, SpreadsheetError, Workbook};

const SAMPLES_PER_COLUMN: usize = 3;

#[derive(Debug, Deserialize, JsonSchema)]
pub struct SmartMappingParams {
    /// Path to the .xlsx file data is copied from
    pub source_file: String,
    /// Path to the .xlsx file data is copied to
    pub target_file: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct CopyByMappingParams {
    /// Path to the .xlsx file data is copied from
    pub source_file: String,
    /// Path to the .xlsx file data is copied to
    pub target_file: String,
    /// Object mapping 1-based source columns to 1-based target columns,
    /// e.g. {"1": "3", "2": "1"}; a JSON string holding the object also works
    pub mapping_rules: Value,
}

/// Up to three non-empty values of a zero-based column, comma separated
fn sample_text(sheet: &Sheet, col: usize) -> String {
    let samples = sheet.samples(col, SAMPLES_PER_COLUMN);
    if samples.is_empty() {
        "no data".to_string()
    } else {
        samples.join(", ")
    }
}

pub struct SmartColumnMapping;

impl SmartColumnMapping {
    pub fn definition() -> ToolDefinition {
        ToolDefinition::new(
            "smart_column_mapping",
            "Suggest how the columns of a source Excel file map onto the columns of a target file",
            input_schema::<SmartMappingParams>(),
        )
    }
}

#[async_trait]
impl ToolHandler for SmartColumnMapping {
    async fn call(&self, arguments: ToolArguments) -> Result<ToolOutput, ToolError> {
        let params: SmartMappingParams = arguments.parse()?;

        run_blocking(move || {
            let source_book = Workbook::load(&PathBuf::from(&params.source_file))?;
            let target_book = Workbook::load(&PathBuf::from(&params.target_file))?;
            let (source, target) = (source_book.first_sheet(), target_book.first_sheet());

            let source_headers = source.headers();
            let target_headers = target.headers();
            let suggestions = suggest_mappings(&source_headers, &target_headers);

            let mut lines = vec![
                "🔗 Column mapping suggestions".to_string(),
                format!("Source ({}): {}", params.source_file, source_headers.join(", ")),
                format!("Target ({}): {}", params.target_file, target_headers.join(", ")),
                String::new(),
            ];

            for suggestion in &suggestions {
                match (suggestion.target_column, &suggestion.target_header, suggestion.confidence) {
                    (Some(column), Some(header), Some(confidence)) => lines.push(format!(
                        "  {}. {} → {}. {} ({} confidence, {})",
                        suggestion.source_column,
                        suggestion.source_header,
                        column,
                        header,
                        confidence,
                        suggestion.reason
                    )),
                    _ => lines.push(format!(
                        "  {}. {} → no match ({})",
                        suggestion.source_column, suggestion.source_header, suggestion.reason
                    )),
                }
                lines.push(format!(
                    "     samples: {}",
                    sample_text(source, suggestion.source_column - 1)
                ));
            }

            lines.push(String::new());
            lines.push("Target samples:".to_string());
            lines.extend(
                target_headers
                    .iter()
                    .enumerate()
                    .map(|(col, header)| format!("  {}. {}: {}", col + 1, header, sample_text(target, col))),
            );

            Ok(ToolOutput::Text(lines.join("\n")))
        })
        .await
    }
}

pub struct CopyDataByMapping;

impl CopyDataByMapping {
    pub fn definition() -> ToolDefinition {
        ToolDefinition::new(
            "copy_data_by_mapping",
            "Replace the data rows of a target Excel file with source rows, copying columns by an explicit mapping",
            input_schema::<CopyByMappingParams>(),
        )
    }
}

#[async_trait]
impl ToolHandler for CopyDataByMapping {
    async fn call(&self, arguments: ToolArguments) -> Result<ToolOutput, ToolError> {
        let params: CopyByMappingParams = arguments.parse()?;
        let rules = parse_mapping_rules(&params.mapping_rules).map_err(|e| match e {
            SpreadsheetError::InvalidMapping(message) => ToolError::InvalidArguments(message),
            other => ToolError::Spreadsheet(other),
        })?;

        run_blocking(move || {
            let source_book = Workbook::load(&PathBuf::from(&params.source_file))?;
            let target_path = PathBuf::from(&params.target_file);
            let mut target_book = Workbook::load(&target_path)?;

            let copied = apply_mapping(source_book.first_sheet(), target_book.first_sheet_mut(), &rules);
            target_book.save(&target_path)?;

            info!("Copied {} rows into {}", copied, params.target_file);
            let applied = rules
                .iter()
                .map(|(from, to)| format!("{}→{}", from, to))
                .collect::<Vec<_>>()
                .join(", ");
            Ok(ToolOutput::Text(format!(
                "✅ Copied {} rows from {} to {}\nMapping: {}",
                copied, params.source_file, params.target_file, applied
            )))
        })
        .await
    }
}

pub fn register(registry: &mut ToolRegistry) -> Result<(), RegistryError> {
    registry.register(SmartColumnMapping::definition(), SmartColumnMapping)?;
    registry.register(CopyDataByMapping::definition(), CopyDataByMapping)?;
    Ok(())
}
