/// Spreadsheet inspection tools
///
/// `analyze_table_structure`, `clear_content_keep_headers` and
/// `get_column_data_sample` all operate on the first worksheet.

use std::path::PathBuf;

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::Deserialize;
use tracing::info;

use super::{input_schema, run_blocking, ColumnRef};
use crate::mcp::{RegistryError, ToolArguments, ToolDefinition, ToolError, ToolHandler, ToolOutput, ToolRegistry};
use crate::spreadsheet::{Sheet, Workbook};

const PREVIEW_ROWS: usize = 3;
const DEFAULT_SAMPLE_SIZE: usize = 5;

/// Parameters naming a single workbook
#[derive(Debug, Deserialize, JsonSchema)]
pub struct FileParams {
    /// Path to the .xlsx file
    pub file_path: String,
}

/// Parameters for `get_column_data_sample`
#[derive(Debug, Deserialize, JsonSchema)]
pub struct ColumnSampleParams {
    /// Path to the .xlsx file
    pub file_path: String,
    /// 1-based column index or exact header name
    pub column_name_or_index: ColumnRef,
    /// Number of data rows to sample
    #[serde(default)]
    pub sample_size: Option<usize>,
}

fn describe(path: &str, sheet: &Sheet) -> String {
    let headers = sheet.headers();
    let mut lines = vec![
        format!("📊 Table structure of {}", path),
        format!("Sheet: {}", sheet.name),
        format!(
            "Rows: {} ({} data rows)",
            sheet.row_count(),
            sheet.data_rows().len()
        ),
        format!("Columns: {}", headers.len()),
        String::new(),
        "Headers:".to_string(),
    ];
    lines.extend(
        headers
            .iter()
            .enumerate()
            .map(|(idx, header)| format!("  {}. {}", idx + 1, header)),
    );

    let preview = sheet.data_rows().len().min(PREVIEW_ROWS);
    if preview > 0 {
        lines.push(String::new());
        lines.push(format!("Preview (first {} rows):", preview));
        lines.extend((1..=preview).map(|row| format!("  {}", sheet.row_text(row).join(" | "))));
    }

    lines.join("\n")
}

pub struct AnalyzeTableStructure;

impl AnalyzeTableStructure {
    pub fn definition() -> ToolDefinition {
        ToolDefinition::new(
            "analyze_table_structure",
            "Describe the first sheet of an Excel file: headers, row and column counts, and a preview",
            input_schema::<FileParams>(),
        )
    }
}

#[async_trait]
impl ToolHandler for AnalyzeTableStructure {
    async fn call(&self, arguments: ToolArguments) -> Result<ToolOutput, ToolError> {
        let params: FileParams = arguments.parse()?;

        run_blocking(move || {
            let workbook = Workbook::load(&PathBuf::from(&params.file_path))?;
            Ok(ToolOutput::Text(describe(&params.file_path, workbook.first_sheet())))
        })
        .await
    }
}

pub struct ClearContentKeepHeaders;

impl ClearContentKeepHeaders {
    pub fn definition() -> ToolDefinition {
        ToolDefinition::new(
            "clear_content_keep_headers",
            "Delete every data row of the first sheet of an Excel file, keeping the header row",
            input_schema::<FileParams>(),
        )
    }
}

#[async_trait]
impl ToolHandler for ClearContentKeepHeaders {
    async fn call(&self, arguments: ToolArguments) -> Result<ToolOutput, ToolError> {
        let params: FileParams = arguments.parse()?;

        run_blocking(move || {
            let path = PathBuf::from(&params.file_path);
            let mut workbook = Workbook::load(&path)?;
            let sheet = workbook.first_sheet_mut();
            let sheet_name = sheet.name.clone();
            let removed = sheet.clear_data();
            workbook.save(&path)?;

            info!("Cleared {} rows from {}", removed, params.file_path);
            Ok(ToolOutput::Text(format!(
                "✅ Cleared {} data rows from sheet '{}' in {}; headers kept",
                removed, sheet_name, params.file_path
            )))
        })
        .await
    }
}

pub struct GetColumnDataSample;

impl GetColumnDataSample {
    pub fn definition() -> ToolDefinition {
        ToolDefinition::new(
            "get_column_data_sample",
            "Return sample values from one column of an Excel file",
            input_schema::<ColumnSampleParams>(),
        )
    }
}

#[async_trait]
impl ToolHandler for GetColumnDataSample {
    async fn call(&self, arguments: ToolArguments) -> Result<ToolOutput, ToolError> {
        let params: ColumnSampleParams = arguments.parse()?;
        let sample_size = params.sample_size.unwrap_or(DEFAULT_SAMPLE_SIZE);

        run_blocking(move || {
            let workbook = Workbook::load(&PathBuf::from(&params.file_path))?;
            let sheet = workbook.first_sheet();
            let col = sheet.resolve_column(&params.column_name_or_index.to_string())?;
            let header = sheet.headers().swap_remove(col);
            let samples = sheet.samples(col, sample_size);

            let mut lines = vec![format!(
                "📋 Column {} '{}' ({} non-empty of the first {} rows)",
                col + 1,
                header,
                samples.len(),
                sample_size.min(sheet.data_rows().len())
            )];
            lines.extend(samples.iter().map(|value| format!("  - {}", value)));
            Ok(ToolOutput::Text(lines.join("\n")))
        })
        .await
    }
}

pub fn register(registry: &mut ToolRegistry) -> Result<(), RegistryError> {
    registry.register(AnalyzeTableStructure::definition(), AnalyzeTableStructure)?;
    registry.register(ClearContentKeepHeaders::definition(), ClearContentKeepHeaders)?;
    registry.register(GetColumnDataSample::definition(), GetColumnDataSample)?;
    Ok(())
}
