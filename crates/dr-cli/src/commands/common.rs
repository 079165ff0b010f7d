//! Shared utilities for CLI commands

use std::fmt;
use std::path::Path;

use anyhow::{Context, Result};
use dr_core::DocValue;
use dr_schema::Schema;
use dr_sql::SchemaCatalog;

/// Error type representing a non-zero process exit code.
///
/// Use `return Err(ExitCode(N).into())` instead of `std::process::exit(N)`
/// so that RAII destructors run and cleanup happens properly.
#[derive(Debug)]
pub struct ExitCode(pub i32);

impl fmt::Display for ExitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "")
    }
}

impl std::error::Error for ExitCode {}

/// Load a file of demo/test documents: a JSON array, or a single JSON
/// object, parsed through [`DocValue::from_extended_json`] so `$oid`/
/// `$numberLong`/... wrapper objects recover their BSON-specific type.
pub fn load_documents(path: &str) -> Result<Vec<DocValue>> {
    let bytes = std::fs::read(path).with_context(|| format!("failed to read {path}"))?;
    let json: serde_json::Value =
        serde_json::from_slice(&bytes).with_context(|| format!("failed to parse {path} as JSON"))?;
    let items = match json {
        serde_json::Value::Array(items) => items,
        other => vec![other],
    };
    Ok(items.iter().map(DocValue::from_extended_json).collect())
}

/// Build the `sql_name -> table_id` catalog `dr-sql`'s lowering pass needs
/// from a persisted schema's tables.
pub fn build_catalog(schema: &Schema) -> SchemaCatalog {
    schema
        .tables
        .values()
        .map(|t| (t.sql_name.clone(), t.table_id))
        .collect()
}

/// Where `infer-schema`/`show-schema` resolve a persisted schema version
/// to, for status messages; mirrors `dr_schema::store::schema_file_path`
/// without depending on that crate-private helper.
pub fn schema_file_path(schema_dir: &str, schema_name: &str, version: u64) -> String {
    Path::new(schema_dir)
        .join(format!("{schema_name}.v{version}.json"))
        .display()
        .to_string()
}

// ---------------------------------------------------------------------------
// Table-printing utilities
// ---------------------------------------------------------------------------

/// Calculate column widths for a table given headers and row data.
///
/// For each column, returns the maximum width across the header and all
/// row values so that data aligns when printed with left-padding.
pub fn calculate_column_widths(headers: &[&str], rows: &[Vec<String>]) -> Vec<usize> {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.len()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            if i < widths.len() {
                widths[i] = widths[i].max(cell.len());
            }
        }
    }
    widths
}

/// Print a formatted table to stdout.
///
/// Calculates column widths from `headers` and `rows`, then prints
/// a left-aligned header row, a separator line of dashes, and each
/// data row.  Columns are separated by two spaces.
pub fn print_table(headers: &[&str], rows: &[Vec<String>]) {
    let widths = calculate_column_widths(headers, rows);
    print_table_header(headers, &widths);
    for row in rows {
        println!("{}", format_table_row(row, &widths));
    }
}

/// Print just the header and separator lines for a table.
///
/// Useful for commands that need to print rows individually (e.g. to
/// interleave a per-row warning between rows). Use
/// [`calculate_column_widths`] to obtain `widths`.
pub fn print_table_header(headers: &[&str], widths: &[usize]) {
    let header_parts: Vec<String> = headers
        .iter()
        .zip(widths)
        .map(|(h, &w)| format!("{:<width$}", h, width = w))
        .collect();
    println!("{}", header_parts.join("  "));

    let sep_parts: Vec<String> = widths.iter().map(|&w| "-".repeat(w)).collect();
    println!("{}", sep_parts.join("  "));
}

/// Format a single table row as a string using pre-computed column widths.
///
/// Each cell is left-aligned and padded to the corresponding width.
/// Columns are separated by two spaces.
pub fn format_table_row(row: &[String], widths: &[usize]) -> String {
    let parts: Vec<String> = row
        .iter()
        .zip(widths)
        .map(|(cell, &w)| format!("{:<width$}", cell, width = w))
        .collect();
    parts.join("  ")
}
