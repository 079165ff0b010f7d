//! `docrelay show-schema` - print a persisted schema's tables and columns,
//! optionally diffing it against another version

use anyhow::{Context, Result};
use dr_schema::{JsonFileSchemaStore, SchemaStore, VersionSelector};

use crate::cli::{GlobalArgs, ShowSchemaArgs};
use crate::commands::common::print_table;

pub async fn execute(args: &ShowSchemaArgs, global: &GlobalArgs) -> Result<()> {
    let store = JsonFileSchemaStore::new(&global.schema_dir);

    let selector = match args.version {
        Some(v) => VersionSelector::Exact(v),
        None => VersionSelector::Latest,
    };
    let schema = store
        .read(&args.schema_name, selector)
        .await
        .context("failed to read schema")?
        .ok_or_else(|| {
            anyhow::anyhow!(
                "no schema named '{}' found under {}",
                args.schema_name,
                global.schema_dir
            )
        })?;

    println!("schema '{}' version {}", schema.schema_name, schema.version);

    for table in schema.tables.values() {
        println!(
            "\ntable {}  ({:?}, from collection '{}', path '{}')",
            table.sql_name, table.kind, table.source_collection, table.path_from_root
        );
        let rows: Vec<Vec<String>> = table
            .columns
            .iter()
            .map(|c| {
                vec![
                    c.name.clone(),
                    c.sql_type.to_string(),
                    if c.nullable { "YES".to_string() } else { "NO".to_string() },
                    if c.is_primary_key { "PK".to_string() } else { String::new() },
                ]
            })
            .collect();
        print_table(&["COLUMN", "TYPE", "NULLABLE", "KEY"], &rows);
    }

    if let Some(other) = args.diff {
        let (from, to) = if other < schema.version {
            (other, schema.version)
        } else {
            (schema.version, other)
        };
        let diff = store
            .diff(&args.schema_name, from, to)
            .await
            .context("failed to diff schema versions")?;
        println!("\ndiff v{from} -> v{to}:");
        println!("  added tables:   {}", diff.added_tables.len());
        println!("  removed tables: {}", diff.removed_tables.len());
    }

    Ok(())
}
