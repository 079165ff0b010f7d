//! `docrelay query` - compile a SQL query against a persisted schema and
//! run it against demo document data, printing the resulting rows

use std::sync::Arc;

use anyhow::{Context, Result};
use dr_doc::InMemoryDocumentClient;
use dr_exec::{CancellationToken, Executor};
use dr_plan::{Locale, PlanCompiler};
use dr_schema::{JsonFileSchemaStore, SchemaStore, VersionSelector};
use dr_sql::{lower_statement, SqlParser};

use crate::cli::{GlobalArgs, QueryArgs};
use crate::commands::common::{build_catalog, load_documents, print_table};

pub async fn execute(args: &QueryArgs, global: &GlobalArgs) -> Result<()> {
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

    let catalog = build_catalog(&schema);
    let parser = SqlParser::new();
    let stmt = parser.parse_single(&args.sql).context("failed to parse SQL")?;
    let logical_tree = lower_statement(&stmt, &catalog).context("failed to lower SQL to a logical tree")?;

    let locale = Locale::new(args.locale.clone());
    let ctx = PlanCompiler::compile(&logical_tree, &schema, &locale).context("failed to compile query")?;

    let docs = load_documents(&args.data)?;
    log::debug!("loaded {} documents from {}", docs.len(), args.data);
    let client = InMemoryDocumentClient::new();
    client.seed(&ctx.collection, docs);

    let executor = Executor::new(Arc::new(client));
    let mut cursor = executor
        .open(&ctx, args.fetch_size, CancellationToken::new(), None)
        .await
        .context("failed to open cursor")?;

    let headers: Vec<&str> = ctx.output_columns.iter().map(|c| c.name.as_str()).collect();
    let mut rows: Vec<Vec<String>> = Vec::new();
    let mut row_count = 0usize;
    while let Some(batch) = cursor.next_batch().await.context("query execution failed")? {
        for row in &batch.rows {
            rows.push(row.values().iter().map(|v| v.to_json_string()).collect());
        }
        row_count += batch.len();
    }
    cursor.close().await;

    if headers.is_empty() {
        println!("({row_count} rows, no output columns)");
    } else {
        print_table(&headers, &rows);
        println!("\n({row_count} rows)");
    }

    for warning in cursor.warnings() {
        log::warn!("{warning}");
    }
    if !cursor.warnings().is_empty() {
        println!("\n{} warning(s):", cursor.warnings().len());
        for warning in cursor.warnings() {
            println!("  {warning}");
        }
    }

    Ok(())
}
