//! `docrelay explain` - compile a SQL query against a persisted schema and
//! print the aggregation pipeline it lowers to

use anyhow::{Context, Result};
use dr_plan::{Locale, PlanCompiler};
use dr_schema::{JsonFileSchemaStore, SchemaStore, VersionSelector};
use dr_sql::{lower_statement, SqlParser};

use crate::cli::{ExplainArgs, GlobalArgs};
use crate::commands::common::build_catalog;

pub async fn execute(args: &ExplainArgs, global: &GlobalArgs) -> Result<()> {
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

    println!("collection: {}", ctx.collection);
    println!("\nstages:");
    println!("{}", ctx.explain());

    println!("\noutput columns:");
    for col in &ctx.output_columns {
        println!(
            "  {}  {}{}",
            col.name,
            col.sql_type,
            if col.nullable { " NULL" } else { " NOT NULL" }
        );
    }

    Ok(())
}
