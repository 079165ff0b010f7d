//! `docrelay infer-schema` - sample a collection's documents and persist a
//! new inferred schema version

use anyhow::Context;
use dr_core::SampleStrategy;
use dr_doc::InMemoryDocumentClient;
use dr_schema::{JsonFileSchemaStore, SchemaInference, SchemaStore};

use crate::cli::{GlobalArgs, InferSchemaArgs};
use crate::commands::common::{load_documents, schema_file_path};

pub async fn execute(args: &InferSchemaArgs, global: &GlobalArgs) -> anyhow::Result<()> {
    let docs = load_documents(&args.data)?;
    log::debug!("loaded {} documents from {}", docs.len(), args.data);

    let client = InMemoryDocumentClient::new();
    client.seed(&args.collection, docs);

    let strategy = SampleStrategy::parse(&args.sample_strategy)
        .with_context(|| format!("invalid --sample-strategy '{}'", args.sample_strategy))?;

    let schema = SchemaInference::infer(
        &client,
        &args.schema_name,
        &args.collection,
        args.sample_limit,
        strategy,
    )
    .await
    .context("schema inference failed")?;

    if schema.tables.is_empty() {
        println!(
            "no documents sampled from '{}'; nothing persisted",
            args.collection
        );
        return Ok(());
    }

    let table_count = schema.tables.len();
    let store = JsonFileSchemaStore::new(&global.schema_dir);
    let version = store.write(schema).await.context("failed to persist schema")?;

    println!(
        "inferred schema '{}' version {} ({} table{}) from '{}' -> {}",
        args.schema_name,
        version,
        table_count,
        if table_count == 1 { "" } else { "s" },
        args.collection,
        schema_file_path(&global.schema_dir, &args.schema_name, version),
    );
    Ok(())
}
