//! CLI argument definitions using clap derive API

use clap::{Args, Parser, Subcommand};

/// docrelay - a relational, SQL-queryable bridge over a schemaless document database
#[derive(Parser, Debug)]
#[command(name = "docrelay")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Global options
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Global arguments available to all commands
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Enable verbose (debug-level) logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Directory persisted schema versions are read from and written to
    #[arg(long, global = true, default_value = ".docrelay/schemas")]
    pub schema_dir: String,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Sample a collection's documents and persist a new inferred schema version
    InferSchema(InferSchemaArgs),

    /// Print a persisted schema's tables and columns
    ShowSchema(ShowSchemaArgs),

    /// Compile a SQL query against a persisted schema and print its aggregation pipeline
    Explain(ExplainArgs),

    /// Compile and run a SQL query against demo document data
    Query(QueryArgs),
}

/// Arguments for the infer-schema command
#[derive(Args, Debug)]
pub struct InferSchemaArgs {
    /// JSON file holding the sample documents (a JSON array, or extended-JSON
    /// documents using `$oid`/`$numberLong`/... wrappers)
    #[arg(long)]
    pub data: String,

    /// Collection the sampled documents belong to
    #[arg(long)]
    pub collection: String,

    /// Schema name the new version is persisted under
    #[arg(long, default_value = "_default")]
    pub schema_name: String,

    /// Maximum number of documents to sample; ignored when --sample-strategy=all
    #[arg(long, default_value_t = 1000)]
    pub sample_limit: u32,

    /// Sample strategy: random | idForward | idReverse | all
    #[arg(long, default_value = "all")]
    pub sample_strategy: String,
}

/// Arguments for the show-schema command
#[derive(Args, Debug)]
pub struct ShowSchemaArgs {
    /// Schema name to read
    #[arg(long, default_value = "_default")]
    pub schema_name: String,

    /// Version to show; defaults to the latest persisted version
    #[arg(long)]
    pub version: Option<u64>,

    /// Diff the shown version against this other version
    #[arg(long)]
    pub diff: Option<u64>,
}

/// Arguments for the explain command
#[derive(Args, Debug)]
pub struct ExplainArgs {
    /// SQL SELECT statement to compile
    pub sql: String,

    /// Schema name to compile against
    #[arg(long, default_value = "_default")]
    pub schema_name: String,

    /// Schema version to compile against; defaults to the latest
    #[arg(long)]
    pub version: Option<u64>,

    /// Locale tag for locale-dependent expressions (DAYNAME/MONTHNAME)
    #[arg(long, default_value = "en-US")]
    pub locale: String,
}

/// Arguments for the query command
#[derive(Args, Debug)]
pub struct QueryArgs {
    /// SQL SELECT statement to compile and run
    pub sql: String,

    /// Schema name to compile against
    #[arg(long, default_value = "_default")]
    pub schema_name: String,

    /// Schema version to compile against; defaults to the latest
    #[arg(long)]
    pub version: Option<u64>,

    /// Locale tag for locale-dependent expressions (DAYNAME/MONTHNAME)
    #[arg(long, default_value = "en-US")]
    pub locale: String,

    /// JSON file of documents to seed the demo document client with
    #[arg(long)]
    pub data: String,

    /// Rows per fetch batch; 0 lets the executor pick its own default
    #[arg(long, default_value_t = 0)]
    pub fetch_size: usize,
}

#[cfg(test)]
#[path = "cli_test.rs"]
mod tests;
