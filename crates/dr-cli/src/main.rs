//! docrelay - a relational, SQL-queryable bridge over a schemaless document
//! database: CLI entry point exposing `infer-schema`, `show-schema`,
//! `explain`, and `query`.

use anyhow::Result;
use clap::Parser;

mod cli;
mod commands;

use cli::Cli;
use commands::{explain, infer_schema, query, show_schema};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let level = if cli.global.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let result: Result<()> = match &cli.command {
        cli::Commands::InferSchema(args) => infer_schema::execute(args, &cli.global).await,
        cli::Commands::ShowSchema(args) => show_schema::execute(args, &cli.global).await,
        cli::Commands::Explain(args) => explain::execute(args, &cli.global).await,
        cli::Commands::Query(args) => query::execute(args, &cli.global).await,
    };

    if let Err(err) = result {
        // Check if this is an ExitCode (structured exit, not a real error)
        if let Some(exit_code) = err.downcast_ref::<commands::common::ExitCode>() {
            std::process::exit(exit_code.0);
        }
        // Real error — print and exit 1
        eprintln!("Error: {:?}", err);
        std::process::exit(1);
    }
}
