//! SQL dialect abstraction

use sqlparser::ast::Statement;
use sqlparser::dialect::{Dialect, GenericDialect};
use sqlparser::parser::Parser;

use crate::error::{SqlError, SqlResult};

/// Trait for SQL dialect implementations, kept as a seam even though only
/// one dialect ships today, since the underlying `sqlparser` `Dialect`
/// trait is itself an extension point.
pub trait SqlDialect: Send + Sync {
    /// Get the underlying sqlparser dialect
    fn parser_dialect(&self) -> &dyn Dialect;

    /// Parse SQL into AST statements
    fn parse(&self, sql: &str) -> SqlResult<Vec<Statement>> {
        Parser::parse_sql(self.parser_dialect(), sql).map_err(|e| {
            let msg = e.to_string();
            SqlError::ParseError {
                message: msg,
                line: 0,
                column: 0,
            }
        })
    }

    /// Quote an identifier for this dialect
    fn quote_ident(&self, ident: &str) -> String;

    /// Get the dialect name
    fn name(&self) -> &'static str;
}

/// ANSI-ish generic SQL dialect, the only one docrelay's caller-facing
/// surface needs — there is no warehouse-specific syntax to pick between
/// when the thing being queried is a document store, not a SQL engine.
pub struct AnsiDialect {
    dialect: GenericDialect,
}

impl AnsiDialect {
    pub fn new() -> Self {
        Self {
            dialect: GenericDialect {},
        }
    }
}

impl Default for AnsiDialect {
    fn default() -> Self {
        Self::new()
    }
}

impl SqlDialect for AnsiDialect {
    fn parser_dialect(&self) -> &dyn Dialect {
        &self.dialect
    }

    fn quote_ident(&self, ident: &str) -> String {
        format!("\"{}\"", ident.replace('"', "\"\""))
    }

    fn name(&self) -> &'static str {
        "ansi"
    }
}
