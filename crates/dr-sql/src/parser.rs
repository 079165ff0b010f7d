//! SQL parser wrapper

use crate::dialect::{AnsiDialect, SqlDialect};
use crate::error::{SqlError, SqlResult};
use sqlparser::ast::Statement;

/// SQL parser that wraps sqlparser-rs with dialect support
pub struct SqlParser {
    dialect: Box<dyn SqlDialect>,
}

impl SqlParser {
    /// Create a new parser with the default (ANSI-ish) dialect
    pub fn new() -> Self {
        Self {
            dialect: Box::new(AnsiDialect::new()),
        }
    }

    /// Parse SQL into AST statements
    pub fn parse(&self, sql: &str) -> SqlResult<Vec<Statement>> {
        let sql = sql.trim();
        if sql.is_empty() {
            return Err(SqlError::EmptySql);
        }

        self.dialect.parse(sql)
    }

    /// Parse SQL and return the first statement
    pub fn parse_single(&self, sql: &str) -> SqlResult<Statement> {
        let stmts = self.parse(sql)?;
        stmts.into_iter().next().ok_or(SqlError::EmptySql)
    }

    /// Get the dialect name
    pub fn dialect_name(&self) -> &'static str {
        self.dialect.name()
    }

    /// Quote an identifier for the current dialect
    pub fn quote_ident(&self, ident: &str) -> String {
        self.dialect.quote_ident(ident)
    }
}

impl Default for SqlParser {
    fn default() -> Self {
        Self::new()
    }
}
