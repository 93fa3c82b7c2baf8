// src/query/mod.rs

pub mod duck;

use anyhow::Result;

use crate::config::ConnectionProfile;
use crate::table::Table;
pub use duck::DuckDbSource;

/// A relational store that can run one statement and hand back a typed table.
///
/// Sources are opened per call and closed explicitly once the query is done.
pub trait DataSource: Sized {
    fn open(profile: &ConnectionProfile) -> Result<Self>;

    fn query(&mut self, sql: &str) -> Result<Table>;

    fn close(self) -> Result<()>;
}

/// `SELECT <columns|*> FROM <table>`. Column names are used verbatim.
pub fn build_select(table: &str, columns: Option<&[&str]>) -> String {
    let projection = match columns {
        Some(cols) if !cols.is_empty() => cols.join(","),
        _ => "*".to_string(),
    };
    format!("SELECT {} FROM {}", projection, table)
}
