// src/table/mod.rs

pub mod value;

use std::collections::HashSet;

use tracing::trace;

use crate::error::DataError;
pub use value::{Row, Value};

/// Build a row from anything convertible into [`Value`]: `row![date, 1.0, "x"]`.
#[macro_export]
macro_rules! row {
    ($($v:expr),* $(,)?) => {
        vec![$($crate::table::Value::from($v)),*]
    };
}

/// Semantic type of a column, fixed when the table is ingested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnType {
    Text,
    Number,
    Timestamp,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub name: String,
    pub kind: ColumnType,
}

impl Column {
    pub fn new(name: impl Into<String>, kind: ColumnType) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

/// Header plus rows. Every row has exactly one value per column.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    columns: Vec<Column>,
    rows: Vec<Row>,
}

impl Table {
    /// Build a table from bare names, deriving each column's type from its values.
    pub fn new(header: Vec<String>, rows: Vec<Row>) -> Result<Self, DataError> {
        check_shape(&header, &rows)?;
        let rows: Vec<Row> = rows
            .into_iter()
            .map(|row| row.into_iter().map(Value::normalized).collect())
            .collect();
        let columns = header
            .into_iter()
            .enumerate()
            .map(|(idx, name)| {
                let kind = infer_column_type(rows.iter().map(|r| &r[idx]));
                trace!(column = %name, kind = ?kind, "inferred column type");
                Column { name, kind }
            })
            .collect();
        Ok(Self { columns, rows })
    }

    /// Build a table whose column types are already known (e.g. from a database schema).
    pub fn with_columns(columns: Vec<Column>, rows: Vec<Row>) -> Result<Self, DataError> {
        let names: Vec<String> = columns.iter().map(|c| c.name.clone()).collect();
        check_shape(&names, &rows)?;
        let rows = rows
            .into_iter()
            .map(|row| row.into_iter().map(Value::normalized).collect())
            .collect();
        Ok(Self { columns, rows })
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn header(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty() || self.rows.is_empty()
    }

    /// Position of the first timestamp-typed column, in header order.
    pub fn time_column(&self) -> Option<usize> {
        self.columns
            .iter()
            .position(|c| c.kind == ColumnType::Timestamp)
    }

    /// True when every non-null value of column `idx` is a timestamp at midnight.
    pub(crate) fn is_date_only(&self, idx: usize) -> bool {
        self.rows
            .iter()
            .filter_map(|r| r[idx].as_timestamp())
            .all(|ts| value::is_midnight(&ts))
    }
}

fn check_shape(header: &[String], rows: &[Row]) -> Result<(), DataError> {
    let mut seen = HashSet::with_capacity(header.len());
    for name in header {
        if !seen.insert(name.as_str()) {
            return Err(DataError::DuplicateColumn(name.clone()));
        }
    }
    for (row, values) in rows.iter().enumerate() {
        if values.len() != header.len() {
            return Err(DataError::RowArity {
                row,
                expected: header.len(),
                found: values.len(),
            });
        }
    }
    Ok(())
}

/// A column is a timestamp or number column only if all of its non-null values agree.
fn infer_column_type<'a>(values: impl Iterator<Item = &'a Value>) -> ColumnType {
    let mut kind = None;
    for v in values {
        let this = match v {
            Value::Null => continue,
            Value::Int(_) | Value::Float(_) => ColumnType::Number,
            Value::Timestamp(_) => ColumnType::Timestamp,
            Value::Text(_) => return ColumnType::Text,
        };
        match kind {
            None => kind = Some(this),
            Some(k) if k != this => return ColumnType::Text,
            _ => {}
        }
    }
    kind.unwrap_or(ColumnType::Text)
}
