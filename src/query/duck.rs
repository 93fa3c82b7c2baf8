// src/query/duck.rs

use std::time::Instant;

use anyhow::Result;
use duckdb::arrow::array::{
    Array, Date32Array, Date64Array, Decimal128Array, Float32Array, Float64Array, Int16Array,
    Int32Array, Int64Array, Int8Array, LargeStringArray, StringArray, StringViewArray,
    TimestampMicrosecondArray, TimestampMillisecondArray, TimestampNanosecondArray,
    TimestampSecondArray, UInt16Array, UInt32Array, UInt64Array, UInt8Array,
};
use duckdb::arrow::datatypes::{DataType, TimeUnit};
use duckdb::arrow::record_batch::RecordBatch;
use duckdb::arrow::util::display::array_value_to_string;
use duckdb::{AccessMode, Config as DuckConfig, Connection};
use tracing::{debug, info, instrument};

use super::DataSource;
use crate::config::ConnectionProfile;
use crate::table::{Column, ColumnType, Row, Table, Value};

/// DuckDB-backed source. One connection per instance.
pub struct DuckDbSource {
    conn: Connection,
}

impl DataSource for DuckDbSource {
    #[instrument(level = "debug", skip(profile), fields(db = %profile.database.display()))]
    fn open(profile: &ConnectionProfile) -> Result<Self> {
        let conn = if profile.read_only {
            let config = DuckConfig::default().access_mode(AccessMode::ReadOnly)?;
            Connection::open_with_flags(&profile.database, config)?
        } else {
            Connection::open(&profile.database)?
        };
        debug!(read_only = profile.read_only, "opened duckdb connection");
        Ok(Self { conn })
    }

    #[instrument(level = "debug", skip(self))]
    fn query(&mut self, sql: &str) -> Result<Table> {
        let start = Instant::now();
        let mut stmt = self.conn.prepare(sql)?;
        let arrow = stmt.query_arrow([])?;
        let schema = arrow.get_schema();
        let batches: Vec<RecordBatch> = arrow.collect();

        let columns: Vec<Column> = schema
            .fields()
            .iter()
            .map(|f| Column::new(f.name().clone(), column_type(f.data_type())))
            .collect();

        let total: usize = batches.iter().map(RecordBatch::num_rows).sum();
        let mut rows: Vec<Row> = Vec::with_capacity(total);
        for batch in &batches {
            let converted = batch
                .columns()
                .iter()
                .map(|array| array_values(array.as_ref()))
                .collect::<Result<Vec<_>>>()?;
            let mut cells: Vec<_> = converted.into_iter().map(Vec::into_iter).collect();
            for _ in 0..batch.num_rows() {
                rows.push(
                    cells
                        .iter_mut()
                        .map(|col| col.next().unwrap_or(Value::Null))
                        .collect(),
                );
            }
        }

        info!(
            rows = rows.len(),
            columns = columns.len(),
            batches = batches.len(),
            elapsed = ?start.elapsed(),
            "query complete"
        );
        Ok(Table::with_columns(columns, rows)?)
    }

    fn close(self) -> Result<()> {
        self.conn.close().map_err(|(_, err)| err)?;
        debug!("closed duckdb connection");
        Ok(())
    }
}

/// Declared semantic type of an Arrow column.
fn column_type(dt: &DataType) -> ColumnType {
    match dt {
        DataType::Timestamp(_, _) | DataType::Date32 | DataType::Date64 => ColumnType::Timestamp,
        DataType::Int8
        | DataType::Int16
        | DataType::Int32
        | DataType::Int64
        | DataType::UInt8
        | DataType::UInt16
        | DataType::UInt32
        | DataType::UInt64
        | DataType::Float32
        | DataType::Float64
        | DataType::Decimal128(_, _) => ColumnType::Number,
        _ => ColumnType::Text,
    }
}

/// Downcast to `A` and map every non-null slot through `f`.
fn map_array<A: Array + 'static>(
    array: &dyn Array,
    f: impl Fn(&A, usize) -> Value,
) -> Option<Vec<Value>> {
    let typed = array.as_any().downcast_ref::<A>()?;
    Some(
        (0..typed.len())
            .map(|i| if typed.is_null(i) { Value::Null } else { f(typed, i) })
            .collect(),
    )
}

fn array_values(array: &dyn Array) -> Result<Vec<Value>> {
    let converted = match array.data_type() {
        DataType::Int8 => map_array::<Int8Array>(array, |a, i| Value::Int(a.value(i).into())),
        DataType::Int16 => map_array::<Int16Array>(array, |a, i| Value::Int(a.value(i).into())),
        DataType::Int32 => map_array::<Int32Array>(array, |a, i| Value::Int(a.value(i).into())),
        DataType::Int64 => map_array::<Int64Array>(array, |a, i| Value::Int(a.value(i))),
        DataType::UInt8 => map_array::<UInt8Array>(array, |a, i| Value::Int(a.value(i).into())),
        DataType::UInt16 => map_array::<UInt16Array>(array, |a, i| Value::Int(a.value(i).into())),
        DataType::UInt32 => map_array::<UInt32Array>(array, |a, i| Value::Int(a.value(i).into())),
        DataType::UInt64 => map_array::<UInt64Array>(array, |a, i| {
            let v = a.value(i);
            i64::try_from(v).map_or(Value::Float(v as f64), Value::Int)
        }),
        DataType::Float32 => {
            map_array::<Float32Array>(array, |a, i| Value::Float(a.value(i).into()))
        }
        DataType::Float64 => map_array::<Float64Array>(array, |a, i| Value::Float(a.value(i))),
        DataType::Decimal128(_, _) => map_array::<Decimal128Array>(array, |a, i| {
            a.value_as_string(i)
                .parse::<f64>()
                .map_or(Value::Null, Value::Float)
        }),
        DataType::Utf8 => map_array::<StringArray>(array, |a, i| Value::Text(a.value(i).into())),
        DataType::LargeUtf8 => {
            map_array::<LargeStringArray>(array, |a, i| Value::Text(a.value(i).into()))
        }
        DataType::Utf8View => {
            map_array::<StringViewArray>(array, |a, i| Value::Text(a.value(i).into()))
        }
        DataType::Date32 => map_array::<Date32Array>(array, |a, i| a.value_as_datetime(i).into()),
        DataType::Date64 => map_array::<Date64Array>(array, |a, i| a.value_as_datetime(i).into()),
        DataType::Timestamp(TimeUnit::Second, _) => {
            map_array::<TimestampSecondArray>(array, |a, i| a.value_as_datetime(i).into())
        }
        DataType::Timestamp(TimeUnit::Millisecond, _) => {
            map_array::<TimestampMillisecondArray>(array, |a, i| a.value_as_datetime(i).into())
        }
        DataType::Timestamp(TimeUnit::Microsecond, _) => {
            map_array::<TimestampMicrosecondArray>(array, |a, i| a.value_as_datetime(i).into())
        }
        DataType::Timestamp(TimeUnit::Nanosecond, _) => {
            map_array::<TimestampNanosecondArray>(array, |a, i| a.value_as_datetime(i).into())
        }
        _ => None,
    };

    match converted {
        Some(values) => Ok(values),
        None => {
            debug!(data_type = ?array.data_type(), "rendering unsupported column as text");
            (0..array.len())
                .map(|i| -> Result<Value> {
                    if array.is_null(i) {
                        Ok(Value::Null)
                    } else {
                        Ok(Value::Text(array_value_to_string(array, i)?))
                    }
                })
                .collect()
        }
    }
}
