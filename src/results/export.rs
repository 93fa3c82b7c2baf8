// src/results/export.rs

use std::io;

use csv::{Terminator, WriterBuilder};
use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};

use crate::error::DataError;
use crate::table::value::{format_float, format_timestamp};
use crate::table::{Row, Table, Value};

/// Text form of a cell as it appears in CSV output and chart categories.
pub(super) fn cell_text(value: &Value, date_only: bool) -> String {
    match value {
        Value::Null => String::new(),
        Value::Int(v) => v.to_string(),
        Value::Float(v) => format_float(*v),
        Value::Text(s) => s.clone(),
        Value::Timestamp(ts) => format_timestamp(ts, date_only),
    }
}

pub(super) fn to_csv(table: &Table) -> Result<String, DataError> {
    let date_only: Vec<bool> = (0..table.columns().len())
        .map(|idx| table.is_date_only(idx))
        .collect();

    let mut writer = WriterBuilder::new()
        .terminator(Terminator::Any(b'\n'))
        .from_writer(Vec::new());
    writer.write_record(std::iter::once("").chain(table.header()))?;

    let mut record: Vec<String> = Vec::with_capacity(date_only.len() + 1);
    for (idx, row) in table.rows().iter().enumerate() {
        record.clear();
        record.push(idx.to_string());
        record.extend(
            row.iter()
                .zip(&date_only)
                .map(|(value, &date_only)| cell_text(value, date_only)),
        );
        writer.write_record(&record)?;
    }

    let bytes = writer.into_inner().map_err(|e| e.into_error())?;
    String::from_utf8(bytes).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e).into())
}

pub(super) fn to_json(table: &Table) -> Result<String, DataError> {
    let header = table.header();
    let rows = JsonRows {
        header: &header,
        rows: table.rows(),
    };
    Ok(serde_json::to_string(&rows)?)
}

/// Array of row objects; a map per row keeps keys in header order.
struct JsonRows<'a> {
    header: &'a [&'a str],
    rows: &'a [Row],
}

struct JsonRow<'a> {
    header: &'a [&'a str],
    row: &'a Row,
}

impl Serialize for JsonRows<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.rows.len()))?;
        for row in self.rows {
            seq.serialize_element(&JsonRow {
                header: self.header,
                row,
            })?;
        }
        seq.end()
    }
}

impl Serialize for JsonRow<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.header.len()))?;
        for (name, value) in self.header.iter().zip(self.row) {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}
