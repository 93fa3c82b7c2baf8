// src/resample/mod.rs

pub mod timeframe;

use chrono::NaiveDateTime;
use tracing::{debug, instrument};

use crate::error::DataError;
use crate::table::value::{format_timestamp, is_midnight};
use crate::table::{Column, ColumnType, Row, Table, Value};
pub use timeframe::{Anchor, Timeframe, Unit};

/// Suffix of the derived period-over-period columns.
pub const PCT_CHANGE_SUFFIX: &str = "_pct_change";

/// Resample `table` into one row per time bucket.
///
/// The first timestamp column becomes the bucket label and moves to the front as
/// text. Every other column keeps the last observation of its bucket, empty
/// buckets repeat the previous bucket, and each of those columns gains a
/// `<name>_pct_change` companion holding `current / previous - 1`.
#[instrument(level = "debug", skip(table), fields(rows = table.rows().len()))]
pub fn resample(table: &Table, code: &str) -> Result<Table, DataError> {
    let columns = table.columns();
    let time_idx = table
        .time_column()
        .ok_or_else(|| DataError::MissingTimeColumn {
            columns: columns.iter().map(|c| c.name.clone()).collect(),
        })?;
    let timeframe = Timeframe::parse(code)?;
    let out_of_range = || DataError::InvalidTimeframe(code.to_string());

    let value_cols: Vec<usize> = (0..columns.len()).filter(|&i| i != time_idx).collect();

    let mut out_columns = Vec::with_capacity(1 + 2 * value_cols.len());
    out_columns.push(Column::new(columns[time_idx].name.clone(), ColumnType::Text));
    out_columns.extend(value_cols.iter().map(|&i| columns[i].clone()));
    out_columns.extend(value_cols.iter().map(|&i| {
        Column::new(
            format!("{}{}", columns[i].name, PCT_CHANGE_SUFFIX),
            ColumnType::Number,
        )
    }));

    let mut stamped: Vec<(NaiveDateTime, &Row)> = table
        .rows()
        .iter()
        .filter_map(|row| row[time_idx].as_timestamp().map(|ts| (ts, row)))
        .collect();
    let dropped = table.rows().len() - stamped.len();
    if dropped > 0 {
        debug!(dropped, "skipping rows without a timestamp");
    }
    stamped.sort_by_key(|(ts, _)| *ts);

    let (Some(&(first, _)), Some(&(last, _))) = (stamped.first(), stamped.last()) else {
        return Table::with_columns(out_columns, Vec::new());
    };

    let origin = timeframe.origin(first);
    let bucket_of = |ts: NaiveDateTime| timeframe.bucket_of(origin, ts);
    let bucket_count = bucket_of(last) as usize + 1;

    // rows are sorted, so the last write per bucket is its latest observation
    let mut latest: Vec<Option<&Row>> = vec![None; bucket_count];
    for &(ts, row) in &stamped {
        latest[bucket_of(ts) as usize] = Some(row);
    }

    let mut labels = Vec::with_capacity(bucket_count);
    let mut rows = Vec::with_capacity(bucket_count);
    let mut carried: Option<&Row> = None;
    let mut previous: Vec<Option<f64>> = vec![None; value_cols.len()];

    for (bucket, observed) in latest.into_iter().enumerate() {
        let label = timeframe
            .label(origin, bucket as i64)
            .ok_or_else(out_of_range)?;
        let source = observed.or(carried);
        carried = source;

        let mut values = Vec::with_capacity(value_cols.len());
        let mut changes = Vec::with_capacity(value_cols.len());
        for (k, &i) in value_cols.iter().enumerate() {
            let cell = source.map_or(Value::Null, |row| row[i].clone());
            let current = match columns[i].kind {
                ColumnType::Number => cell.as_f64().or(previous[k]),
                _ => None,
            };
            changes.push(Value::from(pct_change(previous[k], current)));
            previous[k] = current;
            values.push(cell);
        }

        labels.push(label);
        rows.push((values, changes));
    }

    let date_only = labels.iter().all(is_midnight);
    let rows: Vec<Row> = labels
        .iter()
        .zip(rows)
        .map(|(label, (values, changes))| {
            let mut row = Vec::with_capacity(1 + values.len() + changes.len());
            row.push(Value::Text(format_timestamp(label, date_only)));
            row.extend(values);
            row.extend(changes);
            row
        })
        .collect();

    debug!(buckets = rows.len(), ?timeframe, "resampled");
    Table::with_columns(out_columns, rows)
}

/// Fractional change; undefined without a predecessor or against zero.
fn pct_change(previous: Option<f64>, current: Option<f64>) -> Option<f64> {
    match (previous, current) {
        (Some(prev), Some(cur)) if prev != 0.0 => {
            let change = cur / prev - 1.0;
            change.is_finite().then_some(change)
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};

    fn names(cols: &[&str]) -> Vec<String> {
        cols.iter().map(|s| s.to_string()).collect()
    }

    fn date(y: i32, m: u32, d: u32) -> Value {
        NaiveDate::from_ymd_opt(y, m, d).unwrap().into()
    }

    fn text(v: &Value) -> &str {
        match v {
            Value::Text(s) => s,
            other => panic!("expected text, got {other:?}"),
        }
    }

    #[test]
    fn keeps_last_observation_per_bucket() {
        let table = Table::new(
            names(&["date", "price"]),
            vec![
                vec![date(2020, 1, 5), 10.0.into()],
                vec![date(2020, 1, 20), 12.0.into()],
                vec![date(2020, 2, 3), 15.0.into()],
            ],
        )
        .unwrap();

        let out = resample(&table, "M").unwrap();
        assert_eq!(out.header(), vec!["date", "price", "price_pct_change"]);
        assert_eq!(out.rows().len(), 2);
        assert_eq!(text(&out.rows()[0][0]), "2020-01-31");
        assert_eq!(out.rows()[0][1], Value::Float(12.0));
        assert_eq!(out.rows()[0][2], Value::Null);
        assert_eq!(text(&out.rows()[1][0]), "2020-02-29");
        assert_eq!(out.rows()[1][2], Value::Float(15.0 / 12.0 - 1.0));
    }

    #[test]
    fn unsorted_input_is_ordered_by_time() {
        let table = Table::new(
            names(&["v", "when"]),
            vec![
                vec![3i64.into(), date(2021, 3, 1)],
                vec![1i64.into(), date(2021, 1, 1)],
                vec![2i64.into(), date(2021, 2, 1)],
            ],
        )
        .unwrap();

        let out = resample(&table, "Y").unwrap();
        // the date column moves to the front
        assert_eq!(out.header(), vec!["when", "v", "v_pct_change"]);
        assert_eq!(out.rows().len(), 1);
        assert_eq!(out.rows()[0][1], Value::Int(3));
    }

    #[test]
    fn empty_buckets_carry_previous_values() {
        let table = Table::new(
            names(&["date", "a"]),
            vec![
                vec![date(2020, 1, 15), 4i64.into()],
                vec![date(2020, 3, 15), 6i64.into()],
            ],
        )
        .unwrap();

        let out = resample(&table, "M").unwrap();
        let rows = out.rows();
        assert_eq!(rows.len(), 3);
        assert_eq!(text(&rows[1][0]), "2020-02-29");
        assert_eq!(rows[1][1], Value::Int(4));
        assert_eq!(rows[1][2], Value::Float(0.0));
        assert_eq!(rows[2][2], Value::Float(0.5));
    }

    #[test]
    fn nulls_are_forward_filled_for_changes() {
        let table = Table::new(
            names(&["date", "a"]),
            vec![
                vec![date(2001, 6, 1), 2.0.into()],
                vec![date(2002, 6, 1), Value::Null],
                vec![date(2003, 6, 1), 3.0.into()],
            ],
        )
        .unwrap();

        let out = resample(&table, "Y").unwrap();
        let rows = out.rows();
        assert_eq!(rows[1][1], Value::Null);
        assert_eq!(rows[1][2], Value::Float(0.0));
        assert_eq!(rows[2][2], Value::Float(0.5));
    }

    #[test]
    fn change_against_zero_is_null() {
        assert_eq!(pct_change(Some(0.0), Some(1.0)), None);
        assert_eq!(pct_change(None, Some(1.0)), None);
        assert_eq!(pct_change(Some(2.0), None), None);
        assert_eq!(pct_change(Some(2.0), Some(3.0)), Some(0.5));
    }

    #[test]
    fn text_columns_get_null_changes() {
        let table = Table::new(
            names(&["date", "tag"]),
            vec![
                vec![date(2020, 1, 1), "a".into()],
                vec![date(2021, 1, 1), "b".into()],
            ],
        )
        .unwrap();

        let out = resample(&table, "Y").unwrap();
        assert_eq!(out.header(), vec!["date", "tag", "tag_pct_change"]);
        assert!(out.rows().iter().all(|r| r[2].is_null()));
        assert_eq!(out.rows()[1][1], Value::Text("b".into()));
    }

    #[test]
    fn hourly_labels_keep_time_of_day() {
        let start = NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_opt(0, 30, 0)
            .unwrap();
        let rows = (0..4)
            .map(|h| vec![Value::from(start + Duration::hours(h)), Value::from(h)])
            .collect();
        let table = Table::new(names(&["ts", "n"]), rows).unwrap();

        let out = resample(&table, "2H").unwrap();
        let labels: Vec<&str> = out.rows().iter().map(|r| text(&r[0])).collect();
        assert_eq!(labels, vec!["2024-05-01 00:00:00", "2024-05-01 02:00:00"]);
    }

    #[test]
    fn multi_period_end_labels_close_on_first_period() {
        let table = Table::new(
            names(&["date", "v"]),
            vec![
                vec![date(1871, 1, 15), 1.0.into()],
                vec![date(1871, 5, 1), 2.0.into()],
                vec![date(1871, 8, 1), 3.0.into()],
                vec![date(1871, 10, 1), 4.0.into()],
            ],
        )
        .unwrap();

        let out = resample(&table, "2Q").unwrap();
        let labels: Vec<&str> = out.rows().iter().map(|r| text(&r[0])).collect();
        assert_eq!(labels, vec!["1871-03-31", "1871-09-30", "1872-03-31"]);
        assert_eq!(out.rows()[1][1], Value::Float(3.0));
        assert_eq!(out.rows()[2][1], Value::Float(4.0));
    }

    #[test]
    fn oversized_multiplier_is_rejected() {
        let table = Table::new(
            names(&["date", "v"]),
            vec![
                vec![date(1990, 6, 1), 1.0.into()],
                vec![date(1991, 6, 1), 2.0.into()],
            ],
        )
        .unwrap();
        let err = resample(&table, "4294967295Y").unwrap_err();
        assert!(matches!(err, DataError::InvalidTimeframe(code) if code == "4294967295Y"));
    }

    #[test]
    fn missing_time_column_is_reported() {
        let table = Table::new(names(&["a"]), vec![vec![1i64.into()]]).unwrap();
        let err = resample(&table, "Y").unwrap_err();
        assert!(matches!(err, DataError::MissingTimeColumn { columns } if columns == ["a"]));
    }

    #[test]
    fn declared_time_column_without_rows_yields_empty_table() {
        let table = Table::with_columns(
            vec![
                Column::new("date", ColumnType::Timestamp),
                Column::new("a", ColumnType::Number),
            ],
            vec![],
        )
        .unwrap();
        let out = resample(&table, "Q").unwrap();
        assert_eq!(out.header(), vec!["date", "a", "a_pct_change"]);
        assert!(out.rows().is_empty());
    }
}
