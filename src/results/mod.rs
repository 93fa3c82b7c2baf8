// src/results/mod.rs

mod export;

use tracing::{debug, info};

use crate::chart::BarChart;
use crate::error::DataError;
use crate::resample::resample;
use crate::table::{Row, Table};

/// A queried dataset, optionally resampled, ready to be exported.
///
/// Resampling happens once, at construction. Every export checks that there is
/// something to export and fails with [`DataError::EmptyDataset`] otherwise.
#[derive(Debug, Clone)]
pub struct Results {
    table: Table,
    /// Column acting as the time axis once resampled (always the first one).
    date_column: Option<usize>,
}

impl Results {
    /// Wrap caller-supplied header and rows, resampling when `timeframe` is given.
    pub fn new(
        header: Vec<String>,
        rows: Vec<Row>,
        timeframe: Option<&str>,
    ) -> Result<Self, DataError> {
        Self::from_table(Table::new(header, rows)?, timeframe)
    }

    /// Wrap an already typed table, resampling when `timeframe` is given.
    pub fn from_table(table: Table, timeframe: Option<&str>) -> Result<Self, DataError> {
        match timeframe {
            None => Ok(Self {
                table,
                date_column: None,
            }),
            Some(code) => {
                let resampled = resample(&table, code)?;
                info!(
                    timeframe = code,
                    rows_in = table.rows().len(),
                    rows_out = resampled.rows().len(),
                    "resampled results"
                );
                Ok(Self {
                    table: resampled,
                    date_column: Some(0),
                })
            }
        }
    }

    /// Header and rows as currently held, resampled if a timeframe was given.
    pub fn as_raw_data(&self) -> Result<(Vec<&str>, &[Row]), DataError> {
        self.ensure_data()?;
        Ok((self.table.header(), self.table.rows()))
    }

    /// CSV text with a leading unnamed 0-based index column.
    pub fn as_csv(&self) -> Result<String, DataError> {
        self.ensure_data()?;
        export::to_csv(&self.table)
    }

    /// JSON array with one object per row, keys in header order.
    pub fn as_json(&self) -> Result<String, DataError> {
        self.ensure_data()?;
        export::to_json(&self.table)
    }

    /// Bar chart with the date column as categories and one series per other column.
    /// With `show`, the chart is also rendered to an HTML page before returning.
    pub fn plot(&self, show: bool) -> Result<BarChart, DataError> {
        self.ensure_data()?;
        let date_idx = self
            .date_column
            .or_else(|| self.table.time_column())
            .ok_or_else(|| DataError::MissingTimeColumn {
                columns: self.table.header().iter().map(|s| s.to_string()).collect(),
            })?;

        let date_only = self.table.is_date_only(date_idx);
        let categories = self
            .table
            .rows()
            .iter()
            .map(|row| export::cell_text(&row[date_idx], date_only))
            .collect();

        let mut chart = BarChart::new(categories);
        for (idx, column) in self.table.columns().iter().enumerate() {
            if idx == date_idx {
                continue;
            }
            let points = self.table.rows().iter().map(|row| row[idx].as_f64());
            chart.add_series(&column.name, points.collect());
        }
        debug!(series = chart.series().len(), "built bar chart");

        if show {
            let path = chart.show()?;
            info!(path = %path.display(), "chart rendered");
        }
        Ok(chart)
    }

    pub fn table(&self) -> &Table {
        &self.table
    }

    /// Precondition of every export.
    fn ensure_data(&self) -> Result<(), DataError> {
        if self.table.is_empty() {
            return Err(DataError::EmptyDataset);
        }
        Ok(())
    }
}
