//! Query the S&P 500 history table, optionally resample it to a coarser
//! period with period-over-period percent changes, and export the result as
//! CSV, JSON, raw rows or a bar chart.

pub mod api;
pub mod chart;
pub mod config;
pub mod error;
pub mod logging;
pub mod query;
pub mod resample;
pub mod results;
pub mod table;

pub use api::Sp500Api;
pub use chart::BarChart;
pub use config::{Config, ConnectionProfile};
pub use error::DataError;
pub use query::{DataSource, DuckDbSource};
pub use results::Results;
pub use table::{Column, ColumnType, Row, Table, Value};
