// src/api.rs

use std::marker::PhantomData;
use std::path::Path;

use anyhow::Result;
use tracing::{info, instrument};

use crate::config::{Config, ConnectionProfile};
use crate::query::{build_select, DataSource, DuckDbSource};
use crate::results::Results;

/// Entry point for S&P 500 queries.
///
/// Every call opens its own connection, runs one `SELECT`, closes the
/// connection and wraps the rows in [`Results`]. Nothing is cached.
pub struct Sp500Api<S: DataSource = DuckDbSource> {
    profile: ConnectionProfile,
    _source: PhantomData<fn() -> S>,
}

impl Sp500Api<DuckDbSource> {
    /// Build the API from profile `profile` (or the default one) of a YAML config file.
    pub fn from_config<P: AsRef<Path>>(path: P, profile: Option<&str>) -> Result<Self> {
        let config = Config::from_path(path)?;
        Ok(Self::new(config.profile(profile)?.clone()))
    }
}

impl<S: DataSource> Sp500Api<S> {
    pub fn new(profile: ConnectionProfile) -> Self {
        Self {
            profile,
            _source: PhantomData,
        }
    }

    pub fn profile(&self) -> &ConnectionProfile {
        &self.profile
    }

    /// Query `columns` (all when `None`) and resample to `timeframe` when given.
    #[instrument(level = "info", skip(self), fields(table = %self.profile.table))]
    pub fn custom(&self, timeframe: Option<&str>, columns: Option<&[&str]>) -> Result<Results> {
        let sql = build_select(&self.profile.table, columns);

        let mut source = S::open(&self.profile)?;
        let queried = source.query(&sql);
        let closed = source.close();
        let table = queried?;
        closed?;

        info!(rows = table.rows().len(), "fetched");
        Ok(Results::from_table(table, timeframe)?)
    }

    pub fn yearly(&self, columns: Option<&[&str]>) -> Result<Results> {
        self.custom(Some("Y"), columns)
    }

    pub fn quarterly(&self, columns: Option<&[&str]>) -> Result<Results> {
        self.custom(Some("Q"), columns)
    }

    pub fn monthly(&self, columns: Option<&[&str]>) -> Result<Results> {
        self.custom(Some("M"), columns)
    }
}
