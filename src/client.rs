//! Fetch collaborator seam and the client that turns fetched responses into tables.
//!
//! Transport, authentication, pagination and retries live behind [`Fetch`];
//! this crate never performs I/O itself.

use crate::pipeline::{process, Kind};
use crate::table::{FlattenConfig, Table};
use anyhow::{anyhow, Result};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};

/// Retrieves a raw response for an endpoint.
///
/// Implementations return either a single record or the concatenated
/// records of every page. Their errors reach the caller unchanged.
pub trait Fetch {
    fn fetch(&self, endpoint_path: &str, params: &BTreeMap<String, String>) -> Result<Value>;
}

/// Serves canned responses keyed by endpoint path.
#[derive(Debug, Clone, Default)]
pub struct MemoryFetcher {
    responses: HashMap<String, Value>,
}

impl MemoryFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_response(mut self, endpoint_path: impl Into<String>, response: Value) -> Self {
        self.insert(endpoint_path, response);
        self
    }

    pub fn insert(&mut self, endpoint_path: impl Into<String>, response: Value) {
        self.responses.insert(endpoint_path.into(), response);
    }
}

impl Fetch for MemoryFetcher {
    fn fetch(&self, endpoint_path: &str, _params: &BTreeMap<String, String>) -> Result<Value> {
        self.responses
            .get(endpoint_path)
            .cloned()
            .ok_or_else(|| anyhow!("no response recorded for endpoint '{}'", endpoint_path))
    }
}

/// Fetches responses and runs them through the pipeline for their kind
pub struct Client<F: Fetch> {
    fetcher: F,
    config: FlattenConfig,
}

impl<F: Fetch> Client<F> {
    pub fn new(fetcher: F) -> Self {
        Self::with_config(fetcher, FlattenConfig::default())
    }

    pub fn with_config(fetcher: F, config: FlattenConfig) -> Self {
        Client { fetcher, config }
    }

    pub fn config(&self) -> &FlattenConfig {
        &self.config
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// Fetch `endpoint_path` and build the table for `kind`.
    ///
    /// Pipeline failures come back as [`crate::Error`] inside the
    /// `anyhow::Error` and can be recovered with `downcast_ref`.
    pub fn table(
        &self,
        kind: Kind,
        endpoint_path: &str,
        params: &BTreeMap<String, String>,
    ) -> Result<Table> {
        let response = self.fetcher.fetch(endpoint_path, params)?;
        let table = process(kind, response, &self.config)?;
        Ok(table)
    }
}
