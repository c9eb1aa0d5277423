//! Configuration loaded from environment variables.

use std::env;

use anyhow::{Context, Result};

use crate::schema::Dialect;

/// Default limit on include path segments (`a.b.c` is 3).
pub const DEFAULT_MAX_INCLUDE_DEPTH: usize = 8;

/// Planner configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannerConfig {
    /// Deepest include path accepted (default: 8).
    pub max_include_depth: usize,

    /// SQL dialect used when rendering plans (default: postgres).
    pub dialect: Dialect,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            max_include_depth: DEFAULT_MAX_INCLUDE_DEPTH,
            dialect: Dialect::default(),
        }
    }
}

impl PlannerConfig {
    /// Load configuration from environment variables.
    ///
    /// - `JSONAPI_MAX_INCLUDE_DEPTH`
    /// - `JSONAPI_SQL_DIALECT` (`postgres`, `mysql` or `sqlite`)
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let max_include_depth = match lookup("JSONAPI_MAX_INCLUDE_DEPTH") {
            Some(raw) => raw
                .trim()
                .parse()
                .context("JSONAPI_MAX_INCLUDE_DEPTH must be a valid usize")?,
            None => DEFAULT_MAX_INCLUDE_DEPTH,
        };

        let dialect = match lookup("JSONAPI_SQL_DIALECT") {
            Some(raw) => raw
                .parse()
                .context("JSONAPI_SQL_DIALECT must be postgres, mysql or sqlite")?,
            None => Dialect::default(),
        };

        Ok(Self {
            max_include_depth,
            dialect,
        })
    }
}
