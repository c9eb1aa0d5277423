//! JSON-API query planning.
//!
//! Turns parsed `filter`, `fields`, `sort` and `include` parameters into a
//! query by folding them, in a fixed stage order, through a [`Resource`]
//! implementation. The [`schema`] module provides one backed by TOML schemas
//! and rendered to SQL with SeaQuery; callers with their own query type
//! implement [`Resource`] directly.

pub mod config;
pub mod error;
pub mod plan;
pub mod request;
pub mod schema;

pub use config::PlannerConfig;
pub use error::{Error, Result};
pub use plan::{FilterKind, QueryPipeline, Relationships, Resource, SortDirection, SortTerm};
pub use request::{FilterMap, FilterValue, Request};
