//! Request interpretation engine.
//!
//! This module provides:
//! - path: grouping of dotted include/filter paths by leading segment
//! - classify: attribute / join / preload classification of filter keys
//! - filter, include: per-stage planners folding callbacks over a query
//! - fields, sort: sparse fieldset and ordering resolution
//! - QueryPipeline: the orchestrator, generic over a [`Resource`]

pub mod classify;
pub mod fields;
pub mod filter;
pub mod include;
pub mod path;
mod pipeline;
mod resource;
pub mod sort;

pub use classify::{FilterKind, Relationships};
pub use path::GroupedPaths;
pub use pipeline::QueryPipeline;
pub use resource::Resource;
pub use sort::{SortDirection, SortTerm};
