//! Schema-driven query plans.
//!
//! This module provides:
//! - SchemaRegistry: resource schemas loaded from TOML
//! - SchemaResource: the [`Resource`](crate::plan::Resource) built from a schema
//! - QueryPlan: the composable query value it produces
//! - PlanQueryBuilder: SeaQuery-based SQL rendering

mod query_builder;
mod registry;
mod resource;
pub mod types;

pub use query_builder::{Dialect, PlanQueryBuilder, RenderedPreload, RenderedQuery};
pub use registry::{RelationshipSchema, ResourceSchema, SchemaRegistry};
pub use resource::SchemaResource;
pub use types::{PlanFilter, PlanJoin, PlanSort, Preload, QueryPlan};
