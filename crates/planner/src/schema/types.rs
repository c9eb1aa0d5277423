//! Query plan types.
//!
//! A `QueryPlan` is the query value threaded through the pipeline by
//! [`SchemaResource`](super::SchemaResource):
//! - columns: projection (empty selects every column)
//! - filters: equality predicates on the base table
//! - joins: inner joins against filtered subqueries
//! - sorts: ordering, leading term first
//! - preloads: related plans loaded after the primary rows

use serde::Serialize;

use crate::plan::SortDirection;

/// Composable plan for a single table.
///
/// Every builder method consumes the plan and returns the extended one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueryPlan {
    /// Base table to query.
    pub table: String,

    /// Columns to select.
    pub columns: Vec<String>,

    /// Equality predicates.
    pub filters: Vec<PlanFilter>,

    /// Joined relationship subqueries.
    pub joins: Vec<PlanJoin>,

    /// Sort order.
    pub sorts: Vec<PlanSort>,

    /// Relationships to load alongside the results.
    pub preloads: Vec<Preload>,
}

impl QueryPlan {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            columns: Vec::new(),
            filters: Vec::new(),
            joins: Vec::new(),
            sorts: Vec::new(),
            preloads: Vec::new(),
        }
    }

    pub fn with_filter(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.filters.push(PlanFilter {
            field: field.into(),
            value: value.into(),
        });
        self
    }

    pub fn with_join(mut self, join: PlanJoin) -> Self {
        self.joins.push(join);
        self
    }

    /// Replace the projection.
    pub fn with_columns(mut self, columns: Vec<String>) -> Self {
        self.columns = columns;
        self
    }

    /// Add `column` to an explicit projection if it is missing.
    ///
    /// An empty projection already selects every column and is left alone.
    pub fn ensure_column(mut self, column: &str) -> Self {
        if !self.columns.is_empty() && !self.selects(column) {
            self.columns.push(column.to_string());
        }
        self
    }

    /// Replace the ordering.
    pub fn with_sorts(mut self, sorts: Vec<PlanSort>) -> Self {
        self.sorts = sorts;
        self
    }

    pub fn with_preload(mut self, preload: Preload) -> Self {
        self.preloads.push(preload);
        self
    }

    /// Whether `column` ends up in the result rows.
    pub fn selects(&self, column: &str) -> bool {
        self.columns.is_empty() || self.columns.iter().any(|c| c == column)
    }

    pub fn preload(&self, name: &str) -> Option<&Preload> {
        self.preloads.iter().find(|p| p.name == name)
    }

    pub fn join(&self, alias: &str) -> Option<&PlanJoin> {
        self.joins.iter().find(|j| j.alias == alias)
    }
}

/// `table.field = value`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlanFilter {
    pub field: String,
    pub value: String,
}

/// Inner join of a filtered relationship subquery.
///
/// Joined on `base.owner_key = alias.related_key`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlanJoin {
    /// Alias for the subquery, the relationship name.
    pub alias: String,
    pub owner_key: String,
    pub related_key: String,
    /// Render the subquery as `SELECT DISTINCT`, so a has-many join matches
    /// each parent row at most once.
    pub distinct: bool,
    pub plan: QueryPlan,
}

/// Ordering key on the base table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlanSort {
    pub field: String,
    pub direction: SortDirection,
}

/// Related rows loaded for each parent row.
///
/// Child rows belong to the parent whose `owner_key` equals their `related_key`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Preload {
    /// Relationship name the rows are attached under.
    pub name: String,
    pub owner_key: String,
    pub related_key: String,
    pub plan: QueryPlan,
}
