//! Per-resource capabilities the pipeline is generic over.

use std::fmt::Debug;

use super::classify::Relationships;
use super::sort::SortTerm;
use crate::error::{Error, Result};
use crate::request::{FilterValue, Request};

/// One resource type's query-building behavior.
///
/// The pipeline never looks inside [`Resource::Query`]; it only threads the
/// value through these methods in stage order. Every method consumes the
/// query and returns the next one, so a failed stage leaves nothing behind.
pub trait Resource {
    /// Opaque, composable query value.
    type Query;

    /// Field identifier produced by [`map_field`](Self::map_field).
    type Field: Clone + PartialEq + AsRef<str> + Debug;

    /// Type name used as the key into `fields[type]`.
    fn resource_type(&self) -> &str;

    /// Relationship names recognized for filter and include classification.
    fn relationships(&self) -> &Relationships;

    /// A fresh query over the resource.
    fn query(&self) -> Self::Query;

    /// The primary key field; always kept in sparse projections.
    fn primary_key(&self) -> Self::Field;

    /// All schema-declared fields, the projection when no fieldset is given.
    fn default_fields(&self) -> Vec<Self::Field>;

    /// Map a field name to its identifier.
    ///
    /// The default accepts only names already in
    /// [`default_fields`](Self::default_fields).
    fn map_field(&self, name: &str) -> Result<Self::Field> {
        self.default_fields()
            .into_iter()
            .find(|field| field.as_ref() == name)
            .ok_or_else(|| Error::lookup(self.resource_type(), name))
    }

    /// Apply a plain attribute filter.
    fn apply_attribute(
        &self,
        query: Self::Query,
        key: &str,
        value: &FilterValue,
    ) -> Result<Self::Query>;

    /// Apply a relationship filter; `request` carries only `filter`, keyed by
    /// the path remaining after the relationship segment.
    fn apply_join(
        &self,
        query: Self::Query,
        relationship: &str,
        request: &Request,
    ) -> Result<Self::Query>;

    /// Attach a relationship for eager loading, described by `request`.
    fn apply_include(
        &self,
        query: Self::Query,
        relationship: &str,
        request: &Request,
    ) -> Result<Self::Query>;

    /// Set the projection.
    fn select(&self, query: Self::Query, fields: Vec<Self::Field>) -> Result<Self::Query>;

    /// Set the ordering; the first term is the primary sort key.
    fn order_by(&self, query: Self::Query, terms: Vec<SortTerm<Self::Field>>)
    -> Result<Self::Query>;
}
