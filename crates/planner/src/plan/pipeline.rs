//! Request → query orchestration.
//!
//! Stages always run in the order filter, fields, sort, include. The fields
//! stage keeps the primary key in every projection because the include stage
//! associates parent and child rows through it.

use super::path;
use super::resource::Resource;
use super::{fields, filter, include, sort};
use crate::config::{DEFAULT_MAX_INCLUDE_DEPTH, PlannerConfig};
use crate::error::{Error, Result};
use crate::request::Request;

/// Builds queries for one resource type.
pub struct QueryPipeline<'a, R: Resource> {
    resource: &'a R,
    max_include_depth: usize,
}

impl<'a, R: Resource> QueryPipeline<'a, R> {
    pub fn new(resource: &'a R) -> Self {
        Self {
            resource,
            max_include_depth: DEFAULT_MAX_INCLUDE_DEPTH,
        }
    }

    /// Apply limits from `config`.
    pub fn with_config(mut self, config: &PlannerConfig) -> Self {
        self.max_include_depth = config.max_include_depth;
        self
    }

    pub fn resource(&self) -> &'a R {
        self.resource
    }

    /// Build a query from a fresh [`Resource::query`].
    pub fn build(&self, request: &Request) -> Result<R::Query> {
        self.build_from(self.resource.query(), request)
    }

    /// Run every stage over an existing query.
    pub fn build_from(&self, query: R::Query, request: &Request) -> Result<R::Query> {
        let span = tracing::debug_span!("build", resource = self.resource.resource_type());
        let _guard = span.enter();

        self.check_include_depth(request)?;

        let query = self.filter(query, request)?;
        let query = self.fields(query, request)?;
        let query = self.sort(query, request)?;
        self.include(query, request)
    }

    /// Filter stage.
    pub fn filter(&self, query: R::Query, request: &Request) -> Result<R::Query> {
        if request.filter.is_empty() {
            return Ok(query);
        }
        let relationships = self.resource.relationships();
        tracing::debug!(filters = request.filter.len(), "filter stage");

        let included = request.include.as_deref().map(path::group).unwrap_or_default();
        for key in request.filter.keys() {
            if relationships.is_preload_filter(key) && included.get(key).is_none() {
                tracing::warn!(
                    relationship = key,
                    "relationship filter has no matching include and is dropped"
                );
            }
        }

        filter::plan(
            query,
            &request.filter,
            relationships,
            |query, key, value| self.resource.apply_attribute(query, key, value),
            |query, relationship, sub| self.resource.apply_join(query, relationship, sub),
        )
    }

    /// Fields (projection) stage.
    ///
    /// Without a fieldset for this resource type every schema field is
    /// selected, so later stages always see an explicit projection.
    pub fn fields(&self, query: R::Query, request: &Request) -> Result<R::Query> {
        let requested = request
            .fields
            .as_ref()
            .and_then(|sets| sets.get(self.resource.resource_type()));

        let selected = match requested {
            Some(list) => fields::resolve(list, self.resource.primary_key(), |name| {
                self.resource.map_field(name)
            })?,
            None => self.resource.default_fields(),
        };
        tracing::debug!(fields = selected.len(), sparse = requested.is_some(), "fields stage");
        self.resource.select(query, selected)
    }

    /// Sort stage.
    pub fn sort(&self, query: R::Query, request: &Request) -> Result<R::Query> {
        let Some(raw) = request.sort.as_deref() else {
            return Ok(query);
        };
        let terms = sort::parse(raw, |name| self.resource.map_field(name))?;
        tracing::debug!(terms = terms.len(), "sort stage");
        self.resource.order_by(query, terms)
    }

    /// Include stage.
    pub fn include(&self, query: R::Query, request: &Request) -> Result<R::Query> {
        if request.include.is_none() {
            return Ok(query);
        }
        tracing::debug!(include = ?request.include, "include stage");
        include::plan(query, request, |query, relationship, sub| {
            self.resource.apply_include(query, relationship, sub)
        })
    }

    fn check_include_depth(&self, request: &Request) -> Result<()> {
        let Some(include) = request.include.as_deref() else {
            return Ok(());
        };
        if path::max_depth(include) > self.max_include_depth {
            return Err(Error::IncludeTooDeep {
                path: include.to_string(),
                max_depth: self.max_include_depth,
            });
        }
        Ok(())
    }
}
