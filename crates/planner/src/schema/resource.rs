//! Schema-driven [`Resource`] producing [`QueryPlan`]s.

use anyhow::anyhow;

use super::registry::{RelationshipSchema, ResourceSchema, SchemaRegistry};
use super::types::{PlanJoin, PlanSort, Preload, QueryPlan};
use crate::error::{Error, Result};
use crate::plan::{QueryPipeline, Relationships, Resource, SortTerm};
use crate::request::{FilterValue, Request};

/// Query-building behavior derived from a [`ResourceSchema`].
///
/// Relationship filters and includes build the related resource's plan
/// through a nested [`QueryPipeline`], so nested paths recurse naturally.
#[derive(Debug, Clone)]
pub struct SchemaResource<'a> {
    registry: &'a SchemaRegistry,
    schema: &'a ResourceSchema,
    relationships: Relationships,
}

impl<'a> SchemaResource<'a> {
    pub fn new(registry: &'a SchemaRegistry, schema: &'a ResourceSchema) -> Self {
        let relationships = schema.relationships.iter().map(|r| r.name.clone()).collect();
        Self {
            registry,
            schema,
            relationships,
        }
    }

    pub fn schema(&self) -> &'a ResourceSchema {
        self.schema
    }

    /// Pipeline over this resource using the registry's configuration.
    pub fn pipeline(&self) -> QueryPipeline<'_, Self> {
        QueryPipeline::new(self).with_config(self.registry.config())
    }

    fn related(&self, name: &str) -> Result<(&'a RelationshipSchema, SchemaResource<'a>)> {
        let relationship =
            self.schema
                .relationship(name)
                .ok_or_else(|| Error::UnknownRelationship {
                    resource_type: self.schema.resource_type.clone(),
                    relationship: name.to_string(),
                })?;
        let target = self.registry.resource(&relationship.resource).ok_or_else(|| {
            anyhow!(
                "relationship '{name}' targets unregistered resource '{}'",
                relationship.resource
            )
        })?;
        Ok((relationship, target))
    }
}

impl Resource for SchemaResource<'_> {
    type Query = QueryPlan;
    type Field = String;

    fn resource_type(&self) -> &str {
        &self.schema.resource_type
    }

    fn relationships(&self) -> &Relationships {
        &self.relationships
    }

    fn query(&self) -> QueryPlan {
        QueryPlan::new(&self.schema.table)
    }

    fn primary_key(&self) -> String {
        self.schema.primary_key.clone()
    }

    fn default_fields(&self) -> Vec<String> {
        self.schema.fields.clone()
    }

    fn apply_attribute(
        &self,
        query: QueryPlan,
        key: &str,
        value: &FilterValue,
    ) -> Result<QueryPlan> {
        let FilterValue::Scalar(value) = value else {
            return Err(Error::shape(
                format!("filter[{key}]"),
                "attribute filters take a string value",
            ));
        };
        let field = self.map_field(key)?;
        Ok(query.with_filter(field, value.as_str()))
    }

    fn apply_join(
        &self,
        query: QueryPlan,
        relationship: &str,
        request: &Request,
    ) -> Result<QueryPlan> {
        let (rel, target) = self.related(relationship)?;
        // The subquery only narrows parent rows; project the join key alone.
        let plan = target
            .pipeline()
            .build(request)?
            .with_columns(vec![rel.related_key.clone()]);
        Ok(query.with_join(PlanJoin {
            alias: rel.name.clone(),
            owner_key: rel.owner_key.clone(),
            related_key: rel.related_key.clone(),
            distinct: true,
            plan,
        }))
    }

    fn apply_include(
        &self,
        query: QueryPlan,
        relationship: &str,
        request: &Request,
    ) -> Result<QueryPlan> {
        let (rel, target) = self.related(relationship)?;
        let plan = target.pipeline().build(request)?.ensure_column(&rel.related_key);
        Ok(query.ensure_column(&rel.owner_key).with_preload(Preload {
            name: rel.name.clone(),
            owner_key: rel.owner_key.clone(),
            related_key: rel.related_key.clone(),
            plan,
        }))
    }

    fn select(&self, query: QueryPlan, fields: Vec<String>) -> Result<QueryPlan> {
        Ok(query.with_columns(fields))
    }

    fn order_by(&self, query: QueryPlan, terms: Vec<SortTerm<String>>) -> Result<QueryPlan> {
        let sorts = terms
            .into_iter()
            .map(|term| PlanSort {
                field: term.field,
                direction: term.direction,
            })
            .collect();
        Ok(query.with_sorts(sorts))
    }
}
