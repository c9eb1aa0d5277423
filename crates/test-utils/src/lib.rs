//! jsonapi-plan test utilities.
//!
//! Helpers for integration testing: a blog schema fixture and a resource
//! whose query is the log of callbacks the pipeline made.

use jsonapi_plan::schema::SchemaRegistry;
use jsonapi_plan::{FilterValue, Relationships, Request, Resource, Result, SortTerm};

/// Blog schema: articles, people, comments, companies.
pub const BLOG_SCHEMA: &str = include_str!("../fixtures/blog.toml");

/// Registry built from [`BLOG_SCHEMA`].
pub fn blog_registry() -> anyhow::Result<SchemaRegistry> {
    SchemaRegistry::from_toml_str(BLOG_SCHEMA)
}

/// One pipeline callback invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Attribute { key: String, value: FilterValue },
    Join { relationship: String, request: Request },
    Include { relationship: String, request: Request },
    Select(Vec<String>),
    OrderBy(Vec<SortTerm<String>>),
}

/// A resource that records every callback instead of building a query.
#[derive(Debug, Clone)]
pub struct RecordingResource {
    pub resource_type: String,
    pub relationships: Relationships,
    pub fields: Vec<String>,
    pub primary_key: String,
    pub fail_on: Option<String>,
}

/// Create a recording resource with an `id` primary key and no relationships.
pub fn recording(resource_type: &str) -> RecordingResource {
    RecordingResource {
        resource_type: resource_type.to_string(),
        relationships: Relationships::default(),
        fields: vec!["id".to_string()],
        primary_key: "id".to_string(),
        fail_on: None,
    }
}

impl RecordingResource {
    /// Set the relationship names.
    pub fn with_relationships(mut self, names: &[&str]) -> Self {
        self.relationships = Relationships::new(names.iter().copied());
        self
    }

    /// Set the declared fields.
    pub fn with_fields(mut self, fields: &[&str]) -> Self {
        self.fields = fields.iter().map(|f| f.to_string()).collect();
        self
    }

    /// Make any callback keyed by `name` (attribute, relationship) fail.
    pub fn failing_on(mut self, name: &str) -> Self {
        self.fail_on = Some(name.to_string());
        self
    }

    fn record(&self, mut calls: Vec<Call>, name: &str, call: Call) -> Result<Vec<Call>> {
        if self.fail_on.as_deref() == Some(name) {
            return Err(anyhow::anyhow!("callback for '{name}' failed").into());
        }
        calls.push(call);
        Ok(calls)
    }
}

impl Resource for RecordingResource {
    type Query = Vec<Call>;
    type Field = String;

    fn resource_type(&self) -> &str {
        &self.resource_type
    }

    fn relationships(&self) -> &Relationships {
        &self.relationships
    }

    fn query(&self) -> Vec<Call> {
        Vec::new()
    }

    fn primary_key(&self) -> String {
        self.primary_key.clone()
    }

    fn default_fields(&self) -> Vec<String> {
        self.fields.clone()
    }

    fn apply_attribute(
        &self,
        query: Vec<Call>,
        key: &str,
        value: &FilterValue,
    ) -> Result<Vec<Call>> {
        let call = Call::Attribute {
            key: key.to_string(),
            value: value.clone(),
        };
        self.record(query, key, call)
    }

    fn apply_join(
        &self,
        query: Vec<Call>,
        relationship: &str,
        request: &Request,
    ) -> Result<Vec<Call>> {
        let call = Call::Join {
            relationship: relationship.to_string(),
            request: request.clone(),
        };
        self.record(query, relationship, call)
    }

    fn apply_include(
        &self,
        query: Vec<Call>,
        relationship: &str,
        request: &Request,
    ) -> Result<Vec<Call>> {
        let call = Call::Include {
            relationship: relationship.to_string(),
            request: request.clone(),
        };
        self.record(query, relationship, call)
    }

    fn select(&self, mut query: Vec<Call>, fields: Vec<String>) -> Result<Vec<Call>> {
        query.push(Call::Select(fields));
        Ok(query)
    }

    fn order_by(&self, mut query: Vec<Call>, terms: Vec<SortTerm<String>>) -> Result<Vec<Call>> {
        query.push(Call::OrderBy(terms));
        Ok(query)
    }
}
