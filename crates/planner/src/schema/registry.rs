//! Resource schemas loaded from TOML.
//!
//! Each resource declares its table, fields and relationships:
//!
//! ```toml
//! [[resource]]
//! type = "articles"
//! table = "articles"
//! fields = ["id", "title", "author_id"]
//!
//! [[resource.relationships]]
//! name = "author"
//! resource = "people"
//! owner_key = "author_id"
//! related_key = "id"
//! ```

use std::collections::{HashMap, HashSet};
use std::path::Path;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

use super::resource::SchemaResource;
use crate::config::PlannerConfig;

/// Schema for one resource type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceSchema {
    /// Resource type name, the key into `fields[type]`.
    #[serde(rename = "type")]
    pub resource_type: String,

    /// Backing table.
    pub table: String,

    /// Primary key column (default: "id").
    #[serde(default = "default_primary_key")]
    pub primary_key: String,

    /// Declared columns, in default projection order.
    pub fields: Vec<String>,

    /// Relationships to other resource types.
    #[serde(default)]
    pub relationships: Vec<RelationshipSchema>,
}

fn default_primary_key() -> String {
    "id".to_string()
}

impl ResourceSchema {
    pub fn relationship(&self, name: &str) -> Option<&RelationshipSchema> {
        self.relationships.iter().find(|r| r.name == name)
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.fields.iter().any(|f| f == name)
    }
}

/// Relationship from one resource to another.
///
/// Rows relate where `owner.owner_key = related.related_key`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelationshipSchema {
    /// Relationship name used in `filter` and `include`.
    pub name: String,

    /// Related resource type.
    pub resource: String,

    /// Column on the owning resource.
    pub owner_key: String,

    /// Column on the related resource.
    pub related_key: String,
}

#[derive(Debug, Deserialize)]
struct SchemaFile {
    #[serde(default, rename = "resource")]
    resources: Vec<ResourceSchema>,
}

/// Registry of resource schemas, validated as a whole.
#[derive(Debug, Clone)]
pub struct SchemaRegistry {
    resources: HashMap<String, ResourceSchema>,
    config: PlannerConfig,
}

impl SchemaRegistry {
    /// Build a registry, checking every cross-reference.
    pub fn new(resources: Vec<ResourceSchema>) -> Result<Self> {
        let mut by_type = HashMap::new();
        for schema in resources {
            if by_type.contains_key(&schema.resource_type) {
                bail!("resource type '{}' is declared twice", schema.resource_type);
            }
            by_type.insert(schema.resource_type.clone(), schema);
        }

        for schema in by_type.values() {
            validate(schema, &by_type)?;
        }

        Ok(Self {
            resources: by_type,
            config: PlannerConfig::default(),
        })
    }

    /// Parse a registry from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let file: SchemaFile = toml::from_str(content).context("failed to parse schema TOML")?;
        Self::new(file.resources)
    }

    /// Load a registry from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read schema file {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("invalid schema file {}", path.display()))
    }

    /// Use `config` for pipelines built by this registry's resources.
    pub fn with_config(mut self, config: PlannerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    pub fn get(&self, resource_type: &str) -> Option<&ResourceSchema> {
        self.resources.get(resource_type)
    }

    /// The query-building resource for `resource_type`.
    pub fn resource(&self, resource_type: &str) -> Option<SchemaResource<'_>> {
        self.get(resource_type)
            .map(|schema| SchemaResource::new(self, schema))
    }

    /// Registered resource types, sorted.
    pub fn resource_types(&self) -> Vec<&str> {
        let mut types: Vec<&str> = self.resources.keys().map(String::as_str).collect();
        types.sort_unstable();
        types
    }
}

fn validate(schema: &ResourceSchema, all: &HashMap<String, ResourceSchema>) -> Result<()> {
    let ty = &schema.resource_type;

    if !schema.has_field(&schema.primary_key) {
        bail!(
            "resource '{ty}': primary key '{}' is not a declared field",
            schema.primary_key
        );
    }

    let mut names = HashSet::new();
    for rel in &schema.relationships {
        if rel.name.is_empty() || rel.name.contains('.') || rel.name.contains(',') {
            bail!(
                "resource '{ty}': relationship name '{}' must be non-empty without '.' or ','",
                rel.name
            );
        }
        if !names.insert(rel.name.as_str()) {
            bail!("resource '{ty}': relationship '{}' is declared twice", rel.name);
        }
        let Some(target) = all.get(&rel.resource) else {
            bail!(
                "resource '{ty}': relationship '{}' references unknown resource '{}'",
                rel.name,
                rel.resource
            );
        };
        if !schema.has_field(&rel.owner_key) {
            bail!(
                "resource '{ty}': relationship '{}' owner key '{}' is not a declared field",
                rel.name,
                rel.owner_key
            );
        }
        if !target.has_field(&rel.related_key) {
            bail!(
                "resource '{ty}': relationship '{}' related key '{}' is not a field of '{}'",
                rel.name,
                rel.related_key,
                rel.resource
            );
        }
    }
    Ok(())
}
