//! Planner error types.

use thiserror::Error;

/// Errors raised while turning a request into a query.
#[derive(Debug, Error)]
pub enum Error {
    /// A field name has no identifier for the resource type.
    #[error("unknown field `{field}` for resource type `{resource_type}`")]
    Lookup {
        resource_type: String,
        field: String,
    },

    /// A request parameter does not have the expected structure.
    #[error("malformed request parameter `{param}`: {reason}")]
    Shape { param: String, reason: String },

    /// A relationship name is not declared for the resource type.
    #[error("unknown relationship `{relationship}` for resource type `{resource_type}`")]
    UnknownRelationship {
        resource_type: String,
        relationship: String,
    },

    /// An include path nests deeper than the configured limit.
    #[error("include path `{path}` exceeds the maximum depth of {max_depth}")]
    IncludeTooDeep { path: String, max_depth: usize },

    /// A resource callback failed.
    #[error("resource callback failed")]
    Resource(#[from] anyhow::Error),
}

impl Error {
    /// Build a shape error for `param`.
    pub fn shape(param: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::Shape {
            param: param.into(),
            reason: reason.into(),
        }
    }

    /// Build a lookup error for `field` on `resource_type`.
    pub fn lookup(resource_type: impl Into<String>, field: impl Into<String>) -> Self {
        Error::Lookup {
            resource_type: resource_type.into(),
            field: field.into(),
        }
    }
}

/// Result type alias using the planner [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
