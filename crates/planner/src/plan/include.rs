//! Include planning: one sub-request per included relationship.

use super::path::{self, GroupedPaths};
use crate::error::Result;
use crate::request::{FilterMap, FilterValue, Request};

/// Build the sub-request for `relationship`.
///
/// The sub-request carries the remaining include paths, the nested filter at
/// `filter[relationship]` when it is a mapping, and the parent's sparse
/// fieldsets unchanged.
pub fn sub_request(request: &Request, relationship: &str, remainder: &str) -> Request {
    let filter = match request.filter.get(relationship) {
        Some(FilterValue::Nested(nested)) => nested.clone(),
        Some(FilterValue::Scalar(_)) => {
            tracing::warn!(
                relationship,
                "scalar filter on a relationship name is ignored; use a nested mapping"
            );
            FilterMap::new()
        }
        None => FilterMap::new(),
    };

    Request {
        filter,
        fields: request.fields.clone(),
        sort: None,
        include: (!remainder.is_empty()).then(|| remainder.to_string()),
    }
}

/// Included relationships and their sub-requests, in include order.
pub fn sub_requests(request: &Request) -> Vec<(String, Request)> {
    let grouped: GroupedPaths = request
        .include
        .as_deref()
        .map(path::group)
        .unwrap_or_default();

    grouped
        .into_iter()
        .map(|(relationship, remainder)| {
            let sub = sub_request(request, &relationship, &remainder);
            (relationship, sub)
        })
        .collect()
}

/// Fold every included relationship into `query`.
///
/// Without an `include` parameter the query is returned as is.
pub fn plan<Q>(
    query: Q,
    request: &Request,
    mut apply_include: impl FnMut(Q, &str, &Request) -> Result<Q>,
) -> Result<Q> {
    sub_requests(request)
        .into_iter()
        .try_fold(query, |query, (relationship, sub)| {
            tracing::trace!(%relationship, include = ?sub.include, "applying include");
            apply_include(query, &relationship, &sub)
        })
}
