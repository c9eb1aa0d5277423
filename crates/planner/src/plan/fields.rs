//! Sparse fieldset resolution.

use crate::error::Result;

/// Resolve a comma-separated fieldset into field identifiers.
///
/// The primary key is always part of the result, exactly once, and leads the
/// list when it was not requested. Repeated names collapse to their first
/// occurrence.
pub fn resolve<F: PartialEq>(
    requested: &str,
    primary_key: F,
    mut map_field: impl FnMut(&str) -> Result<F>,
) -> Result<Vec<F>> {
    let mut fields: Vec<F> = Vec::new();
    for name in requested.split(',').filter(|name| !name.is_empty()) {
        let field = map_field(name)?;
        if !fields.contains(&field) {
            fields.push(field);
        }
    }

    if !fields.contains(&primary_key) {
        fields.insert(0, primary_key);
    }
    Ok(fields)
}
