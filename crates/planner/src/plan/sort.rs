//! Sort parameter parsing.

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Sort direction.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

/// One ordering key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortTerm<F> {
    pub direction: SortDirection,
    pub field: F,
}

impl<F> SortTerm<F> {
    pub fn asc(field: F) -> Self {
        Self {
            direction: SortDirection::Asc,
            field,
        }
    }

    pub fn desc(field: F) -> Self {
        Self {
            direction: SortDirection::Desc,
            field,
        }
    }
}

/// Parse `"category,-published"` into ordered terms, mapping each name
/// through `map_field`.
pub fn parse<F>(
    sort: &str,
    mut map_field: impl FnMut(&str) -> Result<F>,
) -> Result<Vec<SortTerm<F>>> {
    sort.split(',')
        .filter(|term| !term.is_empty())
        .map(|term| match term.strip_prefix('-') {
            Some(name) => map_field(name).map(SortTerm::desc),
            None => map_field(term).map(SortTerm::asc),
        })
        .collect()
}
