//! Filter planning: attribute predicates first, then relationship joins.
//!
//! Keys that name a relationship exactly (`filter[comments][body]`) are left
//! to include planning and never reach either pass here.

use super::classify::Relationships;
use crate::error::Result;
use crate::request::{FilterMap, FilterValue, Request};

/// Entries that are plain attribute filters, in request order.
pub fn attribute_filters<'a>(
    filter: &'a FilterMap,
    relationships: &'a Relationships,
) -> impl Iterator<Item = (&'a str, &'a FilterValue)> {
    filter
        .iter()
        .filter(|(key, _)| !relationships.is_relationship_filter(key))
}

/// Join filters grouped by leading relationship segment, with the segment
/// stripped from each key.
///
/// Groups come out in the order their first member appears in `filter`.
pub fn join_filters(filter: &FilterMap, relationships: &Relationships) -> Vec<(String, FilterMap)> {
    let mut groups: Vec<(&str, Vec<(&str, &FilterValue)>)> = Vec::new();

    for (key, value) in filter.iter() {
        if !relationships.is_join_filter(key) {
            continue;
        }
        let segment = key.split_once('.').map_or(key, |(head, _)| head);
        match groups.iter_mut().find(|(s, _)| *s == segment) {
            Some((_, entries)) => entries.push((key, value)),
            None => groups.push((segment, vec![(key, value)])),
        }
    }

    groups
        .into_iter()
        .map(|(segment, entries)| trim_leading_relationship_from_keys(segment, entries))
        .collect()
}

/// Strip `relationship.` from each key.
pub fn trim_leading_relationship_from_keys<'a>(
    relationship: &str,
    entries: impl IntoIterator<Item = (&'a str, &'a FilterValue)>,
) -> (String, FilterMap) {
    let prefix = format!("{relationship}.");
    let trimmed = entries
        .into_iter()
        .map(|(key, value)| {
            let key = key.strip_prefix(&prefix).unwrap_or(key);
            (key.to_string(), value.clone())
        })
        .collect();
    (relationship.to_string(), trimmed)
}

/// Fold the filter mapping into `query`.
///
/// Attribute filters are applied one by one in request order, then each
/// relationship group is applied once with a `{"filter": ...}` sub-request.
/// The first callback error aborts the fold.
pub fn plan<Q>(
    query: Q,
    filter: &FilterMap,
    relationships: &Relationships,
    mut apply_attribute: impl FnMut(Q, &str, &FilterValue) -> Result<Q>,
    mut apply_join: impl FnMut(Q, &str, &Request) -> Result<Q>,
) -> Result<Q> {
    let query = attribute_filters(filter, relationships)
        .try_fold(query, |query, (key, value)| {
            tracing::trace!(key, "applying attribute filter");
            apply_attribute(query, key, value)
        })?;

    join_filters(filter, relationships)
        .into_iter()
        .try_fold(query, |query, (relationship, nested)| {
            tracing::trace!(%relationship, filters = nested.len(), "applying join filter");
            apply_join(query, &relationship, &Request::filter_only(nested))
        })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[derive(Debug, PartialEq)]
    enum Call {
        Attr(String, FilterValue),
        Join(String, FilterMap),
    }

    fn run(filter: &FilterMap, rels: &Relationships) -> Result<Vec<Call>> {
        plan(
            Vec::new(),
            filter,
            rels,
            |mut calls, key, value| {
                calls.push(Call::Attr(key.to_string(), value.clone()));
                Ok(calls)
            },
            |mut calls, rel, request| {
                calls.push(Call::Join(rel.to_string(), request.filter.clone()));
                Ok(calls)
            },
        )
    }

    #[test]
    fn trims_relationship_prefix() {
        let tag = FilterValue::from("animals");
        let name = FilterValue::from("joe");
        let (rel, map) = trim_leading_relationship_from_keys(
            "article",
            [("article.tag", &tag), ("article.comments.user.name", &name)],
        );
        assert_eq!(rel, "article");
        assert_eq!(
            map,
            FilterMap::new()
                .with("tag", "animals")
                .with("comments.user.name", "joe")
        );
    }

    #[test]
    fn attributes_before_joins() {
        let rels = Relationships::new(["author", "comments"]);
        let filter = FilterMap::new()
            .with("author.has_bio", "1")
            .with("tag", "animals")
            .with("comments", FilterMap::new().with("body", "Great"));

        let calls = run(&filter, &rels).unwrap();
        assert_eq!(
            calls,
            vec![
                Call::Attr("tag".into(), "animals".into()),
                Call::Join("author".into(), FilterMap::new().with("has_bio", "1")),
            ]
        );
    }

    #[test]
    fn join_groups_follow_first_appearance() {
        let rels = Relationships::new(["author", "comments"]);
        let filter = FilterMap::new()
            .with("comments.body", "x")
            .with("author.name", "joe")
            .with("comments.user.name", "ann");

        let groups = join_filters(&filter, &rels);
        let names: Vec<&str> = groups.iter().map(|(r, _)| r.as_str()).collect();
        assert_eq!(names, vec!["comments", "author"]);
        assert_eq!(
            groups[0].1,
            FilterMap::new().with("body", "x").with("user.name", "ann")
        );
    }

    #[test]
    fn callback_error_stops_the_fold() {
        let rels = Relationships::new(["author"]);
        let filter = FilterMap::new()
            .with("a", "1")
            .with("b", "2")
            .with("author.name", "joe");

        let mut seen = Vec::new();
        let result = plan(
            (),
            &filter,
            &rels,
            |(), key, _| {
                seen.push(key.to_string());
                if key == "a" {
                    Err(Error::lookup("articles", key))
                } else {
                    Ok(())
                }
            },
            |(), _, _| panic!("join pass must not run after a failure"),
        );

        assert!(result.is_err());
        assert_eq!(seen, vec!["a"]);
    }

    #[test]
    fn empty_filter_returns_query_untouched() {
        let rels = Relationships::new(["author"]);
        assert!(run(&FilterMap::new(), &rels).unwrap().is_empty());
    }
}
