//! Filter key classification against a resource's relationship names.

use std::collections::BTreeSet;

/// What a filter key refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterKind {
    /// Plain field on the primary resource.
    Attribute,
    /// Dotted path into a relationship (`author.name`).
    Join,
    /// Exact relationship name with a nested mapping (`comments`).
    Preload,
}

/// Known relationship names for one resource type.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Relationships {
    names: BTreeSet<String>,
}

impl Relationships {
    /// Collect relationship names.
    ///
    /// Names that are empty or contain `.` or `,` cannot be addressed by a
    /// filter key or include path and are skipped.
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names = names
            .into_iter()
            .map(Into::into)
            .filter(|name: &String| {
                let valid = !name.is_empty() && !name.contains(['.', ',']);
                if !valid {
                    tracing::warn!(
                        relationship = %name,
                        "skipping unaddressable relationship name"
                    );
                }
                valid
            })
            .collect();
        Self { names }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    /// True if `key` starts with `relationship.` for any known relationship.
    pub fn is_join_filter(&self, key: &str) -> bool {
        self.names.iter().any(|name| {
            key.strip_prefix(name.as_str())
                .is_some_and(|rest| rest.starts_with('.'))
        })
    }

    /// True if `key` is exactly a known relationship name.
    pub fn is_preload_filter(&self, key: &str) -> bool {
        self.names.contains(key)
    }

    pub fn is_relationship_filter(&self, key: &str) -> bool {
        self.is_join_filter(key) || self.is_preload_filter(key)
    }

    pub fn classify(&self, key: &str) -> FilterKind {
        if self.is_join_filter(key) {
            FilterKind::Join
        } else if self.is_preload_filter(key) {
            FilterKind::Preload
        } else {
            FilterKind::Attribute
        }
    }
}

impl<S: Into<String>> FromIterator<S> for Relationships {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self::new(iter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn blog() -> Relationships {
        Relationships::new(["articles", "comments"])
    }

    #[test]
    fn dotted_relationship_key_is_join() {
        let rels = blog();
        assert!(rels.is_join_filter("articles.comments.user"));
        assert!(!rels.is_preload_filter("articles.comments.user"));
        assert_eq!(rels.classify("articles.comments.user"), FilterKind::Join);
    }

    #[test]
    fn exact_relationship_key_is_preload() {
        let rels = blog();
        assert!(!rels.is_join_filter("comments"));
        assert!(rels.is_preload_filter("comments"));
        assert_eq!(rels.classify("comments"), FilterKind::Preload);
    }

    #[test]
    fn plain_key_is_attribute() {
        let rels = blog();
        assert!(!rels.is_relationship_filter("email"));
        assert_eq!(rels.classify("email"), FilterKind::Attribute);
    }

    #[test]
    fn prefix_without_dot_is_not_join() {
        let rels = blog();
        assert!(!rels.is_join_filter("articles_count"));
        assert!(!rels.is_join_filter("commentsx.body"));
    }

    #[test]
    fn dotted_relationship_names_are_skipped() {
        let rels = Relationships::new(["a", "a.b", "", "c,d"]);
        assert_eq!(rels.iter().collect::<Vec<_>>(), vec!["a"]);
        assert!(rels.is_join_filter("a.b"));
        assert!(!rels.is_preload_filter("a.b"));
        assert_eq!(rels.classify("a.b"), FilterKind::Join);
    }

    proptest! {
        #[test]
        fn kinds_partition_keys(
            key in "(articles|comments|email|art)(\\.[a-z]{1,4}){0,2}",
            extra in "(articles|art)(\\.[a-z]{1,4}){0,2}",
        ) {
            let rels = Relationships::new(["articles", "comments", extra.as_str()]);
            let join = rels.is_join_filter(&key);
            let preload = rels.is_preload_filter(&key);
            let attribute = !rels.is_relationship_filter(&key);
            prop_assert_eq!(u8::from(join) + u8::from(preload) + u8::from(attribute), 1);
        }
    }
}
