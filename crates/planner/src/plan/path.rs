//! Grouping of comma-separated dotted paths by their leading segment.
//!
//! Used for `include` strings and for forwarding nested relationship paths:
//! `"a,a.b,a.b.c,a.d,e"` groups into `a → "b,b.c,d"` and `e → ""`.

/// Paths grouped by leading segment, in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupedPaths {
    groups: Vec<(String, String)>,
}

impl GroupedPaths {
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// Remainder paths for `head`, comma-joined.
    pub fn get(&self, head: &str) -> Option<&str> {
        self.groups
            .iter()
            .find(|(h, _)| h == head)
            .map(|(_, tail)| tail.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.groups.iter().map(|(h, t)| (h.as_str(), t.as_str()))
    }

    /// Flatten the groups back into a comma-separated path list.
    pub fn to_csv(&self) -> String {
        let mut paths = Vec::new();
        for (head, tail) in &self.groups {
            if tail.is_empty() {
                paths.push(head.clone());
            } else {
                paths.extend(tail.split(',').map(|t| format!("{head}.{t}")));
            }
        }
        paths.join(",")
    }
}

impl IntoIterator for GroupedPaths {
    type Item = (String, String);
    type IntoIter = std::vec::IntoIter<(String, String)>;

    fn into_iter(self) -> Self::IntoIter {
        self.groups.into_iter()
    }
}

/// Group a comma-separated dotted path list by leading segment.
pub fn group(paths: &str) -> GroupedPaths {
    let mut groups: Vec<(String, Vec<&str>)> = Vec::new();

    for path in paths.split(',').filter(|p| !p.is_empty()) {
        let (head, tail) = path.split_once('.').unwrap_or((path, ""));
        match groups.iter_mut().find(|(h, _)| h == head) {
            Some((_, tails)) => tails.push(tail),
            None => groups.push((head.to_string(), vec![tail])),
        }
    }

    GroupedPaths {
        groups: groups
            .into_iter()
            .map(|(head, tails)| {
                let tail = tails
                    .into_iter()
                    .filter(|t| !t.is_empty())
                    .collect::<Vec<_>>()
                    .join(",");
                (head, tail)
            })
            .collect(),
    }
}

/// Number of segments in the deepest path of a comma-separated list.
pub fn max_depth(paths: &str) -> usize {
    paths
        .split(',')
        .filter(|p| !p.is_empty())
        .map(|p| p.split('.').count())
        .max()
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn groups_by_leading_segment() {
        let grouped = group("a,a.b,a.b.c,a.d,e");
        let pairs: Vec<(&str, &str)> = grouped.iter().collect();
        assert_eq!(pairs, vec![("a", "b,b.c,d"), ("e", "")]);
    }

    #[test]
    fn empty_input_yields_no_groups() {
        assert!(group("").is_empty());
        assert!(group(",,").is_empty());
    }

    #[test]
    fn duplicate_heads_merge() {
        let grouped = group("author.company,comments,author.avatar");
        assert_eq!(grouped.len(), 2);
        assert_eq!(grouped.get("author"), Some("company,avatar"));
        assert_eq!(grouped.get("comments"), Some(""));
    }

    #[test]
    fn to_csv_flattens() {
        assert_eq!(group("a,a.b,a.b.c,a.d,e").to_csv(), "a.b,a.b.c,a.d,e");
    }

    #[test]
    fn depth_counts_segments() {
        assert_eq!(max_depth(""), 0);
        assert_eq!(max_depth("a"), 1);
        assert_eq!(max_depth("a,b.c.d,e.f"), 3);
    }

    fn arb_paths() -> impl Strategy<Value = String> {
        let segment = prop_oneof![Just("a"), Just("b"), Just("c"), Just("d")];
        let path = prop::collection::vec(segment, 1..4).prop_map(|s| s.join("."));
        prop::collection::vec(path, 0..8).prop_map(|p| p.join(","))
    }

    proptest! {
        #[test]
        fn regrouping_is_stable(paths in arb_paths()) {
            let grouped = group(&paths);
            prop_assert_eq!(group(&grouped.to_csv()), grouped);
        }
    }
}
