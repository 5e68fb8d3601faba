//! Column naming convention shared by the flattener and the post-processors.
//!
//! A derived column is named `<parent><sep><key>`, where `key` is either an
//! object key or a 1-based sequence position. Cleanup and pivot read names
//! back through the same helpers so the two sides cannot drift apart.

use crate::error::{Error, Result};

/// Index rendered for the first element of a sequence.
const FIRST_INDEX: usize = 1;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Naming {
    separator: String,
}

impl Naming {
    /// Fails with `InvalidInput` for an empty separator, which would make
    /// every trailing `1` look like a sequence index.
    pub fn new(separator: impl Into<String>) -> Result<Self> {
        let separator = separator.into();
        if separator.is_empty() {
            return Err(Error::InvalidInput("column separator must not be empty".to_string()));
        }
        Ok(Naming { separator })
    }

    pub fn separator(&self) -> &str {
        &self.separator
    }

    /// Name of the column derived from `parent` for sub-key `key`.
    pub fn child(&self, parent: &str, key: &str) -> String {
        format!("{}{}{}", parent, self.separator, key)
    }

    /// Sub-key for the element at zero-based `offset` of a sequence.
    pub fn index_key(&self, offset: usize) -> String {
        (offset + FIRST_INDEX).to_string()
    }

    /// Suffix appended when a sequence contributes its first element.
    pub fn singleton_marker(&self) -> String {
        format!("{}{}", self.separator, FIRST_INDEX)
    }

    /// `name` without its trailing singleton marker, if it has one.
    pub fn strip_singleton<'a>(&self, name: &'a str) -> Option<&'a str> {
        name.strip_suffix(self.singleton_marker().as_str())
            .filter(|base| !base.is_empty())
    }

    /// Whether any name in `names` is, or descends from, the second
    /// positional sibling of `base`.
    pub fn has_second_sibling<'a, I>(&self, base: &str, names: I) -> bool
    where
        I: IntoIterator<Item = &'a str>,
    {
        let sibling = self.child(base, &self.index_key(FIRST_INDEX));
        let nested_prefix = format!("{}{}", sibling, self.separator);
        names
            .into_iter()
            .any(|name| name == sibling || name.starts_with(&nested_prefix))
    }

    /// Proper suffixes of `name` that start right after a separator,
    /// longest first.
    pub fn suffixes<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        let skip = self.separator.len();
        name.match_indices(self.separator.as_str())
            .map(move |(idx, _)| &name[idx + skip..])
            .filter(|suffix| !suffix.is_empty())
    }
}

impl Default for Naming {
    fn default() -> Self {
        Naming {
            separator: "_".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_child_and_index() {
        let naming = Naming::default();
        assert_eq!(naming.child("loc", "lat"), "loc_lat");
        assert_eq!(naming.child("tags", &naming.index_key(0)), "tags_1");
        assert_eq!(naming.child("tags", &naming.index_key(1)), "tags_2");
    }

    #[test]
    fn test_strip_singleton() {
        let naming = Naming::default();
        assert_eq!(naming.strip_singleton("tags_1"), Some("tags"));
        assert_eq!(naming.strip_singleton("tags_11"), None);
        assert_eq!(naming.strip_singleton("pm1"), None);
        assert_eq!(naming.strip_singleton("_1"), None);
    }

    #[test]
    fn test_second_sibling() {
        let naming = Naming::default();
        let names = ["a_1", "a_2_x", "b_1"];
        assert!(naming.has_second_sibling("a", names.iter().copied()));
        assert!(!naming.has_second_sibling("b", names.iter().copied()));
    }

    #[test]
    fn test_custom_separator() {
        let naming = Naming::new(".").unwrap();
        assert_eq!(naming.child("model", "params"), "model.params");
        assert_eq!(naming.strip_singleton("tags.1"), Some("tags"));
    }

    #[test]
    fn test_suffixes_longest_first() {
        let naming = Naming::default();
        let suffixes: Vec<&str> = naming.suffixes("coef_no2_ae").collect();
        assert_eq!(suffixes, vec!["no2_ae", "ae"]);
        assert_eq!(naming.suffixes("pm1").count(), 0);
    }

    #[test]
    fn test_empty_separator_is_rejected() {
        assert!(matches!(Naming::new(""), Err(Error::InvalidInput(_))));
    }
}
