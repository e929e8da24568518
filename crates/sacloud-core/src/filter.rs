//! Search filters for data sources
//!
//! Data sources accept a `filter` block:
//!
//! ```json
//! { "filter": { "id": "113000000001", "names": ["example"], "tags": ["prod"] } }
//! ```
//!
//! The HTTP backend translates a [`SearchFilter`] into the API `Filter`
//! object; the in-memory backend evaluates it with [`SearchFilter::matches`].
//! Both follow the API semantics: every name is a case-insensitive partial
//! match and every tag must be present.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::schema::ResourceData;

/// Attribute name of the filter block in data source schemas
pub const FILTER_ATTR_NAME: &str = "filter";

/// Default page size for find requests
pub const DEFAULT_FIND_COUNT: usize = 100;

/// Conditions narrowing a find request
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchFilter {
    /// Exact resource id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Partial name matches, all must hit
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub names: Vec<String>,
    /// Tags, all must be present
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

impl SearchFilter {
    /// True when no condition is set
    pub fn is_empty(&self) -> bool {
        self.id.is_none() && self.names.is_empty() && self.tags.is_empty()
    }

    /// Evaluate the filter against a resource
    pub fn matches(&self, id: &str, name: &str, tags: &[String]) -> bool {
        if let Some(ref want) = self.id
            && want != id
        {
            return false;
        }

        let name = name.to_lowercase();
        if !self
            .names
            .iter()
            .all(|n| name.contains(&n.to_lowercase()))
        {
            return false;
        }

        self.tags.iter().all(|t| tags.contains(t))
    }
}

/// A find request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FindCondition {
    pub filter: SearchFilter,
    pub count: usize,
}

impl FindCondition {
    pub fn new(filter: SearchFilter) -> Self {
        Self {
            filter,
            count: DEFAULT_FIND_COUNT,
        }
    }
}

impl Default for FindCondition {
    fn default() -> Self {
        Self::new(SearchFilter::default())
    }
}

/// Build a [`SearchFilter`] from the `filter` block of a data source
///
/// A missing block yields an empty filter (matches everything).
pub fn expand_search_filter(d: &ResourceData) -> Result<SearchFilter> {
    match d.get(FILTER_ATTR_NAME) {
        None => Ok(SearchFilter::default()),
        Some(value) if value.is_null() => Ok(SearchFilter::default()),
        Some(value) => {
            let mut filter: SearchFilter = serde_json::from_value(value.clone())
                .map_err(|e| Error::invalid_input(format!("invalid filter block: {}", e)))?;
            filter.id = filter.id.filter(|id| !id.is_empty());
            filter.names.retain(|n| !n.is_empty());
            filter.tags.retain(|t| !t.is_empty());
            Ok(filter)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn tags(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn empty_filter_matches_everything() {
        let filter = SearchFilter::default();
        assert!(filter.is_empty());
        assert!(filter.matches("1", "anything", &[]));
    }

    #[test]
    fn names_are_partial_case_insensitive_and_all_required() {
        let filter = SearchFilter {
            names: vec!["Example".into(), "com".into()],
            ..Default::default()
        };

        assert!(filter.matches("1", "www.example.com", &[]));
        assert!(!filter.matches("1", "www.example.net", &[]));
    }

    #[test]
    fn every_tag_must_be_present() {
        let filter = SearchFilter {
            tags: tags(&["tag1", "tag3"]),
            ..Default::default()
        };

        assert!(filter.matches("1", "router", &tags(&["tag1", "tag2", "tag3"])));
        assert!(!filter.matches("1", "router", &tags(&["tag1", "tag2"])));
    }

    #[test]
    fn id_is_exact() {
        let filter = SearchFilter {
            id: Some("113000000001".into()),
            ..Default::default()
        };

        assert!(filter.matches("113000000001", "a", &[]));
        assert!(!filter.matches("1130000000010", "a", &[]));
    }

    #[test]
    fn expand_drops_blank_entries() {
        let mut d = ResourceData::new();
        d.set(
            FILTER_ATTR_NAME,
            json!({"id": "", "names": ["", "foo"], "tags": ["prod", ""]}),
        );

        let filter = expand_search_filter(&d).unwrap();
        assert_eq!(filter.id, None);
        assert_eq!(filter.names, vec!["foo".to_string()]);
        assert_eq!(filter.tags, vec!["prod".to_string()]);
    }

    #[test]
    fn expand_rejects_malformed_block() {
        let mut d = ResourceData::new();
        d.set(FILTER_ATTR_NAME, json!({"names": "not-a-list"}));

        assert!(matches!(
            expand_search_filter(&d),
            Err(Error::InvalidInput(_))
        ));
    }
}
