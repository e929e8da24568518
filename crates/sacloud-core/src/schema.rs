//! Declarative schemas and resource attribute bags
//!
//! The host orchestrator hands every operation a [`ResourceData`]: an
//! optional id plus a JSON object of attributes. Each handler publishes a
//! [`Schema`]; [`Schema::prepare`] applies defaults and rejects invalid
//! attributes before any API call is made.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::error::{Error, Result};

/// Attribute value kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttrKind {
    String,
    Int,
    Bool,
    /// List of strings
    List,
    /// Nested object (e.g. `filter`)
    Block,
    /// List of nested objects (computed only)
    BlockList,
}

impl AttrKind {
    fn accepts(&self, value: &Value) -> bool {
        match self {
            AttrKind::String => value.is_string(),
            AttrKind::Int => value.is_i64() || value.is_u64(),
            AttrKind::Bool => value.is_boolean(),
            AttrKind::List => value
                .as_array()
                .is_some_and(|items| items.iter().all(Value::is_string)),
            AttrKind::Block => value.is_object(),
            AttrKind::BlockList => value
                .as_array()
                .is_some_and(|items| items.iter().all(Value::is_object)),
        }
    }
}

/// One attribute of a schema
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attribute {
    pub kind: AttrKind,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub optional: bool,
    #[serde(default)]
    pub computed: bool,
    /// Changing the attribute requires replacing the resource
    #[serde(default)]
    pub force_new: bool,
    #[serde(default)]
    pub sensitive: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    /// Accepted values for string attributes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub one_of: Option<Vec<String>>,
    /// Inclusive (min, max) bounds: string length or integer value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub between: Option<(i64, i64)>,
}

impl Attribute {
    fn of(kind: AttrKind) -> Self {
        Self {
            kind,
            required: false,
            optional: false,
            computed: false,
            force_new: false,
            sensitive: false,
            default: None,
            one_of: None,
            between: None,
        }
    }

    pub fn required(kind: AttrKind) -> Self {
        Self {
            required: true,
            ..Self::of(kind)
        }
    }

    pub fn optional(kind: AttrKind) -> Self {
        Self {
            optional: true,
            ..Self::of(kind)
        }
    }

    pub fn computed(kind: AttrKind) -> Self {
        Self {
            computed: true,
            ..Self::of(kind)
        }
    }

    pub fn force_new(mut self) -> Self {
        self.force_new = true;
        self
    }

    pub fn sensitive(mut self) -> Self {
        self.sensitive = true;
        self
    }

    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn one_of(mut self, words: &[&str]) -> Self {
        self.one_of = Some(words.iter().map(|w| w.to_string()).collect());
        self
    }

    pub fn between(mut self, min: i64, max: i64) -> Self {
        self.between = Some((min, max));
        self
    }

    fn validate(&self, name: &str, value: &Value) -> Result<()> {
        if !self.kind.accepts(value) {
            return Err(Error::invalid_input(format!(
                "attribute '{}' must be of kind {:?}, got {}",
                name, self.kind, value
            )));
        }

        if let (Some(words), Some(s)) = (&self.one_of, value.as_str())
            && !words.iter().any(|w| w == s)
        {
            return Err(Error::invalid_input(format!(
                "attribute '{}' must be one of [{}], got '{}'",
                name,
                words.join(" "),
                s
            )));
        }

        if let Some((min, max)) = self.between {
            let measured = match value {
                Value::String(s) => Some(s.chars().count() as i64),
                Value::Number(n) => n.as_i64(),
                _ => None,
            };
            if let Some(m) = measured
                && !(min..=max).contains(&m)
            {
                return Err(Error::invalid_input(format!(
                    "attribute '{}' must be between {} and {}, got {}",
                    name, min, max, m
                )));
            }
        }

        Ok(())
    }
}

/// Schema of a resource or data source
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    pub attributes: BTreeMap<String, Attribute>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an attribute
    pub fn with(mut self, name: &str, attribute: Attribute) -> Self {
        self.attributes.insert(name.to_string(), attribute);
        self
    }

    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.get(name)
    }

    /// Names of attributes whose change forces a replacement
    pub fn force_new_attributes(&self) -> Vec<&str> {
        self.attributes
            .iter()
            .filter(|(_, a)| a.force_new)
            .map(|(n, _)| n.as_str())
            .collect()
    }

    /// Apply defaults and validate user-supplied attributes
    ///
    /// Unknown attributes are rejected. Computed-only attributes are passed
    /// through untouched so that prior state can be handed back in.
    pub fn prepare(&self, d: &mut ResourceData) -> Result<()> {
        for key in d.attributes.keys() {
            if !self.attributes.contains_key(key) {
                return Err(Error::invalid_input(format!("unknown attribute '{}'", key)));
            }
        }

        for (name, attribute) in &self.attributes {
            match d.attributes.get(name) {
                Some(value) if !value.is_null() => {
                    if attribute.required || attribute.optional {
                        attribute.validate(name, value)?;
                    }
                }
                _ => {
                    if attribute.required {
                        return Err(Error::invalid_input(format!(
                            "attribute '{}' is required",
                            name
                        )));
                    }
                    if let Some(ref default) = attribute.default {
                        d.attributes.insert(name.clone(), default.clone());
                    }
                }
            }
        }

        Ok(())
    }

    /// Attributes whose value differs between `prior` and `planned` and that
    /// force a replacement
    pub fn replacement_reasons(&self, prior: &ResourceData, planned: &ResourceData) -> Vec<String> {
        self.force_new_attributes()
            .into_iter()
            .filter(|name| prior.get(name) != planned.get(name))
            .map(str::to_string)
            .collect()
    }
}

/// Attribute bag of a single resource instance
///
/// Getters follow the host's conventions: a missing attribute reads as the
/// zero value of its kind, and the `get_ok_*` variants return `None` for
/// both missing and zero values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    #[serde(default)]
    attributes: Map<String, Value>,
}

impl ResourceData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create from an attribute object
    pub fn from_attributes(attributes: Map<String, Value>) -> Self {
        Self {
            id: None,
            attributes,
        }
    }

    /// Builder-style id setter
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.set_id(id);
        self
    }

    /// Builder-style attribute setter
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.set(key, value);
        self
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// Set the id; an empty id marks the resource as gone
    pub fn set_id(&mut self, id: impl Into<String>) {
        let id = id.into();
        self.id = if id.is_empty() { None } else { Some(id) };
    }

    /// The id, or an invalid-input error when absent
    pub fn require_id(&self) -> Result<&str> {
        self.id()
            .ok_or_else(|| Error::invalid_input("resource id is not set"))
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }

    pub fn set(&mut self, key: &str, value: impl Into<Value>) {
        self.attributes.insert(key.to_string(), value.into());
    }

    /// String attribute, empty when absent
    pub fn get_string(&self, key: &str) -> String {
        self.get(key)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    }

    /// Non-empty string attribute
    pub fn get_ok_string(&self, key: &str) -> Option<String> {
        self.get(key)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    }

    /// Integer attribute, zero when absent
    pub fn get_int(&self, key: &str) -> i64 {
        self.get(key).and_then(Value::as_i64).unwrap_or_default()
    }

    /// Non-zero integer attribute
    pub fn get_ok_int(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(Value::as_i64).filter(|v| *v != 0)
    }

    /// Boolean attribute, false when absent
    pub fn get_bool(&self, key: &str) -> bool {
        self.get(key).and_then(Value::as_bool).unwrap_or_default()
    }

    /// List-of-strings attribute, empty when absent
    pub fn get_string_list(&self, key: &str) -> Vec<String> {
        self.get(key)
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn attributes(&self) -> &Map<String, Value> {
        &self.attributes
    }

    pub fn into_parts(self) -> (Option<String>, Map<String, Value>) {
        (self.id, self.attributes)
    }
}

/// Convert an attribute integer into a narrower unsigned type
pub fn int_to<T: TryFrom<i64>>(name: &str, value: i64) -> Result<T> {
    T::try_from(value)
        .map_err(|_| Error::invalid_input(format!("attribute '{}' out of range: {}", name, value)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record_schema() -> Schema {
        Schema::new()
            .with("name", Attribute::required(AttrKind::String).force_new())
            .with(
                "type",
                Attribute::required(AttrKind::String).one_of(&["A", "MX"]),
            )
            .with("ttl", Attribute::optional(AttrKind::Int).with_default(3600))
            .with("fingerprint", Attribute::computed(AttrKind::String))
            .with(
                "pass_phrase",
                Attribute::optional(AttrKind::String).between(8, 64).sensitive(),
            )
    }

    #[test]
    fn prepare_applies_defaults() {
        let mut d = ResourceData::new().with("name", "www").with("type", "A");
        record_schema().prepare(&mut d).unwrap();
        assert_eq!(d.get_int("ttl"), 3600);
    }

    #[test]
    fn prepare_keeps_explicit_values() {
        let mut d = ResourceData::new()
            .with("name", "www")
            .with("type", "A")
            .with("ttl", 60);
        record_schema().prepare(&mut d).unwrap();
        assert_eq!(d.get_int("ttl"), 60);
    }

    #[test]
    fn prepare_rejects_missing_required() {
        let mut d = ResourceData::new().with("type", "A");
        let err = record_schema().prepare(&mut d).unwrap_err();
        assert!(err.to_string().contains("'name' is required"));
    }

    #[test]
    fn prepare_rejects_words_outside_the_set() {
        let mut d = ResourceData::new().with("name", "www").with("type", "PTR");
        let err = record_schema().prepare(&mut d).unwrap_err();
        assert!(err.to_string().contains("must be one of [A MX]"));
    }

    #[test]
    fn prepare_rejects_wrong_kind_and_unknown_keys() {
        let mut d = ResourceData::new()
            .with("name", "www")
            .with("type", "A")
            .with("ttl", "sixty");
        assert!(record_schema().prepare(&mut d).is_err());

        let mut d = ResourceData::new()
            .with("name", "www")
            .with("type", "A")
            .with("colour", "blue");
        assert!(record_schema().prepare(&mut d).is_err());
    }

    #[test]
    fn prepare_checks_length_bounds() {
        let mut d = ResourceData::new()
            .with("name", "www")
            .with("type", "A")
            .with("pass_phrase", "short");
        assert!(record_schema().prepare(&mut d).is_err());
    }

    #[test]
    fn computed_attributes_pass_through() {
        let mut d = ResourceData::new()
            .with("name", "www")
            .with("type", "A")
            .with("fingerprint", "aa:bb");
        record_schema().prepare(&mut d).unwrap();
        assert_eq!(d.get_string("fingerprint"), "aa:bb");
    }

    #[test]
    fn replacement_reasons_list_changed_force_new_attributes() {
        let prior = ResourceData::new().with("name", "www").with("ttl", 60);
        let planned = ResourceData::new().with("name", "api").with("ttl", 120);
        assert_eq!(
            record_schema().replacement_reasons(&prior, &planned),
            vec!["name".to_string()]
        );
    }

    #[test]
    fn getters_use_zero_values() {
        let d = ResourceData::new()
            .with("priority", 0)
            .with("tags", json!(["a", "b"]));

        assert_eq!(d.get_string("missing"), "");
        assert_eq!(d.get_ok_string("missing"), None);
        assert_eq!(d.get_int("priority"), 0);
        assert_eq!(d.get_ok_int("priority"), None);
        assert!(!d.get_bool("missing"));
        assert_eq!(d.get_string_list("tags"), vec!["a", "b"]);
    }

    #[test]
    fn empty_id_clears() {
        let mut d = ResourceData::new().with_id("dnsrecord-1");
        assert_eq!(d.id(), Some("dnsrecord-1"));
        d.set_id("");
        assert_eq!(d.id(), None);
        assert!(d.require_id().is_err());
    }

    #[test]
    fn int_to_checks_range() {
        assert_eq!(int_to::<u16>("priority", 10).unwrap(), 10);
        assert!(int_to::<u16>("priority", 70000).is_err());
        assert!(int_to::<u32>("ttl", -1).is_err());
    }
}
