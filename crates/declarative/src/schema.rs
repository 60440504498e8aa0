//! Schema descriptors
//!
//! A [`Schema`] is the static, ordered declaration of a resource kind's
//! attributes. Every attribute is exactly one of required, optional or
//! computed, may be sensitive, and is either a string or a list of nested
//! objects.

use crate::types::{Diagnostic, Diagnostics, is_unknown_marker};
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use serde_json::Value;

/// Placeholder written in place of sensitive values
pub const REDACTED: &str = "(sensitive)";

/// Who supplies an attribute's value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AttributeMode {
    /// Must be set by the caller
    Required,
    /// May be set by the caller
    Optional,
    /// Never set by the caller; populated after a remote call
    Computed,
}

/// Shape of an attribute's value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AttributeKind {
    String,
    /// Ordered list of objects with the nested attributes
    ListNested { attributes: Attributes },
}

/// Ordered attribute declarations, serialized as a JSON object
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Attributes(Vec<(String, Attribute)>);

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an attribute, replacing any earlier one with the same name
    pub fn with(mut self, name: impl Into<String>, attribute: Attribute) -> Self {
        let name = name.into();
        self.0.retain(|(n, _)| *n != name);
        self.0.push((name, attribute));
        self
    }

    pub fn get(&self, name: &str) -> Option<&Attribute> {
        self.0.iter().find(|(n, _)| n == name).map(|(_, a)| a)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Attribute)> {
        self.0.iter().map(|(n, a)| (n.as_str(), a))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Serialize for Attributes {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, attribute) in &self.0 {
            map.serialize_entry(name, attribute)?;
        }
        map.end()
    }
}

/// A single attribute declaration
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Attribute {
    pub mode: AttributeMode,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub sensitive: bool,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(flatten)]
    pub kind: AttributeKind,
}

impl Attribute {
    fn string(mode: AttributeMode) -> Self {
        Self {
            mode,
            sensitive: false,
            description: String::new(),
            kind: AttributeKind::String,
        }
    }

    pub fn required_string() -> Self {
        Self::string(AttributeMode::Required)
    }

    pub fn optional_string() -> Self {
        Self::string(AttributeMode::Optional)
    }

    pub fn computed_string() -> Self {
        Self::string(AttributeMode::Computed)
    }

    /// A computed list of nested objects
    pub fn computed_list_nested(attributes: Attributes) -> Self {
        Self {
            mode: AttributeMode::Computed,
            sensitive: false,
            description: String::new(),
            kind: AttributeKind::ListNested { attributes },
        }
    }

    /// Mark the attribute as sensitive
    pub fn sensitive(mut self) -> Self {
        self.sensitive = true;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn is_required(&self) -> bool {
        self.mode == AttributeMode::Required
    }

    pub fn is_computed(&self) -> bool {
        self.mode == AttributeMode::Computed
    }
}

/// What a JSON object is being validated as
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Validation {
    /// Caller-authored configuration: computed attributes must not be set
    Config,
    /// A plan or prior state: computed attributes may carry values
    State,
    /// State that is being removed: only value shapes are checked
    Removal,
}

/// Schema for a provider, resource or data source
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Schema {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
    pub attributes: Attributes,
}

impl Schema {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            attributes: Attributes::new(),
        }
    }

    pub fn with_attribute(mut self, name: impl Into<String>, attribute: Attribute) -> Self {
        self.attributes = self.attributes.with(name, attribute);
        self
    }

    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.get(name)
    }

    /// Names of computed attributes, in declaration order
    pub fn computed(&self) -> Vec<&str> {
        self.attributes
            .iter()
            .filter(|(_, a)| a.is_computed())
            .map(|(n, _)| n)
            .collect()
    }

    /// Names of required attributes, in declaration order
    pub fn required(&self) -> Vec<&str> {
        self.attributes
            .iter()
            .filter(|(_, a)| a.is_required())
            .map(|(n, _)| n)
            .collect()
    }

    /// Validate a JSON object against this schema
    ///
    /// Reports unsupported attribute names, missing required attributes,
    /// values of the wrong shape, and (for [`Validation::Config`]) concrete
    /// values supplied for computed attributes.
    pub fn validate(&self, value: &Value, mode: Validation) -> Diagnostics {
        let mut diags = Diagnostics::new();

        let Some(object) = value.as_object() else {
            diags.add_error("Invalid object", format!("Expected a JSON object, got: {value}"));
            return diags;
        };

        for name in object.keys() {
            if self.attribute(name).is_none() {
                diags.push(
                    Diagnostic::error(
                        "Unsupported argument",
                        format!("An argument named \"{name}\" is not expected here."),
                    )
                    .with_attribute(name.clone()),
                );
            }
        }

        for (name, attribute) in self.attributes.iter() {
            let field = object.get(name).unwrap_or(&Value::Null);

            if attribute.is_required() && field.is_null() && mode != Validation::Removal {
                diags.push(
                    Diagnostic::error(
                        "Missing required argument",
                        format!("The argument \"{name}\" is required, but no definition was found."),
                    )
                    .with_attribute(name),
                );
                continue;
            }

            if mode == Validation::Config
                && attribute.is_computed()
                && !field.is_null()
                && !is_unknown_marker(field)
            {
                diags.push(
                    Diagnostic::error(
                        "Invalid configuration for read-only attribute",
                        format!("Cannot set value for attribute \"{name}\"; it is computed."),
                    )
                    .with_attribute(name),
                );
                continue;
            }

            check_kind(name, &attribute.kind, field, &mut diags);
        }

        diags
    }

    /// Copy of `value` with sensitive attributes replaced by [`REDACTED`]
    pub fn redact(&self, value: &Value) -> Value {
        let mut redacted = value.clone();
        if let Some(object) = redacted.as_object_mut() {
            for (name, attribute) in self.attributes.iter() {
                if attribute.sensitive
                    && let Some(field) = object.get_mut(name)
                    && !field.is_null()
                {
                    *field = Value::String(REDACTED.to_string());
                }
            }
        }
        redacted
    }
}

fn check_kind(name: &str, kind: &AttributeKind, field: &Value, diags: &mut Diagnostics) {
    if field.is_null() || is_unknown_marker(field) {
        return;
    }

    match kind {
        AttributeKind::String => {
            if !field.is_string() {
                diags.push(
                    Diagnostic::error(
                        "Incorrect attribute value type",
                        format!("Attribute \"{name}\" must be a string, got: {field}"),
                    )
                    .with_attribute(name),
                );
            }
        }
        AttributeKind::ListNested { attributes } => {
            let Some(items) = field.as_array() else {
                diags.push(
                    Diagnostic::error(
                        "Incorrect attribute value type",
                        format!("Attribute \"{name}\" must be a list, got: {field}"),
                    )
                    .with_attribute(name),
                );
                return;
            };

            for (index, item) in items.iter().enumerate() {
                let path = format!("{name}[{index}]");
                let Some(object) = item.as_object() else {
                    diags.push(
                        Diagnostic::error(
                            "Incorrect attribute value type",
                            format!("Element \"{path}\" must be an object, got: {item}"),
                        )
                        .with_attribute(path),
                    );
                    continue;
                };
                for key in object.keys() {
                    if attributes.get(key).is_none() {
                        diags.push(
                            Diagnostic::error(
                                "Unsupported argument",
                                format!("An argument named \"{key}\" is not expected in \"{path}\"."),
                            )
                            .with_attribute(format!("{path}.{key}")),
                        );
                    }
                }
                for (nested_name, nested) in attributes.iter() {
                    let nested_field = object.get(nested_name).unwrap_or(&Value::Null);
                    check_kind(&format!("{path}.{nested_name}"), &nested.kind, nested_field, diags);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn database_schema() -> Schema {
        Schema::new("Notion database data source")
            .with_attribute("id", Attribute::required_string())
            .with_attribute("url", Attribute::computed_string())
            .with_attribute(
                "properties",
                Attribute::computed_list_nested(
                    Attributes::new()
                        .with("name", Attribute::computed_string())
                        .with("type", Attribute::computed_string()),
                ),
            )
    }

    #[test]
    fn test_attribute_modes() {
        let schema = database_schema();
        assert_eq!(schema.required(), vec!["id"]);
        assert_eq!(schema.computed(), vec!["url", "properties"]);
    }

    #[test]
    fn test_attributes_keep_declaration_order() {
        let json = serde_json::to_string(&database_schema()).unwrap();
        let id = json.find("\"id\"").unwrap();
        let url = json.find("\"url\"").unwrap();
        let properties = json.find("\"properties\"").unwrap();
        assert!(id < url && url < properties);
    }

    #[test]
    fn test_with_replaces_duplicate_name() {
        let attrs = Attributes::new()
            .with("id", Attribute::optional_string())
            .with("id", Attribute::required_string());
        assert_eq!(attrs.len(), 1);
        assert!(attrs.get("id").unwrap().is_required());
    }

    #[test]
    fn test_validate_valid_config() {
        let diags = database_schema().validate(&json!({"id": "example-id"}), Validation::Config);
        assert!(diags.is_empty(), "{diags:?}");
    }

    #[test]
    fn test_validate_missing_required() {
        let diags = database_schema().validate(&json!({"url": null}), Validation::Config);
        assert!(diags.has_error());
        assert_eq!(diags.iter().next().unwrap().attribute.as_deref(), Some("id"));
    }

    #[test]
    fn test_validate_unknown_attribute() {
        let diags = database_schema().validate(&json!({"id": "x", "colour": "red"}), Validation::Config);
        assert_eq!(diags.len(), 1);
        assert_eq!(diags.iter().next().unwrap().summary, "Unsupported argument");
    }

    #[test]
    fn test_validate_computed_set_in_config() {
        let schema = database_schema();
        let value = json!({"id": "x", "url": "https://example.com"});

        assert!(schema.validate(&value, Validation::Config).has_error());
        assert!(!schema.validate(&value, Validation::State).has_error());

        let unknown = json!({"id": "x", "url": {"unknown": true}});
        assert!(!schema.validate(&unknown, Validation::Config).has_error());
    }

    #[test]
    fn test_validate_nested_list_shape() {
        let schema = database_schema();
        let good = json!({"id": "x", "properties": [{"name": "Name", "type": "title"}]});
        assert!(schema.validate(&good, Validation::State).is_empty());

        let not_list = json!({"id": "x", "properties": "Name"});
        assert!(schema.validate(&not_list, Validation::State).has_error());

        let bad_key = json!({"id": "x", "properties": [{"name": "Name", "kind": "title"}]});
        let diags = schema.validate(&bad_key, Validation::State);
        assert_eq!(
            diags.iter().next().unwrap().attribute.as_deref(),
            Some("properties[0].kind")
        );
    }

    #[test]
    fn test_validate_wrong_scalar_type() {
        let diags = database_schema().validate(&json!({"id": 42}), Validation::Config);
        assert_eq!(diags.iter().next().unwrap().summary, "Incorrect attribute value type");
    }

    #[test]
    fn test_validate_removal_skips_required() {
        let schema = database_schema();
        assert!(schema.validate(&json!({}), Validation::Removal).is_empty());
        assert!(schema.validate(&json!({}), Validation::State).has_error());
        assert!(schema.validate(&json!({"id": 42}), Validation::Removal).has_error());
    }

    #[test]
    fn test_validate_non_object() {
        assert!(database_schema().validate(&json!([1, 2]), Validation::State).has_error());
    }

    #[test]
    fn test_redact_sensitive() {
        let schema = Schema::new("")
            .with_attribute("token", Attribute::optional_string().sensitive())
            .with_attribute("name", Attribute::optional_string());

        let redacted = schema.redact(&json!({"token": "hunter2", "name": "x"}));
        assert_eq!(redacted, json!({"token": REDACTED, "name": "x"}));

        let unset = schema.redact(&json!({"token": null}));
        assert_eq!(unset, json!({"token": null}));
    }
}
