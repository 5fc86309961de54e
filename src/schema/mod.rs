//! JSON Schema Subset
//!
//! `ToolSchema` (`types::tool`) and `ElicitationSchema` (`types::elicitation`)
//! each hand-roll a thin, single-purpose slice of JSON Schema. This module
//! generalizes both into one closed `SchemaNode` sum type plus a validator,
//! for callers (the server façade's registries, primarily) that need to
//! check a `Value` against an arbitrary schema rather than just describe an
//! object's top-level properties.
//!
//! Deliberately closed, not a full JSON Schema implementation: no `$ref`,
//! no external vocabulary, no format assertions beyond what's listed here.
//! That scope matches what both of the hand-rolled originals actually needed.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A JSON Schema node, restricted to the subset MCP tool/elicitation
/// schemas actually use.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SchemaNode {
    String {
        #[serde(skip_serializing_if = "Option::is_none")]
        min_length: Option<usize>,
        #[serde(skip_serializing_if = "Option::is_none")]
        max_length: Option<usize>,
        #[serde(skip_serializing_if = "Option::is_none")]
        format: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pattern: Option<String>,
    },
    Number {
        #[serde(skip_serializing_if = "Option::is_none")]
        minimum: Option<f64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        maximum: Option<f64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        exclusive_minimum: Option<f64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        exclusive_maximum: Option<f64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        multiple_of: Option<f64>,
    },
    Integer {
        #[serde(skip_serializing_if = "Option::is_none")]
        minimum: Option<i64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        maximum: Option<i64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        exclusive_minimum: Option<i64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        exclusive_maximum: Option<i64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        multiple_of: Option<i64>,
    },
    Boolean,
    Null,
    Array {
        items: Box<SchemaNode>,
        #[serde(skip_serializing_if = "Option::is_none")]
        min_items: Option<usize>,
        #[serde(skip_serializing_if = "Option::is_none")]
        max_items: Option<usize>,
        #[serde(skip_serializing_if = "Option::is_none")]
        unique_items: Option<bool>,
    },
    Object {
        #[serde(default)]
        properties: HashMap<String, SchemaNode>,
        #[serde(default)]
        required: Vec<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        additional_properties: Option<bool>,
        #[serde(default, skip_serializing_if = "HashMap::is_empty")]
        dependent_required: HashMap<String, Vec<String>>,
    },
    #[serde(rename = "enum")]
    Enum { values: Vec<Value> },
    AllOf {
        schemas: Vec<SchemaNode>,
    },
    AnyOf {
        schemas: Vec<SchemaNode>,
    },
    OneOf {
        schemas: Vec<SchemaNode>,
    },
    Not {
        schema: Box<SchemaNode>,
    },
    Any,
}

/// A validation failure, with a JSON-pointer-like path to the offending
/// value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("at {path}: {reason}")]
pub struct ValidationError {
    pub path: String,
    pub reason: String,
}

impl ValidationError {
    fn new(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Render as the single-line `"{reason} (at {path})"` message the wire
    /// protocol's `InvalidParams` error uses.
    pub fn to_invalid_params_message(&self) -> String {
        let path = if self.path.is_empty() { "/" } else { &self.path };
        format!("{} (at {})", self.reason, path)
    }
}

impl SchemaNode {
    /// A bare string schema with no constraints.
    pub fn string() -> Self {
        SchemaNode::String { min_length: None, max_length: None, format: None, pattern: None }
    }

    /// A bare number schema with no constraints.
    pub fn number() -> Self {
        SchemaNode::Number {
            minimum: None,
            maximum: None,
            exclusive_minimum: None,
            exclusive_maximum: None,
            multiple_of: None,
        }
    }

    /// A bare integer schema with no constraints.
    pub fn integer() -> Self {
        SchemaNode::Integer {
            minimum: None,
            maximum: None,
            exclusive_minimum: None,
            exclusive_maximum: None,
            multiple_of: None,
        }
    }

    /// An array schema with the given item schema and no size constraints.
    pub fn array(items: SchemaNode) -> Self {
        SchemaNode::Array { items: Box::new(items), min_items: None, max_items: None, unique_items: None }
    }

    /// An object schema with the given properties and required names.
    pub fn object(properties: HashMap<String, SchemaNode>, required: Vec<String>) -> Self {
        SchemaNode::Object {
            properties,
            required,
            additional_properties: None,
            dependent_required: HashMap::new(),
        }
    }

    /// Validate `value` against this schema, returning the first violation
    /// encountered in depth-first, property-declaration order.
    pub fn validate(&self, value: &Value) -> Result<(), ValidationError> {
        self.validate_at(value, "")
    }

    fn validate_at(&self, value: &Value, path: &str) -> Result<(), ValidationError> {
        match self {
            SchemaNode::Any => Ok(()),
            SchemaNode::String { min_length, max_length, pattern, .. } => {
                let s = value
                    .as_str()
                    .ok_or_else(|| ValidationError::new(path, "Expected string"))?;
                if let Some(min) = min_length {
                    if s.len() < *min {
                        return Err(ValidationError::new(path, format!("shorter than minLength {min}")));
                    }
                }
                if let Some(max) = max_length {
                    if s.len() > *max {
                        return Err(ValidationError::new(path, format!("longer than maxLength {max}")));
                    }
                }
                if let Some(pattern) = pattern {
                    let re = regex::Regex::new(pattern)
                        .map_err(|e| ValidationError::new(path, format!("invalid pattern {pattern}: {e}")))?;
                    if !re.is_match(s) {
                        return Err(ValidationError::new(path, format!("does not match pattern {pattern}")));
                    }
                }
                Ok(())
            }
            SchemaNode::Number { minimum, maximum, exclusive_minimum, exclusive_maximum, multiple_of } => {
                let n = value
                    .as_f64()
                    .ok_or_else(|| ValidationError::new(path, "Expected number"))?;
                if let Some(min) = minimum {
                    if n < *min {
                        return Err(ValidationError::new(path, format!("less than minimum {min}")));
                    }
                }
                if let Some(max) = maximum {
                    if n > *max {
                        return Err(ValidationError::new(path, format!("greater than maximum {max}")));
                    }
                }
                if let Some(min) = exclusive_minimum {
                    if n <= *min {
                        return Err(ValidationError::new(path, format!("not greater than exclusiveMinimum {min}")));
                    }
                }
                if let Some(max) = exclusive_maximum {
                    if n >= *max {
                        return Err(ValidationError::new(path, format!("not less than exclusiveMaximum {max}")));
                    }
                }
                if let Some(step) = multiple_of {
                    if *step != 0.0 && (n / step).fract().abs() > f64::EPSILON {
                        return Err(ValidationError::new(path, format!("not a multiple of {step}")));
                    }
                }
                Ok(())
            }
            SchemaNode::Integer { minimum, maximum, exclusive_minimum, exclusive_maximum, multiple_of } => {
                let n = value
                    .as_i64()
                    .ok_or_else(|| ValidationError::new(path, "Expected integer"))?;
                if let Some(min) = minimum {
                    if n < *min {
                        return Err(ValidationError::new(path, format!("less than minimum {min}")));
                    }
                }
                if let Some(max) = maximum {
                    if n > *max {
                        return Err(ValidationError::new(path, format!("greater than maximum {max}")));
                    }
                }
                if let Some(min) = exclusive_minimum {
                    if n <= *min {
                        return Err(ValidationError::new(path, format!("not greater than exclusiveMinimum {min}")));
                    }
                }
                if let Some(max) = exclusive_maximum {
                    if n >= *max {
                        return Err(ValidationError::new(path, format!("not less than exclusiveMaximum {max}")));
                    }
                }
                if let Some(step) = multiple_of {
                    if *step != 0 && n % step != 0 {
                        return Err(ValidationError::new(path, format!("not a multiple of {step}")));
                    }
                }
                Ok(())
            }
            SchemaNode::Boolean => {
                value
                    .as_bool()
                    .ok_or_else(|| ValidationError::new(path, "Expected boolean"))?;
                Ok(())
            }
            SchemaNode::Null => {
                if !value.is_null() {
                    return Err(ValidationError::new(path, "Expected null"));
                }
                Ok(())
            }
            SchemaNode::Array { items, min_items, max_items, unique_items } => {
                let arr = value
                    .as_array()
                    .ok_or_else(|| ValidationError::new(path, "Expected array"))?;
                if let Some(min) = min_items {
                    if arr.len() < *min {
                        return Err(ValidationError::new(path, format!("fewer than minItems {min}")));
                    }
                }
                if let Some(max) = max_items {
                    if arr.len() > *max {
                        return Err(ValidationError::new(path, format!("more than maxItems {max}")));
                    }
                }
                if unique_items.unwrap_or(false) {
                    for (i, a) in arr.iter().enumerate() {
                        if arr[..i].iter().any(|b| b == a) {
                            return Err(ValidationError::new(path, "items are not unique"));
                        }
                    }
                }
                for (i, element) in arr.iter().enumerate() {
                    items.validate_at(element, &format!("{path}/{i}"))?;
                }
                Ok(())
            }
            SchemaNode::Object { properties, required, additional_properties, dependent_required } => {
                let obj = value
                    .as_object()
                    .ok_or_else(|| ValidationError::new(path, "Expected object"))?;
                for name in required {
                    if !obj.contains_key(name) {
                        return Err(ValidationError::new(path, format!("missing required property \"{name}\"")));
                    }
                }
                for (name, node) in properties {
                    if let Some(v) = obj.get(name) {
                        node.validate_at(v, &format!("{path}/{name}"))?;
                    }
                }
                if additional_properties == &Some(false) {
                    for name in obj.keys() {
                        if !properties.contains_key(name) {
                            return Err(ValidationError::new(path, format!("unexpected additional property \"{name}\"")));
                        }
                    }
                }
                for (trigger, deps) in dependent_required {
                    if obj.contains_key(trigger) {
                        for dep in deps {
                            if !obj.contains_key(dep) {
                                return Err(ValidationError::new(
                                    path,
                                    format!("\"{trigger}\" requires \"{dep}\" to also be present"),
                                ));
                            }
                        }
                    }
                }
                Ok(())
            }
            SchemaNode::Enum { values } => {
                if values.iter().any(|v| v == value) {
                    Ok(())
                } else {
                    Err(ValidationError::new(path, "value not in enum"))
                }
            }
            SchemaNode::AllOf { schemas } => {
                for schema in schemas {
                    schema.validate_at(value, path)?;
                }
                Ok(())
            }
            SchemaNode::AnyOf { schemas } => {
                if schemas.iter().any(|s| s.validate_at(value, path).is_ok()) {
                    Ok(())
                } else {
                    Err(ValidationError::new(path, "matched none of anyOf"))
                }
            }
            SchemaNode::OneOf { schemas } => {
                let matches = schemas.iter().filter(|s| s.validate_at(value, path).is_ok()).count();
                if matches == 1 {
                    Ok(())
                } else {
                    Err(ValidationError::new(path, format!("matched {matches} of oneOf, expected exactly 1")))
                }
            }
            SchemaNode::Not { schema } => {
                if schema.validate_at(value, path).is_ok() {
                    Err(ValidationError::new(path, "matched a schema under not"))
                } else {
                    Ok(())
                }
            }
        }
    }
}

impl From<&crate::types::tool::ToolSchema> for SchemaNode {
    /// Convert a tool's flat `ToolSchema` into the recursive `SchemaNode`
    /// form so `tools/call` can validate arguments with the same engine as
    /// any other schema. Each property's raw JSON Schema value is
    /// deserialized directly into a `SchemaNode` (the `#[serde(tag =
    /// "type")]` representation matches plain JSON Schema shapes like
    /// `{"type": "number"}`); a property that doesn't deserialize into this
    /// subset is treated as unconstrained (`Any`) rather than rejected.
    fn from(schema: &crate::types::tool::ToolSchema) -> Self {
        let properties = schema
            .properties
            .as_ref()
            .map(|props| {
                props
                    .iter()
                    .map(|(name, value)| {
                        let node = serde_json::from_value(value.clone()).unwrap_or(SchemaNode::Any);
                        (name.clone(), node)
                    })
                    .collect()
            })
            .unwrap_or_default();

        SchemaNode::object(properties, schema.required.clone().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object_schema() -> SchemaNode {
        SchemaNode::object(
            HashMap::from([
                ("name".to_string(), SchemaNode::String { min_length: Some(1), max_length: None, format: None, pattern: None }),
                ("age".to_string(), SchemaNode::Integer {
                    minimum: Some(0),
                    maximum: None,
                    exclusive_minimum: None,
                    exclusive_maximum: None,
                    multiple_of: None,
                }),
            ]),
            vec!["name".to_string()],
        )
    }

    #[test]
    fn test_object_accepts_valid_value() {
        let schema = object_schema();
        assert!(schema.validate(&json!({"name": "ada", "age": 30})).is_ok());
    }

    #[test]
    fn test_object_rejects_missing_required() {
        let schema = object_schema();
        let err = schema.validate(&json!({"age": 30})).unwrap_err();
        assert!(err.reason.contains("name"));
    }

    #[test]
    fn test_nested_array_reports_element_path() {
        use pretty_assertions::assert_eq;

        let schema = SchemaNode::array(SchemaNode::Integer {
            minimum: Some(0),
            maximum: None,
            exclusive_minimum: None,
            exclusive_maximum: None,
            multiple_of: None,
        });
        let err = schema.validate(&json!([1, 2, -1])).unwrap_err();
        assert_eq!(err, ValidationError::new("/2", "less than minimum 0"));
    }

    #[test]
    fn test_enum_rejects_value_outside_set() {
        let schema = SchemaNode::Enum { values: vec![json!("a"), json!("b")] };
        assert!(schema.validate(&json!("a")).is_ok());
        assert!(schema.validate(&json!("c")).is_err());
    }

    #[test]
    fn test_one_of_requires_exactly_one_match() {
        let schema = SchemaNode::OneOf {
            schemas: vec![SchemaNode::string(), SchemaNode::Enum { values: vec![json!("x")] }],
        };
        // "x" matches both the string arm and the enum arm.
        assert!(schema.validate(&json!("x")).is_err());
        assert!(schema.validate(&json!("y")).is_ok());
    }

    #[test]
    fn test_any_accepts_everything() {
        assert!(SchemaNode::Any.validate(&json!(null)).is_ok());
        assert!(SchemaNode::Any.validate(&json!([1, 2, 3])).is_ok());
    }

    #[test]
    fn test_string_pattern_constraint() {
        let schema = SchemaNode::String {
            min_length: None,
            max_length: None,
            format: None,
            pattern: Some(r"^\d{3}-\d{4}$".to_string()),
        };
        assert!(schema.validate(&json!("555-1234")).is_ok());
        assert!(schema.validate(&json!("not-a-number")).is_err());
    }

    #[test]
    fn test_number_exclusive_bounds_and_multiple_of() {
        let schema = SchemaNode::Number {
            minimum: None,
            maximum: None,
            exclusive_minimum: Some(0.0),
            exclusive_maximum: None,
            multiple_of: Some(0.5),
        };
        assert!(schema.validate(&json!(0.0)).is_err());
        assert!(schema.validate(&json!(1.5)).is_ok());
        assert!(schema.validate(&json!(1.2)).is_err());
    }

    #[test]
    fn test_array_unique_items_rejects_duplicates() {
        let schema = SchemaNode::Array {
            items: Box::new(SchemaNode::integer()),
            min_items: None,
            max_items: None,
            unique_items: Some(true),
        };
        assert!(schema.validate(&json!([1, 2, 3])).is_ok());
        assert!(schema.validate(&json!([1, 2, 2])).is_err());
    }

    #[test]
    fn test_object_rejects_additional_properties_when_closed() {
        let schema = SchemaNode::Object {
            properties: HashMap::from([("name".to_string(), SchemaNode::string())]),
            required: vec![],
            additional_properties: Some(false),
            dependent_required: HashMap::new(),
        };
        assert!(schema.validate(&json!({"name": "ada"})).is_ok());
        assert!(schema.validate(&json!({"name": "ada", "extra": 1})).is_err());
    }

    #[test]
    fn test_object_dependent_required() {
        let schema = SchemaNode::Object {
            properties: HashMap::from([
                ("creditCard".to_string(), SchemaNode::string()),
                ("billingAddress".to_string(), SchemaNode::string()),
            ]),
            required: vec![],
            additional_properties: None,
            dependent_required: HashMap::from([("creditCard".to_string(), vec!["billingAddress".to_string()])]),
        };
        assert!(schema.validate(&json!({})).is_ok());
        assert!(schema.validate(&json!({"creditCard": "1234"})).is_err());
        assert!(schema
            .validate(&json!({"creditCard": "1234", "billingAddress": "221B Baker St"}))
            .is_ok());
    }

    #[test]
    fn test_from_tool_schema_validates_properties() {
        use crate::types::tool::ToolSchema;

        let tool_schema = ToolSchema::from_value(json!({
            "type": "object",
            "properties": {
                "a": {"type": "number"},
                "b": {"type": "number"},
            },
            "required": ["a", "b"],
        }));
        let node = SchemaNode::from(&tool_schema);

        assert!(node.validate(&json!({"a": 2, "b": 3})).is_ok());
        let err = node.validate(&json!({"a": "x", "b": 3})).unwrap_err();
        assert_eq!(err.to_invalid_params_message(), "Expected number (at /a)");
    }
}
