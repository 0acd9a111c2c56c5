//! Cell lookup and metadata extraction

use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

use crate::tree::error::ValidationFailure;
use crate::tree::{CellShape, Node};

/// Normalized view of a cell's content
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CellMetadata {
    pub value: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shape: Option<CellShape>,
}

/// The kind of JSON value a schema expects
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ValueKind {
    #[default]
    Any,
    String,
    Number,
    Boolean,
    Array,
    /// An object carrying at least the listed fields
    Object {
        #[serde(default)]
        required: Vec<String>,
    },
}

/// A simple type and shape check for cell values
///
/// With `coerce` set, primitives are converted where the conversion is
/// lossless in intent: numbers and booleans to strings, numeric strings to
/// numbers, `"true"`/`"false"` to booleans.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CellSchema {
    #[serde(flatten)]
    pub kind: ValueKind,
    /// Shape tag the cell must carry
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shape: Option<CellShape>,
    #[serde(default)]
    pub coerce: bool,
}

impl CellSchema {
    pub fn new(kind: ValueKind) -> Self {
        Self {
            kind,
            shape: None,
            coerce: false,
        }
    }

    pub fn any() -> Self {
        Self::new(ValueKind::Any)
    }

    pub fn string() -> Self {
        Self::new(ValueKind::String)
    }

    pub fn number() -> Self {
        Self::new(ValueKind::Number)
    }

    pub fn boolean() -> Self {
        Self::new(ValueKind::Boolean)
    }

    pub fn array() -> Self {
        Self::new(ValueKind::Array)
    }

    /// An object with the given required fields
    pub fn object<I, S>(required: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(ValueKind::Object {
            required: required.into_iter().map(Into::into).collect(),
        })
    }

    /// Require a specific shape tag
    pub fn shape(mut self, shape: impl Into<CellShape>) -> Self {
        self.shape = Some(shape.into());
        self
    }

    /// Allow primitive conversions
    pub fn coerce(mut self, coerce: bool) -> Self {
        self.coerce = coerce;
        self
    }

    /// Check `cell`'s content, returning the possibly converted value
    fn check(
        &self,
        key: &str,
        value: &Value,
        shape: Option<&CellShape>,
    ) -> Result<Value, ValidationFailure> {
        let fail = |expected: String| ValidationFailure {
            cell: key.to_string(),
            expected,
            found: value.clone(),
        };

        if let Some(expected) = &self.shape {
            if shape != Some(expected) {
                return Err(fail(format!("shape `{expected}`")));
            }
        }

        match (&self.kind, value) {
            (ValueKind::Any, _)
            | (ValueKind::String, Value::String(_))
            | (ValueKind::Number, Value::Number(_))
            | (ValueKind::Boolean, Value::Bool(_))
            | (ValueKind::Array, Value::Array(_)) => Ok(value.clone()),
            (ValueKind::Object { required }, Value::Object(map)) => {
                match required.iter().find(|field| !map.contains_key(field.as_str())) {
                    Some(missing) => Err(fail(format!("an object with field `{missing}`"))),
                    None => Ok(value.clone()),
                }
            }
            (kind, _) => self
                .coerced(kind, value)
                .ok_or_else(|| fail(describe(kind).to_string())),
        }
    }

    fn coerced(&self, kind: &ValueKind, value: &Value) -> Option<Value> {
        if !self.coerce {
            return None;
        }
        match (kind, value) {
            (ValueKind::String, Value::Number(number)) => Some(Value::String(number.to_string())),
            (ValueKind::String, Value::Bool(flag)) => Some(Value::String(flag.to_string())),
            (ValueKind::Number, Value::String(text)) => {
                parse_number(text.trim()).map(Value::Number)
            }
            (ValueKind::Boolean, Value::String(text)) => match text.trim() {
                "true" => Some(Value::Bool(true)),
                "false" => Some(Value::Bool(false)),
                _ => None,
            },
            _ => None,
        }
    }
}

fn parse_number(text: &str) -> Option<Number> {
    if let Ok(int) = text.parse::<i64>() {
        return Some(Number::from(int));
    }
    text.parse::<f64>().ok().and_then(Number::from_f64)
}

fn describe(kind: &ValueKind) -> &'static str {
    match kind {
        ValueKind::Any => "any value",
        ValueKind::String => "a string",
        ValueKind::Number => "a number",
        ValueKind::Boolean => "a boolean",
        ValueKind::Array => "an array",
        ValueKind::Object { .. } => "an object",
    }
}

/// Returns true if `node` has a non-null cell under `key`
pub fn cell_exists(node: &Node, key: &str) -> bool {
    node.has_cell(key)
}

/// Read a cell's value and shape, optionally checked against `schema`
///
/// Returns `Ok(None)` when the cell does not exist. A schema mismatch is an
/// ordinary outcome reported as `Err`, not a panic.
///
/// ```
/// use serde_json::json;
/// use tree_data::tree::prelude::*;
///
/// let node = Node::new("n", "N").with_cell("qty", Cell::shaped("12", "number"));
/// let schema = CellSchema::number().coerce(true);
/// let meta = extract_cell_metadata(&node, "qty", Some(&schema)).unwrap().unwrap();
/// assert_eq!(meta.value, json!(12));
/// assert_eq!(meta.shape, Some(CellShape::Number));
/// ```
pub fn extract_cell_metadata(
    node: &Node,
    cell_id: &str,
    schema: Option<&CellSchema>,
) -> Result<Option<CellMetadata>, ValidationFailure> {
    let Some(cell) = node.cell(cell_id) else {
        return Ok(None);
    };

    let value = match schema {
        Some(schema) => schema.check(cell_id, &cell.value, cell.shape.as_ref())?,
        None => cell.value.clone(),
    };

    Ok(Some(CellMetadata {
        value,
        shape: cell.shape.clone(),
    }))
}

impl Node {
    /// See [`extract_cell_metadata`]
    pub fn cell_metadata(
        &self,
        cell_id: &str,
        schema: Option<&CellSchema>,
    ) -> Result<Option<CellMetadata>, ValidationFailure> {
        extract_cell_metadata(self, cell_id, schema)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::node::json_kind;
    use crate::tree::Cell;
    use serde_json::json;

    fn sample() -> Node {
        Node::new("row", "Row")
            .with_cell("name", Cell::shaped("Widget", "text"))
            .with_cell("count", Cell::new(7))
            .with_cell("chart", Cell::shaped(json!({ "series": [1, 2, 3] }), "chart"))
            .with_cell("flag", Cell::new("true"))
            .with_cell("cleared", Cell::new(Value::Null))
    }

    #[test]
    fn test_cell_exists() {
        let node = sample();
        assert!(cell_exists(&node, "name"));
        assert!(!cell_exists(&node, "cleared"));
        assert!(!cell_exists(&node, "missing"));
    }

    #[test]
    fn test_missing_cell_is_none() {
        let node = sample();
        assert_eq!(extract_cell_metadata(&node, "missing", None), Ok(None));
        assert_eq!(
            extract_cell_metadata(&node, "cleared", Some(&CellSchema::string())),
            Ok(None)
        );
    }

    #[test]
    fn test_without_schema_returns_raw_cell() {
        let meta = sample().cell_metadata("chart", None).unwrap().unwrap();
        assert_eq!(meta.value, json!({ "series": [1, 2, 3] }));
        assert_eq!(meta.shape, Some(CellShape::Chart));
    }

    #[test]
    fn test_kind_mismatch_reports_failure() {
        let err = extract_cell_metadata(&sample(), "count", Some(&CellSchema::string()))
            .unwrap_err();
        assert_eq!(err.cell, "count");
        assert_eq!(err.expected, "a string");
        assert_eq!(err.found, json!(7));
    }

    #[test]
    fn test_coercion() {
        let node = sample();
        let as_text = CellSchema::string().coerce(true);
        let meta = extract_cell_metadata(&node, "count", Some(&as_text)).unwrap().unwrap();
        assert_eq!(meta.value, json!("7"));

        let as_flag = CellSchema::boolean().coerce(true);
        let meta = extract_cell_metadata(&node, "flag", Some(&as_flag)).unwrap().unwrap();
        assert_eq!(meta.value, json!(true));

        let as_number = CellSchema::number().coerce(true);
        assert!(extract_cell_metadata(&node, "name", Some(&as_number)).is_err());
    }

    #[test]
    fn test_shape_check() {
        let node = sample();
        let chart = CellSchema::object(["series"]).shape("chart");
        assert!(extract_cell_metadata(&node, "chart", Some(&chart)).is_ok());

        let err = extract_cell_metadata(&node, "name", Some(&CellSchema::any().shape("code")))
            .unwrap_err();
        assert_eq!(err.expected, "shape `code`");
    }

    #[test]
    fn test_required_fields() {
        let schema = CellSchema::object(["series", "labels"]);
        let err = extract_cell_metadata(&sample(), "chart", Some(&schema)).unwrap_err();
        assert_eq!(err.expected, "an object with field `labels`");
    }

    #[test]
    fn test_schema_from_json() {
        let schema: CellSchema = serde_json::from_value(json!({
            "type": "object",
            "required": ["series"],
            "shape": "chart",
        }))
        .unwrap();
        assert_eq!(schema, CellSchema::object(["series"]).shape(CellShape::Chart));
        assert_eq!(describe(&schema.kind), "an object");
        assert_eq!(json_kind(&json!([])), "an array");
    }
}
