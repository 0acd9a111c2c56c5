//! Core node types for the forest model

use derive_more::Display;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

use crate::tree::error::{Result, TreeError};

/// Whether a node can hold children
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum NodeKind {
    /// A branch node - has a `children` sequence, possibly empty
    #[display(fmt = "Branch")]
    Branch,
    /// A leaf node - has no `children` sequence at all
    #[display(fmt = "Leaf")]
    Leaf,
}

impl NodeKind {
    /// Returns true if this is a branch node
    pub const fn is_branch(self) -> bool {
        matches!(self, NodeKind::Branch)
    }

    /// Returns true if this is a leaf node
    pub const fn is_leaf(self) -> bool {
        matches!(self, NodeKind::Leaf)
    }
}

/// Tag telling a collaborator how to interpret a cell's value
///
/// The engine carries shapes around but never branches on them. Unknown
/// tags survive a parse/serialize cycle through [`CellShape::Custom`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum CellShape {
    #[display(fmt = "text")]
    Text,
    #[display(fmt = "number")]
    Number,
    #[display(fmt = "boolean")]
    Boolean,
    #[display(fmt = "code")]
    Code,
    #[display(fmt = "markdown")]
    Markdown,
    #[display(fmt = "chart")]
    Chart,
    #[display(fmt = "image")]
    Image,
    #[display(fmt = "link")]
    Link,
    #[display(fmt = "{}", _0)]
    Custom(String),
}

impl CellShape {
    /// The tag as it appears in serialized data
    pub fn as_str(&self) -> &str {
        match self {
            CellShape::Text => "text",
            CellShape::Number => "number",
            CellShape::Boolean => "boolean",
            CellShape::Code => "code",
            CellShape::Markdown => "markdown",
            CellShape::Chart => "chart",
            CellShape::Image => "image",
            CellShape::Link => "link",
            CellShape::Custom(tag) => tag,
        }
    }
}

impl From<&str> for CellShape {
    fn from(tag: &str) -> Self {
        match tag {
            "text" => CellShape::Text,
            "number" => CellShape::Number,
            "boolean" => CellShape::Boolean,
            "code" => CellShape::Code,
            "markdown" => CellShape::Markdown,
            "chart" => CellShape::Chart,
            "image" => CellShape::Image,
            "link" => CellShape::Link,
            other => CellShape::Custom(other.to_string()),
        }
    }
}

impl From<String> for CellShape {
    fn from(tag: String) -> Self {
        CellShape::from(tag.as_str())
    }
}

impl From<CellShape> for String {
    fn from(shape: CellShape) -> Self {
        match shape {
            CellShape::Custom(tag) => tag,
            known => known.as_str().to_string(),
        }
    }
}

/// Structured content attached to a node under a string key
///
/// A cell whose `value` is JSON `null` is treated as absent.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "CellRepr")]
pub struct Cell {
    /// The payload, opaque to the engine
    #[serde(skip_serializing_if = "Value::is_null")]
    pub value: Value,
    /// How a collaborator should interpret `value`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shape: Option<CellShape>,
}

/// Accepted input forms: a `{ value, shape }` mapping or a bare value.
#[derive(Deserialize)]
#[serde(untagged)]
enum CellRepr {
    Full {
        value: Value,
        #[serde(default)]
        shape: Option<CellShape>,
    },
    Bare(Value),
}

impl From<CellRepr> for Cell {
    fn from(repr: CellRepr) -> Self {
        match repr {
            CellRepr::Full { value, shape } => Cell { value, shape },
            CellRepr::Bare(value) => Cell { value, shape: None },
        }
    }
}

impl Cell {
    /// Create a cell without a shape tag
    pub fn new(value: impl Into<Value>) -> Self {
        Self {
            value: value.into(),
            shape: None,
        }
    }

    /// Create a cell tagged with a shape
    pub fn shaped(value: impl Into<Value>, shape: impl Into<CellShape>) -> Self {
        Self {
            value: value.into(),
            shape: Some(shape.into()),
        }
    }

    /// Returns true if the payload is JSON `null`
    pub fn is_empty(&self) -> bool {
        self.value.is_null()
    }
}

/// A single node in a forest
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Node {
    /// Identifier, unique within its dataset once sanitized
    #[serde(default)]
    pub id: String,
    /// Display value (string or primitive)
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub value: Value,
    /// Ordered children; `None` marks a leaf
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<Node>>,
    /// Structured sub-content keyed by cell id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cells: Option<BTreeMap<String, Cell>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Node {
    /// Create a leaf node
    pub fn new(id: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            id: id.into(),
            value: value.into(),
            ..Self::default()
        }
    }

    /// Create a leaf node (alias of [`Node::new`])
    pub fn leaf(id: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(id, value)
    }

    /// Create a branch node with an empty children sequence
    pub fn branch(id: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            children: Some(Vec::new()),
            ..Self::new(id, value)
        }
    }

    /// Append a child, turning a leaf into a branch
    pub fn with_child(mut self, child: Node) -> Self {
        self.children.get_or_insert_with(Vec::new).push(child);
        self
    }

    /// Replace the children sequence
    pub fn with_children(mut self, children: Vec<Node>) -> Self {
        self.children = Some(children);
        self
    }

    /// Attach a cell under `key`
    pub fn with_cell(mut self, key: impl Into<String>, cell: Cell) -> Self {
        self.cells
            .get_or_insert_with(BTreeMap::new)
            .insert(key.into(), cell);
        self
    }

    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Branch or leaf, decided by the presence of `children`
    pub fn kind(&self) -> NodeKind {
        if self.children.is_some() {
            NodeKind::Branch
        } else {
            NodeKind::Leaf
        }
    }

    /// Returns true if this node has a children sequence (even an empty one)
    pub fn is_branch(&self) -> bool {
        self.kind().is_branch()
    }

    /// Returns true if this node has no children sequence
    pub fn is_leaf(&self) -> bool {
        self.kind().is_leaf()
    }

    /// Children as a slice; empty for leaves
    pub fn children(&self) -> &[Node] {
        self.children.as_deref().unwrap_or(&[])
    }

    pub fn child_count(&self) -> usize {
        self.children().len()
    }

    /// The display value rendered as text
    ///
    /// Strings are returned verbatim, `null` becomes an empty string and any
    /// other value uses its JSON text.
    pub fn label(&self) -> String {
        match &self.value {
            Value::Null => String::new(),
            Value::String(text) => text.clone(),
            other => other.to_string(),
        }
    }

    /// Look up a non-empty cell
    pub fn cell(&self, key: &str) -> Option<&Cell> {
        self.cells
            .as_ref()?
            .get(key)
            .filter(|cell| !cell.is_empty())
    }

    /// Returns true if a non-empty cell exists under `key`
    pub fn has_cell(&self, key: &str) -> bool {
        self.cell(key).is_some()
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}) - {}", self.id, self.kind(), self.label())
    }
}

/// Grid column metadata, carried through untouched
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<Value>,
    /// Any other column settings the rendering layer understands
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// A forest of root nodes plus optional column metadata
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Dataset {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub columns: Option<Vec<ColumnDescriptor>>,
    pub nodes: Vec<Node>,
}

impl Dataset {
    /// Create a dataset from root nodes
    pub fn new(nodes: Vec<Node>) -> Self {
        Self {
            columns: None,
            nodes,
        }
    }

    /// Attach column metadata
    pub fn with_columns(mut self, columns: Vec<ColumnDescriptor>) -> Self {
        self.columns = Some(columns);
        self
    }

    /// Parse a dataset from JSON text
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::InvalidInput`] if the text is not JSON or does not
    /// have the shape described by [`Dataset::from_value`].
    pub fn from_json(json: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(json)?;
        Self::from_value(value)
    }

    /// Build a dataset from an already-parsed JSON value
    ///
    /// Accepts either a `{ "columns"?, "nodes" }` object or a bare array of
    /// root nodes.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::InvalidInput`] for any other top-level value, or
    /// when `nodes`/`children` are not sequences.
    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Array(nodes) => Ok(Self::new(serde_json::from_value(Value::Array(nodes))?)),
            Value::Object(map) => {
                match map.get("nodes") {
                    Some(Value::Array(_)) => {}
                    Some(other) => {
                        return Err(TreeError::invalid(format!(
                            "`nodes` must be an array, found {}",
                            json_kind(other)
                        )))
                    }
                    None => return Err(TreeError::invalid("missing `nodes` array")),
                }
                Ok(serde_json::from_value(Value::Object(map))?)
            }
            other => Err(TreeError::invalid(format!(
                "expected a dataset object or an array of nodes, found {}",
                json_kind(&other)
            ))),
        }
    }

    /// Serialize back to indented JSON
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl From<Vec<Node>> for Dataset {
    fn from(nodes: Vec<Node>) -> Self {
        Self::new(nodes)
    }
}

pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
