//! Tagged-variant configuration tree.
//!
//! Test documents are parsed from YAML into [`Node`] so the block processor can
//! walk maps, sequences and scalars without reaching into untyped values.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

/// A single node of a configuration document.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Node {
    Scalar(Scalar),
    Seq(Vec<Node>),
    Map(IndexMap<String, Node>),
}

/// Leaf values of a configuration document.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Scalar {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

/// Coarse shape of a node, used by transforms that only accept some inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Null,
    Bool,
    Number,
    String,
    Seq,
    Map,
}

impl Node {
    pub fn null() -> Self {
        Node::Scalar(Scalar::Null)
    }

    pub fn string<T: Into<String>>(value: T) -> Self {
        Node::Scalar(Scalar::Str(value.into()))
    }

    pub fn int(value: i64) -> Self {
        Node::Scalar(Scalar::Int(value))
    }

    pub fn map() -> Self {
        Node::Map(IndexMap::new())
    }

    pub fn kind(&self) -> NodeKind {
        match self {
            Node::Scalar(Scalar::Null) => NodeKind::Null,
            Node::Scalar(Scalar::Bool(_)) => NodeKind::Bool,
            Node::Scalar(Scalar::Int(_)) | Node::Scalar(Scalar::Float(_)) => NodeKind::Number,
            Node::Scalar(Scalar::Str(_)) => NodeKind::String,
            Node::Seq(_) => NodeKind::Seq,
            Node::Map(_) => NodeKind::Map,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Node::Scalar(Scalar::Str(text)) => Some(text),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&IndexMap<String, Node>> {
        match self {
            Node::Map(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_map_mut(&mut self) -> Option<&mut IndexMap<String, Node>> {
        match self {
            Node::Map(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_seq(&self) -> Option<&[Node]> {
        match self {
            Node::Seq(items) => Some(items),
            _ => None,
        }
    }

    /// Look up a key when this node is a map.
    pub fn get(&self, key: &str) -> Option<&Node> {
        self.as_map().and_then(|map| map.get(key))
    }

    /// Text form of a scalar, as a human would write it in YAML.
    pub fn scalar_text(&self) -> Option<String> {
        match self {
            Node::Scalar(Scalar::Null) => Some(String::new()),
            Node::Scalar(Scalar::Bool(flag)) => Some(flag.to_string()),
            Node::Scalar(Scalar::Int(value)) => Some(value.to_string()),
            Node::Scalar(Scalar::Float(value)) => Some(value.to_string()),
            Node::Scalar(Scalar::Str(text)) => Some(text.clone()),
            _ => None,
        }
    }

    pub fn from_yaml(value: serde_yaml::Value) -> Self {
        match value {
            serde_yaml::Value::Null => Node::null(),
            serde_yaml::Value::Bool(flag) => Node::Scalar(Scalar::Bool(flag)),
            serde_yaml::Value::Number(number) => Node::Scalar(yaml_number(&number)),
            serde_yaml::Value::String(text) => Node::string(text),
            serde_yaml::Value::Sequence(items) => {
                Node::Seq(items.into_iter().map(Node::from_yaml).collect())
            }
            serde_yaml::Value::Mapping(mapping) => Node::Map(
                mapping
                    .into_iter()
                    .map(|(key, value)| (yaml_key(key), Node::from_yaml(value)))
                    .collect(),
            ),
            serde_yaml::Value::Tagged(tagged) => Node::from_yaml(tagged.value),
        }
    }

    pub fn from_json(value: Value) -> Self {
        match value {
            Value::Null => Node::null(),
            Value::Bool(flag) => Node::Scalar(Scalar::Bool(flag)),
            Value::Number(number) => match number.as_i64() {
                Some(int) => Node::int(int),
                None => Node::Scalar(Scalar::Float(number.as_f64().unwrap_or_default())),
            },
            Value::String(text) => Node::string(text),
            Value::Array(items) => Node::Seq(items.into_iter().map(Node::from_json).collect()),
            Value::Object(map) => Node::Map(
                map.into_iter()
                    .map(|(key, value)| (key, Node::from_json(value)))
                    .collect(),
            ),
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            Node::Scalar(Scalar::Null) => Value::Null,
            Node::Scalar(Scalar::Bool(flag)) => Value::Bool(*flag),
            Node::Scalar(Scalar::Int(value)) => Value::Number((*value).into()),
            Node::Scalar(Scalar::Float(value)) => Number::from_f64(*value)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            Node::Scalar(Scalar::Str(text)) => Value::String(text.clone()),
            Node::Seq(items) => Value::Array(items.iter().map(Node::to_json).collect()),
            Node::Map(map) => {
                let mut object = Map::new();
                for (key, value) in map {
                    object.insert(key.clone(), value.to_json());
                }
                Value::Object(object)
            }
        }
    }
}

fn yaml_number(number: &serde_yaml::Number) -> Scalar {
    if let Some(int) = number.as_i64() {
        Scalar::Int(int)
    } else if let Some(float) = number.as_f64() {
        Scalar::Float(float)
    } else {
        Scalar::Str(number.to_string())
    }
}

fn yaml_key(key: serde_yaml::Value) -> String {
    match key {
        serde_yaml::Value::String(text) => text,
        serde_yaml::Value::Bool(flag) => flag.to_string(),
        serde_yaml::Value::Number(number) => number.to_string(),
        serde_yaml::Value::Null => "null".to_string(),
        other => serde_yaml::to_string(&other)
            .map(|text| text.trim().to_string())
            .unwrap_or_default(),
    }
}

/// Parse every `---`-separated YAML document in `source`.
pub fn parse_documents(source: &str) -> Result<Vec<Node>, serde_yaml::Error> {
    let mut documents = Vec::new();
    for document in serde_yaml::Deserializer::from_str(source) {
        let value = serde_yaml::Value::deserialize(document)?;
        documents.push(Node::from_yaml(value));
    }
    Ok(documents)
}

/// A key of the form `base<transform>` split into its parts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaggedKey<'a> {
    pub base: &'a str,
    pub transform: &'a str,
}

/// Split a `base<transform>` key.
///
/// Returns `None` unless the key ends in `>` and both parts are non-empty. The
/// base may not itself contain angle brackets, so a key carries at most one
/// transform reference.
pub fn parse_tagged_key(key: &str) -> Option<TaggedKey<'_>> {
    let inner = key.strip_suffix('>')?;
    let (base, transform) = inner.rsplit_once('<')?;
    if base.is_empty() || transform.is_empty() {
        return None;
    }
    if base.contains(['<', '>']) || transform.contains('>') {
        return None;
    }
    Some(TaggedKey { base, transform })
}
