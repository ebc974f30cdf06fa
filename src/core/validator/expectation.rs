use crate::core::document::{Node, Scalar};
use regex::{Regex, RegexBuilder};

#[derive(Debug, thiserror::Error)]
pub enum ExpectationError {
    #[error("`expected` must be a map")]
    NotAMap,
    #[error("`{field}` has an unsupported shape: {reason}")]
    InvalidShape { field: &'static str, reason: String },
    #[error("unknown response type '{0}'; supported types are exact, regex, contains, empty")]
    UnknownResponseType(String),
    #[error("response type '{0}' requires a `value`")]
    MissingValue(String),
    #[error("invalid response regex '{pattern}': {source}")]
    InvalidRegex {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

/// One acceptable status code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusValue {
    Code(i64),
    /// Members that did not parse as integers; compared against the decimal
    /// rendering of the actual status.
    Text(String),
}

impl StatusValue {
    fn from_node(node: &Node) -> Option<Self> {
        match node {
            Node::Scalar(Scalar::Int(code)) => Some(StatusValue::Code(*code)),
            Node::Scalar(Scalar::Null) => None,
            Node::Scalar(_) => node.scalar_text().map(StatusValue::Text),
            _ => None,
        }
    }

    pub fn matches(&self, status: u16) -> bool {
        match self {
            StatusValue::Code(code) => *code == i64::from(status),
            StatusValue::Text(text) => *text == status.to_string(),
        }
    }
}

impl std::fmt::Display for StatusValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StatusValue::Code(code) => write!(f, "{}", code),
            StatusValue::Text(text) => write!(f, "{}", text),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusExpectation {
    Exact(StatusValue),
    AnyOf(Vec<StatusValue>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentTypeExpectation {
    Exact(String),
    AnyOf(Vec<String>),
}

#[derive(Debug, Clone)]
pub enum BodyExpectation {
    Exact(String),
    /// Compiled in multi-line mode; matches anywhere in the body.
    Regex(Regex),
    Contains(String),
    Empty,
}

/// What a passing response must look like. Absent fields impose nothing.
#[derive(Debug, Clone, Default)]
pub struct ExpectationSet {
    pub status: Option<StatusExpectation>,
    pub content_type: Option<ContentTypeExpectation>,
    pub cors: Option<String>,
    pub response: Option<BodyExpectation>,
}

impl ExpectationSet {
    /// Build an expectation set from the processed `expected` block.
    pub fn from_node(node: Option<&Node>) -> Result<Self, ExpectationError> {
        let map = match node {
            None | Some(Node::Scalar(Scalar::Null)) => return Ok(Self::default()),
            Some(Node::Map(map)) => map,
            Some(_) => return Err(ExpectationError::NotAMap),
        };

        Ok(Self {
            status: map.get("status").map(parse_status).transpose()?,
            content_type: map
                .get("content-type")
                .map(parse_content_type)
                .transpose()?,
            cors: map.get("cors").map(parse_cors).transpose()?,
            response: map.get("response").map(parse_response).transpose()?,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.status.is_none()
            && self.content_type.is_none()
            && self.cors.is_none()
            && self.response.is_none()
    }
}

/// Values of a `{type: multiple, values: [...]}` block, if `node` is one.
fn multiple_values<'a>(
    node: &'a Node,
    field: &'static str,
) -> Result<Option<&'a [Node]>, ExpectationError> {
    let Some(map) = node.as_map() else {
        return Ok(None);
    };
    if map.get("type").and_then(Node::as_str) != Some("multiple") {
        return Err(ExpectationError::InvalidShape {
            field,
            reason: "maps must be of the form {type: multiple, values: [...]}".to_string(),
        });
    }
    map.get("values")
        .and_then(Node::as_seq)
        .map(Some)
        .ok_or_else(|| ExpectationError::InvalidShape {
            field,
            reason: "`values` must be a list".to_string(),
        })
}

fn parse_status(node: &Node) -> Result<StatusExpectation, ExpectationError> {
    let invalid = |reason: &str| ExpectationError::InvalidShape {
        field: "status",
        reason: reason.to_string(),
    };
    if let Some(values) = multiple_values(node, "status")? {
        let members = values
            .iter()
            .map(|value| {
                StatusValue::from_node(value).ok_or_else(|| invalid("members must be scalars"))
            })
            .collect::<Result<Vec<_>, _>>()?;
        return Ok(StatusExpectation::AnyOf(members));
    }
    StatusValue::from_node(node)
        .map(StatusExpectation::Exact)
        .ok_or_else(|| invalid("expected an integer or a multiple block"))
}

fn parse_content_type(node: &Node) -> Result<ContentTypeExpectation, ExpectationError> {
    let invalid = |reason: &str| ExpectationError::InvalidShape {
        field: "content-type",
        reason: reason.to_string(),
    };
    if let Some(values) = multiple_values(node, "content-type")? {
        let members = values
            .iter()
            .map(|value| match value {
                Node::Scalar(_) => value.scalar_text().ok_or_else(|| invalid("bad member")),
                _ => Err(invalid("members must be strings")),
            })
            .collect::<Result<Vec<_>, _>>()?;
        return Ok(ContentTypeExpectation::AnyOf(members));
    }
    match node {
        Node::Scalar(Scalar::Null) | Node::Seq(_) | Node::Map(_) => {
            Err(invalid("expected a string or a multiple block"))
        }
        Node::Scalar(_) => Ok(ContentTypeExpectation::Exact(
            node.scalar_text().unwrap_or_default(),
        )),
    }
}

fn parse_cors(node: &Node) -> Result<String, ExpectationError> {
    match node {
        Node::Scalar(Scalar::Null) | Node::Seq(_) | Node::Map(_) => {
            Err(ExpectationError::InvalidShape {
                field: "cors",
                reason: "expected a string".to_string(),
            })
        }
        Node::Scalar(_) => Ok(node.scalar_text().unwrap_or_default()),
    }
}

fn parse_response(node: &Node) -> Result<BodyExpectation, ExpectationError> {
    let Some(map) = node.as_map() else {
        return Err(ExpectationError::InvalidShape {
            field: "response",
            reason: "expected a map with `type` and `value`".to_string(),
        });
    };
    let kind = map
        .get("type")
        .and_then(Node::scalar_text)
        .unwrap_or_else(|| "exact".to_string());
    let value = map
        .get("value")
        .filter(|value| !matches!(value, Node::Scalar(Scalar::Null)))
        .and_then(Node::scalar_text);
    let require =
        |value: Option<String>| value.ok_or_else(|| ExpectationError::MissingValue(kind.clone()));

    match kind.as_str() {
        "exact" => Ok(BodyExpectation::Exact(require(value)?)),
        "contains" => Ok(BodyExpectation::Contains(require(value)?)),
        "regex" => {
            let pattern = require(value)?;
            let regex = RegexBuilder::new(&pattern)
                .multi_line(true)
                .build()
                .map_err(|source| ExpectationError::InvalidRegex { pattern, source })?;
            Ok(BodyExpectation::Regex(regex))
        }
        "empty" => Ok(BodyExpectation::Empty),
        other => Err(ExpectationError::UnknownResponseType(other.to_string())),
    }
}
