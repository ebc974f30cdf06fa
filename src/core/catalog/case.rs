use crate::core::document::{Node, Scalar};
use crate::core::validator::{ExpectationError, ExpectationSet};
use indexmap::IndexMap;
use reqwest::Method;
use url::Url;

#[derive(Debug, thiserror::Error)]
pub enum CaseError {
    #[error("test has neither `url` nor `relative-url`")]
    MissingUrl,
    #[error("`relative-url` '{0}' needs a configured baseUrl")]
    MissingBaseUrl(String),
    #[error("invalid url '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("invalid HTTP method '{0}'")]
    InvalidMethod(String),
    #[error("`{field}` must be {expected}")]
    InvalidField {
        field: &'static str,
        expected: &'static str,
    },
    #[error(transparent)]
    Expectation(#[from] ExpectationError),
}

/// Where a case sends its request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Absolute(Url),
    /// Joined against the run's base URL.
    Relative(String),
}

impl Target {
    pub fn resolve(&self, base_url: Option<&Url>) -> Result<Url, CaseError> {
        match self {
            Target::Absolute(url) => Ok(url.clone()),
            Target::Relative(path) => {
                let base = base_url.ok_or_else(|| CaseError::MissingBaseUrl(path.clone()))?;
                base.join(path).map_err(|err| CaseError::InvalidUrl {
                    url: path.clone(),
                    reason: err.to_string(),
                })
            }
        }
    }

    /// Best-effort text form, used when a case fails before resolution.
    pub fn display(&self, base_url: Option<&Url>) -> String {
        match self.resolve(base_url) {
            Ok(url) => url.to_string(),
            Err(_) => match self {
                Target::Absolute(url) => url.to_string(),
                Target::Relative(path) => path.clone(),
            },
        }
    }
}

/// One fully resolved endpoint check. Immutable once loaded.
#[derive(Debug, Clone)]
pub struct TestCase {
    pub name: String,
    pub target: Target,
    pub method: Method,
    pub body: Option<serde_json::Value>,
    pub headers: IndexMap<String, String>,
    pub expected: ExpectationSet,
    /// The processed `expected` block, kept for reporting.
    pub expected_document: serde_json::Value,
    /// `<file>#<index>` provenance.
    pub source_file: String,
}

impl TestCase {
    /// Convert a processed document into a test case.
    pub fn from_document(document: &Node, source_file: &str) -> Result<Self, CaseError> {
        let target = match (document.get("url"), document.get("relative-url")) {
            (Some(url), _) => {
                let text = required_text(url, "url")?;
                let parsed = Url::parse(&text).map_err(|err| CaseError::InvalidUrl {
                    url: text.clone(),
                    reason: err.to_string(),
                })?;
                Target::Absolute(parsed)
            }
            (None, Some(relative)) => Target::Relative(required_text(relative, "relative-url")?),
            (None, None) => return Err(CaseError::MissingUrl),
        };

        let method = match document.get("type") {
            None | Some(Node::Scalar(Scalar::Null)) => Method::GET,
            Some(node) => {
                let text = required_text(node, "type")?.to_uppercase();
                Method::from_bytes(text.as_bytes()).map_err(|_| CaseError::InvalidMethod(text))?
            }
        };

        let body = match document.get("body") {
            None | Some(Node::Scalar(Scalar::Null)) => None,
            Some(node) => Some(node.to_json()),
        };

        let headers = match document.get("headers") {
            None | Some(Node::Scalar(Scalar::Null)) => IndexMap::new(),
            Some(Node::Map(map)) => map
                .iter()
                .map(|(name, value)| {
                    let text = value.scalar_text().ok_or(CaseError::InvalidField {
                        field: "headers",
                        expected: "a map of scalar values",
                    })?;
                    Ok::<_, CaseError>((name.clone(), text))
                })
                .collect::<Result<_, CaseError>>()?,
            Some(_) => {
                return Err(CaseError::InvalidField {
                    field: "headers",
                    expected: "a map",
                })
            }
        };

        let expected_node = document.get("expected");
        let expected = ExpectationSet::from_node(expected_node)?;
        let expected_document = expected_node
            .map(Node::to_json)
            .unwrap_or_else(|| serde_json::json!({}));

        let name = document
            .get("name")
            .and_then(Node::scalar_text)
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| source_file.to_string());

        Ok(TestCase {
            name,
            target,
            method,
            body,
            headers,
            expected,
            expected_document,
            source_file: source_file.to_string(),
        })
    }
}

fn required_text(node: &Node, field: &'static str) -> Result<String, CaseError> {
    match node {
        Node::Scalar(Scalar::Str(text)) if !text.trim().is_empty() => Ok(text.trim().to_string()),
        _ => Err(CaseError::InvalidField {
            field,
            expected: "a non-empty string",
        }),
    }
}
