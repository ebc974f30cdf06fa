//! Response validation.
//!
//! Rules are evaluated in a fixed order (status, content-type, CORS, body) and
//! the first failing rule is reported as a [`Mismatch`]. Validation never
//! performs I/O; failures are data, not errors.

use crate::core::executor::ActualResponse;
use serde::Serialize;

pub mod expectation;

pub use expectation::{
    BodyExpectation, ContentTypeExpectation, ExpectationError, ExpectationSet, StatusExpectation,
    StatusValue,
};

const CORS_HEADER: &str = "access-control-allow-origin";
const PREVIEW_CHARS: usize = 100;

#[derive(Debug, Clone, Copy)]
pub struct ValidationOptions {
    /// Strip leading and trailing whitespace from the body before comparing.
    pub trim: bool,
}

impl Default for ValidationOptions {
    fn default() -> Self {
        Self { trim: true }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Rule {
    Status,
    ContentType,
    Cors,
    Response,
}

impl std::fmt::Display for Rule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Rule::Status => "status",
            Rule::ContentType => "content-type",
            Rule::Cors => "cors",
            Rule::Response => "response",
        };
        write!(f, "{}", name)
    }
}

/// The first rule a response violated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Mismatch {
    pub rule: Rule,
    pub expected: String,
    pub actual: String,
}

impl Mismatch {
    fn new(rule: Rule, expected: impl Into<String>, actual: impl Into<String>) -> Self {
        Self {
            rule,
            expected: expected.into(),
            actual: actual.into(),
        }
    }
}

impl std::fmt::Display for Mismatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} check failed: expected {}, got '{}'",
            self.rule, self.expected, self.actual
        )
    }
}

pub fn validate(
    expected: &ExpectationSet,
    actual: &ActualResponse,
    options: &ValidationOptions,
) -> Result<(), Mismatch> {
    let outcome = check_status(expected, actual)
        .and_then(|_| check_content_type(expected, actual))
        .and_then(|_| check_cors(expected, actual))
        .and_then(|_| check_body(expected, actual, options));
    if let Err(mismatch) = &outcome {
        tracing::debug!("{}", mismatch);
    }
    outcome
}

fn check_status(expected: &ExpectationSet, actual: &ActualResponse) -> Result<(), Mismatch> {
    match &expected.status {
        None => Ok(()),
        Some(StatusExpectation::Exact(value)) if value.matches(actual.status) => Ok(()),
        Some(StatusExpectation::Exact(value)) => Err(Mismatch::new(
            Rule::Status,
            value.to_string(),
            actual.status.to_string(),
        )),
        Some(StatusExpectation::AnyOf(values)) => {
            if values.iter().any(|value| value.matches(actual.status)) {
                Ok(())
            } else {
                Err(Mismatch::new(
                    Rule::Status,
                    format!("one of {}", join(values)),
                    actual.status.to_string(),
                ))
            }
        }
    }
}

fn check_content_type(expected: &ExpectationSet, actual: &ActualResponse) -> Result<(), Mismatch> {
    let Some(expectation) = &expected.content_type else {
        return Ok(());
    };
    let content_type = actual.header("content-type");
    let (matched, described) = match expectation {
        ContentTypeExpectation::Exact(prefix) => {
            (content_type.starts_with(prefix.as_str()), format!("prefix '{}'", prefix))
        }
        ContentTypeExpectation::AnyOf(prefixes) => (
            prefixes
                .iter()
                .any(|prefix| content_type.starts_with(prefix.as_str())),
            format!("a prefix from {}", join(prefixes)),
        ),
    };
    if matched {
        Ok(())
    } else {
        Err(Mismatch::new(Rule::ContentType, described, content_type))
    }
}

fn check_cors(expected: &ExpectationSet, actual: &ActualResponse) -> Result<(), Mismatch> {
    let Some(origin) = &expected.cors else {
        return Ok(());
    };
    let header = actual.header(CORS_HEADER);
    let matched = if origin == "*" {
        header == "*"
    } else {
        header.contains(origin.as_str())
    };
    if matched {
        Ok(())
    } else {
        Err(Mismatch::new(Rule::Cors, format!("'{}'", origin), header))
    }
}

fn check_body(
    expected: &ExpectationSet,
    actual: &ActualResponse,
    options: &ValidationOptions,
) -> Result<(), Mismatch> {
    let Some(expectation) = &expected.response else {
        return Ok(());
    };
    let body = if options.trim {
        actual.body.trim()
    } else {
        actual.body.as_str()
    };
    let (matched, described) = match expectation {
        BodyExpectation::Exact(value) => (body == value, format!("exactly '{}'", value)),
        BodyExpectation::Regex(regex) => (
            regex.is_match(body),
            format!("a match for /{}/", regex.as_str()),
        ),
        BodyExpectation::Contains(value) => (
            body.contains(value.as_str()),
            format!("a body containing '{}'", value),
        ),
        BodyExpectation::Empty => (body.is_empty(), "an empty body".to_string()),
    };
    if matched {
        Ok(())
    } else {
        Err(Mismatch::new(Rule::Response, described, preview(body)))
    }
}

fn join<T: std::fmt::Display>(values: &[T]) -> String {
    let rendered: Vec<String> = values.iter().map(|value| value.to_string()).collect();
    format!("[{}]", rendered.join(", "))
}

fn preview(body: &str) -> String {
    if body.chars().count() <= PREVIEW_CHARS {
        body.to_string()
    } else {
        let head: String = body.chars().take(PREVIEW_CHARS).collect();
        format!("{}...", head)
    }
}
