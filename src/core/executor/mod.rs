//! Executes a single test case: build the request, send it with
//! timeout/retry policy, then validate the captured response.

use crate::core::catalog::TestCase;
use crate::core::validator::{self, Mismatch, ValidationOptions};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde::Serialize;
use std::time::{Duration, Instant};
use url::Url;

pub mod transport;

pub use transport::{ActualResponse, HttpTransport, OutgoingRequest, Transport, TransportError};

/// Per-run request policy shared by every case.
#[derive(Debug, Clone)]
pub struct RunSettings {
    pub base_url: Option<Url>,
    /// Bound on each attempt.
    pub timeout: Duration,
    /// Total attempts for timing-out requests; 0 is treated as 1.
    pub retries: u32,
    /// Pause between timed-out attempts.
    pub retry_backoff: Duration,
    pub trim: bool,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            base_url: None,
            timeout: Duration::from_secs(30),
            retries: 1,
            retry_backoff: Duration::from_secs(1),
            trim: true,
        }
    }
}

impl RunSettings {
    pub fn attempts(&self) -> u32 {
        self.retries.max(1)
    }
}

/// Outcome of one executed case.
#[derive(Debug, Clone, Serialize)]
pub struct TestResult {
    pub name: String,
    pub url: String,
    pub passed: bool,
    pub expected: serde_json::Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual: Option<ActualResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mismatch: Option<Mismatch>,
    /// Seconds from the first attempt to the final outcome.
    pub duration: f64,
}

impl TestResult {
    /// A result for a case that never produced a response.
    pub fn errored(case: &TestCase, url: String, error: impl Into<String>, duration: f64) -> Self {
        Self {
            name: case.name.clone(),
            url,
            passed: false,
            expected: case.expected_document.clone(),
            actual: None,
            error: Some(error.into()),
            mismatch: None,
            duration,
        }
    }

    /// Short human-readable failure reason, if any.
    pub fn failure_reason(&self) -> Option<String> {
        self.error
            .clone()
            .or_else(|| self.mismatch.as_ref().map(ToString::to_string))
    }
}

/// Build the outgoing request for `case`.
pub fn build_request(case: &TestCase, settings: &RunSettings) -> Result<OutgoingRequest, String> {
    let url = case
        .target
        .resolve(settings.base_url.as_ref())
        .map_err(|err| err.to_string())?;

    let mut headers = HeaderMap::new();
    for (name, value) in &case.headers {
        let header_name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|_| format!("invalid header name '{}'", name))?;
        let header_value = HeaderValue::from_str(value)
            .map_err(|_| format!("invalid value for header '{}'", name))?;
        headers.append(header_name, header_value);
    }

    Ok(OutgoingRequest {
        method: case.method.clone(),
        url,
        headers,
        body: case.body.clone(),
    })
}

/// Send `request`, retrying only on timeout.
///
/// Each attempt is bounded by `settings.timeout`. A timed-out attempt other
/// than the last is followed by a `retry_backoff` pause; any other transport
/// error ends the case immediately.
pub async fn send_with_retry(
    transport: &dyn Transport,
    request: &OutgoingRequest,
    settings: &RunSettings,
) -> Result<ActualResponse, String> {
    let attempts = settings.attempts();
    for attempt in 1..=attempts {
        let outcome = tokio::time::timeout(settings.timeout, transport.send(request.clone())).await;
        match outcome {
            Ok(Ok(response)) => return Ok(response),
            Ok(Err(TransportError::Request(message))) => return Err(message),
            Ok(Err(TransportError::Timeout)) | Err(_) => {
                if attempt == attempts {
                    break;
                }
                tracing::warn!(
                    "{} {} timed out (attempt {}/{}), retrying in {:?}",
                    request.method,
                    request.url,
                    attempt,
                    attempts,
                    settings.retry_backoff
                );
                tokio::time::sleep(settings.retry_backoff).await;
            }
        }
    }
    Err(format!("request timed out after {} attempt(s)", attempts))
}

/// Run one case end to end. Never fails: every problem becomes a failed result.
pub async fn execute(transport: &dyn Transport, case: &TestCase, settings: &RunSettings) -> TestResult {
    let started = Instant::now();
    let request = match build_request(case, settings) {
        Ok(request) => request,
        Err(error) => {
            let url = case.target.display(settings.base_url.as_ref());
            return TestResult::errored(case, url, error, started.elapsed().as_secs_f64());
        }
    };
    let url = request.url.to_string();
    tracing::debug!("{} {} ({})", request.method, url, case.source_file);

    match send_with_retry(transport, &request, settings).await {
        Ok(actual) => {
            let options = ValidationOptions {
                trim: settings.trim,
            };
            let mismatch = validator::validate(&case.expected, &actual, &options).err();
            TestResult {
                name: case.name.clone(),
                url,
                passed: mismatch.is_none(),
                expected: case.expected_document.clone(),
                actual: Some(actual),
                error: None,
                mismatch,
                duration: started.elapsed().as_secs_f64(),
            }
        }
        Err(error) => {
            tracing::debug!("{} failed: {}", case.name, error);
            TestResult::errored(case, url, error, started.elapsed().as_secs_f64())
        }
    }
}
