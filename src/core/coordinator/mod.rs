//! Bounded-concurrency dispatch of test cases.

use crate::core::catalog::TestCase;
use crate::core::executor::{self, RunSettings, TestResult, Transport};
use futures::future::join_all;
use futures::FutureExt;
use serde::Serialize;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;

#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Upper bound on in-flight requests; 0 picks the available parallelism.
    pub max_concurrent: usize,
    /// Stop admitting new cases after the first failure.
    pub stop_on_fail: bool,
    pub settings: RunSettings,
}

/// Aggregated outcome of a run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub results: Vec<TestResult>,
    pub passed: usize,
    pub failed: usize,
    /// Cases never admitted because of an early stop.
    pub not_started: usize,
    pub stopped_early: bool,
    pub concurrency: usize,
    pub duration: f64,
}

impl RunReport {
    pub fn success(&self) -> bool {
        self.failed == 0
    }

    pub fn total(&self) -> usize {
        self.passed + self.failed + self.not_started
    }
}

/// Resolve the configured concurrency, falling back to the hardware default.
pub fn effective_concurrency(configured: usize) -> usize {
    if configured > 0 {
        return configured;
    }
    std::thread::available_parallelism()
        .map(|parallelism| parallelism.get())
        .unwrap_or(1)
}

/// Run every case, at most `max_concurrent` at a time.
///
/// A permit is taken before a case is spawned and held until it finishes, so
/// admission itself is what blocks when the pool is saturated. Results are
/// returned in submission order.
pub async fn run_all(
    cases: Vec<Arc<TestCase>>,
    transport: Arc<dyn Transport>,
    options: RunOptions,
) -> RunReport {
    let started = Instant::now();
    let concurrency = effective_concurrency(options.max_concurrent);
    let semaphore = Arc::new(Semaphore::new(concurrency));
    let stop = Arc::new(AtomicBool::new(false));
    let settings = Arc::new(options.settings);
    let stop_on_fail = options.stop_on_fail;

    tracing::info!(
        "Running {} endpoint test(s) with concurrency {}",
        cases.len(),
        concurrency
    );

    let mut handles = Vec::with_capacity(cases.len());
    let mut not_started = 0;
    for case in cases {
        if stop_on_fail && stop.load(Ordering::SeqCst) {
            not_started += 1;
            continue;
        }
        let Ok(permit) = Arc::clone(&semaphore).acquire_owned().await else {
            not_started += 1;
            continue;
        };
        if stop_on_fail && stop.load(Ordering::SeqCst) {
            drop(permit);
            not_started += 1;
            continue;
        }

        let transport = Arc::clone(&transport);
        let settings = Arc::clone(&settings);
        let stop = Arc::clone(&stop);
        let worker_case = Arc::clone(&case);
        let handle = tokio::spawn(async move {
            let _permit = permit;
            let outcome =
                AssertUnwindSafe(executor::execute(transport.as_ref(), &worker_case, &settings))
                    .catch_unwind()
                    .await;
            let result = match outcome {
                Ok(result) => result,
                Err(panic) => {
                    let reason = panic_reason(panic.as_ref());
                    tracing::error!("Test {} panicked: {}", worker_case.name, reason);
                    let url = worker_case.target.display(settings.base_url.as_ref());
                    TestResult::errored(
                        &worker_case,
                        url,
                        format!("test worker panicked: {}", reason),
                        0.0,
                    )
                }
            };
            if !result.passed && stop_on_fail && !stop.swap(true, Ordering::SeqCst) {
                tracing::info!("Stopping on first failure ({})", result.name);
            }
            result
        });
        handles.push((case, handle));
    }

    let joined = join_all(
        handles
            .into_iter()
            .map(|(case, handle)| async move { (case, handle.await) }),
    )
    .await;

    let mut results = Vec::with_capacity(joined.len());
    for (case, outcome) in joined {
        let result = match outcome {
            Ok(result) => result,
            Err(err) => {
                tracing::error!("Test {} aborted: {}", case.name, err);
                if stop_on_fail {
                    stop.store(true, Ordering::SeqCst);
                }
                let url = case.target.display(settings.base_url.as_ref());
                TestResult::errored(&case, url, format!("test worker aborted: {}", err), 0.0)
            }
        };
        results.push(result);
    }

    let passed = results.iter().filter(|result| result.passed).count();
    let failed = results.len() - passed;
    RunReport {
        results,
        passed,
        failed,
        not_started,
        stopped_early: stop.load(Ordering::SeqCst),
        concurrency,
        duration: started.elapsed().as_secs_f64(),
    }
}

fn panic_reason(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
