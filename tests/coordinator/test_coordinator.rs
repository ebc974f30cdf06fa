use apiprobe::core::catalog::TestCase;
use apiprobe::core::coordinator::{run_all, RunOptions};
use apiprobe::core::document::parse_documents;
use apiprobe::core::executor::{
    ActualResponse, OutgoingRequest, RunSettings, Transport, TransportError,
};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Records how many requests are in flight at once. Paths containing `fail`
/// answer 500, paths containing `panic` panic, everything else answers 200.
#[derive(Default)]
struct Instrumented {
    in_flight: AtomicUsize,
    peak: AtomicUsize,
    calls: AtomicUsize,
}

#[async_trait]
impl Transport for Instrumented {
    async fn send(&self, request: OutgoingRequest) -> Result<ActualResponse, TransportError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(20)).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if request.url.path().contains("panic") {
            panic!("transport exploded");
        }
        let status = if request.url.path().contains("fail") {
            500
        } else {
            200
        };
        Ok(ActualResponse::new(status, "ok"))
    }
}

fn case(name: &str, path: &str) -> Arc<TestCase> {
    let yaml = format!(
        "name: {}\nurl: http://probe.test/{}\nexpected:\n  status: 200\n",
        name, path
    );
    let document = parse_documents(&yaml).unwrap().remove(0);
    Arc::new(TestCase::from_document(&document, "coordinator.yaml#1").unwrap())
}

fn options(max_concurrent: usize, stop_on_fail: bool) -> RunOptions {
    RunOptions {
        max_concurrent,
        stop_on_fail,
        settings: RunSettings {
            timeout: Duration::from_secs(5),
            ..RunSettings::default()
        },
    }
}

#[tokio::test]
async fn test_in_flight_requests_never_exceed_limit() {
    let transport = Arc::new(Instrumented::default());
    let cases = (0..50)
        .map(|index| case(&format!("case-{}", index), &format!("ok/{}", index)))
        .collect();

    let report = run_all(cases, transport.clone(), options(5, false)).await;

    assert_eq!(report.results.len(), 50);
    assert_eq!(report.passed, 50);
    assert!(report.success());
    assert_eq!(report.concurrency, 5);
    assert_eq!(transport.calls.load(Ordering::SeqCst), 50);
    let peak = transport.peak.load(Ordering::SeqCst);
    assert!(peak <= 5, "peak in-flight was {}", peak);
    assert!(peak > 1, "cases never overlapped");
}

#[tokio::test]
async fn test_results_keep_submission_order() {
    let transport = Arc::new(Instrumented::default());
    let cases = vec![
        case("first", "ok/1"),
        case("second", "fail/2"),
        case("third", "ok/3"),
    ];

    let report = run_all(cases, transport, options(3, false)).await;

    let names: Vec<&str> = report
        .results
        .iter()
        .map(|result| result.name.as_str())
        .collect();
    assert_eq!(names, vec!["first", "second", "third"]);
    assert_eq!(report.passed, 2);
    assert_eq!(report.failed, 1);
    assert!(!report.success());
    assert!(!report.stopped_early);
    assert_eq!(report.not_started, 0);
}

#[tokio::test]
async fn test_stop_on_fail_leaves_later_cases_unstarted() {
    let transport = Arc::new(Instrumented::default());
    let cases = vec![
        case("one", "ok/1"),
        case("two", "fail/2"),
        case("three", "ok/3"),
        case("four", "ok/4"),
        case("five", "ok/5"),
    ];

    let report = run_all(cases, transport.clone(), options(1, true)).await;

    assert!(report.stopped_early);
    assert_eq!(report.passed, 1);
    assert_eq!(report.failed, 1);
    assert_eq!(report.not_started, 3);
    assert_eq!(report.total(), 5);
    assert_eq!(transport.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_failures_without_stop_on_fail_run_everything() {
    let transport = Arc::new(Instrumented::default());
    let cases = (0..10)
        .map(|index| case(&format!("case-{}", index), &format!("fail/{}", index)))
        .collect();

    let report = run_all(cases, transport.clone(), options(2, false)).await;

    assert_eq!(report.failed, 10);
    assert_eq!(report.not_started, 0);
    assert_eq!(transport.calls.load(Ordering::SeqCst), 10);
}

#[tokio::test]
async fn test_panicking_case_fails_and_stops_admission() {
    let transport = Arc::new(Instrumented::default());
    let cases = vec![
        case("one", "ok/1"),
        case("two", "panic/2"),
        case("three", "ok/3"),
        case("four", "ok/4"),
    ];

    let report = run_all(cases, transport.clone(), options(1, true)).await;

    assert!(report.stopped_early);
    assert_eq!(report.passed, 1);
    assert_eq!(report.failed, 1);
    assert_eq!(report.not_started, 2);
    let error = report.results[1].error.as_deref().unwrap();
    assert!(error.contains("transport exploded"), "{}", error);
}
