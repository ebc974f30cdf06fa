use apiprobe::core::document::parse_documents;
use apiprobe::core::executor::ActualResponse;
use apiprobe::core::validator::{validate, ExpectationSet, Rule, ValidationOptions};

fn expectations(yaml: &str) -> ExpectationSet {
    let node = parse_documents(yaml).unwrap().remove(0);
    ExpectationSet::from_node(Some(&node)).unwrap()
}

fn check(yaml: &str, actual: &ActualResponse) -> Result<(), Rule> {
    validate(&expectations(yaml), actual, &ValidationOptions::default())
        .map_err(|mismatch| mismatch.rule)
}

fn check_untrimmed(yaml: &str, actual: &ActualResponse) -> Result<(), Rule> {
    validate(
        &expectations(yaml),
        actual,
        &ValidationOptions { trim: false },
    )
    .map_err(|mismatch| mismatch.rule)
}

#[test]
fn test_scalar_status_requires_equality() {
    assert_eq!(check("status: 200", &ActualResponse::new(200, "")), Ok(()));
    assert_eq!(
        check("status: 200", &ActualResponse::new(201, "")),
        Err(Rule::Status)
    );
}

#[test]
fn test_status_set_requires_membership() {
    let yaml = "status: {type: multiple, values: [200, 404]}";
    assert_eq!(check(yaml, &ActualResponse::new(404, "")), Ok(()));
    assert_eq!(check(yaml, &ActualResponse::new(500, "")), Err(Rule::Status));
}

#[test]
fn test_non_integer_status_members_compare_as_text() {
    let yaml = "status: {type: multiple, values: [-1, \"404\", teapot]}";
    assert_eq!(check(yaml, &ActualResponse::new(404, "")), Ok(()));
    assert_eq!(check(yaml, &ActualResponse::new(200, "")), Err(Rule::Status));
}

#[test]
fn test_content_type_is_a_case_sensitive_prefix() {
    let actual = ActualResponse::new(200, "{}")
        .with_header("Content-Type", "application/json; charset=utf-8");
    assert_eq!(check("content-type: application/json", &actual), Ok(()));
    assert_eq!(
        check("content-type: Application/JSON", &actual),
        Err(Rule::ContentType)
    );
    assert_eq!(
        check("content-type: charset=utf-8", &actual),
        Err(Rule::ContentType)
    );
}

#[test]
fn test_content_type_set_accepts_any_prefix() {
    let yaml = "content-type: {type: multiple, values: [text/plain, application/json]}";
    let json = ActualResponse::new(200, "").with_header("content-type", "application/json");
    let html = ActualResponse::new(200, "").with_header("content-type", "text/html");
    assert_eq!(check(yaml, &json), Ok(()));
    assert_eq!(check(yaml, &html), Err(Rule::ContentType));
}

#[test]
fn test_missing_content_type_header_is_empty() {
    assert_eq!(
        check("content-type: text/plain", &ActualResponse::new(200, "")),
        Err(Rule::ContentType)
    );
}

#[test]
fn test_cors_wildcard_requires_wildcard() {
    let wildcard = ActualResponse::new(200, "").with_header("Access-Control-Allow-Origin", "*");
    let origin = ActualResponse::new(200, "")
        .with_header("Access-Control-Allow-Origin", "https://example.com");
    assert_eq!(check("cors: '*'", &wildcard), Ok(()));
    assert_eq!(check("cors: '*'", &origin), Err(Rule::Cors));
}

#[test]
fn test_cors_origin_is_a_substring_match() {
    let actual = ActualResponse::new(200, "").with_header(
        "access-control-allow-origin",
        "https://example.com, https://other.com",
    );
    assert_eq!(check("cors: https://example.com", &actual), Ok(()));
    assert_eq!(
        check("cors: https://third.com", &actual),
        Err(Rule::Cors)
    );
    assert_eq!(
        check("cors: https://example.com", &ActualResponse::new(200, "")),
        Err(Rule::Cors)
    );
}

#[test]
fn test_contains_body() {
    let yaml = "response: {type: contains, value: ok}";
    assert_eq!(check(yaml, &ActualResponse::new(200, "  status: ok \n")), Ok(()));
    assert_eq!(
        check(yaml, &ActualResponse::new(200, "status: fail")),
        Err(Rule::Response)
    );
}

#[test]
fn test_empty_body_respects_trim() {
    let yaml = "response: {type: empty}";
    let blank = ActualResponse::new(204, "   ");
    assert_eq!(check(yaml, &blank), Ok(()));
    assert_eq!(check_untrimmed(yaml, &blank), Err(Rule::Response));
}

#[test]
fn test_exact_body_compares_trimmed_text() {
    let yaml = "response: {type: exact, value: pong}";
    assert_eq!(check(yaml, &ActualResponse::new(200, "pong\n")), Ok(()));
    assert_eq!(
        check_untrimmed(yaml, &ActualResponse::new(200, "pong\n")),
        Err(Rule::Response)
    );
}

#[test]
fn test_regex_body_matches_anywhere() {
    let yaml = r#"response: {type: regex, value: '^"id": \d+$'}"#;
    let body = "{\n\"id\": 42\n}";
    assert_eq!(check(yaml, &ActualResponse::new(200, body)), Ok(()));
    assert_eq!(
        check(yaml, &ActualResponse::new(200, "{\"id\": \"x\"}")),
        Err(Rule::Response)
    );
}

#[test]
fn test_first_failing_rule_is_reported() {
    let yaml = "status: 200\ncontent-type: application/json\nresponse: {type: empty}";
    let actual = ActualResponse::new(500, "oops").with_header("content-type", "text/plain");
    let mismatch = validate(
        &expectations(yaml),
        &actual,
        &ValidationOptions::default(),
    )
    .unwrap_err();
    assert_eq!(mismatch.rule, Rule::Status);
    assert_eq!(mismatch.actual, "500");
    assert_eq!(
        mismatch.to_string(),
        "status check failed: expected 200, got '500'"
    );
}

#[test]
fn test_long_bodies_are_truncated_in_mismatch() {
    let body = "x".repeat(150);
    let mismatch = validate(
        &expectations("response: {type: exact, value: y}"),
        &ActualResponse::new(200, body),
        &ValidationOptions::default(),
    )
    .unwrap_err();
    assert_eq!(mismatch.actual.len(), 103);
    assert!(mismatch.actual.ends_with("..."));
}

#[test]
fn test_empty_expectations_accept_anything() {
    let set = ExpectationSet::from_node(None).unwrap();
    assert!(set.is_empty());
    assert!(validate(
        &set,
        &ActualResponse::new(503, "down"),
        &ValidationOptions::default()
    )
    .is_ok());
}

#[test]
fn test_invalid_response_type_is_rejected() {
    let node = parse_documents("response: {type: fuzzy, value: x}")
        .unwrap()
        .remove(0);
    assert!(ExpectationSet::from_node(Some(&node)).is_err());

    let node = parse_documents("response: {type: regex, value: '(unclosed'}")
        .unwrap()
        .remove(0);
    assert!(ExpectationSet::from_node(Some(&node)).is_err());
}
