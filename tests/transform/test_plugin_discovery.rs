use apiprobe::core::block_processor::BlockProcessor;
use apiprobe::core::document::{parse_documents, Node};
use apiprobe::core::transform::plugins::{load_registry, manifest_files};
use apiprobe::core::transform::TransformContext;
use apiprobe::core::types::{Namespace, Precedence};
use std::fs;
use tempfile::TempDir;

fn write(dir: &TempDir, name: &str, content: &str) {
    fs::write(dir.path().join(name), content).unwrap();
}

#[test]
fn test_named_entries_are_registered_in_user_namespace() {
    let dir = TempDir::new().unwrap();
    write(
        &dir,
        "headers.yaml",
        r#"
transforms:
  - name: auth_headers
    kind: merge
    value:
      Authorization: Bearer test-token
  - name: fixed_body
    kind: constant
    value: {ping: pong}
"#,
    );

    let (registry, report) = load_registry(Precedence::FavorUser, dir.path());
    assert_eq!(report.registered, vec!["auth_headers", "fixed_body"]);
    assert!(report.warnings.is_empty());

    let listing = registry.list();
    assert_eq!(listing.user, vec!["auth_headers", "fixed_body"]);
    assert!(listing.builtin.contains(&"multiple".to_string()));

    let (namespace, _) = registry.resolve_with_origin("auth_headers").unwrap();
    assert_eq!(namespace, Namespace::User);
}

#[test]
fn test_unnamed_and_unknown_entries_are_reported() {
    let dir = TempDir::new().unwrap();
    write(
        &dir,
        "mixed.yaml",
        r#"
transforms:
  - kind: constant
    value: 1
  - name: warp
    kind: teleport
  - name: good
    kind: constant
    value: 2
"#,
    );

    let (registry, report) = load_registry(Precedence::FavorUser, dir.path());
    assert_eq!(report.registered, vec!["good"]);
    assert_eq!(report.warnings.len(), 2);
    assert!(report.warnings[0].contains("has no name"));
    assert!(report.warnings[1].contains("teleport"));
    assert!(registry.resolve("warp").is_none());
}

#[test]
fn test_broken_manifest_does_not_stop_discovery() {
    let dir = TempDir::new().unwrap();
    write(&dir, "a_broken.yaml", "transforms: [unclosed\n");
    write(
        &dir,
        "b_good.yml",
        "transforms:\n  - name: later\n    kind: constant\n    value: ok\n",
    );

    let (registry, report) = load_registry(Precedence::FavorUser, dir.path());
    assert_eq!(report.warnings.len(), 1);
    assert!(report.warnings[0].contains("a_broken.yaml"));
    assert!(registry.resolve("later").is_some());
}

#[test]
fn test_manifest_files_are_sorted_and_filtered() {
    let dir = TempDir::new().unwrap();
    write(&dir, "b.yaml", "");
    write(&dir, "a.yml", "");
    write(&dir, "_disabled.yaml", "");
    write(&dir, "notes.txt", "");

    let names: Vec<String> = manifest_files(dir.path())
        .unwrap()
        .iter()
        .map(|path| path.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec!["a.yml", "b.yaml"]);
}

#[test]
fn test_user_transform_shadows_builtin_only_when_favored() {
    let dir = TempDir::new().unwrap();
    write(
        &dir,
        "override.yaml",
        "transforms:\n  - name: multiple\n    kind: constant\n    value: overridden\n",
    );

    let (favor_user, _) = load_registry(Precedence::FavorUser, dir.path());
    let (favor_builtin, _) = load_registry(Precedence::FavorBuiltin, dir.path());
    assert_eq!(
        favor_user.resolve_with_origin("multiple").unwrap().0,
        Namespace::User
    );
    assert_eq!(
        favor_builtin.resolve_with_origin("multiple").unwrap().0,
        Namespace::Builtin
    );
}

#[test]
fn test_missing_directory_yields_builtins_only() {
    let dir = TempDir::new().unwrap();
    let (registry, report) = load_registry(Precedence::FavorUser, &dir.path().join("absent"));
    assert!(report.registered.is_empty());
    assert!(report.warnings.is_empty());
    assert_eq!(registry.list().builtin.len(), 2);
}

#[test]
fn test_merge_transform_applies_through_block_processor() {
    let dir = TempDir::new().unwrap();
    write(
        &dir,
        "headers.yaml",
        "transforms:\n  - name: auth\n    kind: merge\n    value: {Authorization: Bearer t}\n",
    );
    let (registry, _) = load_registry(Precedence::FavorUser, dir.path());

    let document = parse_documents("headers<auth>:\n  Accept: text/plain\n")
        .unwrap()
        .remove(0);
    let context = TransformContext::new(&document, "h.yaml#1");
    let processed = BlockProcessor::new(&registry).process_document(&document, &context);
    let headers = processed.document.get("headers").unwrap();
    assert_eq!(headers.get("Accept"), Some(&Node::string("text/plain")));
    assert_eq!(headers.get("Authorization"), Some(&Node::string("Bearer t")));
}

#[cfg(unix)]
#[test]
fn test_command_transform_reads_stdout_as_json() {
    let dir = TempDir::new().unwrap();
    write(
        &dir,
        "command.yaml",
        r#"
transforms:
  - name: shout
    kind: command
    command: ["sh", "-c", "cat > /dev/null; echo '\"LOUD\"'"]
"#,
    );
    let (registry, report) = load_registry(Precedence::FavorUser, dir.path());
    assert_eq!(report.registered, vec!["shout"]);

    let document = parse_documents("body<shout>: quiet\n").unwrap().remove(0);
    let context = TransformContext::new(&document, "c.yaml#1");
    let processed = BlockProcessor::new(&registry).process_document(&document, &context);
    assert_eq!(processed.document.get("body"), Some(&Node::string("LOUD")));
    assert!(processed.diagnostics.is_empty());
}

#[cfg(unix)]
fn large_document(tag: &str) -> Node {
    let padding = "x".repeat(256 * 1024);
    let yaml = format!("body<{}>: quiet\nnotes: {}\n", tag, padding);
    parse_documents(&yaml).unwrap().remove(0)
}

#[cfg(unix)]
#[test]
fn test_command_streaming_large_payload_completes() {
    let dir = TempDir::new().unwrap();
    write(
        &dir,
        "echo.yaml",
        "transforms:\n  - name: echo_back\n    kind: command\n    command: [\"cat\"]\n",
    );
    let (registry, _) = load_registry(Precedence::FavorUser, dir.path());

    let document = large_document("echo_back");
    let context = TransformContext::new(&document, "big.yaml#1");
    let processed = BlockProcessor::new(&registry).process_document(&document, &context);

    assert!(processed.diagnostics.is_empty());
    let body = processed.document.get("body").unwrap();
    assert_eq!(body.get("key"), Some(&Node::string("body")));
    assert_eq!(body.get("value"), Some(&Node::string("quiet")));
    assert_eq!(body.get("source"), Some(&Node::string("big.yaml#1")));
}

#[cfg(unix)]
#[test]
fn test_command_ignoring_large_stdin_still_succeeds() {
    let dir = TempDir::new().unwrap();
    write(
        &dir,
        "one.yaml",
        "transforms:\n  - name: one\n    kind: command\n    command: [\"echo\", \"1\"]\n",
    );
    let (registry, _) = load_registry(Precedence::FavorUser, dir.path());

    let document = large_document("one");
    let context = TransformContext::new(&document, "big.yaml#1");
    let processed = BlockProcessor::new(&registry).process_document(&document, &context);

    assert!(processed.diagnostics.is_empty(), "{:?}", processed.diagnostics);
    assert_eq!(processed.document.get("body"), Some(&Node::int(1)));
}
