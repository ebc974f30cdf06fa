use apiprobe::core::document::Node;
use apiprobe::core::transform::{
    RegistryError, Transform, TransformContext, TransformError, TransformRegistry,
};
use apiprobe::core::types::{Namespace, Precedence};
use std::sync::Arc;

/// Replaces any block with a fixed label so the winning namespace is visible.
struct Label(&'static str);

impl Transform for Label {
    fn process(
        &self,
        _block_key: &str,
        _block_value: &Node,
        _context: &TransformContext<'_>,
    ) -> Result<Node, TransformError> {
        Ok(Node::string(self.0))
    }

    fn validate(&self, _block_key: &str, _block_value: &Node) -> bool {
        true
    }
}

fn registry(precedence: Precedence) -> TransformRegistry {
    let mut builder = TransformRegistry::builder();
    builder.precedence(precedence);
    builder
        .register(Namespace::Builtin, "shared", Label("builtin"))
        .unwrap();
    builder
        .register(Namespace::User, "shared", Label("user"))
        .unwrap();
    builder
        .register(Namespace::User, "only-user", Label("user"))
        .unwrap();
    builder.build()
}

fn apply(registry: &TransformRegistry, name: &str) -> Node {
    let document = Node::map();
    let context = TransformContext::new(&document, "registry.yaml#1");
    registry
        .resolve(name)
        .unwrap()
        .process("body", &Node::null(), &context)
        .unwrap()
}

#[test]
fn test_favor_user_resolves_user_transform() {
    let registry = registry(Precedence::FavorUser);
    assert_eq!(apply(&registry, "shared"), Node::string("user"));
    let (namespace, _) = registry.resolve_with_origin("shared").unwrap();
    assert_eq!(namespace, Namespace::User);
}

#[test]
fn test_favor_builtin_resolves_builtin_transform() {
    let registry = registry(Precedence::FavorBuiltin);
    assert_eq!(apply(&registry, "shared"), Node::string("builtin"));
    let (namespace, _) = registry.resolve_with_origin("shared").unwrap();
    assert_eq!(namespace, Namespace::Builtin);
}

#[test]
fn test_lookup_falls_through_to_other_namespace() {
    let registry = registry(Precedence::FavorBuiltin);
    let (namespace, _) = registry.resolve_with_origin("only-user").unwrap();
    assert_eq!(namespace, Namespace::User);
    assert!(registry.resolve("missing").is_none());
}

#[test]
fn test_resolve_is_idempotent() {
    let registry = registry(Precedence::FavorUser);
    let first = registry.resolve("shared").unwrap();
    let second = registry.resolve("shared").unwrap();
    assert!(Arc::ptr_eq(&first, &second));

    let shared = registry.clone();
    let third = shared.resolve("shared").unwrap();
    assert!(Arc::ptr_eq(&first, &third));
}

#[test]
fn test_duplicate_registration_is_rejected() {
    let mut builder = TransformRegistry::builder();
    builder
        .register(Namespace::User, "twice", Label("first"))
        .unwrap();
    let err = builder
        .register(Namespace::User, "twice", Label("second"))
        .err()
        .unwrap();
    assert!(matches!(
        err,
        RegistryError::DuplicateTransform {
            namespace: Namespace::User,
            ..
        }
    ));

    let registry = builder.build();
    assert_eq!(apply(&registry, "twice"), Node::string("first"));
}

#[test]
fn test_tag_characters_are_not_valid_names() {
    let mut builder = TransformRegistry::builder();
    let err = builder
        .register(Namespace::User, "bad<name>", Label("x"))
        .err()
        .unwrap();
    assert!(matches!(err, RegistryError::InvalidName(_)));
}

#[test]
fn test_builtins_are_listed() {
    let registry = TransformRegistry::with_builtins(Precedence::FavorBuiltin);
    let listing = registry.list();
    assert_eq!(listing.builtin, vec!["multiple", "encoded_values"]);
    assert!(listing.user.is_empty());
    assert_eq!(listing.precedence, Precedence::FavorBuiltin);
}
