//! Applies tagged-key transforms across a configuration document.

use crate::core::document::{parse_tagged_key, Node, TaggedKey};
use crate::core::transform::{TransformContext, TransformRegistry};
use indexmap::IndexMap;
use serde::Serialize;

/// Why a tagged block fell back to its original value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    UnknownTransform,
    InvalidInput,
    TransformFailed,
}

/// A non-fatal problem recorded while processing one block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub source: String,
    /// Dotted path to the block, e.g. `expected.status<multiple>`.
    pub path: String,
    pub transform: String,
    pub message: String,
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} at {}: transform '{}' {}",
            self.source, self.path, self.transform, self.message
        )
    }
}

/// Result of processing a document.
#[derive(Debug, Clone)]
pub struct Processed {
    pub document: Node,
    pub diagnostics: Vec<Diagnostic>,
}

/// Walks documents depth-first and substitutes transform output for tagged
/// blocks. Each tagged block is transformed exactly once; output is never
/// re-processed.
pub struct BlockProcessor<'r> {
    registry: &'r TransformRegistry,
}

impl<'r> BlockProcessor<'r> {
    pub fn new(registry: &'r TransformRegistry) -> Self {
        Self { registry }
    }

    pub fn process_document(&self, document: &Node, context: &TransformContext<'_>) -> Processed {
        let mut diagnostics = Vec::new();
        let document = self.walk(document, "", context, &mut diagnostics);
        Processed {
            document,
            diagnostics,
        }
    }

    fn walk(
        &self,
        node: &Node,
        path: &str,
        context: &TransformContext<'_>,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Node {
        match node {
            Node::Map(map) => {
                let mut processed = IndexMap::with_capacity(map.len());
                for (key, value) in map {
                    let child_path = join_path(path, key);
                    if key.starts_with('_') {
                        processed.insert(key.clone(), value.clone());
                    } else if let Some(tagged) = parse_tagged_key(key) {
                        let output = self.apply(tagged, value, &child_path, context, diagnostics);
                        processed.insert(tagged.base.to_string(), output);
                    } else {
                        let output = self.walk(value, &child_path, context, diagnostics);
                        processed.insert(key.clone(), output);
                    }
                }
                Node::Map(processed)
            }
            Node::Seq(items) => Node::Seq(
                items
                    .iter()
                    .enumerate()
                    .map(|(index, item)| {
                        let child_path = format!("{}[{}]", path, index);
                        self.walk(item, &child_path, context, diagnostics)
                    })
                    .collect(),
            ),
            Node::Scalar(_) => node.clone(),
        }
    }

    fn apply(
        &self,
        tagged: TaggedKey<'_>,
        value: &Node,
        path: &str,
        context: &TransformContext<'_>,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Node {
        let mut record = |kind: DiagnosticKind, message: String| {
            let diagnostic = Diagnostic {
                kind,
                source: context.source.to_string(),
                path: path.to_string(),
                transform: tagged.transform.to_string(),
                message,
            };
            tracing::warn!("{}", diagnostic);
            diagnostics.push(diagnostic);
        };

        let Some((namespace, transform)) = self.registry.resolve_with_origin(tagged.transform)
        else {
            record(DiagnosticKind::UnknownTransform, "not found".to_string());
            return value.clone();
        };

        if !transform.validate(tagged.base, value) {
            record(
                DiagnosticKind::InvalidInput,
                format!("rejected the value of '{}'", tagged.base),
            );
            return value.clone();
        }

        match transform.process(tagged.base, value, context) {
            Ok(output) => {
                tracing::trace!(
                    "applied {} transform '{}' at {}",
                    namespace,
                    tagged.transform,
                    path
                );
                output
            }
            Err(err) => {
                record(DiagnosticKind::TransformFailed, format!("failed: {}", err));
                value.clone()
            }
        }
    }
}

fn join_path(parent: &str, key: &str) -> String {
    if parent.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", parent, key)
    }
}
