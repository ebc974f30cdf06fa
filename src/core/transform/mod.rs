//! Named transforms that rewrite tagged configuration blocks.
//!
//! A block written as `status<multiple>: 200 | 404` is handed to the transform
//! registered as `multiple`, and its output replaces the block under `status`.

use crate::core::document::Node;

pub mod builtin;
pub mod plugins;
pub mod registry;

pub use registry::{RegistryError, RegistryListing, TransformRegistry, TransformRegistryBuilder};

/// Read-only view handed to every transform invocation.
#[derive(Debug, Clone, Copy)]
pub struct TransformContext<'a> {
    /// The whole test document before any transform ran, so transforms can
    /// inspect sibling fields.
    pub document: &'a Node,
    /// Provenance of the document, `<file>#<index>`.
    pub source: &'a str,
}

impl<'a> TransformContext<'a> {
    pub fn new(document: &'a Node, source: &'a str) -> Self {
        Self { document, source }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TransformError {
    #[error("unsupported input: {0}")]
    InvalidInput(String),
    #[error("command `{command}` failed: {message}")]
    Command { command: String, message: String },
    #[error("{0}")]
    Failed(String),
}

/// Capability contract every transform satisfies, built-in or user supplied.
pub trait Transform: Send + Sync + 'static {
    /// Produce the replacement value for `block_key`.
    fn process(
        &self,
        block_key: &str,
        block_value: &Node,
        context: &TransformContext<'_>,
    ) -> Result<Node, TransformError>;

    /// Report whether `block_value` is an input this transform can handle.
    fn validate(&self, block_key: &str, block_value: &Node) -> bool;
}
