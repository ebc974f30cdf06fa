use crate::core::document::{Node, NodeKind};
use crate::core::transform::registry::RegistryError;
use crate::core::transform::{Transform, TransformContext, TransformError};
use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::json;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::{ChildStdin, Command, Stdio};
use std::sync::Arc;
use std::thread;

/// Top-level shape of an extension manifest file.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct TransformManifest {
    #[serde(default)]
    pub transforms: Vec<TransformDefinition>,
}

/// One transform declared by a manifest.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct TransformDefinition {
    /// Registration name. Entries without one are reported, never activated.
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub kind: Option<String>,
    /// Payload for `merge` and `constant`.
    #[serde(default)]
    pub value: Option<serde_yaml::Value>,
    /// Program and arguments for `command`.
    #[serde(default)]
    pub command: Vec<String>,
    /// Input shapes accepted by `validate`; empty accepts everything.
    #[serde(default)]
    pub accepts: Vec<NodeKind>,
    /// Directory of the manifest; relative command paths resolve against it.
    #[serde(skip)]
    pub base_dir: Option<PathBuf>,
}

impl TransformDefinition {
    fn display_name(&self) -> String {
        self.name.clone().unwrap_or_else(|| "<unnamed>".to_string())
    }

    fn invalid(&self, reason: impl Into<String>) -> RegistryError {
        RegistryError::InvalidTransformKind {
            name: self.display_name(),
            reason: reason.into(),
        }
    }

    /// Build the transform this definition describes.
    pub fn build(&self) -> Result<Arc<dyn Transform>, RegistryError> {
        let kind = self
            .kind
            .as_deref()
            .ok_or_else(|| self.invalid("missing `kind`"))?;
        let accepts = self.accepts.clone();
        match kind {
            "merge" => {
                let value = self
                    .value
                    .clone()
                    .map(Node::from_yaml)
                    .ok_or_else(|| self.invalid("`merge` requires a `value` map"))?;
                let Node::Map(entries) = value else {
                    return Err(self.invalid("`merge` value must be a map"));
                };
                Ok(Arc::new(MergeTransform { entries, accepts }))
            }
            "constant" => {
                let value = self
                    .value
                    .clone()
                    .map(Node::from_yaml)
                    .ok_or_else(|| self.invalid("`constant` requires a `value`"))?;
                Ok(Arc::new(ConstantTransform { value, accepts }))
            }
            "command" => {
                let (program, args) = self
                    .command
                    .split_first()
                    .ok_or_else(|| self.invalid("`command` requires a non-empty `command` list"))?;
                Ok(Arc::new(CommandTransform {
                    program: resolve_program(program, self.base_dir.as_deref()),
                    args: args.to_vec(),
                    working_dir: self.base_dir.clone(),
                    accepts,
                }))
            }
            other => Err(self.invalid(format!(
                "unknown kind '{}'; supported kinds are merge, constant, command",
                other
            ))),
        }
    }
}

fn resolve_program(program: &str, base_dir: Option<&Path>) -> PathBuf {
    let path = PathBuf::from(program);
    match base_dir {
        Some(base) if path.is_relative() && path.components().count() > 1 => base.join(path),
        _ => path,
    }
}

fn accepts_kind(accepts: &[NodeKind], value: &Node) -> bool {
    accepts.is_empty() || accepts.contains(&value.kind())
}

/// Merges a fixed map into map-shaped blocks; any other block is replaced by
/// the map itself.
pub struct MergeTransform {
    entries: IndexMap<String, Node>,
    accepts: Vec<NodeKind>,
}

impl Transform for MergeTransform {
    fn process(
        &self,
        _block_key: &str,
        block_value: &Node,
        _context: &TransformContext<'_>,
    ) -> Result<Node, TransformError> {
        let mut merged = block_value.as_map().cloned().unwrap_or_default();
        for (key, value) in &self.entries {
            merged.insert(key.clone(), value.clone());
        }
        Ok(Node::Map(merged))
    }

    fn validate(&self, _block_key: &str, block_value: &Node) -> bool {
        accepts_kind(&self.accepts, block_value)
    }
}

/// Replaces the block with a fixed value.
pub struct ConstantTransform {
    value: Node,
    accepts: Vec<NodeKind>,
}

impl Transform for ConstantTransform {
    fn process(
        &self,
        _block_key: &str,
        _block_value: &Node,
        _context: &TransformContext<'_>,
    ) -> Result<Node, TransformError> {
        Ok(self.value.clone())
    }

    fn validate(&self, _block_key: &str, block_value: &Node) -> bool {
        accepts_kind(&self.accepts, block_value)
    }
}

/// Runs an external program that speaks JSON over stdio.
///
/// The program receives `{"key", "value", "source", "document"}` on stdin and
/// must print the replacement value as JSON on stdout.
pub struct CommandTransform {
    program: PathBuf,
    args: Vec<String>,
    working_dir: Option<PathBuf>,
    accepts: Vec<NodeKind>,
}

impl CommandTransform {
    fn command_line(&self) -> String {
        std::iter::once(self.program.display().to_string())
            .chain(self.args.iter().cloned())
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn failure(&self, message: impl Into<String>) -> TransformError {
        TransformError::Command {
            command: self.command_line(),
            message: message.into(),
        }
    }
}

/// A child that exits without reading its input closes the pipe early; that
/// is not a failure of the transform.
fn feed_stdin(mut stdin: ChildStdin, payload: &[u8]) -> io::Result<()> {
    match stdin.write_all(payload) {
        Err(err) if err.kind() == io::ErrorKind::BrokenPipe => Ok(()),
        other => other,
    }
}

impl Transform for CommandTransform {
    fn process(
        &self,
        block_key: &str,
        block_value: &Node,
        context: &TransformContext<'_>,
    ) -> Result<Node, TransformError> {
        let payload = json!({
            "key": block_key,
            "value": block_value.to_json(),
            "source": context.source,
            "document": context.document.to_json(),
        });

        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(dir) = &self.working_dir {
            command.current_dir(dir);
        }
        let mut child = command
            .spawn()
            .map_err(|err| self.failure(format!("spawn failed: {}", err)))?;

        // stdin is fed from its own thread while stdout and stderr drain, so a
        // filter that streams its output cannot stall on a full pipe.
        let input = payload.to_string();
        let stdin = child.stdin.take();
        let (output, written) = thread::scope(|scope| {
            let writer = scope.spawn(move || match stdin {
                Some(stdin) => feed_stdin(stdin, input.as_bytes()),
                None => Ok(()),
            });
            let output = child.wait_with_output();
            (output, writer.join())
        });

        let output = output.map_err(|err| self.failure(format!("failed to wait: {}", err)))?;
        written
            .map_err(|_| self.failure("stdin writer panicked"))?
            .map_err(|err| self.failure(format!("failed to write stdin: {}", err)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(self.failure(format!(
                "exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }
        let value: serde_json::Value = serde_json::from_slice(&output.stdout)
            .map_err(|err| self.failure(format!("stdout is not valid JSON: {}", err)))?;
        Ok(Node::from_json(value))
    }

    fn validate(&self, _block_key: &str, block_value: &Node) -> bool {
        accepts_kind(&self.accepts, block_value)
    }
}
