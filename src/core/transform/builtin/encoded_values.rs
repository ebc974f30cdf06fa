use crate::core::document::{Node, Scalar};
use crate::core::transform::{Transform, TransformContext, TransformError};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;

/// Base64-encodes the values of a key/value map, keeping the keys.
///
/// ```yaml
/// body<encoded_values>:
///   username: john_doe
/// ```
/// becomes `body: {username: am9obl9kb2U=}`.
pub struct EncodedValuesTransform;

fn encode(text: &str) -> Node {
    Node::string(STANDARD.encode(text.as_bytes()))
}

impl Transform for EncodedValuesTransform {
    fn process(
        &self,
        _block_key: &str,
        block_value: &Node,
        _context: &TransformContext<'_>,
    ) -> Result<Node, TransformError> {
        let Some(map) = block_value.as_map() else {
            return Ok(block_value.clone());
        };
        let encoded = map
            .iter()
            .map(|(key, value)| {
                let replacement = match value {
                    Node::Scalar(Scalar::Str(text)) => encode(text),
                    Node::Scalar(Scalar::Null) | Node::Seq(_) | Node::Map(_) => value.clone(),
                    scalar => encode(&scalar.scalar_text().unwrap_or_default()),
                };
                (key.clone(), replacement)
            })
            .collect();
        Ok(Node::Map(encoded))
    }

    fn validate(&self, _block_key: &str, block_value: &Node) -> bool {
        match block_value.as_map() {
            Some(map) => map.values().all(|value| {
                matches!(
                    value,
                    Node::Scalar(Scalar::Str(_))
                        | Node::Scalar(Scalar::Int(_))
                        | Node::Scalar(Scalar::Float(_))
                        | Node::Scalar(Scalar::Bool(_))
                )
            }),
            None => false,
        }
    }
}
