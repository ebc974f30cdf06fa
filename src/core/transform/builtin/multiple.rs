use crate::core::document::Node;
use crate::core::transform::{Transform, TransformContext, TransformError};
use indexmap::IndexMap;

/// Turns `200 | 404` into `{type: multiple, values: [200, 404]}`.
///
/// Values under a `status` key are converted to integers where possible; a
/// value that does not parse is kept as text.
pub struct MultipleTransform;

impl MultipleTransform {
    fn split(text: &str) -> Vec<&str> {
        text.split('|').map(str::trim).collect()
    }
}

impl Transform for MultipleTransform {
    fn process(
        &self,
        block_key: &str,
        block_value: &Node,
        _context: &TransformContext<'_>,
    ) -> Result<Node, TransformError> {
        let Some(text) = block_value.as_str().filter(|text| text.contains('|')) else {
            return Ok(block_value.clone());
        };
        let values = Self::split(text)
            .into_iter()
            .map(|part| {
                if block_key == "status" {
                    match part.parse::<i64>() {
                        Ok(code) => Node::int(code),
                        Err(_) => Node::string(part),
                    }
                } else {
                    Node::string(part)
                }
            })
            .collect();

        let mut map = IndexMap::new();
        map.insert("type".to_string(), Node::string("multiple"));
        map.insert("values".to_string(), Node::Seq(values));
        Ok(Node::Map(map))
    }

    fn validate(&self, _block_key: &str, block_value: &Node) -> bool {
        match block_value.as_str() {
            Some(text) if text.contains('|') => {
                let parts = Self::split(text);
                parts.len() > 1 && parts.iter().all(|part| !part.is_empty())
            }
            _ => true,
        }
    }
}
