use crate::core::transform::{Transform, TransformRegistryBuilder};
use crate::core::types::Namespace;
use std::sync::Arc;

mod encoded_values;
mod multiple;

pub use encoded_values::EncodedValuesTransform;
pub use multiple::MultipleTransform;

/// Register every built-in transform into the builtin namespace.
pub fn register_builtins(builder: &mut TransformRegistryBuilder) {
    let transforms: Vec<(&str, Arc<dyn Transform>)> = vec![
        ("multiple", Arc::new(MultipleTransform)),
        ("encoded_values", Arc::new(EncodedValuesTransform)),
    ];
    for (name, transform) in transforms {
        if let Err(err) = builder.register_shared(Namespace::Builtin, name, transform) {
            tracing::warn!("skipping builtin transform '{}': {}", name, err);
        }
    }
}
