use crate::core::transform::plugins::TransformDefinition;
use crate::core::transform::{builtin, Transform};
use crate::core::types::{Namespace, Precedence};
use indexmap::IndexMap;
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("transform '{name}' is already registered in the {namespace} namespace")]
    DuplicateTransform { namespace: Namespace, name: String },
    #[error("transform '{name}' does not satisfy the transform contract: {reason}")]
    InvalidTransformKind { name: String, reason: String },
    #[error("'{0}' cannot be used as a transform name")]
    InvalidName(String),
}

type TransformMap = IndexMap<String, Arc<dyn Transform>>;

/// Builder used to register transforms during the load phase.
pub struct TransformRegistryBuilder {
    builtin: TransformMap,
    user: TransformMap,
    precedence: Precedence,
}

impl Default for TransformRegistryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TransformRegistryBuilder {
    pub fn new() -> Self {
        Self {
            builtin: IndexMap::new(),
            user: IndexMap::new(),
            precedence: Precedence::default(),
        }
    }

    pub fn precedence(&mut self, precedence: Precedence) -> &mut Self {
        self.precedence = precedence;
        self
    }

    pub fn register<T: Transform>(
        &mut self,
        namespace: Namespace,
        name: &str,
        transform: T,
    ) -> Result<&mut Self, RegistryError> {
        self.register_shared(namespace, name, Arc::new(transform))
    }

    pub fn register_shared(
        &mut self,
        namespace: Namespace,
        name: &str,
        transform: Arc<dyn Transform>,
    ) -> Result<&mut Self, RegistryError> {
        validate_name(name)?;
        let map = self.namespace_mut(namespace);
        if map.contains_key(name) {
            return Err(RegistryError::DuplicateTransform {
                namespace,
                name: name.to_string(),
            });
        }
        map.insert(name.to_string(), transform);
        Ok(self)
    }

    /// Register a transform declared in an extension manifest.
    pub fn register_definition(
        &mut self,
        namespace: Namespace,
        definition: &TransformDefinition,
    ) -> Result<&mut Self, RegistryError> {
        let name = definition
            .name
            .as_deref()
            .ok_or_else(|| RegistryError::InvalidTransformKind {
                name: "<unnamed>".to_string(),
                reason: "definition has no name".to_string(),
            })?;
        let transform = definition.build()?;
        self.register_shared(namespace, name, transform)
    }

    pub fn build(self) -> TransformRegistry {
        TransformRegistry {
            inner: Arc::new(RegistryInner {
                builtin: self.builtin,
                user: self.user,
                precedence: self.precedence,
            }),
        }
    }

    fn namespace_mut(&mut self, namespace: Namespace) -> &mut TransformMap {
        match namespace {
            Namespace::Builtin => &mut self.builtin,
            Namespace::User => &mut self.user,
        }
    }
}

fn validate_name(name: &str) -> Result<(), RegistryError> {
    if name.trim().is_empty() || name.contains(['<', '>']) || name != name.trim() {
        return Err(RegistryError::InvalidName(name.to_string()));
    }
    Ok(())
}

struct RegistryInner {
    builtin: TransformMap,
    user: TransformMap,
    precedence: Precedence,
}

/// Immutable registry shared by document processing once loading finishes.
#[derive(Clone)]
pub struct TransformRegistry {
    inner: Arc<RegistryInner>,
}

/// Introspection snapshot of a registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegistryListing {
    pub builtin: Vec<String>,
    pub user: Vec<String>,
    pub precedence: Precedence,
}

impl Default for TransformRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl TransformRegistry {
    /// An empty registry with default precedence.
    pub fn new() -> Self {
        TransformRegistryBuilder::new().build()
    }

    pub fn builder() -> TransformRegistryBuilder {
        TransformRegistryBuilder::new()
    }

    /// Registry holding only the built-in transforms.
    pub fn with_builtins(precedence: Precedence) -> Self {
        let mut builder = TransformRegistryBuilder::new();
        builder.precedence(precedence);
        builtin::register_builtins(&mut builder);
        builder.build()
    }

    pub fn precedence(&self) -> Precedence {
        self.inner.precedence
    }

    /// Look up `name`, consulting the favored namespace first.
    pub fn resolve(&self, name: &str) -> Option<Arc<dyn Transform>> {
        self.resolve_with_origin(name)
            .map(|(_, transform)| transform)
    }

    pub fn resolve_with_origin(&self, name: &str) -> Option<(Namespace, Arc<dyn Transform>)> {
        let order = match self.inner.precedence {
            Precedence::FavorBuiltin => [Namespace::Builtin, Namespace::User],
            Precedence::FavorUser => [Namespace::User, Namespace::Builtin],
        };
        order.into_iter().find_map(|namespace| {
            let map = match namespace {
                Namespace::Builtin => &self.inner.builtin,
                Namespace::User => &self.inner.user,
            };
            map.get(name)
                .map(|transform| (namespace, Arc::clone(transform)))
        })
    }

    pub fn list(&self) -> RegistryListing {
        RegistryListing {
            builtin: self.inner.builtin.keys().cloned().collect(),
            user: self.inner.user.keys().cloned().collect(),
            precedence: self.inner.precedence,
        }
    }
}

impl std::fmt::Debug for TransformRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransformRegistry")
            .field("listing", &self.list())
            .finish()
    }
}
