use serde::{Deserialize, Serialize};

/// Error category enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCategory {
    ConfigError,
    ValidationError,
    SerializationError,
    IoError,
    InternalError,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Error severity enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorSeverity {
    Error,
    /// The affected unit was skipped; the run continues.
    Warning,
}

/// Which namespace a transform was registered in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Namespace {
    Builtin,
    User,
}

impl std::fmt::Display for Namespace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Namespace::Builtin => write!(f, "builtin"),
            Namespace::User => write!(f, "user"),
        }
    }
}

/// Tie-break rule used when a transform name exists in both namespaces.
///
/// Serialized with the configuration spelling: `core` favors built-ins,
/// `non-core` favors user transforms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Precedence {
    #[serde(rename = "core")]
    FavorBuiltin,
    #[default]
    #[serde(rename = "non-core")]
    FavorUser,
}

impl std::fmt::Display for Precedence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Precedence::FavorBuiltin => write!(f, "core"),
            Precedence::FavorUser => write!(f, "non-core"),
        }
    }
}

impl std::str::FromStr for Precedence {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "core" | "builtin" | "favor-builtin" => Ok(Precedence::FavorBuiltin),
            "non-core" | "user" | "favor-user" => Ok(Precedence::FavorUser),
            other => Err(format!(
                "invalid extension precedence '{}'; supported values are core, non-core",
                other
            )),
        }
    }
}
