use crate::core::types::{ErrorCategory, ErrorSeverity};
use chrono::{DateTime, Utc};
use std::collections::HashMap;

#[derive(Debug)]
pub struct AppError {
    pub category: ErrorCategory,
    pub severity: ErrorSeverity,
    pub code: String,
    pub message: String,
    pub context: HashMap<String, String>,
    pub occurred_at: DateTime<Utc>,
    pub source: Option<anyhow::Error>,
}

impl AppError {
    pub fn new<T: Into<String>>(category: ErrorCategory, message: T) -> Self {
        let severity = match category {
            ErrorCategory::ValidationError => ErrorSeverity::Warning,
            ErrorCategory::ConfigError
            | ErrorCategory::SerializationError
            | ErrorCategory::IoError
            | ErrorCategory::InternalError => ErrorSeverity::Error,
        };
        AppError {
            category,
            severity,
            code: format!("ERR-{}", uuid::Uuid::new_v4()),
            message: message.into(),
            context: HashMap::new(),
            occurred_at: Utc::now(),
            source: None,
        }
    }

    pub fn with_context<K: Into<String>, V: Into<String>>(mut self, key: K, value: V) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    pub fn with_code<T: Into<String>>(mut self, code: T) -> Self {
        self.code = code.into();
        self
    }

    pub fn severity(&self) -> ErrorSeverity {
        self.severity
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}: {}", self.code, self.category, self.message)?;
        if !self.context.is_empty() {
            let mut pairs: Vec<_> = self.context.iter().collect();
            pairs.sort();
            write!(f, " (")?;
            for (index, (key, value)) in pairs.into_iter().enumerate() {
                if index > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}={}", key, value)?;
            }
            write!(f, ")")?;
        }
        if let Some(ref source) = self.source {
            write!(f, "\nCaused by: {}", source)?;
        }
        Ok(())
    }
}

impl std::error::Error for AppError {}

impl From<anyhow::Error> for AppError {
    fn from(e: anyhow::Error) -> Self {
        AppError {
            category: ErrorCategory::InternalError,
            severity: ErrorSeverity::Error,
            code: "ANYHOW_ERROR".to_string(),
            message: e.to_string(),
            context: HashMap::new(),
            occurred_at: Utc::now(),
            source: Some(e),
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(e: std::io::Error) -> Self {
        AppError {
            category: ErrorCategory::IoError,
            severity: ErrorSeverity::Error,
            code: "IO_ERROR".to_string(),
            message: e.to_string(),
            context: HashMap::new(),
            occurred_at: Utc::now(),
            source: Some(anyhow::anyhow!(e)),
        }
    }
}
