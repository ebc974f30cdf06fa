pub mod block_processor;
pub mod catalog;
pub mod config;
pub mod coordinator;
pub mod document;
pub mod error;
pub mod executor;
pub mod results_processor;
pub mod transform;
pub mod types;
pub mod validator;

pub use block_processor::{BlockProcessor, Diagnostic, DiagnosticKind, Processed};
pub use catalog::{CatalogLoad, CatalogOptions, TestCase, TestCatalog};
pub use config::{ConfigLoader, RunConfig};
pub use coordinator::{run_all, RunOptions, RunReport};
pub use document::Node;
pub use error::AppError;
pub use executor::{
    ActualResponse, HttpTransport, OutgoingRequest, RunSettings, TestResult, Transport,
    TransportError,
};
pub use results_processor::{OutputFormat, ResultsProcessor};
pub use transform::{Transform, TransformContext, TransformError, TransformRegistry};
pub use types::*;
pub use validator::{ExpectationSet, Mismatch, ValidationOptions};
