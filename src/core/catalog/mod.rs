#![allow(clippy::result_large_err)]

//! Test catalog: turns YAML sources into resolved [`TestCase`]s.
//!
//! Every problem is contained to the smallest unit: an unreadable file drops
//! that file, a bad document drops that document, a failing transform falls
//! back to the raw value. Loading itself never fails.

use crate::core::block_processor::{BlockProcessor, Diagnostic};
use crate::core::document::{parse_documents, Node};
use crate::core::error::AppError;
use crate::core::transform::{TransformContext, TransformRegistry};
use crate::core::types::{ErrorCategory, ErrorSeverity};
use std::fs;
use std::path::{Path, PathBuf};
use url::Url;

pub mod case;

pub use case::{CaseError, Target, TestCase};

/// Key carrying `<file>#<index>` provenance on every loaded document.
pub const SOURCE_FILE_KEY: &str = "_source_file";

#[derive(Debug, Clone, Default)]
pub struct CatalogOptions {
    /// Base for `relative-url` targets; such cases are skipped without one.
    pub base_url: Option<Url>,
}

/// Everything a load produced, including what was skipped and why.
#[derive(Debug, Default)]
pub struct CatalogLoad {
    pub cases: Vec<TestCase>,
    pub errors: Vec<AppError>,
    pub diagnostics: Vec<Diagnostic>,
}

impl CatalogLoad {
    fn record(&mut self, error: AppError) {
        match error.severity() {
            ErrorSeverity::Warning => tracing::warn!("{}", error),
            ErrorSeverity::Error => tracing::error!("{}", error),
        }
        self.errors.push(error);
    }
}

pub struct TestCatalog {
    registry: TransformRegistry,
    options: CatalogOptions,
}

impl TestCatalog {
    pub fn new(registry: TransformRegistry, options: CatalogOptions) -> Self {
        Self { registry, options }
    }

    /// YAML sources in `dir`, sorted by file name.
    pub fn source_files(dir: &Path) -> Result<Vec<PathBuf>, AppError> {
        let entries = fs::read_dir(dir).map_err(|e| {
            AppError::new(
                ErrorCategory::IoError,
                format!("Failed to scan test directory {}: {}", dir.display(), e),
            )
            .with_code("CAT-001")
        })?;

        let mut files: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|entry| entry.path()))
            .filter(|path| {
                path.is_file()
                    && matches!(
                        path.extension().and_then(|ext| ext.to_str()),
                        Some("yaml") | Some("yml")
                    )
            })
            .collect();
        files.sort();
        Ok(files)
    }

    /// Load every source in `dir`.
    pub fn load_all(&self, dir: &Path) -> CatalogLoad {
        let mut load = CatalogLoad::default();
        if !dir.exists() {
            tracing::warn!("Test directory {} does not exist", dir.display());
            return load;
        }

        match Self::source_files(dir) {
            Ok(files) => {
                for file in files {
                    self.load_file_into(&file, &mut load);
                }
            }
            Err(error) => load.record(error),
        }

        tracing::debug!(
            "loaded {} test case(s) from {} ({} skipped)",
            load.cases.len(),
            dir.display(),
            load.errors.len()
        );
        load
    }

    /// Load a single source file.
    pub fn load_file(&self, path: &Path) -> CatalogLoad {
        let mut load = CatalogLoad::default();
        self.load_file_into(path, &mut load);
        load
    }

    fn load_file_into(&self, path: &Path, load: &mut CatalogLoad) {
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        match fs::read_to_string(path) {
            Ok(source) => self.load_source(&file_name, &source, load),
            Err(e) => load.record(
                AppError::new(
                    ErrorCategory::IoError,
                    format!("Failed to read test file {}: {}", path.display(), e),
                )
                .with_code("CAT-002")
                .with_context("file", file_name),
            ),
        }
    }

    /// Load every document of one source. A parse failure drops the whole
    /// source; a bad document drops only itself.
    pub fn load_source(&self, file_name: &str, source: &str, load: &mut CatalogLoad) {
        let documents = match parse_documents(source) {
            Ok(documents) => documents,
            Err(e) => {
                load.record(
                    AppError::new(
                        ErrorCategory::SerializationError,
                        format!("Failed to parse test file {}: {}", file_name, e),
                    )
                    .with_code("CAT-003")
                    .with_context("file", file_name),
                );
                return;
            }
        };

        let processor = BlockProcessor::new(&self.registry);
        for (index, mut document) in documents.into_iter().enumerate() {
            let source_id = format!("{}#{}", file_name, index + 1);
            let Some(map) = document.as_map_mut() else {
                tracing::debug!("skipping {}: document is not a map", source_id);
                continue;
            };
            map.insert(SOURCE_FILE_KEY.to_string(), Node::string(source_id.clone()));

            let context = TransformContext::new(&document, &source_id);
            let processed = processor.process_document(&document, &context);
            load.diagnostics.extend(processed.diagnostics);

            match self.build_case(&processed.document, &source_id) {
                Ok(case) => load.cases.push(case),
                Err(e) => load.record(
                    AppError::new(
                        ErrorCategory::ValidationError,
                        format!("Skipping test {}: {}", source_id, e),
                    )
                    .with_code("CAT-004")
                    .with_context("source", source_id),
                ),
            }
        }
    }

    fn build_case(&self, document: &Node, source_id: &str) -> Result<TestCase, CaseError> {
        let case = TestCase::from_document(document, source_id)?;
        case.target.resolve(self.options.base_url.as_ref())?;
        Ok(case)
    }
}
