//! User transform discovery.
//!
//! The extensions directory is scanned for YAML manifests. Every named entry is
//! built and registered in the user namespace; entries without a name are
//! reported so they are never activated silently.

use crate::core::transform::{builtin, TransformRegistry, TransformRegistryBuilder};
use crate::core::types::{Namespace, Precedence};
use std::fs;
use std::path::{Path, PathBuf};

mod definition;

pub use definition::{
    CommandTransform, ConstantTransform, MergeTransform, TransformDefinition, TransformManifest,
};

/// Outcome of scanning an extensions directory.
#[derive(Debug, Default, Clone)]
pub struct PluginReport {
    /// Names registered in the user namespace, in discovery order.
    pub registered: Vec<String>,
    pub warnings: Vec<String>,
}

/// List manifest files in `dir`, sorted by file name.
pub fn manifest_files(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let is_manifest = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext == "yaml" || ext == "yml")
            .unwrap_or(false);
        let hidden = path
            .file_name()
            .and_then(|name| name.to_str())
            .map(|name| name.starts_with('_') || name.starts_with('.'))
            .unwrap_or(true);
        if path.is_file() && is_manifest && !hidden {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Read a single manifest, stamping every definition with its directory.
pub fn read_manifest(path: &Path) -> Result<Vec<TransformDefinition>, String> {
    let content = fs::read_to_string(path)
        .map_err(|err| format!("failed to read extension manifest {}: {}", path.display(), err))?;
    if content.trim().is_empty() {
        return Ok(Vec::new());
    }
    let manifest: TransformManifest = serde_yaml::from_str(&content).map_err(|err| {
        format!(
            "failed to parse extension manifest {}: {}",
            path.display(),
            err
        )
    })?;
    let base_dir = path.parent().map(Path::to_path_buf);
    Ok(manifest
        .transforms
        .into_iter()
        .map(|mut definition| {
            definition.base_dir = base_dir.clone();
            definition
        })
        .collect())
}

/// Scan `dir` and register every valid user transform into `builder`.
///
/// Problems with one manifest or one entry are recorded as warnings; discovery
/// always continues with the remaining entries.
pub fn load_user_transforms(dir: &Path, builder: &mut TransformRegistryBuilder) -> PluginReport {
    let mut report = PluginReport::default();
    if !dir.exists() {
        tracing::debug!("extensions directory {} does not exist", dir.display());
        return report;
    }

    let files = match manifest_files(dir) {
        Ok(files) => files,
        Err(err) => {
            warn(
                &mut report,
                format!("failed to scan extensions directory {}: {}", dir.display(), err),
            );
            return report;
        }
    };

    for file in files {
        let definitions = match read_manifest(&file) {
            Ok(definitions) => definitions,
            Err(message) => {
                warn(&mut report, message);
                continue;
            }
        };
        for (index, definition) in definitions.iter().enumerate() {
            let Some(name) = definition.name.as_deref() else {
                warn(
                    &mut report,
                    format!(
                        "transform entry #{} in {} has no name; add `name:` to activate it",
                        index + 1,
                        file.display()
                    ),
                );
                continue;
            };
            match builder.register_definition(Namespace::User, definition) {
                Ok(_) => {
                    tracing::debug!("registered user transform '{}' from {}", name, file.display());
                    report.registered.push(name.to_string());
                }
                Err(err) => warn(
                    &mut report,
                    format!("skipping transform in {}: {}", file.display(), err),
                ),
            }
        }
    }
    report
}

/// Build the run's registry: built-ins first, then user transforms from `dir`.
pub fn load_registry(precedence: Precedence, dir: &Path) -> (TransformRegistry, PluginReport) {
    let mut builder = TransformRegistry::builder();
    builder.precedence(precedence);
    builtin::register_builtins(&mut builder);
    let report = load_user_transforms(dir, &mut builder);
    (builder.build(), report)
}

fn warn(report: &mut PluginReport, message: String) {
    tracing::warn!("{}", message);
    report.warnings.push(message);
}
