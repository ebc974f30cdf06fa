use crate::logging::layers::{plain_layer, PlainLayer};
use crate::Result;
use anyhow::{anyhow, Context};
use std::fs::{create_dir_all, OpenOptions};
use std::io;
use std::path::Path;
use tracing::Subscriber;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::registry::LookupSpan;

/// Layer stack that already wraps the provided subscriber.
pub type FileLayerStack<S> = tracing_subscriber::layer::Layered<PlainLayer<S>, S>;

/// Build a tracing layer that appends to `log_file` via a non-blocking writer,
/// or discards everything when no file is configured.
pub fn file_layer<S>(log_file: Option<&Path>) -> Result<(PlainLayer<S>, Option<WorkerGuard>)>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    match log_file {
        Some(log_file) => {
            ensure_log_dir(log_file)?;
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(log_file)
                .with_context(|| format!("failed to open log file {}", log_file.display()))?;

            let (non_blocking, guard) = tracing_appender::non_blocking(file);
            let writer = BoxMakeWriter::new(move || non_blocking.clone());
            Ok((plain_layer(writer), Some(guard)))
        }
        None => Ok((plain_layer(BoxMakeWriter::new(io::sink)), None)),
    }
}

fn ensure_log_dir(log_file: &Path) -> Result<()> {
    let directory = log_file.parent().ok_or_else(|| {
        anyhow!(
            "log file path {} has no parent directory",
            log_file.display()
        )
    })?;
    if directory.as_os_str().is_empty() {
        return Ok(());
    }
    create_dir_all(directory)
        .with_context(|| format!("failed to create log directory {}", directory.display()))?;
    Ok(())
}
