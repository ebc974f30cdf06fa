pub mod console;
pub mod file;

use tracing::Subscriber;
use tracing_subscriber::fmt::{self as tracing_fmt, format, writer::BoxMakeWriter};
use tracing_subscriber::registry::LookupSpan;

/// Plain-text fmt layer shared by the console and file sinks.
pub type PlainLayer<S> =
    tracing_fmt::Layer<S, format::DefaultFields, format::Format<format::Full>, BoxMakeWriter>;

pub(crate) fn plain_layer<S>(writer: BoxMakeWriter) -> PlainLayer<S>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    tracing_fmt::layer()
        .with_writer(writer)
        .with_ansi(false)
        .with_target(false)
}
