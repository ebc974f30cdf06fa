use crate::logging::layers::{plain_layer, PlainLayer};
use clap::ValueEnum;
use std::fmt;
use std::io;
use tracing::Subscriber;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::registry::LookupSpan;

/// Terminal stream that receives log lines. Reports are printed on stdout,
/// so logs default to stderr.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, ValueEnum)]
pub enum ConsoleOutput {
    Stdout,
    #[default]
    Stderr,
    None,
}

impl ConsoleOutput {
    /// Parse an `APIPROBE_LOG_CONSOLE` value; case and padding are ignored.
    pub fn parse(value: &str) -> Result<Self, String> {
        <Self as ValueEnum>::from_str(value.trim(), true).map_err(|_| {
            format!(
                "invalid console output '{}'; supported values are stdout, stderr, none",
                value
            )
        })
    }

    fn writer(self) -> Option<BoxMakeWriter> {
        match self {
            ConsoleOutput::Stdout => Some(BoxMakeWriter::new(io::stdout)),
            ConsoleOutput::Stderr => Some(BoxMakeWriter::new(io::stderr)),
            ConsoleOutput::None => None,
        }
    }
}

impl fmt::Display for ConsoleOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_possible_value() {
            Some(value) => f.write_str(value.get_name()),
            None => Ok(()),
        }
    }
}

/// Console sink, or no layer at all when console logging is switched off.
pub fn console_layer<S>(output: ConsoleOutput) -> Option<PlainLayer<S>>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    output.writer().map(plain_layer)
}
