#![allow(clippy::result_large_err)] // AppError contains rich context; boxing would discard diagnostics needed for reporting.

use crate::core::coordinator::RunReport;
use crate::core::error::AppError;
use crate::core::executor::TestResult;
use crate::core::types::ErrorCategory;
use serde::{Deserialize, Serialize};

#[derive(Debug, Default)]
pub struct ResultsProcessor {
    /// Include expected/actual detail for passing tests too.
    verbose: bool,
}

impl ResultsProcessor {
    pub fn new(verbose: bool) -> Self {
        ResultsProcessor { verbose }
    }

    pub fn generate_report(
        &self,
        report: &RunReport,
        output_format: OutputFormat,
    ) -> Result<String, AppError> {
        tracing::debug!(
            "Generating {:?} report for {} result(s)",
            output_format,
            report.results.len()
        );

        match output_format {
            OutputFormat::Json => self.generate_json_report(report),
            OutputFormat::Text => Ok(self.generate_text_report(report)),
        }
    }

    fn generate_json_report(&self, report: &RunReport) -> Result<String, AppError> {
        serde_json::to_string_pretty(report).map_err(|e| {
            AppError::new(
                ErrorCategory::SerializationError,
                format!("Failed to generate JSON report: {}", e),
            )
            .with_code("REPORT-JSON-001")
        })
    }

    fn generate_text_report(&self, report: &RunReport) -> String {
        let mut text = String::new();
        for result in &report.results {
            text.push_str(&self.format_result(result));
        }
        if report.stopped_early {
            text.push_str(&format!(
                "⏹  Stopped on first failure; {} test(s) not started\n",
                report.not_started
            ));
        }
        text.push_str(&self.generate_summary(report));
        text.push('\n');
        text
    }

    pub fn format_result(&self, result: &TestResult) -> String {
        let mut section = String::new();
        let marker = if result.passed { "✅" } else { "❌" };
        section.push_str(&format!(
            "{} {} ({:.2}s)\n",
            marker, result.name, result.duration
        ));
        if !result.passed || self.verbose {
            section.push_str(&format!("   URL: {}\n", result.url));
        }
        if let Some(error) = &result.error {
            section.push_str(&format!("   Error: {}\n", error));
        }
        if let Some(mismatch) = &result.mismatch {
            section.push_str(&format!("   Failed: {}\n", mismatch));
        }
        if self.verbose {
            if let Some(actual) = &result.actual {
                section.push_str(&format!("   Status: {}\n", actual.status));
            }
        }
        section
    }

    pub fn generate_summary(&self, report: &RunReport) -> String {
        format!(
            "📊 Results: {} passed, {} failed",
            report.passed, report.failed
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Json,
    #[default]
    Text,
}
