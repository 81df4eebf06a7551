//! Run report rendering for text vs JSON output.
//!
//! The final [`RunReport`] flows through [`OutputWriter`], which handles
//! format switching the same way for every payload.

use std::io::Write;

use s3gate_core::{ExitOutcome, ScenarioResult};
use serde::Serialize;

use crate::cli::OutputFormat;

/// Writes payloads in the selected format.
pub struct OutputWriter {
    format: OutputFormat,
}

impl OutputWriter {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Render a payload to stdout.
    pub fn render<T: Render + Serialize>(&self, payload: &T) -> std::io::Result<()> {
        let stdout = std::io::stdout();
        let mut handle = stdout.lock();
        self.render_to(&mut handle, payload)
    }

    /// Render a payload to an arbitrary writer.
    ///
    /// For `Text` format, delegates to `Render::render_text()`.
    /// For `Json` format, serialises via `serde_json`.
    pub fn render_to<T: Render + Serialize>(
        &self,
        w: &mut dyn Write,
        payload: &T,
    ) -> std::io::Result<()> {
        match self.format {
            OutputFormat::Text => payload.render_text(w)?,
            OutputFormat::Json => {
                serde_json::to_writer_pretty(&mut *w, payload)?;
                writeln!(w)?;
            }
        }
        Ok(())
    }
}

/// Human-readable text rendering, implemented alongside `serde::Serialize`.
pub trait Render {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()>;
}

/// Summary of one orchestration run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: String,
    pub variant: String,
    /// Results collected so far, including the failed scenario if any.
    pub scenarios: Vec<ScenarioResult>,
    pub outcome: ExitOutcome,
    pub exit_code: i32,
    /// Message of the error that ended the run.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RunReport {
    pub fn passed(&self) -> usize {
        self.scenarios.iter().filter(|r| r.passed).count()
    }
}

impl Render for RunReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        writeln!(w, "Run {} (variant: {})", self.run_id, self.variant)?;
        writeln!(w)?;

        if self.scenarios.is_empty() {
            writeln!(w, "No scenarios were run.")?;
        } else {
            writeln!(
                w,
                "{:<12} {:<8} {:<10} {}",
                "SCENARIO", "HTTP", "EVIDENCE", "RESULT"
            )?;
            for r in &self.scenarios {
                let http = if r.http_assertions_passed { "ok" } else { "-" };
                let result = if r.passed {
                    "PASS".green().bold()
                } else {
                    "FAIL".red().bold()
                };
                writeln!(
                    w,
                    "{:<12} {:<8} {:<10} {}",
                    r.config.tuple(),
                    http,
                    r.log_evidence_count,
                    result
                )?;
            }
        }

        writeln!(w)?;
        writeln!(
            w,
            "Scenarios passed: {}/{}",
            self.passed(),
            self.scenarios.len()
        )?;
        if let Some(err) = &self.error {
            writeln!(w, "Error: {}", err.red())?;
        }
        let outcome = format!("{} (exit code {})", self.outcome, self.exit_code);
        if self.outcome.is_success() {
            writeln!(w, "Outcome: {}", outcome.green().bold())?;
        } else {
            writeln!(w, "Outcome: {}", outcome.red().bold())?;
        }
        Ok(())
    }
}
