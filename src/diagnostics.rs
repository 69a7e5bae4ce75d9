//! Run diagnostics.
//!
//! Warnings and errors are collected in an explicit [`Diagnostics`] value
//! passed through the pipeline, and written at the end of the run as the
//! status record `{"errors": [...], "warnings": [...]}`.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Append-only record of what went wrong during a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostics {
    /// Failures; any entry makes the run unsuccessful.
    pub errors: Vec<String>,
    /// Recoverable problems.
    pub warnings: Vec<String>,
}

impl Diagnostics {
    /// Empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a warning.
    pub fn warning(&mut self, message: impl Into<String>) {
        let message = message.into();
        tracing::warn!("{message}");
        self.warnings.push(message);
    }

    /// Record an error.
    pub fn error(&mut self, message: impl Into<String>) {
        let message = message.into();
        tracing::error!("{message}");
        self.errors.push(message);
    }

    /// Whether any error was recorded.
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Process exit code: 1 iff errors were recorded.
    pub fn exit_code(&self) -> u8 {
        u8::from(self.has_errors())
    }

    /// Write the status record as JSON.
    pub fn write(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let text = serde_json::to_string_pretty(self)?;
        std::fs::write(path, text).map_err(|e| Error::io(path, e))
    }
}
