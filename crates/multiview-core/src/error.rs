//! Error types for multiview-core

use std::fmt::Write;
use thiserror::Error;

/// Remediation command for resolving an error
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct RemediationCommand {
    /// Short label describing the command purpose
    pub label: String,
    /// Command to run
    pub command: String,
}

/// Actionable remediation guidance for an error
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Remediation {
    /// One-line summary of how to fix the issue
    pub summary: String,
    /// Suggested commands to resolve or diagnose the issue
    pub commands: Vec<RemediationCommand>,
    /// Additional alternative guidance
    pub alternatives: Vec<String>,
}

impl Remediation {
    /// Create a new remediation with a summary
    #[must_use]
    pub fn new(summary: impl Into<String>) -> Self {
        Self {
            summary: summary.into(),
            commands: Vec::new(),
            alternatives: Vec::new(),
        }
    }

    /// Add a suggested command
    #[must_use]
    pub fn command(mut self, label: impl Into<String>, command: impl Into<String>) -> Self {
        self.commands.push(RemediationCommand {
            label: label.into(),
            command: command.into(),
        });
        self
    }

    /// Add an alternative suggestion
    #[must_use]
    pub fn alternative(mut self, alternative: impl Into<String>) -> Self {
        self.alternatives.push(alternative.into());
        self
    }

    /// Render remediation text for human-readable output
    #[must_use]
    pub fn render_plain(&self) -> String {
        let mut output = String::new();
        let _ = writeln!(output, "To fix:");
        let _ = writeln!(output, "  {}", self.summary);

        if !self.commands.is_empty() {
            let _ = writeln!(output, "  Commands:");
            for cmd in &self.commands {
                let _ = writeln!(output, "    - {}: {}", cmd.label, cmd.command);
            }
        }

        if !self.alternatives.is_empty() {
            let _ = writeln!(output, "  Alternatives:");
            for alt in &self.alternatives {
                let _ = writeln!(output, "    - {alt}");
            }
        }

        output
    }
}

/// Result type alias using the library's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for multiview-core
#[derive(Error, Debug)]
pub enum Error {
    /// Layout document storage errors
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Configuration errors
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// A display name that is empty after trimming
    #[error("Invalid multiview name: {0:?}")]
    InvalidName(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Return remediation guidance when available.
    #[must_use]
    pub fn remediation(&self) -> Option<Remediation> {
        match self {
            Self::Storage(err) => Some(err.remediation()),
            Self::Config(err) => Some(err.remediation()),
            Self::InvalidName(_) => Some(
                Remediation::new("Use a non-empty display name.")
                    .command("Create", "mvw create \"Recording Monitor\""),
            ),
            Self::Io(_) => Some(
                Remediation::new("Check filesystem permissions and paths, then retry.")
                    .alternative("Verify the config directory exists and is writable."),
            ),
            Self::Json(_) => Some(
                Remediation::new("Validate the JSON input and retry.")
                    .command("Validate JSON", "python -m json.tool < layout.json")
                    .alternative("Check for trailing commas or invalid UTF-8."),
            ),
        }
    }
}

/// Errors from reading or writing the layout document
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Cannot create config directory {path}: {reason}")]
    ConfigDirUnavailable { path: String, reason: String },

    #[error("Failed to read layout file {path}: {reason}")]
    ReadFailed { path: String, reason: String },

    #[error("Layout file {path} is not a valid document: {reason}")]
    Corrupt { path: String, reason: String },

    #[error("Failed to write layout file {path}: {reason}")]
    WriteFailed { path: String, reason: String },

    #[error("Couldn't write layout file {path}, only wrote {written} bytes out of {expected}")]
    PartialWrite {
        path: String,
        expected: usize,
        written: usize,
    },
}

impl StorageError {
    #[must_use]
    pub fn remediation(&self) -> Remediation {
        match self {
            Self::ConfigDirUnavailable { path, .. } => {
                Remediation::new(format!("Create {path} or make its parent writable."))
                    .command("Check path", format!("ls -ld \"{path}\""))
                    .alternative("Set [storage] directory in multiview.toml to a writable path.")
            }
            Self::ReadFailed { path, .. } => {
                Remediation::new(format!("Failed to read {path}. Check permissions."))
                    .command("Check permissions", format!("ls -l \"{path}\""))
            }
            Self::Corrupt { path, .. } => Remediation::new(format!(
                "{path} could not be parsed; a copy was kept next to it with a .corrupt suffix."
            ))
            .command("Inspect", format!("python -m json.tool < \"{path}\""))
            .alternative("Delete the file to start over with default layouts."),
            Self::WriteFailed { path, .. } | Self::PartialWrite { path, .. } => {
                Remediation::new(format!(
                    "Layouts are still held in memory; free disk space or fix permissions for {path} and save again."
                ))
                .command("Check disk space", "df -h")
                .command("Check permissions", format!("ls -l \"{path}\""))
            }
        }
    }
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config file not found: {0}")]
    FileNotFound(String),

    #[error("Failed to read config file {0}: {1}")]
    ReadFailed(String, String),

    #[error("Failed to parse config: {0}")]
    ParseFailed(String),

    #[error("Failed to serialize config: {0}")]
    SerializeFailed(String),

    #[error("Validation error: {0}")]
    ValidationError(String),
}

impl ConfigError {
    #[must_use]
    pub fn remediation(&self) -> Remediation {
        match self {
            Self::FileNotFound(path) => Remediation::new(format!(
                "Config file not found: {path}. Verify the path and retry."
            ))
            .command("Check path", format!("ls -l \"{path}\""))
            .alternative("Pass --config with the correct path."),
            Self::ReadFailed(path, _) => Remediation::new(format!(
                "Failed to read config file: {path}. Check permissions."
            ))
            .command("Check permissions", format!("ls -l \"{path}\""))
            .alternative("Ensure the file is readable by the current user."),
            Self::ParseFailed(_) => {
                Remediation::new("Config parse failed. Fix the TOML syntax and retry.")
                    .alternative("Remove the offending section to fall back to defaults.")
            }
            Self::SerializeFailed(_) => {
                Remediation::new("Failed to serialize configuration. Check config values.")
            }
            Self::ValidationError(_) => {
                Remediation::new("Config values are invalid. Update the config and retry.")
                    .alternative("[storage] file_name must be a bare file name.")
            }
        }
    }
}
