//! Errors from driving MKVToolNix.

use std::path::{Path, PathBuf};
use std::process::Output;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{tool} command not found; please install mkvtoolnix")]
    ToolNotFound { tool: String },

    /// The tool ran and reported failure.
    #[error("{tool} exited with {status}: {message}")]
    ToolFailed {
        tool: String,
        status: String,
        message: String,
    },

    /// mkvinfo printed something that isn't a track tree.
    #[error("unexpected mkvinfo output: {0}")]
    Parse(String),

    #[error("file not found: {}", path.display())]
    FileNotFound { path: PathBuf },

    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Scratch output, backup or replacement failed.
    ///
    /// `backup` names the copy of the original when one is left on disk.
    #[error("{message}{}", backup_note(.backup))]
    Workspace {
        message: String,
        backup: Option<PathBuf>,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

fn backup_note(backup: &Option<PathBuf>) -> String {
    match backup {
        Some(path) => format!(" (original kept at {})", path.display()),
        None => String::new(),
    }
}

impl Error {
    pub fn tool_not_found(tool: impl Into<String>) -> Self {
        Self::ToolNotFound { tool: tool.into() }
    }

    pub fn workspace(message: impl Into<String>) -> Self {
        Self::Workspace {
            message: message.into(),
            backup: None,
        }
    }

    /// Map a spawn failure to `ToolNotFound` when the executable is missing.
    pub(crate) fn spawn(tool: &str, err: std::io::Error) -> Self {
        if err.kind() == std::io::ErrorKind::NotFound {
            Self::tool_not_found(tool)
        } else {
            Self::Io(err)
        }
    }

    /// Build `ToolFailed` from a finished process.
    ///
    /// MKVToolNix prints most errors on stdout, so stdout is used when
    /// stderr is empty.
    pub(crate) fn from_output(tool: &str, output: &Output) -> Self {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let stdout = String::from_utf8_lossy(&output.stdout);
        let message = if stderr.trim().is_empty() {
            stdout.trim()
        } else {
            stderr.trim()
        };
        let status = output
            .status
            .code()
            .map_or_else(|| "a signal".to_string(), |c| format!("code {}", c));

        Self::ToolFailed {
            tool: tool.to_string(),
            status,
            message: message.to_string(),
        }
    }

    pub(crate) fn file_not_found(path: &Path) -> Self {
        Self::FileNotFound {
            path: path.to_path_buf(),
        }
    }
}
