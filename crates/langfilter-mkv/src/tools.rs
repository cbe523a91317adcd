//! Locating and checking the MKVToolNix programs.

use crate::{Error, Result};
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Command;

/// An MKVToolNix program langfilter runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tool {
    Mkvinfo,
    Mkvmerge,
}

impl Tool {
    /// Executable name looked up on PATH.
    pub fn program(self) -> &'static str {
        match self {
            Self::Mkvinfo => "mkvinfo",
            Self::Mkvmerge => "mkvmerge",
        }
    }
}

impl fmt::Display for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.program())
    }
}

/// What `--check-tools` found for one tool.
#[derive(Debug, Clone)]
pub struct ToolStatus {
    pub tool: Tool,
    /// Resolved executable, if any.
    pub path: Option<PathBuf>,
    /// First line of `--version` output; `None` if the tool didn't run.
    pub version: Option<String>,
}

impl ToolStatus {
    pub fn is_available(&self) -> bool {
        self.version.is_some()
    }
}

/// Resolve the executable for `tool`.
///
/// A configured path is used when it points at a file; otherwise the tool
/// is searched on PATH.
///
/// # Example
///
/// ```no_run
/// use langfilter_mkv::{locate, Tool};
///
/// let mkvmerge = locate(Tool::Mkvmerge, None)?;
/// println!("using {}", mkvmerge.display());
/// # Ok::<(), langfilter_mkv::Error>(())
/// ```
pub fn locate(tool: Tool, configured: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = configured {
        if path.is_file() {
            return Ok(path.to_path_buf());
        }

        #[cfg(feature = "tracing")]
        tracing::warn!(
            "Configured {} path {:?} does not exist, searching PATH",
            tool,
            path
        );
    }

    which::which(tool.program()).map_err(|_| Error::tool_not_found(tool.program()))
}

/// Run `program --version` and return the first line it prints.
pub fn tool_version(program: &Path) -> Option<String> {
    let output = Command::new(program).arg("--version").output().ok()?;
    if !output.status.success() {
        return None;
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    Some(stdout.lines().next().unwrap_or_default().trim().to_string())
}

/// Locate and run mkvinfo and mkvmerge, honouring configured paths.
pub fn check_tools(mkvinfo: Option<&Path>, mkvmerge: Option<&Path>) -> Vec<ToolStatus> {
    [(Tool::Mkvinfo, mkvinfo), (Tool::Mkvmerge, mkvmerge)]
        .into_iter()
        .map(|(tool, configured)| {
            let path = locate(tool, configured).ok();
            let version = path.as_deref().and_then(tool_version);
            ToolStatus {
                tool,
                path,
                version,
            }
        })
        .collect()
}

/// Short program name used in error messages.
pub(crate) fn display_name(program: &Path) -> String {
    program
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| program.display().to_string())
}
