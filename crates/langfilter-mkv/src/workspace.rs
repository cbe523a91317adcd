//! Scratch output and backup-then-replace finalization.

use crate::{Error, Result};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Prefix of backup files written next to the original.
pub const BACKUP_PREFIX: &str = "_original_";

/// Workspace for filtering one file.
///
/// mkvmerge writes into a hidden scratch directory created next to the
/// input, so the final rename never crosses a filesystem boundary. The
/// scratch directory is removed when the workspace is dropped.
///
/// # Example
///
/// ```no_run
/// use langfilter_mkv::Workspace;
///
/// let workspace = Workspace::new("/path/to/input.mkv")?;
/// // Run mkvmerge with workspace.output() as its output file
/// let done = workspace.finalize(None, true)?;
/// println!("backup: {:?}", done.backup);
/// # Ok::<(), langfilter_mkv::Error>(())
/// ```
pub struct Workspace {
    temp_dir: TempDir,
    input_path: PathBuf,
    output_path: PathBuf,
}

/// Result of a successful [`Workspace::finalize`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finalized {
    /// Where the filtered file now lives.
    pub path: PathBuf,
    /// Backup of the original, when one was made.
    pub backup: Option<PathBuf>,
}

impl Workspace {
    /// Create a new workspace for processing a file.
    pub fn new<P: AsRef<Path>>(input: P) -> Result<Self> {
        let input = input.as_ref();

        let file_name = input
            .file_name()
            .ok_or_else(|| Error::InvalidInput(format!("{:?} has no file name", input)))?;

        let parent = match input.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };

        let temp_dir = tempfile::Builder::new()
            .prefix(".langfilter-")
            .tempdir_in(parent)
            .map_err(|e| Error::workspace(format!("Failed to create scratch directory: {}", e)))?;

        let output_path = temp_dir.path().join(file_name);

        Ok(Self {
            temp_dir,
            input_path: input.to_path_buf(),
            output_path,
        })
    }

    /// Get the input file path.
    pub fn input(&self) -> &Path {
        &self.input_path
    }

    /// Get the output file path.
    pub fn output(&self) -> &Path {
        &self.output_path
    }

    /// Get the temp directory path.
    pub fn temp_dir(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Move the output into place.
    ///
    /// With no destination (or the input itself as destination) the original
    /// is replaced; a backup is made first when `backup` is set, and restored
    /// if the replacement fails. Any other destination just receives the
    /// output and the original is left alone.
    pub fn finalize(self, destination: Option<&Path>, backup: bool) -> Result<Finalized> {
        if !self.output_path.exists() {
            return Err(Error::workspace(format!(
                "Output file does not exist: {:?}",
                self.output_path
            )));
        }

        let dest = destination.unwrap_or(&self.input_path);

        if !same_path(dest, &self.input_path) {
            move_file(&self.output_path, dest)?;
            return Ok(Finalized {
                path: dest.to_path_buf(),
                backup: None,
            });
        }

        let backup_path = if backup && self.input_path.exists() {
            Some(create_backup(&self.input_path)?)
        } else {
            None
        };

        if let Err(e) = std::fs::rename(&self.output_path, &self.input_path) {
            let mut message = format!("Failed to replace {}: {}", self.input_path.display(), e);
            if let Some(ref b) = backup_path {
                if !self.input_path.exists() {
                    if let Err(restore) = std::fs::rename(b, &self.input_path) {
                        message.push_str(&format!("; restoring the backup failed: {}", restore));
                    }
                }
            }
            let backup = backup_path.filter(|b| b.exists());
            return Err(Error::Workspace { message, backup });
        }

        #[cfg(feature = "tracing")]
        tracing::debug!("Replaced {:?} (backup: {:?})", self.input_path, backup_path);

        Ok(Finalized {
            path: self.input_path.clone(),
            backup: backup_path,
        })
    }

    /// Clean up without finalizing (discard output).
    pub fn cleanup(self) {
        // TempDir will clean up on drop
        drop(self.temp_dir);
    }
}

/// Pick a free backup name next to `input`.
///
/// `_original_<name>` first, then `_original_1_<name>`, `_original_2_<name>`, …
pub fn backup_path(input: &Path) -> Result<PathBuf> {
    let name = input
        .file_name()
        .ok_or_else(|| Error::InvalidInput(format!("{:?} has no file name", input)))?
        .to_string_lossy();
    let dir = input.parent().unwrap_or_else(|| Path::new(""));

    let mut candidate = dir.join(format!("{}{}", BACKUP_PREFIX, name));
    let mut counter = 1u32;
    while candidate.exists() {
        candidate = dir.join(format!("{}{}_{}", BACKUP_PREFIX, counter, name));
        counter += 1;
    }
    Ok(candidate)
}

/// Back up `input` under a free `_original_` name.
///
/// A hard link is used when the filesystem allows it, otherwise a copy.
pub fn create_backup(input: &Path) -> Result<PathBuf> {
    let backup = backup_path(input)?;

    if std::fs::hard_link(input, &backup).is_err() {
        std::fs::copy(input, &backup).map_err(|e| {
            Error::workspace(format!("Failed to create backup of original file: {}", e))
        })?;
    }

    Ok(backup)
}

fn same_path(a: &Path, b: &Path) -> bool {
    if a == b {
        return true;
    }
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

fn move_file(from: &Path, to: &Path) -> Result<()> {
    if std::fs::rename(from, to).is_ok() {
        return Ok(());
    }

    // Different filesystem
    std::fs::copy(from, to)
        .map_err(|e| Error::workspace(format!("Failed to move output to {:?}: {}", to, e)))?;
    std::fs::remove_file(from)?;
    Ok(())
}
