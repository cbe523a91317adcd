//! Track filtering with mkvmerge.

use crate::tools::display_name;
use crate::{Error, Result};
use std::ffi::OsString;
use std::path::Path;
use std::process::Command;

/// Which tracks of one kind mkvmerge should copy.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TrackSelection {
    /// Copy every track of this kind (no flag passed).
    #[default]
    All,
    /// Drop every track of this kind.
    None,
    /// Copy only the listed mkvmerge track ids.
    Only(Vec<u32>),
}

impl TrackSelection {
    /// Build a selection from the ids to keep out of `total` tracks.
    pub fn from_kept(kept: Vec<u32>, total: usize) -> Self {
        if kept.len() == total {
            Self::All
        } else if kept.is_empty() {
            Self::None
        } else {
            Self::Only(kept)
        }
    }

    fn push_args(&self, args: &mut Vec<OsString>, select_flag: &str, none_flag: &str) {
        match self {
            Self::All => {}
            Self::None => args.push(none_flag.into()),
            Self::Only(ids) => {
                let ids: Vec<String> = ids.iter().map(u32::to_string).collect();
                args.push(select_flag.into());
                args.push(ids.join(",").into());
            }
        }
    }
}

/// Everything mkvmerge needs to know to write a filtered copy.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RemuxPlan {
    /// Audio tracks to copy.
    pub audio: TrackSelection,
    /// Subtitle tracks to copy.
    pub subtitles: TrackSelection,
    /// Default-track flags to set, as (track id, flag).
    pub default_tracks: Vec<(u32, bool)>,
}

impl RemuxPlan {
    /// Whether the plan would produce an identical copy.
    pub fn is_noop(&self) -> bool {
        self.audio == TrackSelection::All
            && self.subtitles == TrackSelection::All
            && self.default_tracks.is_empty()
    }

    /// mkvmerge arguments for this plan.
    pub fn args(&self, input: &Path, output: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec!["-o".into(), output.as_os_str().to_owned()];

        self.audio.push_args(&mut args, "--audio-tracks", "--no-audio");
        self.subtitles
            .push_args(&mut args, "--subtitle-tracks", "--no-subtitles");

        for (id, flag) in &self.default_tracks {
            args.push("--default-track".into());
            args.push(format!("{}:{}", id, if *flag { "yes" } else { "no" }).into());
        }

        args.push(input.as_os_str().to_owned());
        args
    }

    /// Human-readable command line, for logs and dry runs.
    pub fn command_line(&self, mkvmerge: &Path, input: &Path, output: &Path) -> String {
        std::iter::once(mkvmerge.as_os_str().to_owned())
            .chain(self.args(input, output))
            .map(|a| {
                let s = a.to_string_lossy().into_owned();
                if s.contains(char::is_whitespace) {
                    format!("'{}'", s)
                } else {
                    s
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Write a filtered copy of `input` to `output` with mkvmerge.
///
/// A partially written output is removed when mkvmerge fails.
pub fn remux(mkvmerge: &Path, plan: &RemuxPlan, input: &Path, output: &Path) -> Result<()> {
    if !input.exists() {
        return Err(Error::file_not_found(input));
    }
    if input == output {
        return Err(Error::InvalidInput(
            "mkvmerge output must differ from its input".to_string(),
        ));
    }

    #[cfg(feature = "tracing")]
    tracing::info!("Remuxing {:?} -> {:?}", input, output);
    #[cfg(feature = "tracing")]
    tracing::debug!("Running: {}", plan.command_line(mkvmerge, input, output));

    let result = Command::new(mkvmerge)
        .args(plan.args(input, output))
        .output()
        .map_err(|e| Error::spawn(&display_name(mkvmerge), e))?;

    // mkvmerge returns 0 for success, 1 for warnings, 2 for errors
    if !result.status.success() && result.status.code() != Some(1) {
        if output.exists() {
            let _ = std::fs::remove_file(output);
        }

        return Err(Error::from_output(&display_name(mkvmerge), &result));
    }

    #[cfg(feature = "tracing")]
    if result.status.code() == Some(1) {
        tracing::warn!(
            "mkvmerge finished with warnings: {}",
            String::from_utf8_lossy(&result.stdout).trim()
        );
    }

    Ok(())
}
