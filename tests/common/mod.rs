//! Shared helpers for integration tests.
//!
//! [`Fixture`] lays out a scratch directory with fake `mkvinfo` and
//! `mkvmerge` scripts, a config file pointing at them, and dummy media
//! files. The fake mkvmerge copies its input to the `-o` path and records
//! its arguments so tests can check what would have been passed.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// mkvinfo output for a video track, jpn and eng audio, eng and ger subtitles.
pub const MKVINFO_OUTPUT: &str = r#"+ EBML head
|+ Document type: matroska
+ Segment: size 52428800
|+ Segment information
| + Timestamp scale: 1000000
|+ Tracks
| + Track
|  + Track number: 1 (track ID for mkvmerge & mkvextract: 0)
|  + Track type: video
|  + Codec ID: V_MPEGH/ISO/HEVC
| + Track
|  + Track number: 2 (track ID for mkvmerge & mkvextract: 1)
|  + Track type: audio
|  + Codec ID: A_FLAC
|  + Language: jpn
|  + Audio track
|   + Channels: 2
| + Track
|  + Track number: 3 (track ID for mkvmerge & mkvextract: 2)
|  + Track type: audio
|  + "Default track" flag: 0
|  + Codec ID: A_AAC
|  + Language: eng
|  + Audio track
|   + Channels: 2
| + Track
|  + Track number: 4 (track ID for mkvmerge & mkvextract: 3)
|  + Track type: subtitles
|  + Codec ID: S_TEXT/ASS
|  + Language: eng
| + Track
|  + Track number: 5 (track ID for mkvmerge & mkvextract: 4)
|  + Track type: subtitles
|  + "Default track" flag: 0
|  + Codec ID: S_TEXT/ASS
|  + Language: ger
|+ Cluster
"#;

pub const MEDIA_CONTENT: &str = "original media";

pub struct Fixture {
    pub dir: TempDir,
}

impl Fixture {
    /// Fake tools that succeed.
    pub fn new() -> Self {
        Self::with_mkvmerge_exit(0)
    }

    /// Fake tools where mkvmerge exits with `code` after writing its output.
    pub fn with_mkvmerge_exit(code: i32) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let fixture = Self { dir };

        fs::write(fixture.path().join("mkvinfo.txt"), MKVINFO_OUTPUT).unwrap();
        fixture.script(
            "mkvinfo",
            &format!(
                "if [ \"$1\" = \"--version\" ]; then echo \"mkvinfo v80.0 ('Fake')\"; exit 0; fi\n\
                 cat '{}'\n",
                fixture.path().join("mkvinfo.txt").display()
            ),
        );
        fixture.script(
            "mkvmerge",
            &format!(
                "if [ \"$1\" = \"--version\" ]; then echo \"mkvmerge v80.0 ('Fake')\"; exit 0; fi\n\
                 echo \"$@\" > '{log}'\n\
                 out=''\n\
                 while [ $# -gt 1 ]; do\n\
                 if [ \"$1\" = \"-o\" ]; then out=\"$2\"; shift; fi\n\
                 shift\n\
                 done\n\
                 cp \"$1\" \"$out\"\n\
                 echo ' filtered' >> \"$out\"\n\
                 exit {code}\n",
                log = fixture.mkvmerge_log().display(),
                code = code
            ),
        );

        fixture
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn mkvinfo(&self) -> PathBuf {
        self.path().join("bin/mkvinfo")
    }

    pub fn mkvmerge(&self) -> PathBuf {
        self.path().join("bin/mkvmerge")
    }

    pub fn mkvmerge_log(&self) -> PathBuf {
        self.path().join("mkvmerge.log")
    }

    /// Arguments of the last mkvmerge call, if it ran.
    pub fn mkvmerge_args(&self) -> Option<String> {
        fs::read_to_string(self.mkvmerge_log())
            .ok()
            .map(|s| s.trim().to_string())
    }

    /// Write a config with `rules` plus a [tools] section for the fakes.
    pub fn config(&self, rules: &str) -> PathBuf {
        let path = self.path().join("langfilter.ini");
        let content = format!(
            "{}\n[tools]\nmkvinfo = {}\nmkvmerge = {}\n",
            rules,
            self.mkvinfo().display(),
            self.mkvmerge().display()
        );
        fs::write(&path, content).unwrap();
        path
    }

    /// Create a media directory file with dummy content.
    pub fn media(&self, name: &str) -> PathBuf {
        let dir = self.path().join("media");
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        fs::write(&path, MEDIA_CONTENT).unwrap();
        path
    }

    fn script(&self, name: &str, body: &str) {
        let bin = self.path().join("bin");
        fs::create_dir_all(&bin).unwrap();
        let path = bin.join(name);
        fs::write(&path, format!("#!/bin/sh\n{}", body)).unwrap();

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        }
    }
}
