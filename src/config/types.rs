use langfilter_mkv::TrackKind;
use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    /// Rules for audio tracks.
    pub audio: KindRules,

    /// Rules for subtitle tracks.
    pub subtitles: KindRules,

    /// Locations of the MKVToolNix programs.
    pub tools: ToolsConfig,
}

impl Config {
    /// Check if any rule is defined.
    pub fn has_rules(&self) -> bool {
        self.audio.has_rules() || self.subtitles.has_rules()
    }

    /// Rules for a track kind; video and other tracks have none.
    pub fn rules_for(&self, kind: TrackKind) -> Option<&KindRules> {
        match kind {
            TrackKind::Audio => Some(&self.audio),
            TrackKind::Subtitle => Some(&self.subtitles),
            _ => None,
        }
    }
}

impl fmt::Display for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        for (label, rules) in [("audio", &self.audio), ("subtitles", &self.subtitles)] {
            if !rules.keep.is_empty() {
                parts.push(format!("{} keep: {}", label, join(&rules.keep)));
            }
            if !rules.remove.is_empty() {
                parts.push(format!("{} remove: {}", label, join(&rules.remove)));
            }
            if let Some(ref default) = rules.default {
                parts.push(format!("{} default: {}", label, default));
            }
        }

        if parts.is_empty() {
            f.write_str("no rules")
        } else {
            f.write_str(&parts.join("; "))
        }
    }
}

fn join(set: &BTreeSet<String>) -> String {
    set.iter().map(String::as_str).collect::<Vec<_>>().join(", ")
}

/// Keep/remove/default rules for one track kind.
///
/// Language codes are stored lowercased.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KindRules {
    /// If non-empty, only tracks in these languages survive.
    pub keep: BTreeSet<String>,

    /// Tracks in these languages are removed.
    pub remove: BTreeSet<String>,

    /// Language whose first surviving track becomes the default track.
    pub default: Option<String>,
}

impl KindRules {
    pub fn has_rules(&self) -> bool {
        !self.keep.is_empty() || !self.remove.is_empty() || self.default.is_some()
    }

    /// Whether a track in `language` survives these rules.
    pub fn keeps(&self, language: &str) -> bool {
        if !self.keep.is_empty() && !self.keep.contains(language) {
            return false;
        }
        !self.remove.contains(language)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolsConfig {
    pub mkvinfo_path: Option<PathBuf>,
    pub mkvmerge_path: Option<PathBuf>,
}
