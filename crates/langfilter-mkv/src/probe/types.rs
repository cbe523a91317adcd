//! Track information types.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Language code used for tracks that carry no language element.
pub const UNDETERMINED_LANGUAGE: &str = "und";

/// Tracks found in an MKV file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MkvInfo {
    /// Path to the media file.
    pub file_path: PathBuf,
    /// All tracks, in the order mkvinfo lists them.
    pub tracks: Vec<Track>,
}

impl MkvInfo {
    /// Video tracks.
    pub fn video_tracks(&self) -> impl Iterator<Item = &Track> {
        self.tracks_of(TrackKind::Video)
    }

    /// Audio tracks.
    pub fn audio_tracks(&self) -> impl Iterator<Item = &Track> {
        self.tracks_of(TrackKind::Audio)
    }

    /// Subtitle tracks.
    pub fn subtitle_tracks(&self) -> impl Iterator<Item = &Track> {
        self.tracks_of(TrackKind::Subtitle)
    }

    /// Tracks of the given kind.
    pub fn tracks_of(&self, kind: TrackKind) -> impl Iterator<Item = &Track> {
        self.tracks.iter().filter(move |t| t.kind == kind)
    }

    /// Look up a track by its mkvmerge id.
    pub fn track(&self, id: u32) -> Option<&Track> {
        self.tracks.iter().find(|t| t.id == id)
    }

    /// Whether the file has any audio or subtitle track to filter.
    pub fn has_filterable_tracks(&self) -> bool {
        self.tracks.iter().any(|t| t.kind.is_filterable())
    }
}

/// Kind of a Matroska track, as reported by mkvinfo's `Track type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackKind {
    Video,
    Audio,
    Subtitle,
    /// Buttons, complex tracks and anything else mkvinfo may print.
    Other,
}

impl TrackKind {
    /// Parse the value of a `Track type:` line.
    pub fn from_mkvinfo(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "video" => Self::Video,
            "audio" => Self::Audio,
            "subtitles" | "subtitle" => Self::Subtitle,
            _ => Self::Other,
        }
    }

    /// Audio and subtitle tracks can be filtered; everything else is kept.
    pub fn is_filterable(self) -> bool {
        matches!(self, Self::Audio | Self::Subtitle)
    }
}

impl fmt::Display for TrackKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Video => "video",
            Self::Audio => "audio",
            Self::Subtitle => "subtitles",
            Self::Other => "other",
        };
        f.pad(s)
    }
}

/// A single track of an MKV file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    /// Matroska track number (1-based).
    pub number: u32,
    /// Track ID used by mkvmerge and mkvextract (0-based).
    pub id: u32,
    /// Track kind.
    pub kind: TrackKind,
    /// Language code (ISO 639-2), if present.
    pub language: Option<String>,
    /// Track name, if present.
    pub name: Option<String>,
    /// Codec ID (e.g., "A_AC3", "S_TEXT/UTF8").
    pub codec: Option<String>,
    /// Channel count for audio tracks.
    pub channels: Option<u32>,
    /// "Default track" flag.
    pub default: bool,
    /// "Forced display" flag.
    pub forced: bool,
    /// "Enabled" flag.
    pub enabled: bool,
}

impl Track {
    /// Create a track with Matroska's default flag values.
    pub fn new(number: u32, id: u32, kind: TrackKind) -> Self {
        Self {
            number,
            id,
            kind,
            language: None,
            name: None,
            codec: None,
            channels: None,
            default: true,
            forced: false,
            enabled: true,
        }
    }

    /// Lowercased language code, or `und` when the track has none.
    pub fn language_code(&self) -> String {
        self.language
            .as_deref()
            .map(|l| l.trim().to_ascii_lowercase())
            .filter(|l| !l.is_empty())
            .unwrap_or_else(|| UNDETERMINED_LANGUAGE.to_string())
    }
}

impl fmt::Display for Track {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Track {} [{}]",
            self.number,
            self.language.as_deref().unwrap_or("unknown")
        )?;
        if let Some(ref name) = self.name {
            write!(f, " - {}", name)?;
        }
        if let Some(channels) = self.channels {
            write!(f, " ({}ch)", channels)?;
        }
        if let Some(ref codec) = self.codec {
            write!(f, " {}", codec)?;
        }
        Ok(())
    }
}
