use langfilter_mkv::{MkvInfo, RemuxPlan, Track, TrackKind, TrackSelection};
use std::collections::BTreeSet;

/// Errors raised when a selection can't be applied to a file.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RuleError {
    #[error("selection would leave no audio tracks")]
    NoAudioLeft,

    #[error("no track with id {0}")]
    UnknownTrack(u32),

    #[error("{kind} track {id} can't be a default track")]
    NotFilterable { id: u32, kind: TrackKind },
}

/// Which tracks of a file are removed and which become default.
///
/// Tracks are identified by their mkvmerge id. Video and other tracks are
/// never part of a selection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    removed: BTreeSet<u32>,
    default_audio: Option<u32>,
    default_subtitle: Option<u32>,
}

impl Selection {
    /// A selection that keeps everything and changes no flags.
    pub fn keep_all() -> Self {
        Self::default()
    }

    pub fn is_removed(&self, id: u32) -> bool {
        self.removed.contains(&id)
    }

    pub fn remove(&mut self, id: u32) {
        self.removed.insert(id);
    }

    pub fn keep(&mut self, id: u32) {
        self.removed.remove(&id);
    }

    /// Flip a track between kept and removed.
    pub fn toggle(&mut self, id: u32) {
        if !self.removed.remove(&id) {
            self.removed.insert(id);
        }
    }

    /// Keep every track again; default choices are left as they are.
    pub fn clear_removals(&mut self) {
        self.removed.clear();
    }

    /// Ids of removed tracks, ascending.
    pub fn removed(&self) -> impl Iterator<Item = u32> + '_ {
        self.removed.iter().copied()
    }

    /// Track chosen as default for a kind, if any.
    pub fn default_for(&self, kind: TrackKind) -> Option<u32> {
        match kind {
            TrackKind::Audio => self.default_audio,
            TrackKind::Subtitle => self.default_subtitle,
            _ => None,
        }
    }

    /// Make `track` the default of its kind and make sure it is kept.
    pub fn set_default(&mut self, track: &Track) -> Result<(), RuleError> {
        match track.kind {
            TrackKind::Audio => self.default_audio = Some(track.id),
            TrackKind::Subtitle => self.default_subtitle = Some(track.id),
            kind => return Err(RuleError::NotFilterable { id: track.id, kind }),
        }
        self.keep(track.id);
        Ok(())
    }

    /// Kept tracks of a kind, in file order.
    pub fn kept<'a>(
        &'a self,
        info: &'a MkvInfo,
        kind: TrackKind,
    ) -> impl Iterator<Item = &'a Track> {
        info.tracks_of(kind).filter(move |t| !self.is_removed(t.id))
    }

    /// Removed tracks of a kind, in file order.
    pub fn dropped<'a>(
        &'a self,
        info: &'a MkvInfo,
        kind: TrackKind,
    ) -> impl Iterator<Item = &'a Track> {
        info.tracks_of(kind).filter(move |t| self.is_removed(t.id))
    }

    /// Number of tracks kept and removed across audio and subtitles.
    pub fn counts(&self, info: &MkvInfo) -> (usize, usize) {
        info.tracks
            .iter()
            .filter(|t| t.kind.is_filterable())
            .fold((0, 0), |(kept, removed), t| {
                if self.is_removed(t.id) {
                    (kept, removed + 1)
                } else {
                    (kept + 1, removed)
                }
            })
    }

    /// Check the selection against a file.
    ///
    /// Every referenced id must be an audio or subtitle track of the file,
    /// and a file with audio must keep at least one audio track.
    pub fn validate(&self, info: &MkvInfo) -> Result<(), RuleError> {
        let referenced = self
            .removed
            .iter()
            .chain(self.default_audio.iter())
            .chain(self.default_subtitle.iter());
        for &id in referenced {
            let track = info.track(id).ok_or(RuleError::UnknownTrack(id))?;
            if !track.kind.is_filterable() {
                return Err(RuleError::NotFilterable {
                    id,
                    kind: track.kind,
                });
            }
        }

        let has_audio = info.audio_tracks().next().is_some();
        if has_audio && self.kept(info, TrackKind::Audio).next().is_none() {
            return Err(RuleError::NoAudioLeft);
        }

        Ok(())
    }

    /// Build the mkvmerge plan for this selection.
    ///
    /// Default flags are only emitted where they change: the chosen track
    /// gets `yes` unless it already is default, other kept tracks of the
    /// same kind that are flagged default get `no`.
    pub fn plan(&self, info: &MkvInfo) -> RemuxPlan {
        let selection_for = |kind: TrackKind| {
            let kept: Vec<u32> = self.kept(info, kind).map(|t| t.id).collect();
            TrackSelection::from_kept(kept, info.tracks_of(kind).count())
        };

        let mut default_tracks = Vec::new();
        for kind in [TrackKind::Audio, TrackKind::Subtitle] {
            let Some(chosen) = self.default_for(kind).filter(|id| !self.is_removed(*id)) else {
                continue;
            };
            for track in self.kept(info, kind) {
                let want = track.id == chosen;
                if track.default != want {
                    default_tracks.push((track.id, want));
                }
            }
        }

        RemuxPlan {
            audio: selection_for(TrackKind::Audio),
            subtitles: selection_for(TrackKind::Subtitle),
            default_tracks,
        }
    }

    /// Whether applying this selection would change the file.
    pub fn needs_remux(&self, info: &MkvInfo) -> bool {
        !self.plan(info).is_noop()
    }
}
