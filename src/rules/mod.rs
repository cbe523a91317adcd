//! Track selection rules.

mod selection;

pub use selection::{RuleError, Selection};

use crate::config::Config;
use langfilter_mkv::{MkvInfo, TrackKind};

/// Apply the config's keep/remove/default rules to a file's tracks.
pub fn evaluate(info: &MkvInfo, config: &Config) -> Selection {
    let mut selection = Selection::keep_all();

    for track in &info.tracks {
        let Some(rules) = config.rules_for(track.kind) else {
            continue;
        };
        if !rules.keeps(&track.language_code()) {
            selection.remove(track.id);
        }
    }

    for kind in [TrackKind::Audio, TrackKind::Subtitle] {
        let Some(lang) = config.rules_for(kind).and_then(|r| r.default.as_deref()) else {
            continue;
        };
        let chosen = selection
            .kept(info, kind)
            .find(|t| t.language_code() == lang)
            .cloned();
        if let Some(track) = chosen {
            // Kind is audio or subtitle, so this can't fail
            let _ = selection.set_default(&track);
        } else {
            tracing::debug!("No kept {} track in '{}' to make default", kind, lang);
        }
    }

    selection
}
