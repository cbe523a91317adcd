//! mkvinfo-based track inspection.
//!
//! mkvinfo prints the EBML element tree as indented text, one element per
//! line. The nesting depth of an element is the width of the `|`/space
//! prefix in front of its `+` marker:
//!
//! ```text
//! |+ Tracks
//! | + Track
//! |  + Track number: 2 (track ID for mkvmerge & mkvextract: 1)
//! |  + Track type: audio
//! |  + Language: jpn
//! |  + Audio track
//! |   + Channels: 6
//! ```

use super::types::*;
use crate::tools::display_name;
use crate::{Error, Result};
use std::path::Path;
use std::process::Command;

/// Run mkvinfo on a file and parse its track list.
pub fn inspect(mkvinfo: &Path, file: &Path) -> Result<MkvInfo> {
    if !file.exists() {
        return Err(Error::file_not_found(file));
    }

    #[cfg(feature = "tracing")]
    tracing::debug!("Running {:?} on {:?}", mkvinfo, file);

    let output = Command::new(mkvinfo)
        .arg(file)
        .output()
        .map_err(|e| Error::spawn(&display_name(mkvinfo), e))?;

    if !output.status.success() {
        return Err(Error::from_output(&display_name(mkvinfo), &output));
    }

    let text = String::from_utf8(output.stdout)
        .map_err(|e| Error::Parse(format!("invalid UTF-8: {}", e)))?;

    let tracks = parse_mkvinfo(&text)?;

    #[cfg(feature = "tracing")]
    tracing::debug!("Found {} tracks in {:?}", tracks.len(), file);

    Ok(MkvInfo {
        file_path: file.to_path_buf(),
        tracks,
    })
}

/// One `+ key: value` element line.
struct Element<'a> {
    depth: usize,
    key: &'a str,
    value: Option<&'a str>,
}

fn parse_line(line: &str) -> Option<Element<'_>> {
    let line = line.trim_end();
    let plus = line.find('+')?;
    let prefix = &line[..plus];
    if !prefix.chars().all(|c| c == '|' || c == ' ') {
        return None;
    }

    let body = line[plus + 1..].trim_start();
    let (key, value) = match body.split_once(": ") {
        Some((k, v)) => (k.trim(), Some(v.trim())),
        None => (body.trim_end_matches(':').trim(), None),
    };

    Some(Element {
        depth: prefix.len(),
        key,
        value,
    })
}

/// Track under construction; number/id/type are required.
#[derive(Default)]
struct PartialTrack {
    number: Option<(u32, u32)>,
    kind: Option<TrackKind>,
    language: Option<String>,
    name: Option<String>,
    codec: Option<String>,
    channels: Option<u32>,
    default: Option<bool>,
    forced: Option<bool>,
    enabled: Option<bool>,
}

impl PartialTrack {
    fn apply(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "Track number" => self.number = Some(parse_track_number(value)?),
            "Track type" => self.kind = Some(TrackKind::from_mkvinfo(value)),
            "Language" => self.language = Some(value.to_string()),
            "Name" => self.name = Some(value.to_string()),
            "Codec ID" => self.codec = Some(value.to_string()),
            "Channels" => {
                self.channels = Some(value.parse().map_err(|_| {
                    Error::Parse(format!("invalid channel count: {}", value))
                })?)
            }
            "\"Default track\" flag" | "Default flag" => self.default = Some(parse_flag(value)?),
            "\"Forced display\" flag" | "Forced flag" => self.forced = Some(parse_flag(value)?),
            "\"Enabled\" flag" | "Enabled" => self.enabled = Some(parse_flag(value)?),
            _ => {}
        }
        Ok(())
    }

    fn finish(self, line_no: usize) -> Result<Track> {
        let (number, id) = self.number.ok_or_else(|| {
            Error::Parse(format!("track at line {} has no track number", line_no))
        })?;
        let kind = self.kind.ok_or_else(|| {
            Error::Parse(format!("track {} has no track type", number))
        })?;

        let mut track = Track::new(number, id, kind);
        track.language = self.language;
        track.name = self.name;
        track.codec = self.codec;
        track.channels = self.channels;
        track.default = self.default.unwrap_or(true);
        track.forced = self.forced.unwrap_or(false);
        track.enabled = self.enabled.unwrap_or(true);
        Ok(track)
    }
}

/// Parse `2 (track ID for mkvmerge & mkvextract: 1)` into (number, id).
fn parse_track_number(value: &str) -> Result<(u32, u32)> {
    let invalid = || Error::Parse(format!("invalid track number: {}", value));

    let (number, rest) = match value.split_once('(') {
        Some((n, rest)) => (n.trim(), Some(rest)),
        None => (value.trim(), None),
    };
    let number: u32 = number.parse().map_err(|_| invalid())?;

    let id = match rest {
        Some(rest) => rest
            .trim_end_matches(')')
            .rsplit(':')
            .next()
            .and_then(|s| s.trim().parse().ok())
            .ok_or_else(invalid)?,
        // Very old mkvinfo releases print only the number; mkvmerge ids are 0-based
        None => number.checked_sub(1).ok_or_else(invalid)?,
    };

    Ok((number, id))
}

fn parse_flag(value: &str) -> Result<bool> {
    match value.trim() {
        "1" => Ok(true),
        "0" => Ok(false),
        other => Err(Error::Parse(format!("invalid flag value: {}", other))),
    }
}

/// Parse mkvinfo text output into tracks.
pub fn parse_mkvinfo(output: &str) -> Result<Vec<Track>> {
    let mut tracks = Vec::new();
    // (depth of the `+ Track` element, line it started on, fields so far)
    let mut current: Option<(usize, usize, PartialTrack)> = None;

    for (idx, line) in output.lines().enumerate() {
        let Some(element) = parse_line(line) else {
            continue;
        };

        if let Some((depth, _, _)) = current {
            if element.depth <= depth {
                if let Some((_, start, partial)) = current.take() {
                    tracks.push(partial.finish(start)?);
                }
            }
        }

        if element.key == "Track" && element.value.is_none() {
            current = Some((element.depth, idx + 1, PartialTrack::default()));
            continue;
        }

        if let (Some((_, _, partial)), Some(value)) = (current.as_mut(), element.value) {
            partial.apply(element.key, value)?;
        }
    }

    if let Some((_, start, partial)) = current {
        tracks.push(partial.finish(start)?);
    }

    Ok(tracks)
}
