//! Text menu for picking tracks by hand.

use crate::rules::{RuleError, Selection};
use langfilter_mkv::{MkvInfo, Track, TrackKind};
use std::io::{self, BufRead, Write};

/// ANSI escape codes, or empty strings when output isn't a terminal.
#[derive(Debug, Clone, Copy)]
pub struct Palette {
    pub red: &'static str,
    pub green: &'static str,
    pub yellow: &'static str,
    pub bold: &'static str,
    pub reset: &'static str,
}

impl Palette {
    pub const COLOR: Self = Self {
        red: "\x1b[31m",
        green: "\x1b[32m",
        yellow: "\x1b[33m",
        bold: "\x1b[1m",
        reset: "\x1b[0m",
    };

    pub const PLAIN: Self = Self {
        red: "",
        green: "",
        yellow: "",
        bold: "",
        reset: "",
    };

    /// Colors when stdout is a terminal.
    pub fn detect() -> Self {
        use std::io::IsTerminal;
        if io::stdout().is_terminal() {
            Self::COLOR
        } else {
            Self::PLAIN
        }
    }
}

/// A parsed menu command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Toggle removal of these entries (0-based).
    Toggle(Vec<usize>),
    /// Make this entry (0-based) the default of its kind.
    Default(usize),
    Clear,
    Reset,
    Done,
    Quit,
}

/// Parse one line of menu input.
///
/// `max` is the number of listed tracks; entry numbers are 1-based.
pub fn parse_command(input: &str, max: usize) -> Result<Command, String> {
    let input = input.trim().to_lowercase();

    match input.as_str() {
        "" => return Err("Please enter a command or track number(s).".to_string()),
        "d" | "done" => return Ok(Command::Done),
        "q" | "quit" => return Ok(Command::Quit),
        "c" => return Ok(Command::Clear),
        "r" => return Ok(Command::Reset),
        _ => {}
    }

    if let Some(rest) = input.strip_prefix("def") {
        let rest = rest.trim();
        let number: usize = rest
            .parse()
            .map_err(|_| format!("Invalid input: 'def {}'. Use 'def N'.", rest))?;
        return check_number(number, max).map(Command::Default);
    }

    let parts: Vec<&str> = input.split_whitespace().collect();
    parse_track_selection(&parts, max).map(Command::Toggle)
}

/// Parse track numbers and ranges such as `1 3-5 8` into 0-based indices.
pub fn parse_track_selection(parts: &[&str], max: usize) -> Result<Vec<usize>, String> {
    let mut indices = Vec::new();

    for part in parts {
        if let Some((start, end)) = part.split_once('-') {
            let (start, end) = match (start.trim().parse::<usize>(), end.trim().parse::<usize>()) {
                (Ok(s), Ok(e)) => (s, e),
                _ => {
                    return Err(format!(
                        "Invalid range format: '{}'. Use format like '1-5'.",
                        part
                    ))
                }
            };

            if start < 1 || end < 1 || start > max || end > max {
                return Err(format!(
                    "Invalid range: {}. Numbers must be between 1 and {}.",
                    part, max
                ));
            }
            if start > end {
                return Err(format!("Invalid range: {}. Start must be <= end.", part));
            }

            indices.extend((start..=end).map(|n| n - 1));
        } else {
            let number: usize = part.parse().map_err(|_| {
                format!(
                    "Invalid input: '{}'. Please enter numbers or ranges.",
                    part
                )
            })?;
            indices.push(check_number(number, max)?);
        }
    }

    Ok(indices)
}

fn check_number(number: usize, max: usize) -> Result<usize, String> {
    if (1..=max).contains(&number) {
        Ok(number - 1)
    } else {
        Err(format!(
            "Invalid track number: {}. Must be between 1 and {}.",
            number, max
        ))
    }
}

/// How the menu ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuOutcome {
    Accepted(Selection),
    Cancelled,
}

/// Interactive track picker for one file.
pub struct Menu<'a> {
    info: &'a MkvInfo,
    entries: Vec<&'a Track>,
    initial: Selection,
    selection: Selection,
    palette: Palette,
}

impl<'a> Menu<'a> {
    /// Start from `initial`, typically the config rules' selection.
    pub fn new(info: &'a MkvInfo, initial: Selection, palette: Palette) -> Self {
        let entries = info
            .tracks
            .iter()
            .filter(|t| t.kind.is_filterable())
            .collect();
        Self {
            info,
            entries,
            selection: initial.clone(),
            initial,
            palette,
        }
    }

    /// Current selection.
    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// Apply one command. Returns `Some` when the menu is finished.
    pub fn apply<W: Write>(
        &mut self,
        command: Command,
        out: &mut W,
    ) -> io::Result<Option<MenuOutcome>> {
        let p = self.palette;
        match command {
            Command::Toggle(indices) => {
                for index in indices {
                    if let Some(track) = self.entries.get(index) {
                        self.selection.toggle(track.id);
                    }
                }
                writeln!(out, "{}Selection updated.{}", p.green, p.reset)?;
            }
            Command::Default(index) => {
                let Some(&track) = self.entries.get(index) else {
                    return Ok(None);
                };
                if self.selection.set_default(track).is_ok() {
                    writeln!(
                        out,
                        "{}Track {} will be the default {} track.{}",
                        p.green, track.number, track.kind, p.reset
                    )?;
                }
            }
            Command::Clear => self.selection.clear_removals(),
            Command::Reset => self.selection = self.initial.clone(),
            Command::Done => match self.selection.validate(self.info) {
                Ok(()) => return Ok(Some(MenuOutcome::Accepted(self.selection.clone()))),
                Err(RuleError::NoAudioLeft) => writeln!(
                    out,
                    "{}All audio tracks are marked for removal. Keep at least one.{}",
                    p.red, p.reset
                )?,
                Err(e) => writeln!(out, "{}{}{}", p.red, e, p.reset)?,
            },
            Command::Quit => {
                writeln!(out, "Operation cancelled.")?;
                return Ok(Some(MenuOutcome::Cancelled));
            }
        }
        Ok(None)
    }

    /// Run the prompt loop until the user accepts or cancels.
    ///
    /// End of input counts as cancel.
    pub fn run<R: BufRead, W: Write>(
        &mut self,
        mut input: R,
        mut out: W,
    ) -> io::Result<MenuOutcome> {
        let p = self.palette;
        writeln!(
            out,
            "\n{}Found {} audio/subtitle track(s):{}\n",
            p.bold,
            self.entries.len(),
            p.reset
        )?;

        loop {
            self.render(&mut out)?;
            write_help(&mut out, p)?;
            write!(out, "Selection: ")?;
            out.flush()?;

            let mut line = String::new();
            if input.read_line(&mut line)? == 0 {
                writeln!(out, "\n{}Operation cancelled.{}", p.yellow, p.reset)?;
                return Ok(MenuOutcome::Cancelled);
            }

            match parse_command(&line, self.entries.len()) {
                Ok(command) => {
                    if let Some(outcome) = self.apply(command, &mut out)? {
                        return Ok(outcome);
                    }
                }
                Err(message) => writeln!(out, "{}{}{}", p.red, message, p.reset)?,
            }
        }
    }

    fn render<W: Write>(&self, out: &mut W) -> io::Result<()> {
        let p = self.palette;

        for (i, track) in self.entries.iter().enumerate() {
            let default = if self.is_effective_default(track) {
                " [default]"
            } else {
                ""
            };
            if self.selection.is_removed(track.id) {
                writeln!(
                    out,
                    "  {}>{:2}. {:<9} {}{}{}",
                    p.red,
                    i + 1,
                    track.kind,
                    track,
                    default,
                    p.reset
                )?;
            } else {
                writeln!(out, "   {:2}. {:<9} {}{}", i + 1, track.kind, track, default)?;
            }
        }

        let (kept, removed) = self.selection.counts(self.info);
        writeln!(out)?;
        writeln!(
            out,
            "  {}Tracks to keep: {}{} | {}Tracks to remove: {}{}",
            p.green, kept, p.reset, p.red, removed, p.reset
        )?;

        let audio_total = self.info.audio_tracks().count();
        if audio_total > 0 && self.selection.kept(self.info, TrackKind::Audio).next().is_none() {
            writeln!(
                out,
                "  {}{}⚠ All audio tracks selected for removal!{}",
                p.red, p.bold, p.reset
            )?;
        }
        writeln!(out)
    }

    /// Default flag the track will carry after remuxing.
    fn is_effective_default(&self, track: &Track) -> bool {
        match self.selection.default_for(track.kind) {
            Some(id) => id == track.id,
            None => track.default,
        }
    }
}

fn write_help<W: Write>(out: &mut W, p: Palette) -> io::Result<()> {
    writeln!(out, "{}Commands:{}", p.bold, p.reset)?;
    writeln!(out, "  • Enter track number(s) to toggle selection for removal")?;
    writeln!(out, "  • Use ranges: 1-5 selects tracks 1, 2, 3, 4, 5")?;
    writeln!(out, "  • Mix numbers and ranges: 1 3-5 8")?;
    writeln!(out, "  • 'def N' to make track N the default of its kind")?;
    writeln!(out, "  • 'd' or 'done' to proceed with current selection")?;
    writeln!(out, "  • 'q' or 'quit' to cancel")?;
    writeln!(out, "  • 'c' to clear all selections, 'r' to restore config rules")?;
    writeln!(out)
}

/// Print which tracks are kept and removed.
pub fn write_summary<W: Write>(
    out: &mut W,
    info: &MkvInfo,
    selection: &Selection,
    palette: Palette,
) -> io::Result<()> {
    let p = palette;
    let (kept, removed) = selection.counts(info);

    writeln!(out, "  Tracks to keep: {}{}{}", p.green, kept, p.reset)?;
    writeln!(out, "  Tracks to remove: {}{}{}", p.red, removed, p.reset)?;

    for kind in [TrackKind::Audio, TrackKind::Subtitle] {
        let keep: Vec<&Track> = selection.kept(info, kind).collect();
        let drop: Vec<&Track> = selection.dropped(info, kind).collect();
        if keep.is_empty() && drop.is_empty() {
            continue;
        }

        writeln!(out, "\n{}{}:{}", p.bold, kind, p.reset)?;
        for track in keep {
            let default = if selection.default_for(kind) == Some(track.id) {
                " [default]"
            } else {
                ""
            };
            writeln!(out, "  {}✓{} {}{}", p.green, p.reset, track, default)?;
        }
        for track in drop {
            writeln!(out, "  {}✗{} {}", p.red, p.reset, track)?;
        }
    }

    Ok(())
}
