//! Two-phase batch processing: analyse every file first, then remux.

use crate::config::{Config, ToolsConfig};
use crate::interactive::{write_summary, Menu, MenuOutcome, Palette};
use crate::rules::{self, RuleError, Selection};
use anyhow::{Context, Result};
use langfilter_mkv::{inspect, locate, remux, Finalized, MkvInfo, Tool, Workspace};
use std::io;
use std::path::{Path, PathBuf};

/// Resolved locations of the MKVToolNix programs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toolchain {
    pub mkvinfo: PathBuf,
    pub mkvmerge: PathBuf,
}

impl Toolchain {
    /// Use configured paths where they exist, otherwise search PATH.
    pub fn resolve(tools: &ToolsConfig) -> Result<Self> {
        Ok(Self {
            mkvinfo: locate(Tool::Mkvinfo, tools.mkvinfo_path.as_deref())?,
            mkvmerge: locate(Tool::Mkvmerge, tools.mkvmerge_path.as_deref())?,
        })
    }
}

/// Per-run switches from the command line.
#[derive(Debug, Clone, Default)]
pub struct Options {
    /// Only apply config rules.
    pub non_interactive: bool,
    /// Write the result here instead of replacing the input.
    pub output: Option<PathBuf>,
    /// Keep an `_original_` backup when replacing the input.
    pub backup: bool,
    /// Print the mkvmerge command instead of running it.
    pub dry_run: bool,
}

/// Source of hand-made selections for interactive runs.
pub trait TrackPicker {
    fn pick(&mut self, info: &MkvInfo, initial: Selection) -> io::Result<MenuOutcome>;
}

/// Menu on stdin/stdout.
pub struct StdinPicker {
    pub palette: Palette,
}

impl TrackPicker for StdinPicker {
    fn pick(&mut self, info: &MkvInfo, initial: Selection) -> io::Result<MenuOutcome> {
        let stdin = io::stdin();
        let stdout = io::stdout();
        Menu::new(info, initial, self.palette).run(stdin.lock(), stdout.lock())
    }
}

/// Outcome of analysing one file.
#[derive(Debug, Clone)]
pub enum Analysis {
    /// Tracks selected; the file will be remuxed.
    Ready { info: MkvInfo, selection: Selection },
    /// The file has no audio or subtitle tracks.
    NoTracks,
    /// No usable selection was made (cancelled, no rules, or no audio left).
    NoSelection,
    /// The selection keeps every track and changes no flags.
    Unchanged,
    /// Inspection failed.
    Failed(String),
}

impl Analysis {
    fn label(&self) -> &'static str {
        match self {
            Self::Ready { .. } => "ready",
            Self::NoTracks => "no_tracks",
            Self::NoSelection => "no_selection",
            Self::Unchanged => "all_selected",
            Self::Failed(_) => "failed",
        }
    }
}

/// Counts for the final report.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Summary {
    pub analyzed: usize,
    pub selected: usize,
    pub processed: usize,
    pub skipped: usize,
    pub analysis_failed: Vec<PathBuf>,
    pub processing_failed: Vec<PathBuf>,
}

impl Summary {
    /// True when nothing failed.
    pub fn is_success(&self) -> bool {
        self.analysis_failed.is_empty() && self.processing_failed.is_empty()
    }
}

/// Runs the analyse/remux pipeline over a batch of files.
pub struct Processor<'a> {
    config: &'a Config,
    tools: Toolchain,
    options: Options,
    palette: Palette,
}

impl<'a> Processor<'a> {
    pub fn new(config: &'a Config, tools: Toolchain, options: Options, palette: Palette) -> Self {
        Self {
            config,
            tools,
            options,
            palette,
        }
    }

    /// Inspect a file and decide which tracks to keep.
    pub fn analyze(&self, file: &Path, picker: Option<&mut (dyn TrackPicker + '_)>) -> Analysis {
        match self.try_analyze(file, picker) {
            Ok(analysis) => analysis,
            Err(e) => {
                let message = format!("Error analyzing {}: {:#}", file.display(), e);
                tracing::error!("{}", message);
                Analysis::Failed(message)
            }
        }
    }

    fn try_analyze(
        &self,
        file: &Path,
        picker: Option<&mut (dyn TrackPicker + '_)>,
    ) -> Result<Analysis> {
        let p = self.palette;
        println!("\nAnalyzing MKV file: {}", file.display());
        println!("Running mkvinfo to extract track information...");

        let info = inspect(&self.tools.mkvinfo, file)?;
        tracing::debug!("Tracks: {:?}", info.tracks);

        if !info.has_filterable_tracks() {
            println!("No audio or subtitle tracks found in the file.");
            return Ok(Analysis::NoTracks);
        }

        let initial = rules::evaluate(&info, self.config);

        let selection = match picker {
            Some(picker) if !self.options.non_interactive => {
                if self.config.has_rules() {
                    println!(
                        "\n{}Applied default configuration: {}{}",
                        p.yellow, self.config, p.reset
                    );
                }
                match picker.pick(&info, initial).context("Reading track selection")? {
                    MenuOutcome::Accepted(selection) => selection,
                    MenuOutcome::Cancelled => {
                        println!("No tracks selected. File will be skipped.");
                        return Ok(Analysis::NoSelection);
                    }
                }
            }
            _ => {
                if !self.config.has_rules() {
                    println!(
                        "{}Non-interactive mode requires configuration rules.{}",
                        p.yellow, p.reset
                    );
                    println!("No tracks will be removed. File will be skipped.");
                    return Ok(Analysis::NoSelection);
                }
                match initial.validate(&info) {
                    Ok(()) => {}
                    Err(RuleError::NoAudioLeft) => {
                        println!(
                            "{}Rules would remove every audio track. File will be skipped.{}",
                            p.red, p.reset
                        );
                        return Ok(Analysis::NoSelection);
                    }
                    Err(e) => return Err(e.into()),
                }
                println!(
                    "\n{}Applied configuration rules: {}{}",
                    p.bold, self.config, p.reset
                );
                initial
            }
        };

        if !selection.needs_remux(&info) {
            println!("All tracks selected. No filtering needed for this file.");
            return Ok(Analysis::Unchanged);
        }

        write_summary(&mut io::stdout().lock(), &info, &selection, p)?;
        let (kept, removed) = selection.counts(&info);
        println!(
            "\nSelection complete: {} track(s) to keep, {} to remove",
            kept, removed
        );

        Ok(Analysis::Ready { info, selection })
    }

    /// Remux one file according to its selection and put the result in place.
    ///
    /// Returns `None` for dry runs.
    pub fn process(&self, info: &MkvInfo, selection: &Selection) -> Result<Option<Finalized>> {
        let input = info.file_path.as_path();
        let plan = selection.plan(info);

        if self.options.dry_run {
            let target = self.options.output.as_deref().unwrap_or(input);
            println!(
                "[DRY RUN] Would run: {}",
                plan.command_line(&self.tools.mkvmerge, input, target)
            );
            return Ok(None);
        }

        let workspace = Workspace::new(input)?;
        println!(
            "Running: {}",
            plan.command_line(&self.tools.mkvmerge, input, workspace.output())
        );
        println!("This may take a while...");

        remux(&self.tools.mkvmerge, &plan, input, workspace.output())
            .with_context(|| format!("Failed to filter {}", input.display()))?;
        println!("✔ Successfully created filtered MKV file");

        let done = workspace
            .finalize(self.options.output.as_deref(), self.options.backup)
            .with_context(|| format!("Failed to write result for {}", input.display()))?;

        if let Some(ref backup) = done.backup {
            println!("✔ Created backup: {}", backup.display());
        }
        if done.path == input {
            println!("✔ Replaced original file: {}", input.display());
        } else {
            println!("Output: {}", done.path.display());
        }

        Ok(Some(done))
    }

    /// Analyse all files, then process the ones with a selection.
    pub fn run(&self, files: &[PathBuf], mut picker: Option<&mut dyn TrackPicker>) -> Summary {
        let rule = "=".repeat(60);
        let mut summary = Summary {
            analyzed: files.len(),
            ..Default::default()
        };

        println!("\n{}", rule);
        println!(
            "PHASE 1: Analyzing {} file(s) and collecting track selections",
            files.len()
        );
        println!("{}", rule);

        let mut ready = Vec::new();
        for (i, file) in files.iter().enumerate() {
            println!("\n--- File {}/{}: {} ---", i + 1, files.len(), file_name(file));

            let analysis = self.analyze(file, picker.as_deref_mut());

            match analysis {
                Analysis::Ready { info, selection } => {
                    println!("✓ Selection recorded for {}", file_name(file));
                    ready.push((info, selection));
                }
                Analysis::Failed(_) => {
                    println!("✗ Failed to analyze {}", file_name(file));
                    summary.analysis_failed.push(file.clone());
                }
                other => {
                    println!("⚠ Skipping {} ({})", file_name(file), other.label());
                    summary.skipped += 1;
                }
            }
        }

        summary.selected = ready.len();
        if ready.is_empty() {
            println!("\n{}", rule);
            println!("No files to process (no valid selections made)");
            return summary;
        }

        println!("\n{}", rule);
        println!(
            "PHASE 2: Processing {} file(s) with selected tracks",
            ready.len()
        );
        println!("{}", rule);

        for (i, (info, selection)) in ready.iter().enumerate() {
            let file = &info.file_path;
            println!(
                "\n--- Processing {}/{}: {} ---",
                i + 1,
                ready.len(),
                file_name(file)
            );

            match self.process(info, selection) {
                Ok(_) => {
                    println!("✔ File processed successfully!");
                    summary.processed += 1;
                }
                Err(e) => {
                    tracing::error!("Processing {} failed: {:#}", file.display(), e);
                    eprintln!("✗ Error processing {}: {:#}", file.display(), e);
                    summary.processing_failed.push(file.clone());
                }
            }
        }

        print_report(&summary);
        summary
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn print_report(summary: &Summary) {
    let rule = "=".repeat(60);
    println!("\n{}", rule);
    println!("PROCESSING COMPLETE");
    println!("{}", rule);
    println!("Files analyzed: {}", summary.analyzed);
    println!("Files processed: {}/{}", summary.processed, summary.selected);

    if !summary.analysis_failed.is_empty() {
        println!(
            "Analysis failed: {} file(s)",
            summary.analysis_failed.len()
        );
        for file in &summary.analysis_failed {
            println!("  ✗ {}", file_name(file));
        }
    }

    if !summary.processing_failed.is_empty() {
        println!(
            "Processing failed: {} file(s)",
            summary.processing_failed.len()
        );
        for file in &summary.processing_failed {
            println!("  ✗ {}", file_name(file));
        }
    }

    if summary.is_success() {
        println!("✔ All files processed successfully!");
    } else if summary.processed > 0 {
        println!("⚠ Some files failed to process");
    } else {
        println!("✗ No files were processed successfully");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parse_config;
    use crate::rules::test_fixtures::anime;

    fn tools() -> Toolchain {
        Toolchain {
            mkvinfo: PathBuf::from("nonexistent_mkvinfo_12345"),
            mkvmerge: PathBuf::from("nonexistent_mkvmerge_12345"),
        }
    }

    #[test]
    fn test_missing_tool_fails_analysis() {
        let config = Config::default();
        let processor = Processor::new(&config, tools(), Options::default(), Palette::PLAIN);
        let file = tempfile::NamedTempFile::new().unwrap();

        let analysis = processor.analyze(file.path(), None);
        let Analysis::Failed(message) = analysis else {
            panic!("expected failure");
        };
        assert!(message.contains("mkvinfo"));
    }

    #[test]
    fn test_run_counts_failures() {
        let config = parse_config("[audio]\nkeep = jpn\n").unwrap();
        let options = Options {
            non_interactive: true,
            ..Default::default()
        };
        let processor = Processor::new(&config, tools(), options, Palette::PLAIN);
        let file = tempfile::NamedTempFile::new().unwrap();

        let summary = processor.run(&[file.path().to_path_buf()], None);
        assert_eq!(summary.analyzed, 1);
        assert_eq!(summary.analysis_failed.len(), 1);
        assert!(!summary.is_success());
    }

    struct CancellingPicker {
        calls: usize,
    }

    impl TrackPicker for CancellingPicker {
        fn pick(&mut self, _info: &MkvInfo, _initial: Selection) -> io::Result<MenuOutcome> {
            self.calls += 1;
            Ok(MenuOutcome::Cancelled)
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_run_reuses_picker_for_every_file() {
        // Each "file" is a script that sh runs in place of mkvinfo
        let dir = tempfile::tempdir().unwrap();
        let script = "cat <<'EOF'\n\
            |+ Tracks\n\
            | + Track\n\
            |  + Track number: 1 (track ID for mkvmerge & mkvextract: 0)\n\
            |  + Track type: audio\n\
            |  + Language: jpn\n\
            EOF\n";
        let files: Vec<PathBuf> = ["a.mkv", "b.mkv"]
            .iter()
            .map(|name| {
                let path = dir.path().join(name);
                std::fs::write(&path, script).unwrap();
                path
            })
            .collect();

        let config = Config::default();
        let toolchain = Toolchain {
            mkvinfo: PathBuf::from("sh"),
            mkvmerge: PathBuf::from("nonexistent_mkvmerge_12345"),
        };
        let processor = Processor::new(&config, toolchain, Options::default(), Palette::PLAIN);

        let mut picker = CancellingPicker { calls: 0 };
        let summary = processor.run(&files, Some(&mut picker));

        assert_eq!(picker.calls, 2);
        assert_eq!(summary.skipped, 2);
        assert!(summary.analysis_failed.is_empty());
    }

    #[test]
    fn test_dry_run_leaves_file_alone() {
        let config = Config::default();
        let options = Options {
            dry_run: true,
            backup: true,
            ..Default::default()
        };
        let processor = Processor::new(&config, tools(), options, Palette::PLAIN);

        let mut info = anime();
        let file = tempfile::NamedTempFile::new().unwrap();
        info.file_path = file.path().to_path_buf();
        let mut selection = Selection::keep_all();
        selection.remove(2);

        assert_eq!(processor.process(&info, &selection).unwrap(), None);
        assert!(file.path().exists());
    }

    #[test]
    fn test_toolchain_prefers_configured_paths() {
        let mkvinfo = tempfile::NamedTempFile::new().unwrap();
        let mkvmerge = tempfile::NamedTempFile::new().unwrap();
        let tools = ToolsConfig {
            mkvinfo_path: Some(mkvinfo.path().to_path_buf()),
            mkvmerge_path: Some(mkvmerge.path().to_path_buf()),
        };

        let resolved = Toolchain::resolve(&tools).unwrap();
        assert_eq!(resolved.mkvinfo, mkvinfo.path());
        assert_eq!(resolved.mkvmerge, mkvmerge.path());
    }
}
