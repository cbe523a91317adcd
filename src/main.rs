mod cli;

use langfilter::{
    config::{self, LoadedConfig},
    interactive::Palette,
    processor::{Options, Processor, StdinPicker, Toolchain},
};
use langfilter_mkv::{inspect, MkvInfo, TrackKind};

use anyhow::Result;
use clap::Parser;
use cli::Cli;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "langfilter=debug,langfilter_mkv=debug".to_string()
        } else {
            "langfilter=info,langfilter_mkv=info".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .with_writer(std::io::stderr)
        .init();

    if cli.check_tools {
        let loaded = config::load_config_or_default(cli.config.as_deref())?;
        return Ok(check_tools(&loaded.config.tools));
    }

    let files = valid_files(&cli.files);
    if files.is_empty() {
        eprintln!("Error: No valid MKV files to process");
        return Ok(ExitCode::FAILURE);
    }

    if cli.output.is_some() && files.len() > 1 {
        eprintln!("Error: --output can only be used with a single input file");
        return Ok(ExitCode::FAILURE);
    }

    let loaded = config::load_config_or_default(cli.config.as_deref())?;
    report_config(&loaded, cli.config.is_some());
    let config = loaded.config;

    if cli.non_interactive && !cli.list && !config.has_rules() {
        eprintln!("Error: Non-interactive mode requires configuration rules");
        eprintln!("Add keep/remove/default entries to a config file or drop --non-interactive");
        return Ok(ExitCode::FAILURE);
    }

    let tools = Toolchain::resolve(&config.tools)?;
    tracing::debug!("Using {:?}", tools);

    if cli.list {
        return list_tracks(&tools.mkvinfo, &files, cli.json);
    }

    let palette = Palette::detect();
    let options = Options {
        non_interactive: cli.non_interactive,
        output: cli.output,
        backup: !cli.no_backup,
        dry_run: cli.dry_run,
    };

    if cli.dry_run {
        println!("[DRY RUN] No files will be modified");
    }

    let processor = Processor::new(&config, tools, options, palette);
    let summary = if cli.non_interactive {
        processor.run(&files, None)
    } else {
        let mut picker = StdinPicker { palette };
        processor.run(&files, Some(&mut picker))
    };

    Ok(if summary.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

/// Keep the inputs that are regular files, reporting the rest.
fn valid_files(files: &[PathBuf]) -> Vec<PathBuf> {
    let mut valid = Vec::with_capacity(files.len());
    for file in files {
        if !file.exists() {
            eprintln!("Error: File '{}' does not exist", file.display());
            continue;
        }
        if !file.is_file() {
            eprintln!("Error: '{}' is not a file", file.display());
            continue;
        }
        let is_mkv = file
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("mkv"));
        if !is_mkv {
            tracing::warn!("'{}' does not have a .mkv extension", file.display());
        }
        valid.push(file.clone());
    }
    valid
}

fn report_config(loaded: &LoadedConfig, explicit: bool) {
    let Some(ref source) = loaded.source else {
        return;
    };

    if explicit {
        println!("Loaded configuration from {}", source.display());
    } else {
        println!("Found and loaded configuration from {}", source.display());
        if config::is_standard_location(source) {
            println!("Using standard Linux configuration directory.");
        }
    }
    tracing::debug!("Rules: {}", loaded.config);
}

fn list_tracks(mkvinfo: &Path, files: &[PathBuf], json: bool) -> Result<ExitCode> {
    let mut infos = Vec::with_capacity(files.len());
    let mut failed = false;

    for file in files {
        match inspect(mkvinfo, file) {
            Ok(info) => infos.push(info),
            Err(e) => {
                eprintln!("✗ Failed to read tracks of {}: {}", file.display(), e);
                failed = true;
            }
        }
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&infos)?);
    } else {
        for info in &infos {
            print_tracks(info);
        }
    }

    Ok(if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

fn print_tracks(info: &MkvInfo) {
    println!("\nFile: {}", info.file_path.display());

    for (title, kind) in [
        ("Video", TrackKind::Video),
        ("Audio", TrackKind::Audio),
        ("Subtitle", TrackKind::Subtitle),
    ] {
        let tracks: Vec<_> = info.tracks_of(kind).collect();
        println!("\n{} Tracks: {}", title, tracks.len());
        for track in tracks {
            print!("  [{}] {}", track.id, track);
            if track.forced {
                print!(" [forced]");
            }
            if track.default {
                print!(" [default]");
            }
            println!();
        }
    }
}

fn check_tools(tools: &config::ToolsConfig) -> ExitCode {
    println!("Checking external tools...\n");

    let statuses = langfilter_mkv::check_tools(
        tools.mkvinfo_path.as_deref(),
        tools.mkvmerge_path.as_deref(),
    );
    let mut all_ok = true;

    for status in &statuses {
        let mark = if status.is_available() {
            "✓"
        } else {
            all_ok = false;
            "✗"
        };

        print!("{} {}", mark, status.tool);

        if let Some(version) = status.version.as_deref().filter(|v| !v.is_empty()) {
            print!(" ({})", version);
        }

        if let Some(ref path) = status.path {
            print!(" - {}", path.display());
        }

        println!();
    }

    println!();
    if all_ok {
        println!("All required tools are available!");
        ExitCode::SUCCESS
    } else {
        println!("Some tools are missing. Install mkvtoolnix (https://mkvtoolnix.download/).");
        ExitCode::FAILURE
    }
}
