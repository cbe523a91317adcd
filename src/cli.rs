use clap::Parser;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "langfilter")]
#[command(author, version, about = "Remove unwanted languages from MKV files")]
pub struct Cli {
    /// Path(s) to the MKV file(s) to process
    #[arg(required_unless_present = "check_tools")]
    pub files: Vec<PathBuf>,

    /// Output file path (only valid with a single input file)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Only apply config rules, no user interaction
    #[arg(short, long)]
    pub non_interactive: bool,

    /// Don't create a backup when replacing the original file
    #[arg(long)]
    pub no_backup: bool,

    /// Path to configuration file (default: auto-detect)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Show what would be done without executing
    #[arg(long)]
    pub dry_run: bool,

    /// List the tracks of each file and exit
    #[arg(long)]
    pub list: bool,

    /// Output the track list as JSON
    #[arg(long, requires = "list")]
    pub json: bool,

    /// Check that mkvinfo and mkvmerge are available
    #[arg(long)]
    pub check_tools: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}
