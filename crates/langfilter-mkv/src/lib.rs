//! # langfilter-mkv
//!
//! MKVToolNix wrapper used by langfilter.
//!
//! This crate provides functionality for:
//! - Inspecting the tracks of an MKV file with `mkvinfo`
//! - Writing a copy with selected audio/subtitle tracks with `mkvmerge`
//! - Replacing the original file with backup and rollback semantics
//!
//! ## Features
//!
//! - `tracing` - Enable tracing support
//!
//! ## Example
//!
//! ```no_run
//! use langfilter_mkv::{inspect, remux, RemuxPlan, TrackSelection, Workspace};
//! use std::path::Path;
//!
//! let input = Path::new("/path/to/movie.mkv");
//! let info = inspect(Path::new("mkvinfo"), input)?;
//! let keep: Vec<u32> = info
//!     .audio_tracks()
//!     .filter(|t| t.language_code() == "jpn")
//!     .map(|t| t.id)
//!     .collect();
//!
//! let plan = RemuxPlan {
//!     audio: TrackSelection::Only(keep),
//!     ..Default::default()
//! };
//!
//! let workspace = Workspace::new(input)?;
//! remux(Path::new("mkvmerge"), &plan, input, workspace.output())?;
//! workspace.finalize(None, true)?;
//! # Ok::<(), langfilter_mkv::Error>(())
//! ```

pub mod actions;
mod error;
pub mod probe;
pub mod tools;
pub mod workspace;

// Re-exports
pub use actions::{remux, RemuxPlan, TrackSelection};
pub use error::{Error, Result};
pub use probe::{inspect, parse_mkvinfo, MkvInfo, Track, TrackKind};
pub use tools::{check_tools, locate, tool_version, Tool, ToolStatus};
pub use workspace::{Finalized, Workspace};
