//! Track inspection.
//!
//! Tracks are read from the text output of `mkvinfo`, which ships with every
//! MKVToolNix install and needs no JSON support in the installed version.

mod mkvinfo;
mod types;

pub use mkvinfo::{inspect, parse_mkvinfo};
pub use types::*;
