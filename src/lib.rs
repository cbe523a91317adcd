//! langfilter - Remove unwanted audio and subtitle tracks from MKV files
//!
//! This library crate exposes the core functionality for integration testing.

pub mod config;
pub mod interactive;
pub mod processor;
pub mod rules;
