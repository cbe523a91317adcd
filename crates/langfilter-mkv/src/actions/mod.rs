//! Media processing actions.

mod remux;

pub use remux::{remux, RemuxPlan, TrackSelection};
