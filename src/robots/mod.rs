//! Robots.txt handling module
//!
//! This module provides:
//! - Rule evaluation for a robots.txt body (`RobotsRules`)
//! - Per-origin cached policies (`RobotsPolicy`)
//! - The single-flight, fail-open gate consulted before every fetch (`RobotsGate`)

mod cache;
mod gate;
mod parser;

pub use cache::{ExpiryPolicy, PolicySource, RobotsPolicy};
pub use gate::{RobotsDecision, RobotsGate, MAX_ROBOTS_BYTES};
pub use parser::RobotsRules;
