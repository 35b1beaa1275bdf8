//! Application-level orchestration utilities.
//!
//! This module owns run lifecycle control (start/stop) for the interactive UI and the
//! single-shot headless run used by text and JSON output. UI/CLI layers call into
//! this module to keep responsibilities separated.

mod controller;
mod headless;

#[cfg_attr(not(feature = "tui"), allow(unused_imports))]
pub(crate) use controller::{run_controller, UiCommand};
pub(crate) use headless::run_once;
