//! Turbo Setup Library
//!
//! Downloads Turbo C 3, extracts it, and points DOSBox's autoexec at it. The `core`
//! modules hold the pipeline; `commands` renders it for the `turbo-setup` CLI.

pub mod commands;
pub mod core;
pub mod error;
pub mod utils;
