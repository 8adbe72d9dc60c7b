pub mod config;
pub mod extract;
pub mod fetch;
pub mod patch;
pub mod pipeline;
pub mod progress;
