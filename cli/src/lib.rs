//! folderwatch: watch a folder and publish a notification for every change.
//!
//! The binary parses [`Cli`], then [`run`] wires the directory watcher to a
//! [`Pipeline`] of filter, formatter and dispatcher until Ctrl-C.

pub mod args;
pub mod pipeline;
pub mod run;

pub use args::Cli;
pub use pipeline::{Pipeline, RunStats};
pub use run::{run, run_with_shutdown};
