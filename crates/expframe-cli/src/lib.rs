//! ExperimentFramework command-line plan tooling
//!
//! Command bodies live here so they can be driven with any writer; the
//! `expframe` binary only parses arguments and maps outcomes to exit codes.

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod commands;

pub use commands::{apply, export, validate, ReportFormat};
