//! synkctl adapter module
//!
//! Runs the SunSynk inverter-control utility and turns its JSON output into
//! typed records.

pub mod client;
pub mod command;
pub mod fields;
pub mod normalize;
pub mod runner;
pub mod types;

pub use client::SynkctlClient;
pub use command::{DeviceId, Subcommand};
pub use runner::{CommandOutput, CommandRunner, SynkctlRunner};
pub use types::*;
