//! SynkBot
//!
//! A conversational front-end for SunSynk inverters. A language model picks
//! tools that run `synkctl` and answers from the normalized records.

pub mod agent;
pub mod config;
pub mod errors;
pub mod synkctl;
pub mod tools;

pub use agent::{Orchestrator, OllamaBackend};
pub use config::Config;
pub use synkctl::SynkctlClient;
pub use tools::ToolRegistry;
