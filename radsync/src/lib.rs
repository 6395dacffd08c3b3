//! CLI crate for radsync: argument parsing, configuration loading, secrets
//! resolution and the HTTP client implementing the remote contract. All
//! reconciliation logic lives in `radsync-core`.

pub mod api;
pub mod cli;
pub mod load_config;
pub mod secrets;

pub use cli::{run, Cli, Commands};
