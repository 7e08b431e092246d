// server/src/cli/mod.rs

pub mod cli;
pub mod commands;

pub use cli::{start_cli, CliArgs, Commands};
