// server/src/lib.rs
//! The `medscript` binary: command line, tracing setup and data seeding.

pub mod cli;
pub mod seed;
