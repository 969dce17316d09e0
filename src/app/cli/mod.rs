//! CLI module: argument parsing and configuration file handling

pub mod args;
pub mod config;
pub mod error;
