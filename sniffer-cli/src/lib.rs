//! Command-line interface for the sniffer
//!
//! This crate provides argument parsing and the console report that the
//! `sniffer` binary prints for every decoded TCP frame.

pub mod args;
pub mod report;

pub use args::Cli;
pub use report::ConsoleReport;
