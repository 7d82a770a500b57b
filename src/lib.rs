//! Snowpane - run SQL against a Snowflake warehouse from the terminal.
//!
//! This library exposes the core modules for the binaries and for
//! integration tests.

pub mod chart;
pub mod cli;
pub mod config;
pub mod connection;
pub mod db;
pub mod error;
pub mod logging;
pub mod query;
pub mod smoke;
pub mod tui;
