//! Integration tests for Snowpane.

pub mod common;
pub mod config_test;
pub mod context_test;
pub mod headless_test;
pub mod runner_test;
pub mod warehouse_test;
