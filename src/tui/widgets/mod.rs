//! TUI widgets for Snowpane.
//!
//! Contains the page's UI components.

pub mod chart;
pub mod context;
pub mod header;
pub mod input;
pub mod status;
pub mod table;
