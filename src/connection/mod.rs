//! Connection management for Snowpane.
//!
//! Centralizes the warehouse session lifecycle and its replacement.

pub mod manager;

pub use manager::{Session, SessionManager};
