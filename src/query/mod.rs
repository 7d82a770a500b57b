//! Query execution for Snowpane.
//!
//! This module isolates SQL preparation, execution with session recovery,
//! and the session context read-back from the user interface.

pub mod context;
pub mod executor;
pub mod limit;
pub mod retry;

pub use context::{read_context, SessionContext, CONTEXT_SQL};
pub use executor::{QueryOutcome, QueryRequest, QueryRunner};
pub use limit::apply_row_limit;
pub use retry::{should_reconnect, ErrorKind, ExpiryPolicy};
