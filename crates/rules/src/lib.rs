//! Device-to-rule matching and payload formatting.
//!
//! Everything in this crate is a pure function over [`airgate_core`] types;
//! the only outside input is the timestamp injected by the caller, which
//! keeps the whole pipeline unit-testable.

pub mod channel;
pub mod format;
pub mod matcher;

pub use channel::Channel;
pub use format::format_payload;
pub use matcher::{is_match, match_and_format, MatchOutcome, MATCH_ANY};
