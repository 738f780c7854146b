//! Bounded, per-job, append-only audit logging.
//!
//! Each job gets its own line-oriented `.log` file under a shared directory.
//! Appends never fail visibly to callers: internal I/O errors are reported
//! on the process diagnostic channel (`tracing`) and swallowed, so a broken
//! disk can never take down a polling loop.

pub mod entry;
pub mod log;

pub use entry::{PAYLOAD_BEGIN, PAYLOAD_END};
pub use log::{sanitize_job_name, AuditLog, DEFAULT_MAX_LINES};
