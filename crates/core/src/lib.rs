//! Core domain types shared across the Airgate gateway crates.
//!
//! This crate carries no I/O: wire models for the upstream sensor API,
//! routing and job configuration types, the audit event vocabulary, and the
//! injectable clock used wherever timestamps must be deterministic under
//! test.

pub mod clock;
pub mod destination;
pub mod device;
pub mod event;
pub mod job;
pub mod rule;

pub use clock::{Clock, ManualClock, SystemClock};
pub use destination::Destination;
pub use device::{Device, SensorReading};
pub use event::EventKind;
pub use job::{Credentials, JobDescriptor, DEFAULT_POLL_INTERVAL};
pub use rule::MatchRule;
