//! Check-in telemetry
//!
//! # SAFETY INVARIANT
//! Telemetry is a READ-ONLY side-effect layer.
//! It must **NEVER** be read inside decision logic (Reactor, Scheduler).
//! It exists solely for observability and verification.
//!
//! # PRIVACY INVARIANT
//! Telemetry events must **NEVER** contain user content (transcripts, names).
//! Only phases, internal ids, counts and port flags are allowed.

pub mod event;
pub mod metrics;
pub mod recorder;
