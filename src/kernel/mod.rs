//! Check-in dialogue kernel
//!
//! `reactor` is the pure state machine; `driver` is the only part that
//! awaits, spawns or touches an engine.

pub mod cancel;
pub mod driver;
pub mod event;
pub mod lease;
pub mod reactor;
pub mod scheduler;
pub mod state;
pub mod telemetry;
pub mod time;
