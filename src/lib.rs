pub mod announce;
pub mod config;
pub mod engines;
pub mod error;
pub mod kernel;
pub mod language;
pub mod ports;
pub mod services;

pub use config::KioskConfig;
pub use error::{Error, Result};
pub use kernel::driver::{CheckInHandle, CheckInStatus, Driver, SearchReport};
pub use kernel::lease::{VoiceArbiter, VoiceLease};
pub use kernel::reactor::Reactor;
pub use kernel::state::DialoguePhase;
pub use language::SupportedLanguage;
