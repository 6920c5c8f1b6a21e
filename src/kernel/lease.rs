use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::Notify;
use tracing::debug;

use crate::error::{Error, Result};

/// Arbitration for the process-wide voice engines.
///
/// Only one consumer (the check-in dialogue, a results announcer, a chat
/// feature) may drive recognition or synthesis at a time. Holding a
/// [`VoiceLease`] is that permission; dropping it gives the engines back.
#[derive(Debug, Clone, Default)]
pub struct VoiceArbiter {
    inner: Arc<ArbiterInner>,
}

#[derive(Debug, Default)]
struct ArbiterInner {
    holder: Mutex<Option<String>>,
    released: Notify,
}

impl ArbiterInner {
    fn holder(&self) -> MutexGuard<'_, Option<String>> {
        // A poisoned lock still holds a valid Option.
        self.holder.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl VoiceArbiter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn holder(&self) -> Option<String> {
        self.inner.holder().clone()
    }

    pub fn try_acquire(&self, owner: &str) -> Result<VoiceLease> {
        let mut holder = self.inner.holder();
        if let Some(current) = holder.as_ref() {
            return Err(Error::VoiceBusy(current.clone()));
        }
        *holder = Some(owner.to_string());
        debug!(owner, "Voice lease acquired");
        Ok(VoiceLease {
            inner: Arc::clone(&self.inner),
            owner: owner.to_string(),
        })
    }

    /// Waits until the engines are free.
    pub async fn acquire(&self, owner: &str) -> VoiceLease {
        loop {
            // Register before checking so a release in between is not missed.
            let released = self.inner.released.notified();
            if let Ok(lease) = self.try_acquire(owner) {
                return lease;
            }
            released.await;
        }
    }
}

#[derive(Debug)]
pub struct VoiceLease {
    inner: Arc<ArbiterInner>,
    owner: String,
}

impl VoiceLease {
    pub fn owner(&self) -> &str {
        &self.owner
    }
}

impl Drop for VoiceLease {
    fn drop(&mut self) {
        *self.inner.holder() = None;
        debug!(owner = %self.owner, "Voice lease released");
        self.inner.released.notify_waiters();
    }
}
