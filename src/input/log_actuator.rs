// Dry-run actuator - logs key actions instead of injecting them

use super::{ActuatorError, InputActuator};
use crate::keymap::PhysicalKey;
use std::sync::atomic::{AtomicU64, Ordering};

/// Logs every press and release at info level
#[derive(Debug, Default)]
pub struct LogActuator {
    presses: AtomicU64,
    releases: AtomicU64,
}

impl LogActuator {
    pub fn new() -> Self {
        Self::default()
    }

    /// (presses, releases) seen so far
    pub fn counts(&self) -> (u64, u64) {
        (
            self.presses.load(Ordering::Relaxed),
            self.releases.load(Ordering::Relaxed),
        )
    }
}

impl InputActuator for LogActuator {
    async fn press(&self, key: PhysicalKey) -> Result<(), ActuatorError> {
        self.presses.fetch_add(1, Ordering::Relaxed);
        log::info!("[dry-run] press {}", key);
        Ok(())
    }

    async fn release(&self, key: PhysicalKey) -> Result<(), ActuatorError> {
        self.releases.fetch_add(1, Ordering::Relaxed);
        log::debug!("[dry-run] release {}", key);
        Ok(())
    }
}
