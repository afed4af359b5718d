// Keyboard input injection
// The playback core only sees the narrow press/release capability defined here

pub mod log_actuator;
#[cfg(windows)]
pub mod send_input;

pub use log_actuator::LogActuator;
#[cfg(windows)]
pub use send_input::SendInputActuator;

use crate::keymap::PhysicalKey;
use std::future::Future;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ActuatorError {
    #[error("Key {key} was rejected: {reason}")]
    Rejected { key: PhysicalKey, reason: String },

    #[error("Input backend unavailable: {0}")]
    Unavailable(String),
}

/// Capability that presses and releases physical keys.
///
/// Implementations must tolerate concurrent calls: every key of a chord is
/// pressed at once, then every key is released at once.
pub trait InputActuator: Send + Sync + 'static {
    fn press(&self, key: PhysicalKey) -> impl Future<Output = Result<(), ActuatorError>> + Send;

    fn release(&self, key: PhysicalKey) -> impl Future<Output = Result<(), ActuatorError>> + Send;
}

/// The actuator used by the application: OS injection where available,
/// otherwise logging only.
pub enum SystemActuator {
    DryRun(LogActuator),
    #[cfg(windows)]
    SendInput(SendInputActuator),
}

impl SystemActuator {
    /// Pick the platform backend, or the logging actuator when `dry_run` is set
    pub fn select(dry_run: bool) -> Self {
        if dry_run {
            return SystemActuator::DryRun(LogActuator::new());
        }

        #[cfg(windows)]
        let actuator = SystemActuator::SendInput(SendInputActuator::new());

        #[cfg(not(windows))]
        let actuator = {
            log::warn!("No keyboard injection backend on this platform, running dry");
            SystemActuator::DryRun(LogActuator::new())
        };

        actuator
    }

    pub fn is_dry_run(&self) -> bool {
        matches!(self, SystemActuator::DryRun(_))
    }
}

impl InputActuator for SystemActuator {
    async fn press(&self, key: PhysicalKey) -> Result<(), ActuatorError> {
        match self {
            SystemActuator::DryRun(a) => a.press(key).await,
            #[cfg(windows)]
            SystemActuator::SendInput(a) => a.press(key).await,
        }
    }

    async fn release(&self, key: PhysicalKey) -> Result<(), ActuatorError> {
        match self {
            SystemActuator::DryRun(a) => a.release(key).await,
            #[cfg(windows)]
            SystemActuator::SendInput(a) => a.release(key).await,
        }
    }
}
