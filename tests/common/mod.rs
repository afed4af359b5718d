// Test doubles for the playback tests

#![allow(dead_code)]

use parking_lot::Mutex;
use sheet_player_lib::input::{ActuatorError, InputActuator};
use sheet_player_lib::keymap::{KeyMap, PhysicalKey};
use sheet_player_lib::playback::ChordScheduler;
use sheet_player_lib::sheet::Note;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Press,
    Release,
}

/// One recorded key action, timed from the test's start instant
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub at: Duration,
    pub action: Action,
    pub key: PhysicalKey,
}

/// Records every key action. Presses of `reject` fail.
pub struct RecordingActuator {
    origin: Instant,
    events: Mutex<Vec<Event>>,
    reject: Option<PhysicalKey>,
}

impl RecordingActuator {
    pub fn new(origin: Instant) -> Self {
        Self {
            origin,
            events: Mutex::new(Vec::new()),
            reject: None,
        }
    }

    pub fn rejecting(origin: Instant, key: PhysicalKey) -> Self {
        Self {
            reject: Some(key),
            ..Self::new(origin)
        }
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().clone()
    }

    /// Press times in milliseconds with the pressed key
    pub fn presses(&self) -> Vec<(u64, PhysicalKey)> {
        self.events
            .lock()
            .iter()
            .filter(|e| e.action == Action::Press)
            .map(|e| (e.at.as_millis() as u64, e.key))
            .collect()
    }

    fn record(&self, action: Action, key: PhysicalKey) {
        self.events.lock().push(Event {
            at: self.origin.elapsed(),
            action,
            key,
        });
    }
}

impl InputActuator for RecordingActuator {
    async fn press(&self, key: PhysicalKey) -> Result<(), ActuatorError> {
        self.record(Action::Press, key);
        if self.reject == Some(key) {
            return Err(ActuatorError::Rejected {
                key,
                reason: "test rejection".into(),
            });
        }
        Ok(())
    }

    async fn release(&self, key: PhysicalKey) -> Result<(), ActuatorError> {
        self.record(Action::Release, key);
        Ok(())
    }
}

/// Counts song-end callbacks and remembers when they ran
#[derive(Clone)]
pub struct SongEnds {
    origin: Instant,
    count: Arc<AtomicUsize>,
    times: Arc<Mutex<Vec<u64>>>,
}

impl SongEnds {
    pub fn attach<A: InputActuator>(scheduler: &ChordScheduler<A>, origin: Instant) -> Self {
        let ends = Self {
            origin,
            count: Arc::new(AtomicUsize::new(0)),
            times: Arc::new(Mutex::new(Vec::new())),
        };
        let hook = ends.clone();
        scheduler.set_on_song_end(move || {
            hook.count.fetch_add(1, Ordering::SeqCst);
            hook.times.lock().push(hook.origin.elapsed().as_millis() as u64);
        });
        ends
    }

    pub fn count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }

    pub fn times(&self) -> Vec<u64> {
        self.times.lock().clone()
    }
}

pub fn scheduler(actuator: &Arc<RecordingActuator>) -> ChordScheduler<RecordingActuator> {
    ChordScheduler::new(
        actuator.clone(),
        Arc::new(KeyMap::builtin()),
        tokio::runtime::Handle::current(),
    )
}

pub fn notes(raw: &[(u64, &str)]) -> Vec<Note> {
    raw.iter().map(|(t, k)| Note::new(*t, *k)).collect()
}
