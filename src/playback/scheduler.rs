// Chord scheduler - replays a chord timeline as key presses on a virtual clock
//
// Every chord's fire time is derived from the anchor taken when the run starts,
// never from the previous chord, so late wakeups do not accumulate drift.

use super::timeline::{Chord, Timeline};
use crate::input::{ActuatorError, InputActuator};
use crate::keymap::{KeyMap, Layout, PhysicalKey, DEFAULT_PROFILE};
use crate::sheet::{Note, TAIL_WAIT_MS};
use futures_util::future::join_all;
use parking_lot::Mutex;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::{oneshot, Notify};
use tokio::time::Instant;

/// Lowest accepted speed multiplier
pub const MIN_SPEED: f64 = 0.1;

/// Stand-in deadline for waits too long to represent as an instant
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

/// Callback invoked when a run reaches the end of its song
pub type SongEndCallback = Arc<dyn Fn() + Send + Sync>;

/// Per-run playback parameters
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackOptions {
    /// Speed multiplier; clamped to the scheduler's minimum
    pub speed: f64,
    /// Song position to resume from, in milliseconds
    pub start_offset_ms: f64,
    /// Game profile used to resolve note keys
    pub game_profile: String,
}

impl Default for PlaybackOptions {
    fn default() -> Self {
        Self {
            speed: 1.0,
            start_offset_ms: 0.0,
            game_profile: DEFAULT_PROFILE.to_string(),
        }
    }
}

/// Scheduler-wide timing settings
#[derive(Debug, Clone, PartialEq)]
pub struct SchedulerSettings {
    /// Silence after the last chord before the song counts as finished (song time)
    pub tail_wait_ms: u64,
    pub min_speed: f64,
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self {
            tail_wait_ms: TAIL_WAIT_MS,
            min_speed: MIN_SPEED,
        }
    }
}

/// Why `start` did not begin a run
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StartRejected {
    #[error("A song is already playing")]
    AlreadyPlaying,

    #[error("Song has no notes")]
    EmptySong,
}

/// How a run ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaybackOutcome {
    /// Reached the end of the song, including the tail wait
    Completed,
    /// Stopped before the end
    Stopped,
    /// The actuator rejected a key action; the run was aborted
    Failed(ActuatorError),
}

/// Completion handle for one run
#[derive(Debug)]
pub struct PlaybackRun {
    epoch: u64,
    outcome: oneshot::Receiver<PlaybackOutcome>,
}

impl PlaybackRun {
    /// Identifier of this run; increases with every started run
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Wait for the run to end
    pub async fn finished(self) -> PlaybackOutcome {
        // A dropped sender means the run task was torn down
        self.outcome.await.unwrap_or(PlaybackOutcome::Stopped)
    }
}

/// Snapshot of the active run
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackState {
    pub epoch: u64,
    pub speed: f64,
    pub start_offset_ms: u64,
    pub game_profile: String,
    pub position_ms: u64,
}

struct ActiveRun {
    epoch: u64,
    cancel: Arc<Notify>,
    started_at: Instant,
    start_offset_ms: u64,
    speed: f64,
    game_profile: String,
}

impl ActiveRun {
    fn position_ms(&self) -> u64 {
        let elapsed_ms = self.started_at.elapsed().as_secs_f64() * 1000.0;
        self.start_offset_ms.saturating_add((elapsed_ms * self.speed) as u64)
    }
}

#[derive(Default)]
struct Session {
    /// Last epoch handed out
    epoch: u64,
    active: Option<ActiveRun>,
    /// Epoch of the most recent run that reached the end of its song
    last_completed: Option<u64>,
    on_song_end: Option<SongEndCallback>,
}

impl Session {
    fn is_current(&self, epoch: u64) -> bool {
        self.active.as_ref().map(|run| run.epoch) == Some(epoch)
    }
}

/// Owns the single playback session.
///
/// At most one run is active at a time. `start` spawns the run on the given
/// runtime and returns immediately; `stop` cancels the pending wait so the run
/// ends at its next check. A chord that has started firing always finishes its
/// releases.
pub struct ChordScheduler<A: InputActuator> {
    actuator: Arc<A>,
    keymap: Arc<KeyMap>,
    settings: SchedulerSettings,
    session: Arc<Mutex<Session>>,
    runtime: Handle,
}

impl<A: InputActuator> Clone for ChordScheduler<A> {
    fn clone(&self) -> Self {
        Self {
            actuator: self.actuator.clone(),
            keymap: self.keymap.clone(),
            settings: self.settings.clone(),
            session: self.session.clone(),
            runtime: self.runtime.clone(),
        }
    }
}

impl<A: InputActuator> ChordScheduler<A> {
    pub fn new(actuator: Arc<A>, keymap: Arc<KeyMap>, runtime: Handle) -> Self {
        Self::with_settings(actuator, keymap, runtime, SchedulerSettings::default())
    }

    pub fn with_settings(
        actuator: Arc<A>,
        keymap: Arc<KeyMap>,
        runtime: Handle,
        settings: SchedulerSettings,
    ) -> Self {
        Self {
            actuator,
            keymap,
            settings,
            session: Arc::new(Mutex::new(Session::default())),
            runtime,
        }
    }

    pub fn keymap(&self) -> &KeyMap {
        &self.keymap
    }

    pub fn settings(&self) -> &SchedulerSettings {
        &self.settings
    }

    /// Begin playing `notes`.
    ///
    /// Rejected without side effects when the song is empty or a run is
    /// already active. Callers that only want fire-and-forget may ignore the result.
    pub fn start(&self, notes: &[Note], options: PlaybackOptions) -> Result<PlaybackRun, StartRejected> {
        if notes.is_empty() {
            log::debug!("Ignoring start: song has no notes");
            return Err(StartRejected::EmptySong);
        }

        let speed = normalize_speed(options.speed, self.settings.min_speed);
        let start_offset_ms = normalize_offset(options.start_offset_ms);
        let timeline = Timeline::build(notes);

        let (epoch, cancel, started_at) = {
            let mut session = self.session.lock();
            if session.active.is_some() {
                log::debug!("Ignoring start: already playing");
                return Err(StartRejected::AlreadyPlaying);
            }

            session.epoch += 1;
            let run = ActiveRun {
                epoch: session.epoch,
                cancel: Arc::new(Notify::new()),
                started_at: Instant::now(),
                start_offset_ms,
                speed,
                game_profile: options.game_profile.clone(),
            };
            let handles = (run.epoch, run.cancel.clone(), run.started_at);
            session.active = Some(run);
            handles
        };

        log::info!(
            "Playback #{} started: {} chords, speed {:.2}, offset {}ms, profile {}",
            epoch,
            timeline.len(),
            speed,
            start_offset_ms,
            self.keymap.canonical_name(&options.game_profile)
        );

        let task = RunTask {
            epoch,
            timeline,
            speed,
            start_offset_ms,
            started_at,
            game_profile: options.game_profile,
            tail_wait_ms: self.settings.tail_wait_ms,
            cancel,
            actuator: self.actuator.clone(),
            keymap: self.keymap.clone(),
            session: self.session.clone(),
        };

        let (tx, rx) = oneshot::channel();
        self.runtime.spawn(async move {
            let outcome = task.run().await;
            let _ = tx.send(outcome);
        });

        Ok(PlaybackRun { epoch, outcome: rx })
    }

    /// Stop the active run, if any. Safe to call at any time.
    pub fn stop(&self) {
        let stopped = self.session.lock().active.take();
        if let Some(run) = stopped {
            run.cancel.notify_one();
            log::info!("Playback #{} stopped at {}ms", run.epoch, run.position_ms());
        }
    }

    /// Register the end-of-song callback, replacing any previous one
    pub fn set_on_song_end<F>(&self, callback: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.session.lock().on_song_end = Some(Arc::new(callback));
    }

    pub fn is_playing(&self) -> bool {
        self.session.lock().active.is_some()
    }

    /// Song position of the active run in milliseconds
    pub fn position_ms(&self) -> Option<u64> {
        self.session.lock().active.as_ref().map(ActiveRun::position_ms)
    }

    /// Epoch of the latest run that finished naturally
    pub fn last_completed_epoch(&self) -> Option<u64> {
        self.session.lock().last_completed
    }

    pub fn state(&self) -> Option<PlaybackState> {
        self.session.lock().active.as_ref().map(|run| PlaybackState {
            epoch: run.epoch,
            speed: run.speed,
            start_offset_ms: run.start_offset_ms,
            game_profile: run.game_profile.clone(),
            position_ms: run.position_ms(),
        })
    }
}

/// Everything a spawned run needs, detached from the scheduler
struct RunTask<A: InputActuator> {
    epoch: u64,
    timeline: Timeline,
    speed: f64,
    start_offset_ms: u64,
    started_at: Instant,
    game_profile: String,
    tail_wait_ms: u64,
    cancel: Arc<Notify>,
    actuator: Arc<A>,
    keymap: Arc<KeyMap>,
    session: Arc<Mutex<Session>>,
}

impl<A: InputActuator> RunTask<A> {
    async fn run(self) -> PlaybackOutcome {
        let _guard = RunGuard {
            session: self.session.clone(),
            epoch: self.epoch,
        };
        let layout = self.keymap.resolve(&self.game_profile);
        let mut last_fired = None;

        for chord in self.timeline.from_offset(self.start_offset_ms) {
            if !self.wait_until(chord.time_ms).await {
                return PlaybackOutcome::Stopped;
            }

            let keys = resolve_chord(layout, chord);
            if let Err(e) = fire_chord(self.actuator.as_ref(), &keys).await {
                log::error!("Playback #{} aborted at {}ms: {}", self.epoch, chord.time_ms, e);
                return PlaybackOutcome::Failed(e);
            }
            last_fired = Some(chord.time_ms);
        }

        // Nothing fired when the offset is past the last chord; finish right away
        if let Some(last) = last_fired {
            if !self.wait_until(last.saturating_add(self.tail_wait_ms)).await {
                return PlaybackOutcome::Stopped;
            }
        }

        self.finish()
    }

    fn is_current(&self) -> bool {
        self.session.lock().is_current(self.epoch)
    }

    /// Sleep until song time `time_ms`. False if the run was stopped or superseded.
    async fn wait_until(&self, time_ms: u64) -> bool {
        if !self.is_current() {
            return false;
        }

        let delay = scale(time_ms.saturating_sub(self.start_offset_ms), self.speed);
        let target = self
            .started_at
            .checked_add(delay)
            .unwrap_or_else(|| self.started_at + FAR_FUTURE);
        if target > Instant::now() {
            tokio::select! {
                _ = tokio::time::sleep_until(target) => {}
                _ = self.cancel.notified() => return false,
            }
        }

        self.is_current()
    }

    fn finish(&self) -> PlaybackOutcome {
        let callback = {
            let mut session = self.session.lock();
            if !session.is_current(self.epoch) {
                return PlaybackOutcome::Stopped;
            }
            session.active = None;
            session.last_completed = Some(self.epoch);
            session.on_song_end.clone()
        };

        log::info!("Playback #{} finished", self.epoch);

        if let Some(callback) = callback {
            if catch_unwind(AssertUnwindSafe(|| callback())).is_err() {
                log::error!("Song end callback panicked (playback #{})", self.epoch);
            }
        }

        PlaybackOutcome::Completed
    }
}

/// Returns the session to idle if the run task ends without doing so itself
struct RunGuard {
    session: Arc<Mutex<Session>>,
    epoch: u64,
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        let mut session = self.session.lock();
        if session.is_current(self.epoch) {
            session.active = None;
        }
    }
}

/// Map a chord's note keys to physical keys, dropping unmapped and duplicate keys
fn resolve_chord(layout: &Layout, chord: &Chord) -> Vec<PhysicalKey> {
    let mut keys = Vec::with_capacity(chord.keys.len());
    for note_key in &chord.keys {
        match layout.get(note_key) {
            Some(key) if !keys.contains(&key) => keys.push(key),
            Some(_) => {}
            None => log::debug!("No mapping for {} at {}ms", note_key, chord.time_ms),
        }
    }
    keys
}

/// Press every key together, then release every key together.
///
/// Releases are sent even if a press failed so no key stays held.
async fn fire_chord<A: InputActuator>(actuator: &A, keys: &[PhysicalKey]) -> Result<(), ActuatorError> {
    let pressed = join_all(keys.iter().map(|key| actuator.press(*key))).await;
    let released = join_all(keys.iter().map(|key| actuator.release(*key))).await;

    pressed.into_iter().chain(released).collect()
}

/// Wall-clock duration of `song_ms` at `speed`
fn scale(song_ms: u64, speed: f64) -> Duration {
    Duration::from_nanos((song_ms as f64 * 1_000_000.0 / speed).round() as u64)
}

/// Zero and non-finite speeds mean normal speed; others are clamped to `min_speed`
pub fn normalize_speed(speed: f64, min_speed: f64) -> f64 {
    if !speed.is_finite() || speed == 0.0 {
        1.0
    } else {
        speed.max(min_speed)
    }
}

/// Non-finite and negative offsets start from the beginning
pub fn normalize_offset(offset_ms: f64) -> u64 {
    if offset_ms.is_finite() && offset_ms > 0.0 {
        offset_ms.floor() as u64
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn speed_normalization() {
        assert_eq!(normalize_speed(2.0, MIN_SPEED), 2.0);
        assert_eq!(normalize_speed(0.01, MIN_SPEED), MIN_SPEED);
        assert_eq!(normalize_speed(-3.0, MIN_SPEED), MIN_SPEED);
        assert_eq!(normalize_speed(0.0, MIN_SPEED), 1.0);
        assert_eq!(normalize_speed(f64::NAN, MIN_SPEED), 1.0);
        assert_eq!(normalize_speed(f64::INFINITY, MIN_SPEED), 1.0);
    }

    #[test]
    fn offset_normalization() {
        assert_eq!(normalize_offset(1500.9), 1500);
        assert_eq!(normalize_offset(-20.0), 0);
        assert_eq!(normalize_offset(f64::NAN), 0);
        assert_eq!(normalize_offset(f64::NEG_INFINITY), 0);
    }

    #[test]
    fn scaling_by_speed() {
        assert_eq!(scale(1000, 2.0), Duration::from_millis(500));
        assert_eq!(scale(1000, 0.5), Duration::from_millis(2000));
        assert_eq!(scale(0, 1.0), Duration::ZERO);
    }

    #[test]
    fn chord_resolution_drops_unmapped_and_duplicates() {
        let layout: Layout = [
            ("A".to_string(), PhysicalKey::Y),
            ("B".to_string(), PhysicalKey::U),
            ("B2".to_string(), PhysicalKey::U),
        ]
        .into_iter()
        .collect();
        let chord = Chord {
            time_ms: 0,
            keys: vec!["A".into(), "missing".into(), "B".into(), "B2".into()],
        };

        assert_eq!(resolve_chord(&layout, &chord), vec![PhysicalKey::Y, PhysicalKey::U]);
    }
}
