// Transport - play/pause/seek/speed controls over the chord scheduler
// Pausing is a stop that remembers the song position; resuming starts a new run from it

use super::scheduler::{ChordScheduler, PlaybackOptions, PlaybackRun, StartRejected};
use crate::input::InputActuator;
use crate::sheet::Sheet;

/// Slowest speed offered to the user
pub const MIN_TRANSPORT_SPEED: f64 = 0.5;

/// Fastest speed offered to the user
pub const MAX_TRANSPORT_SPEED: f64 = 2.0;

pub struct Transport<A: InputActuator> {
    scheduler: ChordScheduler<A>,
    sheet: Option<Sheet>,
    speed: f64,
    game_profile: String,
    /// Resume position while not playing
    position_ms: u64,
    /// Epoch of the run this transport last started
    run_epoch: Option<u64>,
}

impl<A: InputActuator> Transport<A> {
    pub fn new(scheduler: ChordScheduler<A>, game_profile: impl Into<String>, speed: f64) -> Self {
        Self {
            scheduler,
            sheet: None,
            speed: clamp_speed(speed).unwrap_or(1.0),
            game_profile: game_profile.into(),
            position_ms: 0,
            run_epoch: None,
        }
    }

    pub fn scheduler(&self) -> &ChordScheduler<A> {
        &self.scheduler
    }

    /// Replace the current sheet. Stops playback and rewinds.
    pub fn load(&mut self, sheet: Sheet) {
        self.scheduler.stop();
        log::info!("Loaded {:?} ({} ms)", sheet.title(), sheet.duration_ms());
        self.sheet = Some(sheet);
        self.position_ms = 0;
        self.run_epoch = None;
    }

    pub fn sheet(&self) -> Option<&Sheet> {
        self.sheet.as_ref()
    }

    pub fn duration_ms(&self) -> u64 {
        self.sheet.as_ref().map(Sheet::duration_ms).unwrap_or(0)
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    pub fn game_profile(&self) -> &str {
        &self.game_profile
    }

    /// Takes effect on the next run
    pub fn set_game_profile(&mut self, game_profile: impl Into<String>) {
        self.game_profile = game_profile.into();
    }

    pub fn is_playing(&self) -> bool {
        self.scheduler.is_playing()
    }

    /// Current song position, live while playing
    pub fn position_ms(&mut self) -> u64 {
        self.sync();
        match self.scheduler.position_ms() {
            Some(position) if self.owns_active_run() => position.min(self.duration_ms()),
            _ => self.position_ms,
        }
    }

    /// Start playing from the current position
    pub fn play(&mut self) -> Result<PlaybackRun, StartRejected> {
        self.sync();
        let duration = self.duration_ms();
        let sheet = self.sheet.as_ref().ok_or(StartRejected::EmptySong)?;

        if self.position_ms >= duration {
            self.position_ms = 0;
        }

        let run = self.scheduler.start(
            &sheet.notes,
            PlaybackOptions {
                speed: self.speed,
                start_offset_ms: self.position_ms as f64,
                game_profile: self.game_profile.clone(),
            },
        )?;
        self.run_epoch = Some(run.epoch());
        Ok(run)
    }

    /// Stop and remember where playback was. Returns the resume position.
    pub fn pause(&mut self) -> u64 {
        if self.owns_active_run() {
            if let Some(position) = self.scheduler.position_ms() {
                self.scheduler.stop();
                self.position_ms = position.min(self.duration_ms());
                log::info!("Paused at {}ms", self.position_ms);
            }
        }
        self.position_ms
    }

    /// Pause when playing, play otherwise
    pub fn toggle(&mut self) -> Option<PlaybackRun> {
        if self.is_playing() {
            self.pause();
            None
        } else {
            self.play().ok()
        }
    }

    /// Move to `position_ms` (clamped to the song). Playback continues from there if it was running.
    pub fn seek(&mut self, position_ms: u64) -> Option<PlaybackRun> {
        let was_playing = self.owns_active_run();
        if was_playing {
            self.scheduler.stop();
        }

        self.position_ms = position_ms.min(self.duration_ms());
        log::info!("Seek to {}ms", self.position_ms);

        if was_playing {
            self.play().ok()
        } else {
            None
        }
    }

    /// Change speed (clamped to the user range). A running song restarts at its current position.
    pub fn set_speed(&mut self, speed: f64) -> Option<PlaybackRun> {
        let Some(speed) = clamp_speed(speed) else {
            log::warn!("Ignoring invalid speed {}", speed);
            return None;
        };

        if self.owns_active_run() {
            self.pause();
            self.speed = speed;
            self.play().ok()
        } else {
            self.speed = speed;
            None
        }
    }

    /// Stop and return to the start of the song
    pub fn rewind(&mut self) {
        if self.owns_active_run() {
            self.scheduler.stop();
        }
        self.position_ms = 0;
    }

    fn owns_active_run(&self) -> bool {
        match (self.run_epoch, self.scheduler.state()) {
            (Some(epoch), Some(state)) => state.epoch == epoch,
            _ => false,
        }
    }

    /// A run that reached the end leaves the transport rewound
    fn sync(&mut self) {
        if self.run_epoch.is_some() && self.scheduler.last_completed_epoch() == self.run_epoch {
            self.position_ms = 0;
            self.run_epoch = None;
        }
    }
}

/// Clamp to the user speed range; None for non-finite input
pub fn clamp_speed(speed: f64) -> Option<f64> {
    speed
        .is_finite()
        .then(|| speed.clamp(MIN_TRANSPORT_SPEED, MAX_TRANSPORT_SPEED))
}
