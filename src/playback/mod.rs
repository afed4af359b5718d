// Playback modules

pub mod playlist;
pub mod scheduler;
pub mod timeline;
pub mod transport;

pub use playlist::{PlayMode, Playlist};
pub use scheduler::{
    ChordScheduler, PlaybackOptions, PlaybackOutcome, PlaybackRun, PlaybackState,
    SchedulerSettings, SongEndCallback, StartRejected, MIN_SPEED,
};
pub use timeline::{Chord, Timeline};
pub use transport::{Transport, MAX_TRANSPORT_SPEED, MIN_TRANSPORT_SPEED};
