// Playlist - song order and what plays after a song ends

use rand::Rng;
use serde::{Deserialize, Serialize};

/// What happens when a song reaches its end
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum PlayMode {
    /// Stop after the song
    #[default]
    Once,
    /// Continue with the next song, wrapping to the first
    Sequence,
    /// Continue with a random other song
    Shuffle,
    /// Play the same song again
    RepeatOne,
}

impl PlayMode {
    /// The mode after this one, in player-bar order
    pub fn cycle(self) -> Self {
        match self {
            PlayMode::Once => PlayMode::Sequence,
            PlayMode::Sequence => PlayMode::Shuffle,
            PlayMode::Shuffle => PlayMode::RepeatOne,
            PlayMode::RepeatOne => PlayMode::Once,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PlayMode::Once => "once",
            PlayMode::Sequence => "sequence",
            PlayMode::Shuffle => "shuffle",
            PlayMode::RepeatOne => "repeat-one",
        }
    }
}

/// Position in a list of `len` songs. Indices always stay below `len`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Playlist {
    len: usize,
    current: usize,
    mode: PlayMode,
}

impl Playlist {
    pub fn new(len: usize, mode: PlayMode) -> Self {
        Self { len, current: 0, mode }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn current(&self) -> usize {
        self.current
    }

    pub fn mode(&self) -> PlayMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: PlayMode) {
        self.mode = mode;
    }

    /// Switch to the next mode and return it
    pub fn cycle_mode(&mut self) -> PlayMode {
        self.mode = self.mode.cycle();
        self.mode
    }

    /// Step forward, wrapping past the last song
    pub fn next(&mut self) -> Option<usize> {
        if self.is_empty() {
            return None;
        }
        self.current = (self.current + 1) % self.len;
        Some(self.current)
    }

    /// Step back, wrapping before the first song
    pub fn prev(&mut self) -> Option<usize> {
        if self.is_empty() {
            return None;
        }
        self.current = self.current.checked_sub(1).unwrap_or(self.len - 1);
        Some(self.current)
    }

    /// Song to play after the current one ends; None means stop
    pub fn after_song_end<R: Rng>(&mut self, rng: &mut R) -> Option<usize> {
        if self.is_empty() {
            return None;
        }

        match self.mode {
            PlayMode::Once => None,
            PlayMode::RepeatOne => Some(self.current),
            PlayMode::Sequence => self.next(),
            PlayMode::Shuffle if self.len == 1 => Some(self.current),
            PlayMode::Shuffle => {
                // Pick among the other songs
                let pick = rng.gen_range(0..self.len - 1);
                self.current = if pick >= self.current { pick + 1 } else { pick };
                Some(self.current)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn next_and_prev_wrap() {
        let mut playlist = Playlist::new(3, PlayMode::Once);
        assert_eq!(playlist.prev(), Some(2));
        assert_eq!(playlist.next(), Some(0));
        assert_eq!(playlist.next(), Some(1));
        assert_eq!(playlist.next(), Some(2));
        assert_eq!(playlist.next(), Some(0));
    }

    #[test]
    fn empty_playlist_goes_nowhere() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut playlist = Playlist::new(0, PlayMode::Sequence);
        assert_eq!(playlist.next(), None);
        assert_eq!(playlist.prev(), None);
        assert_eq!(playlist.after_song_end(&mut rng), None);
    }

    #[test]
    fn song_end_follows_mode() {
        let mut rng = StdRng::seed_from_u64(7);

        let mut once = Playlist::new(3, PlayMode::Once);
        assert_eq!(once.after_song_end(&mut rng), None);
        assert_eq!(once.current(), 0);

        let mut repeat = Playlist::new(3, PlayMode::RepeatOne);
        repeat.next();
        assert_eq!(repeat.after_song_end(&mut rng), Some(1));

        let mut sequence = Playlist::new(2, PlayMode::Sequence);
        assert_eq!(sequence.after_song_end(&mut rng), Some(1));
        assert_eq!(sequence.after_song_end(&mut rng), Some(0));
    }

    #[test]
    fn shuffle_never_repeats_the_current_song() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut playlist = Playlist::new(4, PlayMode::Shuffle);
        let mut seen = [false; 4];

        for _ in 0..200 {
            let before = playlist.current();
            let after = playlist.after_song_end(&mut rng).unwrap();
            assert_ne!(after, before);
            assert!(after < 4);
            seen[after] = true;
        }
        assert!(seen.iter().all(|s| *s));

        let mut single = Playlist::new(1, PlayMode::Shuffle);
        assert_eq!(single.after_song_end(&mut rng), Some(0));
    }

    #[test]
    fn modes_cycle_in_player_order() {
        let mut playlist = Playlist::new(1, PlayMode::default());
        assert_eq!(playlist.mode(), PlayMode::Once);
        assert_eq!(playlist.cycle_mode(), PlayMode::Sequence);
        assert_eq!(playlist.cycle_mode(), PlayMode::Shuffle);
        assert_eq!(playlist.cycle_mode(), PlayMode::RepeatOne);
        assert_eq!(playlist.cycle_mode(), PlayMode::Once);
        assert_eq!(PlayMode::RepeatOne.label(), "repeat-one");
    }
}
