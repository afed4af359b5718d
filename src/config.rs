// Configuration management for Sheet Player

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::keymap::{KeyMap, DEFAULT_PROFILE};
use crate::playback::{PlayMode, SchedulerSettings, MIN_SPEED};
use crate::sheet::TAIL_WAIT_MS;

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    /// Game profile used when none is given on the command line
    #[serde(default = "default_game_profile")]
    pub game_profile: String,

    /// Playback speed multiplier (0.5 - 2.0)
    #[serde(default = "default_speed")]
    pub playback_speed: f64,

    /// Delay before the first key press, giving time to focus the game window
    #[serde(default = "default_start_delay_ms")]
    pub start_delay_ms: u64,

    /// Silence after the last note before the song counts as finished
    #[serde(default = "default_tail_wait_ms")]
    pub tail_wait_ms: u64,

    /// Lowest speed the scheduler accepts
    #[serde(default = "default_min_speed")]
    pub min_speed: f64,

    /// Log key actions instead of sending them
    #[serde(default)]
    pub dry_run: bool,

    /// What to play after a song ends: once, sequence, shuffle or repeat-one
    #[serde(default)]
    pub play_mode: PlayMode,

    /// Custom layouts: profile name -> (note key -> key name)
    #[serde(default)]
    pub custom_profiles: HashMap<String, HashMap<String, String>>,

    /// Extra profile names: alias -> profile name
    #[serde(default)]
    pub profile_aliases: HashMap<String, String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            game_profile: default_game_profile(),
            playback_speed: default_speed(),
            start_delay_ms: default_start_delay_ms(),
            tail_wait_ms: default_tail_wait_ms(),
            min_speed: default_min_speed(),
            dry_run: false,
            play_mode: PlayMode::Once,
            custom_profiles: HashMap::new(),
            profile_aliases: HashMap::new(),
        }
    }
}

impl Config {
    /// Load config from disk or return default
    pub fn load_or_default(config_path: &Path) -> Self {
        if config_path.exists() {
            match std::fs::read_to_string(config_path) {
                Ok(contents) => {
                    match toml::from_str(&contents) {
                        Ok(config) => return config,
                        Err(e) => {
                            log::warn!("Failed to parse config: {}", e);
                        }
                    }
                }
                Err(e) => {
                    log::warn!("Failed to read config file: {}", e);
                }
            }
        }

        Self::default()
    }

    /// Save config to disk
    pub fn save(&self, config_path: &Path) -> anyhow::Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(config_path, contents)?;

        Ok(())
    }

    /// Key map with the built-in and custom profiles
    pub fn key_map(&self) -> KeyMap {
        KeyMap::with_custom(&self.custom_profiles, &self.profile_aliases)
    }

    pub fn scheduler_settings(&self) -> SchedulerSettings {
        SchedulerSettings {
            tail_wait_ms: self.tail_wait_ms,
            min_speed: if self.min_speed.is_finite() && self.min_speed > 0.0 {
                self.min_speed
            } else {
                MIN_SPEED
            },
        }
    }
}

/// Get the default config file path
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .or_else(|| dirs::home_dir().map(|h| h.join(".config")))
        .unwrap_or_else(|| PathBuf::from("."))
        .join("sheet-player")
        .join("config.toml")
}

fn default_game_profile() -> String {
    DEFAULT_PROFILE.to_string()
}

fn default_speed() -> f64 {
    1.0
}

/// Default start delay (for serde)
fn default_start_delay_ms() -> u64 {
    120
}

fn default_tail_wait_ms() -> u64 {
    TAIL_WAIT_MS
}

fn default_min_speed() -> f64 {
    MIN_SPEED
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keymap::PhysicalKey;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_or_default(&dir.path().join("config.toml"));
        assert_eq!(config, Config::default());
        assert_eq!(config.start_delay_ms, 120);
        assert_eq!(config.tail_wait_ms, 1000);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
game_profile = "Genshin"
dry_run = true
play_mode = "repeat-one"

[custom_profiles.Harp]
1Key0 = "q"
1Key1 = "w"

[profile_aliases]
"Concert Harp" = "Harp"
"#,
        )
        .unwrap();

        let config = Config::load_or_default(&path);
        assert_eq!(config.game_profile, "Genshin");
        assert!(config.dry_run);
        assert_eq!(config.playback_speed, 1.0);
        assert_eq!(config.play_mode, PlayMode::RepeatOne);

        let keymap = config.key_map();
        assert_eq!(keymap.resolve("concert harp").get("1Key1"), Some(PhysicalKey::W));
    }

    #[test]
    fn invalid_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "playback_speed = \"fast\"").unwrap();
        assert_eq!(Config::load_or_default(&path), Config::default());
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.playback_speed = 1.5;
        config.play_mode = PlayMode::Shuffle;
        config.save(&path).unwrap();

        assert_eq!(Config::load_or_default(&path), config);
    }

    #[test]
    fn bad_min_speed_uses_builtin_floor() {
        let config = Config {
            min_speed: -1.0,
            ..Default::default()
        };
        assert_eq!(config.scheduler_settings().min_speed, MIN_SPEED);
    }
}
