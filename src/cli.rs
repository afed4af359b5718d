// Command line interface

use crate::playback::PlayMode;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(
    name = "sheet-player",
    version,
    about = "Play music sheets as keyboard input for in-game instruments"
)]
pub struct Cli {
    /// Config file (default: user config directory)
    #[arg(long, global = true, env = "SHEET_PLAYER_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Play one or more sheet files
    Play(PlayArgs),

    /// Show what a sheet file contains
    Inspect {
        /// Sheet file (JSON, UTF-8 or UTF-16)
        file: PathBuf,
    },

    /// List game profiles and their key layouts
    Profiles,

    /// Show the effective configuration
    Config {
        /// Write the current settings to the config file
        #[arg(long)]
        write_default: bool,
    },
}

#[derive(Debug, clap::Args)]
pub struct PlayArgs {
    /// Sheet files (JSON, UTF-8 or UTF-16), played in the given order
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Speed multiplier (0.5 - 2.0)
    #[arg(long)]
    pub speed: Option<f64>,

    /// Start position in milliseconds, for the first song
    #[arg(long, default_value = "0")]
    pub offset_ms: u64,

    /// Game profile, e.g. Sky, Genshin, Roblox
    #[arg(long)]
    pub profile: Option<String>,

    /// Log key actions instead of sending them
    #[arg(long)]
    pub dry_run: bool,

    /// What to play after a song ends
    #[arg(long, value_enum)]
    pub mode: Option<PlayMode>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_play() {
        let cli = Cli::try_parse_from([
            "sheet-player",
            "play",
            "song.json",
            "other.json",
            "--speed",
            "1.5",
            "--profile",
            "Genshin",
            "--mode",
            "repeat-one",
        ])
        .unwrap();

        let Command::Play(args) = cli.command else {
            panic!("expected play");
        };
        assert_eq!(args.files, vec![PathBuf::from("song.json"), PathBuf::from("other.json")]);
        assert_eq!(args.speed, Some(1.5));
        assert_eq!(args.offset_ms, 0);
        assert_eq!(args.profile.as_deref(), Some("Genshin"));
        assert_eq!(args.mode, Some(PlayMode::RepeatOne));
        assert!(!args.dry_run);
    }

    #[test]
    fn play_needs_a_file_and_a_known_mode() {
        assert!(Cli::try_parse_from(["sheet-player", "play"]).is_err());
        assert!(Cli::try_parse_from(["sheet-player", "play", "a.json", "--mode", "loop"]).is_err());

        let cli = Cli::try_parse_from(["sheet-player", "play", "a.json", "--mode", "shuffle"]).unwrap();
        let Command::Play(args) = cli.command else {
            panic!("expected play");
        };
        assert_eq!(args.mode, Some(PlayMode::Shuffle));
    }

    #[test]
    fn global_config_flag() {
        let cli = Cli::try_parse_from(["sheet-player", "profiles", "--config", "/tmp/c.toml"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/c.toml")));
        assert!(matches!(cli.command, Command::Profiles));
    }
}
