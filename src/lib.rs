// Sheet Player - plays music sheets as keyboard input for in-game instruments
// Main library entry point

pub mod cli;
pub mod commands;
pub mod config;
pub mod input;
pub mod keymap;
pub mod notifications;
pub mod playback;
pub mod sheet;

use cli::{Cli, Command};

/// Run one CLI command
pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let config_path = cli.config.clone().unwrap_or_else(config::default_config_path);
    let config = config::Config::load_or_default(&config_path);
    log::debug!("Using config {}", config_path.display());

    match cli.command {
        Command::Play(args) => commands::play(&config, args).await,
        Command::Inspect { file } => commands::inspect(&config, &file),
        Command::Profiles => {
            commands::profiles(&config);
            Ok(())
        }
        Command::Config { write_default } => commands::show_config(&config, &config_path, write_default),
    }
}
