// CLI command handlers

use crate::cli::PlayArgs;
use crate::config::Config;
use crate::input::SystemActuator;
use crate::keymap::KeyMap;
use crate::notifications;
use crate::playback::{ChordScheduler, PlaybackOutcome, PlaybackRun, Playlist, Timeline, Transport};
use crate::sheet::{load_sheet, Sheet};
use anyhow::Context;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

// ============================================================================
// Play
// ============================================================================

/// Keyboard control typed on stdin while a song plays
#[derive(Debug, Clone, PartialEq)]
pub enum Control {
    /// `p`: pause or resume
    Toggle,
    /// `s <ms>`: jump to a song position
    Seek(u64),
    /// `x <speed>`: change speed
    Speed(f64),
    /// `r`: stop and go back to the start
    Rewind,
    /// `n`: next song
    Next,
    /// `b`: previous song
    Prev,
    /// `m`: switch play mode
    CycleMode,
    /// `q`: stop and exit
    Quit,
}

impl Control {
    pub fn parse(line: &str) -> Option<Self> {
        let mut parts = line.split_whitespace();
        let command = parts.next()?.to_lowercase();
        let arg = parts.next();

        match (command.as_str(), arg) {
            ("p", None) | ("pause", None) => Some(Control::Toggle),
            ("s", Some(ms)) | ("seek", Some(ms)) => ms.parse().ok().map(Control::Seek),
            ("x", Some(speed)) | ("speed", Some(speed)) => speed.parse().ok().map(Control::Speed),
            ("r", None) | ("rewind", None) => Some(Control::Rewind),
            ("n", None) | ("next", None) => Some(Control::Next),
            ("b", None) | ("prev", None) => Some(Control::Prev),
            ("m", None) | ("mode", None) => Some(Control::CycleMode),
            ("q", None) | ("quit", None) => Some(Control::Quit),
            _ => None,
        }
    }
}

type RunOutcome = (u64, PlaybackOutcome);

/// Reject a start position at or past the end of the song
pub fn check_start_offset(sheet: &Sheet, offset_ms: u64) -> anyhow::Result<u64> {
    let duration = sheet.duration_ms();
    if offset_ms >= duration {
        anyhow::bail!(
            "Start offset {}ms is past the end of \"{}\" ({})",
            offset_ms,
            sheet.title(),
            notifications::format_duration(duration)
        );
    }
    Ok(offset_ms)
}

/// Play the given sheet files until the playlist stops, the user quits, or Ctrl-C
pub async fn play(config: &Config, args: PlayArgs) -> anyhow::Result<()> {
    let sheets = args
        .files
        .iter()
        .map(|path| load_sheet(path).with_context(|| format!("Failed to load sheet {}", path.display())))
        .collect::<anyhow::Result<Vec<Sheet>>>()?;
    let first = sheets.first().context("No sheet files given")?;
    let offset_ms = check_start_offset(first, args.offset_ms)?;

    let keymap = Arc::new(config.key_map());
    let profile = args.profile.unwrap_or_else(|| config.game_profile.clone());
    if !keymap.contains(&profile) {
        log::warn!("Unknown game profile {:?}, using {}", profile, keymap.canonical_name(&profile));
    }

    let actuator = Arc::new(SystemActuator::select(args.dry_run || config.dry_run));
    if actuator.is_dry_run() {
        println!("[Sheet Player] Dry run: key actions are logged, not sent");
    }

    let scheduler = ChordScheduler::with_settings(
        actuator,
        keymap,
        tokio::runtime::Handle::current(),
        config.scheduler_settings(),
    );

    let (song_end_tx, mut song_end_rx) = mpsc::unbounded_channel();
    scheduler.set_on_song_end(move || {
        let _ = song_end_tx.send(());
    });

    let (outcome_tx, mut outcome_rx) = mpsc::unbounded_channel::<RunOutcome>();
    let mode = args.mode.unwrap_or(config.play_mode);
    let mut player = Player {
        transport: Transport::new(scheduler, profile, args.speed.unwrap_or(config.playback_speed)),
        playlist: Playlist::new(sheets.len(), mode),
        sheets,
        rng: StdRng::from_entropy(),
        outcomes: outcome_tx,
    };
    player.load(0);
    player.transport.seek(offset_ms);

    println!(
        "[Sheet Player] Controls: p = pause/resume, s <ms> = seek, x <speed> = speed, r = rewind, \
         n = next, b = previous, m = mode ({}), q = quit",
        mode.label()
    );
    if config.start_delay_ms > 0 {
        tokio::time::sleep(Duration::from_millis(config.start_delay_ms)).await;
    }

    let run = player.transport.play().context("Failed to start playback")?;
    player.started(run);

    let mut stdin = stdin_lines();
    let mut stdin_open = true;
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            _ = &mut ctrl_c => {
                log::info!("Interrupted");
                player.transport.scheduler().stop();
                break;
            }
            line = stdin.recv(), if stdin_open => {
                let Some(line) = line else {
                    stdin_open = false;
                    continue;
                };
                if line.trim().is_empty() {
                    continue;
                }

                match Control::parse(&line) {
                    Some(Control::Quit) => {
                        player.transport.scheduler().stop();
                        break;
                    }
                    Some(control) => player.apply(control),
                    None => notifications::notify_error(&format!("Unknown command {:?}", line.trim())),
                }
            }
            Some(()) = song_end_rx.recv() => {
                notifications::notify_song_finished(&player.title());
                if !player.on_song_end() {
                    break;
                }
            }
            Some((epoch, outcome)) = outcome_rx.recv() => {
                if let PlaybackOutcome::Failed(e) = outcome {
                    notifications::notify_error(&e.to_string());
                    return Err(e).with_context(|| format!("Playback #{} failed", epoch));
                }
            }
        }
    }

    Ok(())
}

/// Transport plus the loaded playlist
struct Player {
    transport: Transport<SystemActuator>,
    sheets: Vec<Sheet>,
    playlist: Playlist,
    rng: StdRng,
    outcomes: mpsc::UnboundedSender<RunOutcome>,
}

impl Player {
    fn title(&self) -> String {
        self.transport
            .sheet()
            .map(|s| s.title().to_string())
            .unwrap_or_default()
    }

    fn load(&mut self, index: usize) {
        if let Some(sheet) = self.sheets.get(index) {
            self.transport.load(sheet.clone());
        }
    }

    /// Load the song at `index` and start it from the top
    fn switch_to(&mut self, index: usize) {
        self.load(index);
        self.play();
    }

    fn play(&mut self) {
        match self.transport.play() {
            Ok(run) => self.started(run),
            Err(e) => notifications::notify_error(&e.to_string()),
        }
    }

    fn started(&mut self, run: PlaybackRun) {
        let position = self.transport.position_ms();
        let profile = self
            .transport
            .scheduler()
            .keymap()
            .canonical_name(self.transport.game_profile())
            .to_string();
        notifications::notify_playback_started(
            &self.title(),
            &profile,
            self.transport.speed(),
            position,
            self.transport.duration_ms(),
        );
        watch(run, &self.outcomes);
    }

    /// Follow the play mode. False when playback should end.
    fn on_song_end(&mut self) -> bool {
        match self.playlist.after_song_end(&mut self.rng) {
            Some(index) => {
                self.switch_to(index);
                true
            }
            None => false,
        }
    }

    fn apply(&mut self, control: Control) {
        match control {
            Control::Toggle if self.transport.is_playing() => {
                notifications::notify_paused(self.transport.pause());
            }
            Control::Toggle => self.play(),
            Control::Seek(position_ms) => {
                let run = self.transport.seek(position_ms);
                notifications::notify_seek(self.transport.position_ms());
                if let Some(run) = run {
                    watch(run, &self.outcomes);
                }
            }
            Control::Speed(speed) => {
                let run = self.transport.set_speed(speed);
                notifications::notify_speed(self.transport.speed());
                if let Some(run) = run {
                    watch(run, &self.outcomes);
                }
            }
            Control::Rewind => {
                self.transport.rewind();
                notifications::notify_seek(0);
            }
            Control::Next => {
                if let Some(index) = self.playlist.next() {
                    self.switch_to(index);
                }
            }
            Control::Prev => {
                if let Some(index) = self.playlist.prev() {
                    self.switch_to(index);
                }
            }
            Control::CycleMode => {
                notifications::notify_mode(self.playlist.cycle_mode());
            }
            Control::Quit => {}
        }
    }
}

/// Lines typed on stdin.
///
/// Read on a plain thread: a pending tokio stdin read would hold up runtime shutdown.
fn stdin_lines() -> mpsc::UnboundedReceiver<String> {
    let (tx, rx) = mpsc::unbounded_channel();
    std::thread::spawn(move || {
        for line in std::io::stdin().lines() {
            match line {
                Ok(line) => {
                    if tx.send(line).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    log::warn!("Failed to read stdin: {}", e);
                    break;
                }
            }
        }
    });
    rx
}

/// Forward a run's outcome to the control loop
fn watch(run: PlaybackRun, outcomes: &mpsc::UnboundedSender<RunOutcome>) {
    let tx = outcomes.clone();
    tokio::spawn(async move {
        let epoch = run.epoch();
        let outcome = run.finished().await;
        let _ = tx.send((epoch, outcome));
    });
}

// ============================================================================
// Inspect
// ============================================================================

/// Summary of a sheet and how well each profile covers its keys
#[derive(Debug, Clone, PartialEq)]
pub struct SheetReport {
    pub title: String,
    pub author: Option<String>,
    pub transcribed_by: Option<String>,
    pub bpm: Option<f64>,
    pub notes: usize,
    pub chords: usize,
    pub duration_ms: u64,
    pub keys: Vec<String>,
    /// Profile name -> note keys the profile has no mapping for
    pub unmapped: Vec<(String, Vec<String>)>,
}

impl SheetReport {
    pub fn new(sheet: &Sheet, keymap: &KeyMap) -> Self {
        let keys: BTreeSet<&str> = sheet.notes.iter().map(|n| n.key.as_str()).collect();

        let unmapped = keymap
            .profile_names()
            .into_iter()
            .map(|profile| {
                let layout = keymap.resolve(profile);
                let missing = keys
                    .iter()
                    .filter(|k| layout.get(k).is_none())
                    .map(|k| k.to_string())
                    .collect();
                (profile.to_string(), missing)
            })
            .collect();

        Self {
            title: sheet.title().to_string(),
            author: sheet.author.clone(),
            transcribed_by: sheet.transcribed_by.clone(),
            bpm: sheet.bpm,
            notes: sheet.notes.len(),
            chords: Timeline::build(&sheet.notes).len(),
            duration_ms: sheet.duration_ms(),
            keys: keys.into_iter().map(String::from).collect(),
            unmapped,
        }
    }
}

pub fn inspect(config: &Config, file: &Path) -> anyhow::Result<()> {
    let sheet = load_sheet(file).with_context(|| format!("Failed to load sheet {}", file.display()))?;
    let report = SheetReport::new(&sheet, &config.key_map());

    println!("Title:    {}", report.title);
    if let Some(author) = &report.author {
        println!("Author:   {}", author);
    }
    if let Some(transcriber) = &report.transcribed_by {
        println!("Transcribed by: {}", transcriber);
    }
    if let Some(bpm) = report.bpm {
        println!("BPM:      {}", bpm);
    }
    println!("Notes:    {} in {} chords", report.notes, report.chords);
    println!("Duration: {}", notifications::format_duration(report.duration_ms));
    println!("Keys:     {}", report.keys.join(" "));
    println!();

    for (profile, missing) in &report.unmapped {
        if missing.is_empty() {
            println!("  {:<10} all keys mapped", profile);
        } else {
            println!("  {:<10} {} unmapped: {}", profile, missing.len(), missing.join(" "));
        }
    }

    Ok(())
}

// ============================================================================
// Profiles / Config
// ============================================================================

pub fn profiles(config: &Config) {
    let keymap = config.key_map();

    for name in keymap.profile_names() {
        let aliases = keymap.aliases_of(name);
        if aliases.is_empty() {
            println!("{}", name);
        } else {
            println!("{} (also: {})", name, aliases.join(", "));
        }

        let layout = keymap
            .resolve(name)
            .entries()
            .into_iter()
            .map(|(note_key, key)| format!("{}={}", note_key, key))
            .collect::<Vec<_>>();
        println!("  {}", layout.join(" "));
    }
}

pub fn show_config(config: &Config, path: &Path, write_default: bool) -> anyhow::Result<()> {
    if write_default {
        config
            .save(path)
            .with_context(|| format!("Failed to write config {}", path.display()))?;
        println!("[Sheet Player] Wrote {}", path.display());
    }

    println!("# {}", path.display());
    print!("{}", toml::to_string_pretty(config)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sheet::Note;

    #[test]
    fn control_parsing() {
        assert_eq!(Control::parse("p"), Some(Control::Toggle));
        assert_eq!(Control::parse("  s 1500 "), Some(Control::Seek(1500)));
        assert_eq!(Control::parse("X 1.5"), Some(Control::Speed(1.5)));
        assert_eq!(Control::parse("r"), Some(Control::Rewind));
        assert_eq!(Control::parse("quit"), Some(Control::Quit));
        assert_eq!(Control::parse("n"), Some(Control::Next));
        assert_eq!(Control::parse("B"), Some(Control::Prev));
        assert_eq!(Control::parse("mode"), Some(Control::CycleMode));
        assert_eq!(Control::parse("n 2"), None);
        assert_eq!(Control::parse("s"), None);
        assert_eq!(Control::parse("s -4"), None);
        assert_eq!(Control::parse("x fast"), None);
        assert_eq!(Control::parse("jump"), None);
    }

    #[test]
    fn start_offset_must_be_inside_the_song() {
        let sheet = Sheet::from_notes(vec![Note::new(0, "1Key0"), Note::new(2000, "1Key1")]);

        assert_eq!(check_start_offset(&sheet, 0).unwrap(), 0);
        assert_eq!(check_start_offset(&sheet, 2999).unwrap(), 2999);
        assert!(check_start_offset(&sheet, 3000).is_err());

        let message = check_start_offset(&sheet, 60_000).unwrap_err().to_string();
        assert!(message.contains("60000ms"), "{}", message);
    }

    #[test]
    fn report_lists_unmapped_keys() {
        let mut sheet = Sheet::from_notes(vec![
            Note::new(0, "1Key0"),
            Note::new(0, "1Key20"),
            Note::new(500, "1Key0"),
        ]);
        sheet.name = Some("Test".into());

        let report = SheetReport::new(&sheet, &KeyMap::builtin());
        assert_eq!(report.title, "Test");
        assert_eq!(report.notes, 3);
        assert_eq!(report.chords, 2);
        assert_eq!(report.duration_ms, 1500);
        assert_eq!(report.keys, vec!["1Key0", "1Key20"]);

        let sky = report.unmapped.iter().find(|(p, _)| p == "Sky").unwrap();
        assert_eq!(sky.1, vec!["1Key20"]);
        let genshin = report.unmapped.iter().find(|(p, _)| p == "Genshin").unwrap();
        assert!(genshin.1.is_empty());
    }
}
