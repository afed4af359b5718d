// Console notifications

use crate::playback::PlayMode;

const PREFIX: &str = "[Sheet Player]";

/// Announce a run starting
pub fn notify_playback_started(title: &str, profile: &str, speed: f64, position_ms: u64, duration_ms: u64) {
    println!(
        "{} Playing \"{}\" on {} at {:.2}x ({} / {})",
        PREFIX,
        title,
        profile,
        speed,
        format_duration(position_ms),
        format_duration(duration_ms)
    );
}

pub fn notify_song_finished(title: &str) {
    println!("{} Finished \"{}\"", PREFIX, title);
}

pub fn notify_paused(position_ms: u64) {
    println!("{} Paused at {}", PREFIX, format_duration(position_ms));
}

pub fn notify_seek(position_ms: u64) {
    println!("{} Position {}", PREFIX, format_duration(position_ms));
}

pub fn notify_speed(speed: f64) {
    println!("{} Speed {:.2}x", PREFIX, speed);
}

pub fn notify_mode(mode: PlayMode) {
    println!("{} Play mode: {}", PREFIX, mode.label());
}

/// Send a notification for errors
pub fn notify_error(message: &str) {
    eprintln!("{} Error: {}", PREFIX, message);
}

/// Format milliseconds as m:ss, or h:mm:ss for long songs
pub fn format_duration(ms: u64) -> String {
    let total_secs = ms / 1000;
    let hours = total_secs / 3600;
    let mins = (total_secs % 3600) / 60;
    let secs = total_secs % 60;

    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, mins, secs)
    } else {
        format!("{}:{:02}", mins, secs)
    }
}
