// Sheet data structures

use serde::{Deserialize, Serialize};

/// Trailing silence after the last note, in song milliseconds
pub const TAIL_WAIT_MS: u64 = 1000;

/// One timestamped key event
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Note {
    /// Milliseconds from song start
    pub time: u64,
    /// Abstract note key, e.g. "1Key0"
    pub key: String,
}

impl Note {
    pub fn new(time: u64, key: impl Into<String>) -> Self {
        Self { time, key: key.into() }
    }
}

/// A parsed sheet
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sheet {
    pub name: Option<String>,
    pub author: Option<String>,
    pub transcribed_by: Option<String>,
    pub bpm: Option<f64>,
    #[serde(rename = "songNotes")]
    pub notes: Vec<Note>,
}

impl Sheet {
    pub fn from_notes(notes: Vec<Note>) -> Self {
        Self {
            notes,
            ..Default::default()
        }
    }

    /// Display title, falling back to "Untitled"
    pub fn title(&self) -> &str {
        self.name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or("Untitled")
    }

    /// Time of the latest note
    pub fn last_note_ms(&self) -> Option<u64> {
        self.notes.iter().map(|n| n.time).max()
    }

    /// Song length including the trailing silence; 0 for an empty sheet
    pub fn duration_ms(&self) -> u64 {
        self.last_note_ms()
            .map(|t| t.saturating_add(TAIL_WAIT_MS))
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duration_includes_tail() {
        let sheet = Sheet::from_notes(vec![Note::new(2500, "1Key0"), Note::new(500, "1Key1")]);
        assert_eq!(sheet.last_note_ms(), Some(2500));
        assert_eq!(sheet.duration_ms(), 3500);
        assert_eq!(Sheet::default().duration_ms(), 0);
    }

    #[test]
    fn untitled_fallback() {
        let mut sheet = Sheet::default();
        assert_eq!(sheet.title(), "Untitled");
        sheet.name = Some("  ".to_string());
        assert_eq!(sheet.title(), "Untitled");
        sheet.name = Some("Dreams of Light".to_string());
        assert_eq!(sheet.title(), "Dreams of Light");
    }
}
