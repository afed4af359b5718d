// Sheet file reading - text decoding and JSON shape detection

use super::{Note, Sheet};
use encoding_rs::{UTF_16LE, UTF_8};
use serde_json::{Map, Value};
use std::path::Path;

/// Bytes inspected by the UTF-16 heuristic
const SNIFF_LEN: usize = 2000;

/// Zero bytes at odd offsets needed to treat BOM-less text as UTF-16LE
const UTF16_ZERO_THRESHOLD: usize = 50;

#[derive(Debug, thiserror::Error)]
pub enum SheetError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unrecognized sheet format: {0}")]
    UnrecognizedFormat(String),

    #[error("Sheet is encrypted")]
    Encrypted,

    #[error("Sheet has no playable notes")]
    Empty,
}

/// Decode sheet bytes as UTF-16LE or UTF-8.
///
/// A BOM decides the encoding when present. Without one, text with many zero
/// bytes at odd offsets is treated as UTF-16LE. Invalid sequences are replaced.
pub fn decode_text(bytes: &[u8]) -> String {
    let has_utf16le_bom = bytes.starts_with(&[0xFF, 0xFE]);
    let has_utf8_bom = bytes.starts_with(&[0xEF, 0xBB, 0xBF]);

    let encoding = if has_utf16le_bom {
        UTF_16LE
    } else if has_utf8_bom {
        UTF_8
    } else {
        let zero_count = bytes
            .iter()
            .take(SNIFF_LEN)
            .skip(1)
            .step_by(2)
            .filter(|b| **b == 0)
            .count();
        if zero_count > UTF16_ZERO_THRESHOLD { UTF_16LE } else { UTF_8 }
    };

    let (text, had_errors) = encoding.decode_with_bom_removal(bytes);
    if had_errors {
        log::warn!("Sheet contained invalid {} sequences", encoding.name());
    }

    text.trim_start_matches('\u{FEFF}').trim().to_string()
}

/// Read, decode and parse a sheet file
pub fn load_sheet(path: &Path) -> Result<Sheet, SheetError> {
    let bytes = std::fs::read(path)?;
    let sheet = parse_sheet(&decode_text(&bytes))?;

    log::info!(
        "Loaded sheet {:?} from {} ({} notes)",
        sheet.title(),
        path.display(),
        sheet.notes.len()
    );

    Ok(sheet)
}

/// Parse sheet JSON.
///
/// Accepts an array of sheets (the first is used), a single sheet object with
/// `songNotes`, or a bare array of notes.
pub fn parse_sheet(text: &str) -> Result<Sheet, SheetError> {
    let value: Value = serde_json::from_str(text)?;

    let sheet = match value {
        Value::Array(items) => match items.first() {
            None => return Err(SheetError::Empty),
            Some(Value::Object(first)) if first.contains_key("songNotes") => {
                if items.len() > 1 {
                    log::debug!("Sheet file holds {} songs, using the first", items.len());
                }
                sheet_from_object(first)?
            }
            Some(Value::Object(_)) => Sheet::from_notes(notes_from_array(&items)),
            Some(other) => {
                return Err(SheetError::UnrecognizedFormat(format!(
                    "array of {}",
                    json_type(other)
                )))
            }
        },
        Value::Object(obj) if obj.contains_key("songNotes") => sheet_from_object(&obj)?,
        other => {
            return Err(SheetError::UnrecognizedFormat(format!(
                "top-level {}",
                json_type(&other)
            )))
        }
    };

    if sheet.notes.is_empty() {
        return Err(SheetError::Empty);
    }

    Ok(sheet)
}

fn sheet_from_object(obj: &Map<String, Value>) -> Result<Sheet, SheetError> {
    let text_field = |name: &str| obj.get(name).and_then(Value::as_str).map(str::to_string);

    let notes = match obj.get("songNotes") {
        Some(Value::Array(items)) => notes_from_array(items),
        Some(Value::String(_)) if obj.get("isEncrypted").and_then(Value::as_bool) == Some(true) => {
            return Err(SheetError::Encrypted)
        }
        Some(other) => {
            return Err(SheetError::UnrecognizedFormat(format!(
                "songNotes is {}",
                json_type(other)
            )))
        }
        None => Vec::new(),
    };

    Ok(Sheet {
        name: text_field("name"),
        author: text_field("author"),
        transcribed_by: text_field("transcribedBy"),
        bpm: obj.get("bpm").and_then(coerce_number),
        notes,
    })
}

fn notes_from_array(items: &[Value]) -> Vec<Note> {
    items
        .iter()
        .filter_map(|item| {
            let key = item.get("key").and_then(Value::as_str);
            match key {
                Some(key) => Some(Note::new(coerce_time(item.get("time")), key)),
                None => {
                    log::debug!("Dropping note without a key: {}", item);
                    None
                }
            }
        })
        .collect()
}

/// Numbers and numeric strings, finite only
fn coerce_number(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    n.filter(|n| n.is_finite())
}

/// Note time in whole milliseconds. Anything unusable becomes 0.
pub fn coerce_time(value: Option<&Value>) -> u64 {
    value
        .and_then(coerce_number)
        .filter(|t| *t >= 0.0)
        .map(|t| t.floor() as u64)
        .unwrap_or(0)
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
