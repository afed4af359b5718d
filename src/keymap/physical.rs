// Physical keyboard keys targeted by the layouts

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A physical key the actuator can press.
///
/// Only the keys used by in-game instrument layouts are represented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum PhysicalKey {
    A, B, C, D, E, F, G, H, I, J, K, L, M,
    N, O, P, Q, R, S, T, U, V, W, X, Y, Z,
    Num0, Num1, Num2, Num3, Num4, Num5, Num6, Num7, Num8, Num9,
    Semicolon,
    Comma,
    Period,
    Slash,
}

const LETTERS: [PhysicalKey; 26] = [
    PhysicalKey::A, PhysicalKey::B, PhysicalKey::C, PhysicalKey::D, PhysicalKey::E,
    PhysicalKey::F, PhysicalKey::G, PhysicalKey::H, PhysicalKey::I, PhysicalKey::J,
    PhysicalKey::K, PhysicalKey::L, PhysicalKey::M, PhysicalKey::N, PhysicalKey::O,
    PhysicalKey::P, PhysicalKey::Q, PhysicalKey::R, PhysicalKey::S, PhysicalKey::T,
    PhysicalKey::U, PhysicalKey::V, PhysicalKey::W, PhysicalKey::X, PhysicalKey::Y,
    PhysicalKey::Z,
];

const DIGITS: [PhysicalKey; 10] = [
    PhysicalKey::Num0, PhysicalKey::Num1, PhysicalKey::Num2, PhysicalKey::Num3,
    PhysicalKey::Num4, PhysicalKey::Num5, PhysicalKey::Num6, PhysicalKey::Num7,
    PhysicalKey::Num8, PhysicalKey::Num9,
];

impl PhysicalKey {
    /// The character this key produces without modifiers.
    pub fn as_char(self) -> char {
        match self {
            PhysicalKey::Semicolon => ';',
            PhysicalKey::Comma => ',',
            PhysicalKey::Period => '.',
            PhysicalKey::Slash => '/',
            key => {
                if let Some(i) = LETTERS.iter().position(|k| *k == key) {
                    (b'a' + i as u8) as char
                } else {
                    let i = DIGITS.iter().position(|k| *k == key).unwrap_or(0);
                    (b'0' + i as u8) as char
                }
            }
        }
    }

    /// Parse a single unshifted character.
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            'a'..='z' => Some(LETTERS[(c as u8 - b'a') as usize]),
            'A'..='Z' => Some(LETTERS[(c as u8 - b'A') as usize]),
            '0'..='9' => Some(DIGITS[(c as u8 - b'0') as usize]),
            ';' => Some(PhysicalKey::Semicolon),
            ',' => Some(PhysicalKey::Comma),
            '.' => Some(PhysicalKey::Period),
            '/' => Some(PhysicalKey::Slash),
            _ => None,
        }
    }

    /// Windows virtual-key code (US layout).
    pub fn virtual_key_code(self) -> u16 {
        match self {
            PhysicalKey::Semicolon => 0xBA,
            PhysicalKey::Comma => 0xBC,
            PhysicalKey::Period => 0xBE,
            PhysicalKey::Slash => 0xBF,
            // Letters and digits share their ASCII uppercase code
            key => key.as_char().to_ascii_uppercase() as u16,
        }
    }
}

impl fmt::Display for PhysicalKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// Error for key names that do not name a supported physical key
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown physical key: {0:?}")]
pub struct UnknownKey(pub String);

impl FromStr for PhysicalKey {
    type Err = UnknownKey;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let mut chars = trimmed.chars();
        if let (Some(c), None) = (chars.next(), chars.next()) {
            return PhysicalKey::from_char(c).ok_or_else(|| UnknownKey(s.to_string()));
        }

        match trimmed.to_ascii_lowercase().as_str() {
            "semicolon" => Ok(PhysicalKey::Semicolon),
            "comma" => Ok(PhysicalKey::Comma),
            "period" | "dot" => Ok(PhysicalKey::Period),
            "slash" => Ok(PhysicalKey::Slash),
            name => name
                .strip_prefix("num")
                .or_else(|| name.strip_prefix("digit"))
                .and_then(|d| {
                    let mut digits = d.chars();
                    match (digits.next(), digits.next()) {
                        (Some(c @ '0'..='9'), None) => PhysicalKey::from_char(c),
                        _ => None,
                    }
                })
                .ok_or_else(|| UnknownKey(s.to_string())),
        }
    }
}

impl TryFrom<String> for PhysicalKey {
    type Error = UnknownKey;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<PhysicalKey> for String {
    fn from(key: PhysicalKey) -> Self {
        key.to_string()
    }
}
