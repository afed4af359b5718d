// Built-in instrument layouts
// Note keys follow the sheet export convention: "1Key<index>", counting up from the lowest note

use super::PhysicalKey;
use PhysicalKey::*;

/// Name of the profile used when a requested profile is unknown
pub const DEFAULT_PROFILE: &str = "Sky";

/// Sky: Children of the Light - 15 keys, 3 rows of 5
pub const SKY: &[PhysicalKey] = &[
    Y, U, I, O, P,
    H, J, K, L, Semicolon,
    N, M, Comma, Period, Slash,
];

/// Genshin Impact lyre - 21 keys, 3 rows of 7 (bottom row is the lowest octave)
pub const GENSHIN: &[PhysicalKey] = &[
    Z, X, C, V, B, N, M,
    A, S, D, F, G, H, J,
    Q, W, E, R, T, Y, U,
];

/// Roblox virtual piano - 22 white keys
pub const ROBLOX: &[PhysicalKey] = &[
    Num1, Num2, Num3, Num4, Num5, Num6, Num7, Num8, Num9, Num0,
    Q, W, E, R, T, Y, U, I, O, P,
    A, S,
];

/// Built-in profiles in display order
pub const BUILTIN_PROFILES: &[(&str, &[PhysicalKey])] = &[
    ("Sky", SKY),
    ("Genshin", GENSHIN),
    ("Roblox", ROBLOX),
];

/// Externally visible names that reuse another profile's layout
pub const BUILTIN_ALIASES: &[(&str, &str)] = &[
    ("Sky: Children of the Light", "Sky"),
    ("Genshin Impact", "Genshin"),
    ("Windsong Lyre", "Genshin"),
    ("Virtual Piano", "Roblox"),
];

/// Note key for a layout slot
pub fn note_key(index: usize) -> String {
    format!("1Key{}", index)
}
