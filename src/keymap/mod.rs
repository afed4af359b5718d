// Game profile key mapping
// Translates abstract note keys ("1Key0") into physical keys for a given game

pub mod layouts;
pub mod physical;

pub use layouts::DEFAULT_PROFILE;
pub use physical::{PhysicalKey, UnknownKey};

use std::collections::{BTreeMap, HashMap};
use std::sync::OnceLock;

/// A single profile's note key -> physical key table
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Layout {
    keys: HashMap<String, PhysicalKey>,
}

impl Layout {
    /// Build a layout from an ordered key list (slot `i` is note key `1Key<i>`)
    pub fn from_slots(slots: &[PhysicalKey]) -> Self {
        Self {
            keys: slots
                .iter()
                .enumerate()
                .map(|(i, key)| (layouts::note_key(i), *key))
                .collect(),
        }
    }

    /// Look up a note key. Absent keys have no mapping.
    pub fn get(&self, note_key: &str) -> Option<PhysicalKey> {
        self.keys.get(note_key).copied()
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Mappings sorted by note key, for display
    pub fn entries(&self) -> Vec<(&str, PhysicalKey)> {
        let mut entries: Vec<_> = self.keys.iter().map(|(k, v)| (k.as_str(), *v)).collect();
        entries.sort_by_key(|(k, _)| slot_order(k));
        entries
    }
}

impl FromIterator<(String, PhysicalKey)> for Layout {
    fn from_iter<T: IntoIterator<Item = (String, PhysicalKey)>>(iter: T) -> Self {
        Self { keys: iter.into_iter().collect() }
    }
}

/// Sort "1Key10" after "1Key9"
fn slot_order(note_key: &str) -> (String, u32) {
    let digits_at = note_key
        .rfind(|c: char| !c.is_ascii_digit())
        .map(|i| i + 1)
        .unwrap_or(0);
    let (prefix, index) = note_key.split_at(digits_at);
    (prefix.to_string(), index.parse().unwrap_or(u32::MAX))
}

/// Read-only table of every known game profile.
///
/// Built once at startup from the built-in layouts plus any custom layouts
/// from the config. Profile names are matched case-insensitively; aliases are
/// resolved before lookup and unknown names fall back to [`DEFAULT_PROFILE`].
#[derive(Debug, Clone)]
pub struct KeyMap {
    /// Lowercased profile name -> (display name, layout)
    profiles: HashMap<String, (String, Layout)>,
    /// Lowercased alias -> (display alias, lowercased profile name)
    aliases: BTreeMap<String, (String, String)>,
    default_profile: String,
}

impl KeyMap {
    /// Key map with only the built-in profiles
    pub fn builtin() -> Self {
        let mut map = Self {
            profiles: HashMap::new(),
            aliases: BTreeMap::new(),
            default_profile: DEFAULT_PROFILE.to_lowercase(),
        };

        for (name, slots) in layouts::BUILTIN_PROFILES {
            map.insert_profile(name, Layout::from_slots(slots));
        }
        for (alias, target) in layouts::BUILTIN_ALIASES {
            map.insert_alias(alias, target);
        }

        map
    }

    /// Built-in profiles extended with custom layouts and aliases.
    ///
    /// Custom layouts are `profile -> (note key -> key name)`. A custom layout
    /// with a built-in name replaces it. Key names that do not parse are skipped.
    pub fn with_custom(
        custom_profiles: &HashMap<String, HashMap<String, String>>,
        aliases: &HashMap<String, String>,
    ) -> Self {
        let mut map = Self::builtin();

        for (name, table) in custom_profiles {
            let layout: Layout = table
                .iter()
                .filter_map(|(note_key, key_name)| match key_name.parse::<PhysicalKey>() {
                    Ok(key) => Some((note_key.clone(), key)),
                    Err(e) => {
                        log::warn!("Skipping {} in custom profile {}: {}", note_key, name, e);
                        None
                    }
                })
                .collect();
            log::debug!("Loaded custom profile {} ({} keys)", name, layout.len());
            map.insert_profile(name, layout);
        }

        for (alias, target) in aliases {
            if map.profiles.contains_key(&target.to_lowercase()) {
                map.insert_alias(alias, target);
            } else {
                log::warn!("Ignoring alias {} -> {}: unknown profile", alias, target);
            }
        }

        map
    }

    fn insert_profile(&mut self, name: &str, layout: Layout) {
        self.profiles
            .insert(name.to_lowercase(), (name.to_string(), layout));
    }

    fn insert_alias(&mut self, alias: &str, target: &str) {
        self.aliases
            .insert(alias.to_lowercase(), (alias.to_string(), target.to_lowercase()));
    }

    /// Canonical display name of the profile `name` resolves to
    pub fn canonical_name(&self, name: &str) -> &str {
        &self.lookup(name).0
    }

    /// Resolve a profile name to its layout. Total over all strings.
    pub fn resolve(&self, name: &str) -> &Layout {
        &self.lookup(name).1
    }

    /// Whether `name` is a known profile or alias
    pub fn contains(&self, name: &str) -> bool {
        let lowered = name.trim().to_lowercase();
        self.profiles.contains_key(&lowered) || self.aliases.contains_key(&lowered)
    }

    fn lookup(&self, name: &str) -> &(String, Layout) {
        let lowered = name.trim().to_lowercase();
        let key = self.aliases.get(&lowered).map(|(_, t)| t).unwrap_or(&lowered);

        self.profiles
            .get(key)
            .or_else(|| {
                log::debug!("Unknown game profile {:?}, using {}", name, DEFAULT_PROFILE);
                self.profiles.get(&self.default_profile)
            })
            .unwrap_or_else(|| EMPTY.get_or_init(|| (String::new(), Layout::default())))
    }

    /// Profile display names, built-ins first
    pub fn profile_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.profiles.values().map(|(n, _)| n.as_str()).collect();
        names.sort_by_key(|n| {
            let builtin = layouts::BUILTIN_PROFILES
                .iter()
                .position(|(b, _)| b.eq_ignore_ascii_case(n));
            (builtin.unwrap_or(usize::MAX), n.to_lowercase())
        });
        names
    }

    /// Aliases pointing at `profile`
    pub fn aliases_of(&self, profile: &str) -> Vec<&str> {
        let target = profile.to_lowercase();
        self.aliases
            .values()
            .filter(|(_, t)| *t == target)
            .map(|(alias, _)| alias.as_str())
            .collect()
    }
}

impl Default for KeyMap {
    fn default() -> Self {
        Self::builtin()
    }
}

// Only reached if the default profile is missing, which construction never allows
static EMPTY: OnceLock<(String, Layout)> = OnceLock::new();
