// Chord timeline - notes grouped by timestamp

use crate::sheet::Note;
use std::collections::BTreeMap;

/// Note keys sounding together at one timestamp
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chord {
    /// Song time in milliseconds
    pub time_ms: u64,
    /// Note keys in first-seen order, without duplicates
    pub keys: Vec<String>,
}

/// Chords in strictly ascending time order. Immutable once built.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Timeline {
    chords: Vec<Chord>,
}

impl Timeline {
    /// Group notes by time. Keys keep their input order within a chord.
    pub fn build(notes: &[Note]) -> Self {
        let mut buckets: BTreeMap<u64, Vec<String>> = BTreeMap::new();

        for note in notes {
            let keys = buckets.entry(note.time).or_default();
            if !keys.contains(&note.key) {
                keys.push(note.key.clone());
            }
        }

        Self {
            chords: buckets
                .into_iter()
                .map(|(time_ms, keys)| Chord { time_ms, keys })
                .collect(),
        }
    }

    pub fn chords(&self) -> &[Chord] {
        &self.chords
    }

    pub fn len(&self) -> usize {
        self.chords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chords.is_empty()
    }

    pub fn last_time_ms(&self) -> Option<u64> {
        self.chords.last().map(|c| c.time_ms)
    }

    /// Chords at or after `offset_ms`; earlier ones are behind the resume point
    pub fn from_offset(&self, offset_ms: u64) -> &[Chord] {
        let start = self.chords.partition_point(|c| c.time_ms < offset_ms);
        &self.chords[start..]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::{BTreeSet, HashSet};

    #[test]
    fn groups_simultaneous_notes() {
        let notes = vec![
            Note::new(500, "C"),
            Note::new(0, "A"),
            Note::new(0, "B"),
            Note::new(0, "A"),
        ];
        let timeline = Timeline::build(&notes);

        assert_eq!(
            timeline.chords(),
            &[
                Chord { time_ms: 0, keys: vec!["A".into(), "B".into()] },
                Chord { time_ms: 500, keys: vec!["C".into()] },
            ]
        );
        assert_eq!(timeline.last_time_ms(), Some(500));
    }

    #[test]
    fn offset_skips_earlier_chords() {
        let notes = vec![Note::new(0, "A"), Note::new(500, "B"), Note::new(1500, "C")];
        let timeline = Timeline::build(&notes);

        let remaining: Vec<u64> = timeline.from_offset(1000).iter().map(|c| c.time_ms).collect();
        assert_eq!(remaining, vec![1500]);
        assert_eq!(timeline.from_offset(500).len(), 2);
        assert!(timeline.from_offset(2000).is_empty());
    }

    #[test]
    fn empty_input() {
        let timeline = Timeline::build(&[]);
        assert!(timeline.is_empty());
        assert_eq!(timeline.last_time_ms(), None);
    }

    proptest! {
        #[test]
        fn one_chord_per_distinct_time(
            raw in prop::collection::vec((0u64..5000, 0usize..20), 0..200)
        ) {
            let notes: Vec<Note> = raw
                .iter()
                .map(|(t, k)| Note::new(*t, format!("1Key{}", k)))
                .collect();
            let timeline = Timeline::build(&notes);

            let distinct: BTreeSet<u64> = notes.iter().map(|n| n.time).collect();
            let times: Vec<u64> = timeline.chords().iter().map(|c| c.time_ms).collect();
            prop_assert_eq!(times, distinct.into_iter().collect::<Vec<_>>());

            for chord in timeline.chords() {
                let expected: HashSet<&str> = notes
                    .iter()
                    .filter(|n| n.time == chord.time_ms)
                    .map(|n| n.key.as_str())
                    .collect();
                let actual: HashSet<&str> = chord.keys.iter().map(String::as_str).collect();
                prop_assert_eq!(chord.keys.len(), expected.len());
                prop_assert_eq!(actual, expected);
            }
        }
    }
}
