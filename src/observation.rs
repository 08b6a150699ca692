//! One sighting of one emitter
//!
//! Observations carry what the collection path saw (identity, signal
//! strength, an optional note) over to the estimation path. They are never
//! persisted.

use crate::emitter::EmitterType;
use crate::ident::RfIdentification;
use std::cmp::Ordering;
use std::fmt::{self, Write};

/// Weakest signal strength score an observation can hold
pub const MIN_ASU: i32 = 0;

/// Strongest signal strength score an observation can hold
pub const MAX_ASU: i32 = 31;

/// A single observation of a radio emitter.
///
/// Equality and hashing cover identity, ASU and note, which are the parts
/// of the `Display` form; two observations are equal exactly when their
/// text is. Ranking uses ASU and identity only, see
/// [`Observation::rank_cmp`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Observation {
    ident: RfIdentification,
    asu: i32,
    note: String,
}

impl Observation {
    /// New observation at the weakest signal with an empty note
    pub fn new(rf_id: impl Into<String>, rf_type: EmitterType) -> Self {
        Self {
            ident: RfIdentification::new(rf_id, rf_type),
            asu: MIN_ASU,
            note: String::new(),
        }
    }

    pub fn ident(&self) -> &RfIdentification {
        &self.ident
    }

    pub fn asu(&self) -> i32 {
        self.asu
    }

    pub fn note(&self) -> &str {
        &self.note
    }

    /// Store `signal` clamped into `[MIN_ASU, MAX_ASU]`
    pub fn set_asu(&mut self, signal: i32) {
        self.asu = signal.clamp(MIN_ASU, MAX_ASU);
    }

    pub fn set_note(&mut self, note: impl Into<String>) {
        self.note = note.into();
    }

    pub fn with_asu(mut self, signal: i32) -> Self {
        self.set_asu(signal);
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.set_note(note);
        self
    }

    /// Priority order: stronger signal first, then ascending identity.
    ///
    /// Notes are ignored here, so two observations of the same emitter at the
    /// same strength rank `Equal` even when they are not `==`.
    pub fn rank_cmp(&self, other: &Self) -> Ordering {
        other
            .asu
            .cmp(&self.asu)
            .then_with(|| self.ident.cmp(&other.ident))
    }
}

impl Ord for Observation {
    fn cmp(&self, other: &Self) -> Ordering {
        self.rank_cmp(other).then_with(|| self.note.cmp(&other.note))
    }
}

impl PartialOrd for Observation {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// `TYPE:id, asu=N, note='...'` with `'` and `\` in the note
/// backslash-escaped, so the closing quote is always the last character
/// and the text maps back to exactly one observation.
impl fmt::Display for Observation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, asu={}, note='", self.ident, self.asu)?;
        for c in self.note.chars() {
            if c == '\'' || c == '\\' {
                f.write_char('\\')?;
            }
            f.write_char(c)?;
        }
        f.write_char('\'')
    }
}

/// Sort observations into priority order, strongest first
pub fn rank(observations: &mut [Observation]) {
    observations.sort_by(Observation::rank_cmp);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::hash_map::DefaultHasher;
    use std::collections::HashSet;
    use std::hash::{Hash, Hasher};

    fn hash_of(obs: &Observation) -> u64 {
        let mut hasher = DefaultHasher::new();
        obs.hash(&mut hasher);
        hasher.finish()
    }

    #[test]
    fn test_new_defaults() {
        let obs = Observation::new("00:11:22:33:44:55", EmitterType::Wlan);
        assert_eq!(obs.asu(), MIN_ASU);
        assert_eq!(obs.note(), "");
        assert_eq!(obs.ident().rf_type(), EmitterType::Wlan);
    }

    #[test]
    fn test_set_asu_clamps() {
        let mut obs = Observation::new("a", EmitterType::Wlan);
        for v in [i32::MIN, -100, -1, 0, 1, 15, 30, 31, 32, 99, i32::MAX] {
            obs.set_asu(v);
            assert_eq!(obs.asu(), v.clamp(MIN_ASU, MAX_ASU), "signal {}", v);
        }
    }

    #[test]
    fn test_stronger_signal_sorts_first() {
        let a = Observation::new("a", EmitterType::Wlan).with_asu(20);
        let b = Observation::new("b", EmitterType::Wlan).with_asu(5);

        let mut obs = vec![b.clone(), a.clone()];
        rank(&mut obs);
        assert_eq!(obs, vec![a, b]);
    }

    #[test]
    fn test_equal_signal_breaks_tie_on_identity() {
        let a = Observation::new("aa", EmitterType::Wlan).with_asu(10);
        let b = Observation::new("bb", EmitterType::Wlan).with_asu(10);

        let mut obs = vec![b.clone(), a.clone()];
        obs.sort();
        assert_eq!(obs, vec![a.clone(), b.clone()]);

        let mut ranked = vec![b.clone(), a.clone()];
        rank(&mut ranked);
        assert_eq!(ranked, vec![a, b]);
    }

    #[test]
    fn test_tie_break_uses_type_before_id() {
        let bt = Observation::new("zz", EmitterType::Bluetooth).with_asu(7);
        let wlan = Observation::new("aa", EmitterType::Wlan).with_asu(7);
        assert_eq!(bt.rank_cmp(&wlan), Ordering::Less);
    }

    #[test]
    fn test_identical_observations_equal_and_hash_alike() {
        let a = Observation::new("x", EmitterType::Lte).with_asu(12).with_note("roof");
        let b = Observation::new("x", EmitterType::Lte).with_asu(12).with_note("roof");

        assert_eq!(a, b);
        assert_eq!(a.to_string(), b.to_string());
        assert_eq!(hash_of(&a), hash_of(&b));
        assert_eq!(a.cmp(&b), Ordering::Equal);
    }

    #[test]
    fn test_note_splits_equality_but_not_rank() {
        let a = Observation::new("x", EmitterType::Lte).with_asu(12).with_note("one");
        let b = Observation::new("x", EmitterType::Lte).with_asu(12).with_note("two");

        assert_ne!(a, b);
        assert_ne!(a.to_string(), b.to_string());
        assert_eq!(a.rank_cmp(&b), Ordering::Equal);
        // Ord still separates them so it agrees with Eq
        assert_ne!(a.cmp(&b), Ordering::Equal);

        let set: HashSet<Observation> = [a, b].into_iter().collect();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_display() {
        let obs = Observation::new("123", EmitterType::Gsm).with_asu(40).with_note("n");
        assert_eq!(obs.to_string(), "GSM:123, asu=31, note='n'");
    }

    #[test]
    fn test_display_escapes_quotes_in_note() {
        let obs = Observation::new("a", EmitterType::Wlan).with_asu(3).with_note(r"it's C:\tmp");
        assert_eq!(obs.to_string(), r"WLAN:a, asu=3, note='it\'s C:\\tmp'");
    }

    #[test]
    fn test_crafted_id_and_note_do_not_collide() {
        // Unescaped, both would print "WLAN:a, asu=3, note='b', asu=5, note='c'"
        let long_note = Observation::new("a", EmitterType::Wlan)
            .with_asu(3)
            .with_note("b', asu=5, note='c");
        let long_id = Observation::new("a, asu=3, note='b'", EmitterType::Wlan)
            .with_asu(5)
            .with_note("c");

        assert_ne!(long_note, long_id);
        assert_ne!(long_note.to_string(), long_id.to_string());
        assert_eq!(long_id.to_string(), "WLAN:a, asu=3, note='b', asu=5, note='c'");
    }
}
