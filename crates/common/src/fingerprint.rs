// Snapshot change detection.
//
// The fingerprint is the serialized JSON of the last-accepted snapshot,
// compared by plain string equality. It is a change-detection token, not a
// content hash: two snapshots are "the same" exactly when their canonical
// serializations are byte-identical.

use serde::Serialize;

use crate::types::Snapshot;

/// Serialized form of the last-accepted snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Fingerprint a snapshot via its canonical JSON serialization.
    ///
    /// Struct field order is fixed at compile time, so equal snapshots always
    /// produce equal fingerprints. Serialization of these types cannot fail.
    pub fn of(snapshot: &Snapshot) -> Self {
        Self(to_canonical_json(snapshot))
    }

    /// The empty fingerprint matches no serialized snapshot, so the first
    /// accepted poll always registers as a change.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn to_canonical_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Habit, Snapshot};

    fn habit(id: i64, current: u32) -> Habit {
        Habit {
            id,
            text: "Run".into(),
            target: 3,
            current,
            completed: false,
            frequency: Default::default(),
            shared: false,
            shared_info: String::new(),
        }
    }

    #[test]
    fn equal_snapshots_have_equal_fingerprints() {
        let a = Snapshot { habits: vec![habit(1, 2)], tasks: vec![], streak: 1 };
        let b = a.clone();
        assert_eq!(Fingerprint::of(&a), Fingerprint::of(&b));
    }

    #[test]
    fn any_field_change_changes_the_fingerprint() {
        let a = Snapshot { habits: vec![habit(1, 2)], tasks: vec![], streak: 1 };
        let mut b = a.clone();
        b.habits[0].current = 3;
        assert_ne!(Fingerprint::of(&a), Fingerprint::of(&b));

        let mut c = a.clone();
        c.streak = 2;
        assert_ne!(Fingerprint::of(&a), Fingerprint::of(&c));
    }

    #[test]
    fn default_fingerprint_is_empty_and_never_matches() {
        let empty = Fingerprint::default();
        assert!(empty.is_empty());
        assert_ne!(empty, Fingerprint::of(&Snapshot::default()));
    }
}
