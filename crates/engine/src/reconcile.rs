//! Local views of the shared collections.
//!
//! Change notifications from the store arrive asynchronously, may be
//! re-delivered and are unordered across keys. Applying them through
//! [`Records::apply`] is idempotent: the final state for a key only depends on
//! the last event applied for it.

use crate::ids::COUNTER_START;

/// A record addressable by its store key.
pub trait Keyed {
    fn key(&self) -> &str;
}

/// Effect of one reconciliation step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Change {
    Inserted,
    Replaced,
    Removed,
    Unchanged,
}

/// Ordered collection with at most one record per key.
///
/// Records keep the order in which their key was first seen; replacements
/// happen in place.
#[derive(Clone, Debug)]
pub struct Records<T> {
    items: Vec<T>,
}

impl<T> Default for Records<T> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

impl<T: Keyed + PartialEq> Records<T> {
    /// Apply a snapshot (`Some`) or a tombstone (`None`) for `key`.
    pub fn apply(&mut self, key: &str, snapshot: Option<T>) -> Change {
        let index = self.items.iter().position(|item| item.key() == key);
        match (snapshot, index) {
            (None, Some(index)) => {
                self.items.remove(index);
                Change::Removed
            }
            (None, None) => Change::Unchanged,
            (Some(record), Some(index)) => {
                if self.items[index] == record {
                    return Change::Unchanged;
                }
                self.items[index] = record;
                Change::Replaced
            }
            (Some(record), None) => {
                self.items.push(record);
                Change::Inserted
            }
        }
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&T> {
        self.items.iter().find(|item| item.key() == key)
    }

    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[T] {
        &self.items
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.items.iter()
    }
}

/// What to do after a counter notification.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CounterAction {
    /// The shared value was adopted as the next sequence number.
    Adopted(i64),
    /// The counter node is missing: write [`COUNTER_START`] to initialize it.
    Bootstrap,
}

/// Local copy of one shared id counter.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CounterSlot {
    next: i64,
}

impl Default for CounterSlot {
    fn default() -> Self {
        Self {
            next: COUNTER_START,
        }
    }
}

impl CounterSlot {
    /// Next sequence number to mint.
    #[must_use]
    pub fn next(&self) -> i64 {
        self.next
    }

    /// Apply a counter notification. Missing and zero values mean the
    /// counter was never initialized.
    pub fn apply(&mut self, value: Option<i64>) -> CounterAction {
        match value {
            Some(next) if next != 0 => {
                self.next = next;
                CounterAction::Adopted(next)
            }
            _ => CounterAction::Bootstrap,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Debug, PartialEq)]
    struct Row {
        id: String,
        value: u32,
    }

    impl Keyed for Row {
        fn key(&self) -> &str {
            &self.id
        }
    }

    fn row(id: &str, value: u32) -> Row {
        Row {
            id: id.to_string(),
            value,
        }
    }

    #[test]
    fn insert_replace_remove() {
        let mut records = Records::default();
        assert_eq!(records.apply("a", Some(row("a", 1))), Change::Inserted);
        assert_eq!(records.apply("b", Some(row("b", 1))), Change::Inserted);
        assert_eq!(records.apply("a", Some(row("a", 2))), Change::Replaced);
        assert_eq!(records.as_slice()[0], row("a", 2));
        assert_eq!(records.apply("a", None), Change::Removed);
        assert_eq!(records.as_slice(), &[row("b", 1)]);
    }

    #[test]
    fn tombstone_for_unknown_key_is_noop() {
        let mut records: Records<Row> = Records::default();
        assert_eq!(records.apply("ghost", None), Change::Unchanged);
        assert!(records.is_empty());
    }

    #[test]
    fn replaying_events_is_idempotent() {
        let events = vec![
            ("a", Some(row("a", 1))),
            ("b", Some(row("b", 1))),
            ("a", None),
            ("a", Some(row("a", 3))),
            ("b", Some(row("b", 2))),
        ];

        let mut once = Records::default();
        for (key, snapshot) in events.clone() {
            once.apply(key, snapshot);
        }

        let mut twice = Records::default();
        for (key, snapshot) in events.iter().chain(events.iter()).cloned() {
            twice.apply(key, snapshot);
        }

        assert_eq!(once.as_slice(), twice.as_slice());
    }

    #[test]
    fn last_event_per_key_wins() {
        let mut records = Records::default();
        records.apply("a", Some(row("a", 1)));
        records.apply("a", Some(row("a", 5)));
        records.apply("a", None);
        assert!(!records.contains("a"));
        records.apply("a", Some(row("a", 9)));
        assert_eq!(records.get("a"), Some(&row("a", 9)));
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn counter_adopts_or_bootstraps() {
        let mut slot = CounterSlot::default();
        assert_eq!(slot.next(), 1);
        assert_eq!(slot.apply(None), CounterAction::Bootstrap);
        assert_eq!(slot.apply(Some(0)), CounterAction::Bootstrap);
        assert_eq!(slot.apply(Some(7)), CounterAction::Adopted(7));
        assert_eq!(slot.next(), 7);
        assert_eq!(slot.apply(None), CounterAction::Bootstrap);
        assert_eq!(slot.next(), 7);
    }
}
