//! Sequential human readable ids (`KV0001`, `SUP0001`).
//!
//! Each sequence is backed by a shared counter node in the counters
//! collection. Two consoles minting from the same counter value at the same
//! time produce the same id; that collision is neither detected nor resolved.

use crate::{EngineError, ResultEngine};

/// First value of every sequence.
pub const COUNTER_START: i64 = 1;

/// The two independent id sequences.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Counter {
    Member,
    Supplement,
}

impl Counter {
    pub const ALL: [Counter; 2] = [Counter::Member, Counter::Supplement];

    /// Key of the counter node in the counters collection.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Counter::Member => "memberIdCounter",
            Counter::Supplement => "supplementIdCounter",
        }
    }

    #[must_use]
    pub const fn prefix(self) -> &'static str {
        match self {
            Counter::Member => "KV",
            Counter::Supplement => "SUP",
        }
    }

    #[must_use]
    pub fn from_key(key: &str) -> Option<Counter> {
        Self::ALL.into_iter().find(|counter| counter.key() == key)
    }

    /// Format `sequence` as an id, zero-padded to at least four digits.
    #[must_use]
    pub fn format(self, sequence: i64) -> String {
        format!("{}{sequence:04}", self.prefix())
    }

    /// Counter value to store once `sequence` has been minted.
    pub fn after(self, sequence: i64) -> ResultEngine<i64> {
        sequence
            .checked_add(1)
            .ok_or_else(|| EngineError::InvalidRecord(format!("{} exhausted", self.key())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_zero_padded_ids() {
        assert_eq!(Counter::Member.format(1), "KV0001");
        assert_eq!(Counter::Member.format(123), "KV0123");
        assert_eq!(Counter::Supplement.format(2), "SUP0002");
        assert_eq!(Counter::Supplement.format(12345), "SUP12345");
    }

    #[test]
    fn exhausted_counter_is_an_error() {
        assert_eq!(Counter::Member.after(1), Ok(2));
        assert!(matches!(
            Counter::Supplement.after(i64::MAX),
            Err(EngineError::InvalidRecord(_))
        ));
    }

    #[test]
    fn keys_round_trip() {
        for counter in Counter::ALL {
            assert_eq!(Counter::from_key(counter.key()), Some(counter));
        }
        assert_eq!(Counter::from_key("other"), None);
    }
}
