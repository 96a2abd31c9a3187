#![forbid(unsafe_code)]

//! Identifiers for variables and subscribers.
//!
//! Variable identifiers are substituted into expression text before the
//! formula engine sees it, so they must lex as a single symbol: a run of
//! ASCII letters that is neither `PI` nor `E`.

use std::borrow::Borrow;
use std::fmt;

/// Length of a generated variable identifier.
pub const VARIABLE_ID_LEN: usize = 36;

/// Uppercase letters a generated identifier draws from. `E` is left out so an
/// identifier never reads as Euler's number.
const ID_ALPHABET: &[u8] = b"ABCDFGHIJKLMNOPQRSTUVWXYZ";

/// Opaque key of a stored variable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VariableId(String);

impl VariableId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VariableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for VariableId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for VariableId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Identity of one listener (one live evaluation session).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriberId(pub u64);

impl SubscriberId {
    /// Create a subscriber ID from a raw value.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the raw ID value.
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:016x}", self.0)
    }
}

/// Source of fresh identifiers.
pub trait IdGenerator {
    /// A new variable identifier. Must be ASCII letters only, and never
    /// `PI` or `E`.
    fn variable_id(&mut self) -> VariableId;

    fn subscriber_id(&mut self) -> SubscriberId;
}

/// Random identifiers: 36 letters drawn from `A`-`Z` without `E`, each
/// independently lowercased with probability one half.
///
/// Collisions are not checked.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomIdGenerator;

impl IdGenerator for RandomIdGenerator {
    fn variable_id(&mut self) -> VariableId {
        let id: String = (0..VARIABLE_ID_LEN)
            .map(|_| {
                let upper = char::from(ID_ALPHABET[rand::random_range(0..ID_ALPHABET.len())]);
                if rand::random_bool(0.5) {
                    upper.to_ascii_lowercase()
                } else {
                    upper
                }
            })
            .collect();
        VariableId(id)
    }

    fn subscriber_id(&mut self) -> SubscriberId {
        SubscriberId(rand::random())
    }
}

/// Predictable identifiers (`Va`, `Vb`, … `Vz`, `Vba`, …) for tests and
/// reproducible runs.
#[derive(Debug, Clone, Default)]
pub struct SequentialIdGenerator {
    next_variable: u64,
    next_subscriber: u64,
}

impl SequentialIdGenerator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl IdGenerator for SequentialIdGenerator {
    fn variable_id(&mut self) -> VariableId {
        let mut n = self.next_variable;
        self.next_variable += 1;

        let mut letters = Vec::new();
        loop {
            letters.push(b'a' + (n % 26) as u8);
            n /= 26;
            if n == 0 {
                break;
            }
        }
        letters.push(b'V');
        letters.reverse();
        VariableId(letters.into_iter().map(char::from).collect())
    }

    fn subscriber_id(&mut self) -> SubscriberId {
        self.next_subscriber += 1;
        SubscriberId(self.next_subscriber)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn random_ids_have_the_documented_shape() {
        let mut ids = RandomIdGenerator;
        for _ in 0..64 {
            let id = ids.variable_id();
            assert_eq!(id.as_str().len(), VARIABLE_ID_LEN);
            assert!(id.as_str().chars().all(|c| c.is_ascii_alphabetic()));
            assert!(!id.as_str().contains(['E', 'e']));
        }
    }

    #[test]
    fn random_ids_differ() {
        let mut ids = RandomIdGenerator;
        assert_ne!(ids.variable_id(), ids.variable_id());
    }

    #[test]
    fn sequential_ids_are_letters_only() {
        let mut ids = SequentialIdGenerator::new();
        let first: Vec<String> = (0..28).map(|_| ids.variable_id().to_string()).collect();
        assert_eq!(first[0], "Va");
        assert_eq!(first[25], "Vz");
        assert_eq!(first[26], "Vba");
        assert!(first.iter().all(|id| id.chars().all(|c| c.is_ascii_alphabetic())));
    }

    #[test]
    fn sequential_subscribers_start_at_one() {
        let mut ids = SequentialIdGenerator::new();
        assert_eq!(ids.subscriber_id(), SubscriberId::new(1));
        assert_eq!(ids.subscriber_id().raw(), 2);
    }

    #[test]
    fn subscriber_display_is_fixed_width() {
        assert_eq!(SubscriberId::new(255).to_string(), "#00000000000000ff");
    }
}
