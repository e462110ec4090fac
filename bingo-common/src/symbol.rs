//! Sequence symbols
//!
//! The four letters of BASE, unlocked strictly left to right.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// One letter of the unlock sequence
///
/// Variant order is unlock order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Symbol {
    B,
    A,
    S,
    E,
}

/// The unlock sequence, in order
pub const SEQUENCE: [Symbol; 4] = [Symbol::B, Symbol::A, Symbol::S, Symbol::E];

/// Number of symbols needed to complete the challenge
pub const SEQUENCE_LEN: usize = SEQUENCE.len();

impl Symbol {
    /// Symbol at a zero-based position in the sequence
    pub fn at(position: usize) -> Option<Symbol> {
        SEQUENCE.get(position).copied()
    }

    /// Zero-based position of this symbol in the sequence
    pub fn position(self) -> usize {
        match self {
            Symbol::B => 0,
            Symbol::A => 1,
            Symbol::S => 2,
            Symbol::E => 3,
        }
    }

    pub fn as_char(self) -> char {
        match self {
            Symbol::B => 'B',
            Symbol::A => 'A',
            Symbol::S => 'S',
            Symbol::E => 'E',
        }
    }

    pub fn from_char(c: char) -> Option<Symbol> {
        match c {
            'B' => Some(Symbol::B),
            'A' => Some(Symbol::A),
            'S' => Some(Symbol::S),
            'E' => Some(Symbol::E),
            _ => None,
        }
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// Text that is not one of the sequence letters
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown sequence symbol: {0:?}")]
pub struct UnknownSymbol(pub String);

impl FromStr for Symbol {
    type Err = UnknownSymbol;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Symbol::from_char(c).ok_or_else(|| UnknownSymbol(s.to_string())),
            _ => Err(UnknownSymbol(s.to_string())),
        }
    }
}

/// Concatenate symbols into their letters, e.g. `[B, A]` -> `"BA"`
pub fn concat<'a>(symbols: impl IntoIterator<Item = &'a Symbol>) -> String {
    symbols.into_iter().map(|s| s.as_char()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequence_spells_base() {
        assert_eq!(concat(&SEQUENCE), "BASE");
        assert_eq!(SEQUENCE_LEN, 4);
    }

    #[test]
    fn test_position_matches_sequence() {
        for (i, symbol) in SEQUENCE.iter().enumerate() {
            assert_eq!(symbol.position(), i);
            assert_eq!(Symbol::at(i), Some(*symbol));
        }
        assert_eq!(Symbol::at(4), None);
    }

    #[test]
    fn test_parse() {
        assert_eq!("S".parse::<Symbol>(), Ok(Symbol::S));
        assert!("s".parse::<Symbol>().is_err());
        assert!("BA".parse::<Symbol>().is_err());
        assert!("".parse::<Symbol>().is_err());
    }

    #[test]
    fn test_serde_uses_letter() {
        assert_eq!(serde_json::to_string(&Symbol::E).unwrap(), "\"E\"");
        let parsed: Symbol = serde_json::from_str("\"A\"").unwrap();
        assert_eq!(parsed, Symbol::A);
    }
}
