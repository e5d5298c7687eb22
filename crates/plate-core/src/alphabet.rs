use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Symbols emitted by the plate recognition model, in label-index order.
///
/// The trailing space is a real symbol (index 41), not padding.
pub const PLATE_ALPHABET: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZÄÖÜ0123456789- ";

/// Ordered character table; a symbol's index is its position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct Alphabet {
    symbols: Vec<char>,
}

impl Alphabet {
    pub fn new(symbols: impl Into<Vec<char>>) -> Self {
        Self {
            symbols: symbols.into(),
        }
    }

    /// The 42-symbol table used by the reference plate model.
    pub fn plates() -> Self {
        PLATE_ALPHABET.chars().collect::<Vec<_>>().into()
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Character for a symbol index, `None` when the index is out of range.
    pub fn get(&self, index: usize) -> Option<char> {
        self.symbols.get(index).copied()
    }

    /// Reverse lookup, first occurrence wins.
    pub fn index_of(&self, ch: char) -> Option<usize> {
        self.symbols.iter().position(|&c| c == ch)
    }

    pub fn symbols(&self) -> &[char] {
        &self.symbols
    }
}

impl Default for Alphabet {
    fn default() -> Self {
        Self::plates()
    }
}

impl From<Vec<char>> for Alphabet {
    fn from(symbols: Vec<char>) -> Self {
        Self { symbols }
    }
}

impl From<&str> for Alphabet {
    fn from(s: &str) -> Self {
        Self {
            symbols: s.chars().collect(),
        }
    }
}

impl From<String> for Alphabet {
    fn from(s: String) -> Self {
        Self::from(s.as_str())
    }
}

impl From<Alphabet> for String {
    fn from(alphabet: Alphabet) -> Self {
        alphabet.symbols.into_iter().collect()
    }
}

impl FromStr for Alphabet {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from(s))
    }
}

impl fmt::Display for Alphabet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for c in &self.symbols {
            write!(f, "{}", c)?;
        }
        Ok(())
    }
}
