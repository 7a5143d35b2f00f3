use super::Square;
use derive_more::{Display, Error};
use std::str::FromStr;
use test_strategy::Arbitrary;

/// A chess move in pure coordinate notation.
///
/// Pawns that reach the last rank are always promoted to a queen, so a move is
/// fully described by its source and destination squares.
#[derive(Debug, Display, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Arbitrary)]
#[filter(#self.0 != #self.1)]
#[display(fmt = "{}{}", _0, _1)]
pub struct Move(pub Square, pub Square);

impl Move {
    /// The source [`Square`].
    pub fn whence(&self) -> Square {
        self.0
    }

    /// The destination [`Square`].
    pub fn whither(&self) -> Square {
        self.1
    }
}

/// The reason why parsing [`Move`] failed.
#[derive(Debug, Display, Clone, Eq, PartialEq, Error)]
#[display(fmt = "expected a move in pure coordinate notation, such as `e2e4`")]
pub struct ParseMoveError;

impl FromStr for Move {
    type Err = ParseMoveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = match s.len() {
            5 if s.ends_with('q') => &s[..4],
            4 => s,
            _ => return Err(ParseMoveError),
        };

        let whence = s.get(..2).ok_or(ParseMoveError)?;
        let whither = s.get(2..).ok_or(ParseMoveError)?;

        Ok(Move(
            whence.parse().map_err(|_| ParseMoveError)?,
            whither.parse().map_err(|_| ParseMoveError)?,
        ))
    }
}
