use crate::chess::{ParseRoleError, ParseSquareError, Role, Square};
use derive_more::{Display, Error};
use proptest::{collection::btree_map, prelude::*};
use std::{collections::BTreeMap, str::FromStr};
use test_strategy::Arbitrary;

/// A [`Role`] fused onto a [`Square`], written as `d5=p`.
#[derive(Debug, Display, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Arbitrary)]
#[display(fmt = "{}={}", _0, _1)]
pub struct Fusion(pub Square, pub Role);

impl Fusion {
    /// The [`Square`] carrying the fused [`Role`].
    pub fn square(&self) -> Square {
        self.0
    }

    /// The fused [`Role`].
    pub fn role(&self) -> Role {
        self.1
    }
}

/// The reason why parsing [`Fusion`] failed.
#[derive(Debug, Display, Clone, Eq, PartialEq, Error)]
pub enum ParseFusionError {
    #[display(fmt = "expected a fusion in the form `<square>=<role>`, such as `d5=p`")]
    InvalidSyntax,
    #[display(fmt = "invalid fused square")]
    InvalidSquare(ParseSquareError),
    #[display(fmt = "invalid fused role")]
    InvalidRole(ParseRoleError),
}

impl FromStr for Fusion {
    type Err = ParseFusionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (square, role) = s.trim().split_once('=').ok_or(ParseFusionError::InvalidSyntax)?;

        let square = square
            .trim()
            .to_ascii_lowercase()
            .parse()
            .map_err(ParseFusionError::InvalidSquare)?;

        let role = role.trim().parse().map_err(ParseFusionError::InvalidRole)?;

        Ok(Fusion(square, role))
    }
}

/// The [`Role`]s fused onto [`Square`]s of the board.
///
/// At most one role is kept per square.
#[derive(Debug, Default, Clone, Eq, PartialEq, Hash, Arbitrary)]
pub struct Overlay(
    #[strategy(btree_map(any::<Square>(), any::<Role>(), 0..=8))]
    BTreeMap<Square, Role>,
);

impl Overlay {
    /// Parses every token, failing without partial results if any is invalid.
    pub fn load<I, S>(tokens: I) -> Result<Self, ParseFusionError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        tokens
            .into_iter()
            .map(|t| t.as_ref().parse::<Fusion>())
            .collect()
    }

    /// The entries as [`Fusion`]s, in [`Square`] order.
    pub fn export(&self) -> Vec<Fusion> {
        self.iter().collect()
    }

    /// An iterator over the entries, in [`Square`] order.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = Fusion> + ExactSizeIterator + '_ {
        self.0.iter().map(|(&s, &r)| Fusion(s, r))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// The [`Role`] fused onto a [`Square`], if any.
    pub fn get(&self, s: Square) -> Option<Role> {
        self.0.get(&s).copied()
    }

    /// Fuses a [`Role`] onto a [`Square`], returning the one it replaced.
    pub fn set(&mut self, s: Square, r: Role) -> Option<Role> {
        self.0.insert(s, r)
    }

    /// Removes the entry on a [`Square`], returning it.
    pub fn clear(&mut self, s: Square) -> Option<Role> {
        self.0.remove(&s)
    }

    /// Moves the entry on `whence` to `whither`, replacing whatever was there.
    ///
    /// Nothing happens if `whence` has no entry.
    pub fn relocate(&mut self, whence: Square, whither: Square) {
        if let Some(r) = self.0.remove(&whence) {
            self.0.insert(whither, r);
        }
    }

    /// Keeps only the entries for which the predicate holds.
    pub fn retain<F: FnMut(Square, Role) -> bool>(&mut self, mut f: F) {
        self.0.retain(|&s, &mut r| f(s, r))
    }
}

impl FromIterator<Fusion> for Overlay {
    fn from_iter<I: IntoIterator<Item = Fusion>>(iter: I) -> Self {
        Overlay(iter.into_iter().map(|Fusion(s, r)| (s, r)).collect())
    }
}
