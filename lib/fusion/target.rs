use crate::chess::{Color, Role, Square};
use derive_more::Display;
use test_strategy::Arbitrary;

/// The capability granted by a capture.
#[derive(Debug, Display, Copy, Clone, Eq, PartialEq, Hash, Arbitrary)]
pub enum FusionTarget {
    /// The capturer's [`Square`] gains the [`Role`] of the captured piece.
    #[display(fmt = "{}={}", _0, _1)]
    Overlay(Square, Role),

    /// The king of a [`Color`] gains the [`Role`] of the captured piece.
    #[display(fmt = "{} king={}", _0, _1)]
    KingBonus(Color, Role),
}

/// The [`Role`] each king acquired by capturing.
///
/// Kings never carry an overlay on their square, so their fusions are kept
/// apart, at most one per [`Color`].
#[derive(Debug, Default, Copy, Clone, Eq, PartialEq, Hash, Arbitrary)]
pub struct KingFusion([Option<Role>; 2]);

impl KingFusion {
    /// The [`Role`] fused onto the king of a [`Color`], if any.
    pub fn get(&self, c: Color) -> Option<Role> {
        self.0[c.index()]
    }

    /// Fuses a [`Role`] onto the king of a [`Color`], returning the one it replaced.
    pub fn set(&mut self, c: Color, r: Role) -> Option<Role> {
        self.0[c.index()].replace(r)
    }

    pub fn clear(&mut self) {
        self.0 = Default::default();
    }

    pub fn is_empty(&self) -> bool {
        self.0.iter().all(Option::is_none)
    }

    /// An iterator over the kings that have a fusion.
    pub fn iter(&self) -> impl Iterator<Item = (Color, Role)> + '_ {
        [Color::White, Color::Black]
            .into_iter()
            .filter_map(|c| Some((c, self.get(c)?)))
    }
}
