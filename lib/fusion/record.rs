use super::FusionTarget;
use crate::chess::{Move, MoveKind, Piece, San};
use derive_more::Display;

/// How a [`Move`] was found to be legal.
#[derive(Debug, Display, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Path {
    /// Legal under the standard rules of chess.
    #[display(fmt = "standard")]
    Standard,

    /// Legal only thanks to a fused capability.
    #[display(fmt = "fused")]
    Fused,
}

/// A [`Move`] committed to the board.
#[derive(Debug, Display, Clone, Eq, PartialEq, Hash)]
#[display(fmt = "{}", san)]
pub struct MoveRecord {
    /// The move in pure coordinate notation.
    pub m: Move,
    /// The piece that moved, as it stood on the board.
    pub piece: Piece,
    /// The piece captured, if any.
    pub capture: Option<Piece>,
    /// The move in algebraic notation, from the board it was played on.
    pub san: San,
    /// Whether the move was a capture, a promotion, en passant or castling.
    pub kind: MoveKind,
    pub path: Path,
    /// The capability gained by the capture, if any.
    pub fusion: Option<FusionTarget>,
}
