use super::{Fusion, Overlay};
use crate::chess::{Fen, Piece, Role};

/// Materializes every [`Fusion`] as a piece of its [`Role`] and its occupant's color.
///
/// Fusions that cannot be represented on a chess board are skipped: those on
/// empty squares or on a king's square, fused kings, and fused pawns on a back
/// rank. Everything else about the position is left untouched.
pub fn project(fen: &Fen, overlay: &Overlay) -> Fen {
    fen.with(overlay.iter().filter_map(|Fusion(s, r)| {
        let Piece(c, occupant) = fen.piece(s)?;

        if occupant == Role::King || r == Role::King || (r == Role::Pawn && s.is_back_rank()) {
            None
        } else {
            Some((s, Some(Piece(c, r))))
        }
    }))
}
