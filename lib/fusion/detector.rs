use super::{project, FusionBoard};
use crate::chess::{Move, Outcome, Piece, Role, Square};
use crate::rules::Rules;
use std::collections::BTreeSet;

impl<R: Rules> FusionBoard<R> {
    /// Whether the side to move is in check, by a standard or a fused piece.
    pub fn is_check(&self) -> bool {
        self.board().is_check()
            || (!self.overlay().is_empty() && self.virtualize().is_exposed(self.turn()))
    }

    /// The [`Square`] of the king of the side to move.
    pub fn find_king(&self) -> Option<Square> {
        let king = Piece(self.turn(), Role::King);
        Square::iter().find(|&s| self.board().piece(s) == Some(king))
    }

    /// The first [`Square`] from where the king of the side to move is attacked.
    ///
    /// Attackers on both the primary and the virtual board are considered.
    pub fn find_checker(&self) -> Option<Square> {
        let king = self.find_king()?;
        let fen = self.board().fen();
        let virtualized = project(&fen, self.overlay());

        let attackers: BTreeSet<_> = fen
            .attackers(king, !self.turn())
            .chain(virtualized.attackers(king, !self.turn()))
            .collect();

        attackers.into_iter().next()
    }

    /// The [`Move`]s the side to move can play.
    ///
    /// Both the standard moves and those the fused roles allow are considered.
    pub fn moves(&self) -> Vec<Move> {
        if self.overlay().is_empty() {
            return self.board().moves();
        }

        let mut candidates: BTreeSet<_> = self.board().moves().into_iter().collect();
        if let Some(shadow) = self.shadow() {
            candidates.extend(shadow.moves());
        }

        candidates
            .into_iter()
            .filter(|&m| self.resolve(m).is_ok())
            .collect()
    }

    /// Whether the side to move has no way out, neither by standard nor by fused moves.
    pub fn cannot_block_mate(&self) -> bool {
        self.moves().is_empty()
    }

    /// Whether the side to move is checkmated.
    pub fn is_checkmate(&self) -> bool {
        if self.overlay().is_empty() {
            self.board().is_checkmate()
        } else {
            self.is_check() && self.cannot_block_mate()
        }
    }

    /// Whether the side to move is stalemated.
    pub fn is_stalemate(&self) -> bool {
        if self.overlay().is_empty() {
            self.board().is_stalemate()
        } else {
            !self.is_check() && self.cannot_block_mate()
        }
    }

    /// Whether the game has ended.
    pub fn is_game_over(&self) -> bool {
        self.outcome().is_some()
    }

    /// The [`Outcome`] of the game, if it has ended.
    pub fn outcome(&self) -> Option<Outcome> {
        if self.is_checkmate() {
            Some(Outcome::Checkmate(!self.turn()))
        } else if self.is_stalemate() {
            Some(Outcome::Stalemate)
        } else if self.overlay().is_empty() && self.board().is_material_insufficient() {
            Some(Outcome::DrawByInsufficientMaterial)
        } else if self.board().halfmoves() >= 150 {
            Some(Outcome::DrawBy75MoveRule)
        } else {
            None
        }
    }
}
