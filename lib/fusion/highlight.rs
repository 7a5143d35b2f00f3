use super::FusionBoard;
use crate::chess::{Move, Role, Square};
use crate::rules::Rules;

impl<R: Rules> FusionBoard<R> {
    /// The [`Move`]s from a [`Square`] as seen on the virtual board.
    ///
    /// Captures of a piece whose role is one of `in_play` are left out, unless
    /// that role is `hovering`. Every move returned would be accepted by
    /// [`FusionBoard::play`].
    pub fn fused_moves(&self, whence: Square, in_play: &[Role], hovering: Role) -> Vec<Move> {
        let shadow = match self.shadow() {
            Some(shadow) => shadow,
            None => return Vec::new(),
        };

        shadow
            .moves()
            .into_iter()
            .filter(|m| m.whence() == whence)
            .filter(|m| match shadow.piece(m.whither()) {
                Some(p) => !in_play.contains(&p.role()) || p.role() == hovering,
                None => true,
            })
            .filter(|&m| self.resolve(m).is_ok())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use crate::chess::{Fen, Move, Position, Role, Square};
    use crate::fusion::FusionBoard;
    use std::convert::TryFrom;

    fn board(fen: &str, fused: &[&str]) -> FusionBoard {
        let fen: Fen = fen.parse().unwrap();
        let mut fb = FusionBoard::new(Position::try_from(fen).unwrap());
        fb.set_fused(fused).unwrap();
        fb
    }

    #[test]
    fn fused_moves_follow_the_fused_role() {
        let fb = board("4k3/8/8/8/8/8/8/1N2K3 w - - 0 1", &["b1=r"]);
        let moves = fb.fused_moves(Square::B1, &[], Role::Rook);

        assert!(moves.contains(&Move(Square::B1, Square::B8)));
        assert!(moves.contains(&Move(Square::B1, Square::D1)));
        assert!(!moves.contains(&Move(Square::B1, Square::C3)));
    }

    #[test]
    fn fused_moves_only_start_from_the_given_square() {
        let fb = board("4k3/8/8/8/8/8/8/1N2K3 w - - 0 1", &["b1=r"]);
        let moves = fb.fused_moves(Square::B1, &[], Role::Rook);
        assert!(moves.iter().all(|m| m.whence() == Square::B1));
    }

    #[test]
    fn captures_of_roles_in_play_are_left_out_unless_hovering() {
        let fb = board("4k3/8/8/8/8/8/8/1N1rK3 w - - 0 1", &["b1=r"]);
        let capture = Move(Square::B1, Square::D1);

        assert!(fb
            .fused_moves(Square::B1, &[], Role::Knight)
            .contains(&capture));

        assert!(!fb
            .fused_moves(Square::B1, &[Role::Rook], Role::Knight)
            .contains(&capture));

        assert!(fb
            .fused_moves(Square::B1, &[Role::Rook], Role::Rook)
            .contains(&capture));
    }

    #[test]
    fn fused_moves_are_all_playable() {
        let fb = board("4k3/8/8/8/8/8/8/1N2K3 w - - 0 1", &["b1=q"]);

        for m in fb.fused_moves(Square::B1, &[], Role::Queen) {
            assert!(fb.clone().play(m).is_ok());
        }
    }
}
