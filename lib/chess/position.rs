use super::{Color, Fen, Move, Piece, Role, San, Square};
use bitflags::bitflags;
use derive_more::{DebugCustom, Display, Error};
use proptest::{prelude::*, sample::Selector};
use shakmaty as sm;
use std::{convert::TryFrom, num::NonZeroU32};
use test_strategy::Arbitrary;

bitflags! {
    /// Characteristics of a [`Move`] in the context of a [`Position`].
    #[derive(Default)]
    pub struct MoveKind: u8 {
        const ANY =         0b00000001;
        const CASTLE =      0b00000010;
        const PROMOTION =   0b00000100;
        const CAPTURE =     0b00001000;
        const EN_PASSANT =  0b00010000;
    }
}

#[doc(hidden)]
impl From<&sm::Move> for MoveKind {
    fn from(m: &sm::Move) -> Self {
        let mut kind = Self::ANY;

        if m.is_castle() {
            kind |= MoveKind::CASTLE
        }

        if m.is_promotion() {
            kind |= MoveKind::PROMOTION
        }

        if m.is_capture() {
            kind |= MoveKind::CAPTURE;
        }

        if m.is_en_passant() {
            kind |= MoveKind::EN_PASSANT;
        }

        kind
    }
}

/// Represents an illegal [`Move`].
#[derive(Debug, Display, Copy, Clone, Eq, PartialEq, Hash, Arbitrary, Error)]
#[display(fmt = "move `{}` is illegal", _0)]
pub struct IllegalMove(#[error(not(source))] pub Move);

/// The effects of a [`Move`] played in a [`Position`].
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct Played {
    /// The move in algebraic notation.
    pub san: San,
    /// What kind of move it was.
    pub kind: MoveKind,
    /// The [`Role`] of the piece captured, if any.
    pub capture: Option<Role>,
    /// Where the rook went from and to, if castling.
    pub castle: Option<(Square, Square)>,
}

/// The current position on the chess board.
///
/// This type guarantees that it only holds valid positions.
#[derive(DebugCustom, Display, Default, Clone, Eq, PartialEq, Hash, Arbitrary)]
#[debug(fmt = "Position(\"{}\")", self)]
#[display(fmt = "{}", "self.fen()")]
pub struct Position(
    #[strategy((0..256, any::<Selector>()).prop_map(|(moves, selector)| {
        let mut chess = sm::Chess::default();
        for _ in 0..moves {
            match selector.try_select(sm::Position::legal_moves(&chess)) {
                Some(m) => sm::Position::play_unchecked(&mut chess, &m),
                _ => break,
            }
        }
        chess
    }).no_shrink())]
    sm::Chess,
);

impl Position {
    /// The side to move.
    pub fn turn(&self) -> Color {
        sm::Position::turn(&self.0).into()
    }

    /// The number of halfmoves since the last capture or pawn advance.
    ///
    /// It resets to 0 whenever a piece is captured or a pawn is moved.
    pub fn halfmoves(&self) -> u32 {
        sm::Position::halfmoves(&self.0)
    }

    /// The current move number since the start of the game.
    ///
    /// It starts at 1, and is incremented after every move by black.
    pub fn fullmoves(&self) -> NonZeroU32 {
        sm::Position::fullmoves(&self.0)
    }

    /// The [`Piece`] on a [`Square`], if any.
    pub fn piece(&self, s: Square) -> Option<Piece> {
        sm::Position::board(&self.0)
            .piece_at(s.into())
            .map(Into::into)
    }

    /// This position in [`Fen`].
    pub fn fen(&self) -> Fen {
        sm::Position::into_setup(self.0.clone(), sm::EnPassantMode::Legal).into()
    }

    /// This position in [`Fen`], keeping the en passant square after every
    /// double pawn push, even if no pawn can take.
    pub fn fen_with_en_passant(&self) -> Fen {
        sm::Position::into_setup(self.0.clone(), sm::EnPassantMode::Always).into()
    }

    /// Loads a [`Fen`], tolerating what a playable board does not depend on.
    ///
    /// Unlike [`TryFrom<Fen>`], this accepts inconsistent castling rights and
    /// en passant squares, more material than the initial position has, and
    /// checks that could not have been delivered by a legal sequence of moves.
    pub fn load(fen: Fen) -> Result<Self, IllegalPosition> {
        let chess = sm::Setup::from(fen)
            .position::<sm::Chess>(sm::CastlingMode::Standard)
            .or_else(sm::PositionError::ignore_invalid_castling_rights)
            .or_else(sm::PositionError::ignore_invalid_ep_square)
            .or_else(sm::PositionError::ignore_impossible_material)
            .or_else(sm::PositionError::ignore_impossible_check)?;

        Ok(Position(chess))
    }

    /// Whether this position is a [check].
    ///
    /// [check]: https://www.chessprogramming.org/Check
    pub fn is_check(&self) -> bool {
        sm::Position::is_check(&self.0)
    }

    /// Whether this position is a [checkmate].
    ///
    /// [checkmate]: https://www.chessprogramming.org/Checkmate
    pub fn is_checkmate(&self) -> bool {
        sm::Position::is_checkmate(&self.0)
    }

    /// Whether this position is a [stalemate].
    ///
    /// [stalemate]: https://www.chessprogramming.org/Stalemate
    pub fn is_stalemate(&self) -> bool {
        sm::Position::is_stalemate(&self.0)
    }

    /// Whether this position has [insufficient material].
    ///
    /// [insufficient material]: https://www.chessprogramming.org/Material#InsufficientMaterial
    pub fn is_material_insufficient(&self) -> bool {
        sm::Position::is_insufficient_material(&self.0)
    }

    /// The legal [`Move`]s in this position.
    ///
    /// Promotions other than to a queen are left out.
    pub fn moves(&self) -> Vec<Move> {
        sm::Position::legal_moves(&self.0)
            .into_iter()
            .filter(|vm| matches!(vm.promotion(), None | Some(sm::Role::Queen)))
            .filter_map(|vm| match sm::uci::Uci::from_standard(&vm) {
                sm::uci::Uci::Normal { from, to, .. } => Some(Move(from.into(), to.into())),
                _ => None,
            })
            .collect()
    }

    /// Play a [`Move`] if legal in this position.
    ///
    /// Pawns that reach the last rank are promoted to a queen.
    pub fn play(&mut self, m: Move) -> Result<Played, IllegalMove> {
        let promotion = match self.piece(m.whence()) {
            Some(Piece(_, Role::Pawn)) if m.whither().is_back_rank() => Some(sm::Role::Queen),
            _ => None,
        };

        let uci = sm::uci::Uci::Normal {
            from: m.whence().into(),
            to: m.whither().into(),
            promotion,
        };

        match uci.to_move(&self.0) {
            Ok(vm)
                if sm::Position::is_legal(&self.0, &vm)
                    && sm::uci::Uci::from_standard(&vm) == uci =>
            {
                let played = Played {
                    san: sm::san::San::from_move(&self.0, &vm).into(),
                    kind: (&vm).into(),
                    capture: vm.capture().map(Into::into),
                    castle: match vm {
                        sm::Move::Castle { king, rook } => {
                            let file = if rook > king { sm::File::F } else { sm::File::D };
                            let whither = sm::Square::from_coords(file, rook.rank());
                            Some((rook.into(), whither.into()))
                        }

                        _ => None,
                    },
                };

                sm::Position::play_unchecked(&mut self.0, &vm);
                Ok(played)
            }

            _ => Err(IllegalMove(m)),
        }
    }
}

/// The reason why the position represented by the FEN string is illegal.
#[derive(Debug, Display, Clone, Eq, PartialEq, Error)]
pub enum IllegalPosition {
    #[display(fmt = "at least one side has no king")]
    MissingKing,
    #[display(fmt = "at least one side has multiple kings")]
    TooManyKings,
    #[display(fmt = "there are pawns on the back-rank")]
    PawnsOnBackRank,
    #[display(fmt = "the player in check is not to move")]
    OppositeCheck,
    #[display(fmt = "invalid en passant square; wrong rank, occupied, or missing pushed pawn")]
    InvalidEnPassantSquare,
    #[display(fmt = "invalid castling rights")]
    InvalidCastlingRights,
    #[display(fmt = "no sequence of legal moves can reach this position")]
    Other,
}

#[doc(hidden)]
impl From<sm::PositionError<sm::Chess>> for IllegalPosition {
    fn from(e: sm::PositionError<sm::Chess>) -> Self {
        let kinds = e.kinds();

        if kinds.contains(sm::PositionErrorKinds::MISSING_KING) {
            IllegalPosition::MissingKing
        } else if kinds.contains(sm::PositionErrorKinds::TOO_MANY_KINGS) {
            IllegalPosition::TooManyKings
        } else if kinds.contains(sm::PositionErrorKinds::PAWNS_ON_BACKRANK) {
            IllegalPosition::PawnsOnBackRank
        } else if kinds.contains(sm::PositionErrorKinds::OPPOSITE_CHECK) {
            IllegalPosition::OppositeCheck
        } else if kinds.contains(sm::PositionErrorKinds::INVALID_EP_SQUARE) {
            IllegalPosition::InvalidEnPassantSquare
        } else if kinds.contains(sm::PositionErrorKinds::INVALID_CASTLING_RIGHTS) {
            IllegalPosition::InvalidCastlingRights
        } else {
            IllegalPosition::Other
        }
    }
}

impl TryFrom<Fen> for Position {
    type Error = IllegalPosition;

    fn try_from(fen: Fen) -> Result<Self, Self::Error> {
        Ok(Position(
            sm::Setup::from(fen).position(sm::CastlingMode::Standard)?,
        ))
    }
}

#[doc(hidden)]
impl From<sm::Chess> for Position {
    fn from(chess: sm::Chess) -> Self {
        Position(chess)
    }
}

#[doc(hidden)]
impl AsRef<sm::Chess> for Position {
    fn as_ref(&self) -> &sm::Chess {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use test_strategy::proptest;

    #[proptest]
    fn turn_returns_the_current_side_to_play(pos: Position) {
        assert_eq!(pos.turn(), Color::from(sm::Position::turn(&pos.0)));
    }

    #[proptest]
    fn position_can_be_reloaded_from_its_fen(pos: Position) {
        assert_eq!(Position::load(pos.fen())?.fen(), pos.fen());
    }

    #[proptest]
    fn checkmate_implies_check(pos: Position) {
        assert!(!pos.is_checkmate() || pos.is_check());
    }

    #[proptest]
    fn checkmate_and_stalemate_are_mutually_exclusive(pos: Position) {
        assert!(!(pos.is_checkmate() && pos.is_stalemate()));
    }

    #[proptest]
    fn moves_are_unique(pos: Position) {
        let moves = pos.moves();
        assert_eq!(moves.iter().collect::<HashSet<_>>().len(), moves.len());
    }

    #[proptest]
    fn moves_can_all_be_played(pos: Position) {
        for m in pos.moves() {
            let mut next = pos.clone();
            assert_eq!(next.piece(m.whence()).map(|p| p.color()), Some(pos.turn()));
            assert_eq!(next.play(m).err(), None);
            assert_eq!(next.turn(), !pos.turn());
        }
    }

    #[proptest]
    fn stalemate_and_checkmate_imply_no_moves(pos: Position) {
        if pos.is_checkmate() || pos.is_stalemate() {
            assert_eq!(pos.moves(), vec![]);
        }
    }

    #[proptest]
    fn illegal_move_fails_without_changing_position(
        #[by_ref] mut pos: Position,
        #[filter(!#pos.moves().contains(&#m))] m: Move,
    ) {
        let before = pos.clone();
        assert_eq!(pos.play(m), Err(IllegalMove(m)));
        assert_eq!(pos, before);
    }

    #[test]
    fn pawns_are_promoted_to_queens() {
        let fen: Fen = "4k3/P7/8/8/8/8/8/4K3 w - - 0 1".parse().unwrap();
        let mut pos = Position::try_from(fen).unwrap();
        let played = pos.play(Move(Square::A7, Square::A8)).unwrap();

        assert!(played.kind.contains(MoveKind::PROMOTION));
        assert_eq!(played.san.to_string(), "a8=Q");
        assert_eq!(pos.piece(Square::A8), Some(Piece(Color::White, Role::Queen)));
    }

    #[test]
    fn castling_reports_where_the_rook_went() {
        let fen: Fen = "r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1".parse().unwrap();

        let mut pos = Position::try_from(fen.clone()).unwrap();
        let played = pos.play(Move(Square::E1, Square::G1)).unwrap();
        assert_eq!(played.castle, Some((Square::H1, Square::F1)));
        assert_eq!(pos.piece(Square::F1), Some(Piece(Color::White, Role::Rook)));

        let mut pos = Position::try_from(fen).unwrap();
        let played = pos.play(Move(Square::E1, Square::C1)).unwrap();
        assert_eq!(played.castle, Some((Square::A1, Square::D1)));
        assert_eq!(played.san.to_string(), "O-O-O");
    }

    #[test]
    fn captures_report_the_captured_role() {
        let fen: Fen = "4k3/8/8/3p4/8/2N5/8/4K3 w - - 0 1".parse().unwrap();
        let mut pos = Position::try_from(fen).unwrap();
        let played = pos.play(Move(Square::C3, Square::D5)).unwrap();
        assert!(played.kind.contains(MoveKind::CAPTURE));
        assert_eq!(played.capture, Some(Role::Pawn));
    }

    #[test]
    fn en_passant_square_is_kept_only_on_request() {
        let mut pos = Position::default();
        pos.play(Move(Square::E2, Square::E4)).unwrap();

        assert_eq!(
            pos.fen().to_string(),
            "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1"
        );

        assert_eq!(
            pos.fen_with_en_passant().to_string(),
            "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1"
        );
    }

    #[test]
    fn load_tolerates_too_much_material() {
        let fen: Fen = "4k3/8/8/8/8/8/PPPPPPPP/QQQQKQQQ w - - 0 1".parse().unwrap();
        assert!(Position::try_from(fen.clone()).is_err());
        assert!(Position::load(fen).is_ok());
    }

    #[test]
    fn load_rejects_missing_kings() {
        let fen: Fen = "8/8/8/8/8/8/8/4K3 w - - 0 1".parse().unwrap();
        assert_eq!(Position::load(fen).err(), Some(IllegalPosition::MissingKing));
    }
}
