use super::{project, Fusion, FusionTarget, KingFusion, MoveRecord, Overlay, ParseFusionError, Path};
use crate::chess::{Color, Fen, Move, Piece, Position, Role};
use crate::rules::Rules;
use derive_more::{Display, Error};
use std::{fmt, mem};
use tracing::{debug, instrument, warn};

/// The reason why a [`Move`] was rejected.
#[derive(Debug, Display, Copy, Clone, Eq, PartialEq, Hash, Error)]
pub enum RejectedMove {
    #[display(fmt = "move `{}` is illegal", _0)]
    Illegal(#[error(not(source))] Move),

    #[display(fmt = "move `{}` leaves the {} king under attack", _0, _1)]
    ExposesKing(Move, Color),
}

/// A [`FusionBoard`] in text form.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct Positions {
    /// The board as seen by the standard rules.
    pub primary: Fen,
    /// The fused roles.
    pub fused: Vec<Fusion>,
    /// The roles fused onto each king.
    pub kings: KingFusion,
    /// The board with every fused role in place of its occupant.
    pub virtualized: Fen,
}

impl fmt::Display for Positions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "position: {}", self.primary)?;

        write!(f, "fused:")?;
        for fusion in &self.fused {
            write!(f, " {}", fusion)?;
        }
        writeln!(f)?;

        write!(f, "kings:")?;
        for (c, r) in self.kings.iter() {
            write!(f, " {}={}", c, r)?;
        }
        writeln!(f)?;

        write!(f, "virtual: {}", self.virtualized)
    }
}

/// Whether the king of a [`Color`] is attacked on a board or on its projection.
fn exposes_king(fen: &Fen, overlay: &Overlay, c: Color) -> bool {
    fen.is_exposed(c) || (!overlay.is_empty() && project(fen, overlay).is_exposed(c))
}

#[derive(Debug, Clone, Eq, PartialEq)]
struct Snapshot<R> {
    board: R,
    overlay: Overlay,
    kings: KingFusion,
}

/// The outcome of resolving a [`Move`], ready to be committed.
#[derive(Debug)]
pub(super) struct Commit<R> {
    board: R,
    overlay: Overlay,
    kings: KingFusion,
    record: MoveRecord,
}

/// A game of fusion chess.
///
/// Moves are first checked against the standard rules of chess and, failing
/// that, against the virtual board, where every fused role stands in place of
/// the piece that carries it.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct FusionBoard<R: Rules = Position> {
    board: R,
    overlay: Overlay,
    kings: KingFusion,
    history: Vec<(MoveRecord, Snapshot<R>)>,
}

impl<R: Rules + Default> Default for FusionBoard<R> {
    fn default() -> Self {
        Self::new(R::default())
    }
}

impl<R: Rules> From<R> for FusionBoard<R> {
    fn from(board: R) -> Self {
        Self::new(board)
    }
}

impl<R: Rules> FusionBoard<R> {
    /// A game starting at a position, without any fusion.
    pub fn new(board: R) -> Self {
        FusionBoard {
            board,
            overlay: Overlay::default(),
            kings: KingFusion::default(),
            history: Vec::new(),
        }
    }

    /// The board as seen by the standard rules.
    pub fn board(&self) -> &R {
        &self.board
    }

    /// The fused roles.
    pub fn overlay(&self) -> &Overlay {
        &self.overlay
    }

    /// The roles fused onto each king.
    pub fn kings(&self) -> KingFusion {
        self.kings
    }

    /// The side to move.
    pub fn turn(&self) -> Color {
        self.board.turn()
    }

    /// The moves played so far, oldest first.
    pub fn history(&self) -> impl DoubleEndedIterator<Item = &MoveRecord> + ExactSizeIterator {
        self.history.iter().map(|(record, _)| record)
    }

    /// The virtual board in [`Fen`].
    pub fn virtualize(&self) -> Fen {
        if self.overlay.is_empty() {
            return self.board.fen();
        }

        // A fused pawn may take en passant where no real pawn could.
        project(&self.board.fen_with_en_passant(), &self.overlay)
    }

    /// The virtual board as a playable position, if it is one.
    pub(super) fn shadow(&self) -> Option<R> {
        if self.overlay.is_empty() {
            return Some(self.board.clone());
        }

        let fen = self.virtualize();
        match R::load(fen.clone()) {
            Ok(shadow) => Some(shadow),
            Err(e) => {
                warn!(%fen, error = %e, "virtual board is not a playable position");
                None
            }
        }
    }

    /// The current state in text form.
    pub fn positions(&self) -> Positions {
        Positions {
            primary: self.board.fen(),
            fused: self.overlay.export(),
            kings: self.kings,
            virtualized: self.virtualize(),
        }
    }

    /// Replaces the fused roles with those described by `tokens`, such as `d5=p`.
    ///
    /// If any token is invalid, nothing changes. Fusions on empty squares or on
    /// a king's square are dropped.
    pub fn set_fused<I, S>(&mut self, tokens: I) -> Result<(), ParseFusionError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut overlay = Overlay::load(tokens)?;

        overlay.retain(|s, r| match self.board.piece(s) {
            Some(Piece(_, Role::King)) | None => {
                warn!(fusion = %Fusion(s, r), "dropping fusion that has no carrier");
                false
            }

            Some(_) => true,
        });

        self.overlay = overlay;
        Ok(())
    }

    /// Starts over from a position, without any fusion.
    pub fn reset(&mut self, board: R) {
        *self = Self::new(board);
    }

    /// Takes back the last move, if any.
    pub fn undo(&mut self) -> Option<MoveRecord> {
        let (record, snapshot) = self.history.pop()?;
        self.board = snapshot.board;
        self.overlay = snapshot.overlay;
        self.kings = snapshot.kings;
        Some(record)
    }

    /// Play a [`Move`] if legal, otherwise leaves the game untouched.
    #[instrument(level = "debug", skip(self), ret, err)]
    pub fn play(&mut self, m: Move) -> Result<MoveRecord, RejectedMove> {
        let Commit {
            board,
            overlay,
            kings,
            record,
        } = self.resolve(m)?;

        let snapshot = Snapshot {
            board: mem::replace(&mut self.board, board),
            overlay: mem::replace(&mut self.overlay, overlay),
            kings: mem::replace(&mut self.kings, kings),
        };

        self.history.push((record.clone(), snapshot));
        Ok(record)
    }

    /// Works out what playing a [`Move`] would lead to, without committing it.
    pub(super) fn resolve(&self, m: Move) -> Result<Commit<R>, RejectedMove> {
        let mover = match self.board.piece(m.whence()) {
            Some(p) if p.color() == self.turn() => p,
            _ => return Err(RejectedMove::Illegal(m)),
        };

        match self.standard(m, mover) {
            Some(commit) if exposes_king(&commit.board.fen(), &commit.overlay, mover.color()) => {
                Err(RejectedMove::ExposesKing(m, mover.color()))
            }

            Some(commit) => Ok(commit),
            None if self.overlay.is_empty() => Err(RejectedMove::Illegal(m)),
            None => {
                debug!(%m, "move is not standard, trying the virtual board");
                self.fused(m, mover)
            }
        }
    }

    fn standard(&self, m: Move, mover: Piece) -> Option<Commit<R>> {
        let mut board = self.board.clone();
        let played = board.play(m).ok()?;

        let mut overlay = self.overlay.clone();
        let mut kings = self.kings;

        let fusion = match played.capture {
            Some(r) if r == mover.role() => {
                overlay.clear(m.whither());
                None
            }

            Some(r) if mover.role() == Role::King => {
                overlay.clear(m.whither());
                kings.set(mover.color(), r);
                Some(FusionTarget::KingBonus(mover.color(), r))
            }

            Some(r) => {
                overlay.clear(m.whither());
                overlay.clear(m.whence());
                overlay.set(m.whither(), r);
                Some(FusionTarget::Overlay(m.whither(), r))
            }

            None => None,
        };

        overlay.relocate(m.whence(), m.whither());
        if let Some((whence, whither)) = played.castle {
            overlay.relocate(whence, whither);
        }

        overlay.retain(|s, _| board.piece(s).is_some());

        let record = MoveRecord {
            m,
            piece: mover,
            capture: played.capture.map(|r| Piece(!mover.color(), r)),
            san: played.san,
            kind: played.kind,
            path: Path::Standard,
            fusion,
        };

        Some(Commit {
            board,
            overlay,
            kings,
            record,
        })
    }

    fn fused(&self, m: Move, mover: Piece) -> Result<Commit<R>, RejectedMove> {
        // Only the role fused onto the mover can make a move the standard rules reject.
        if self.overlay.get(m.whence()).is_none() {
            return Err(RejectedMove::Illegal(m));
        }

        let mut shadow = self.shadow().ok_or(RejectedMove::Illegal(m))?;
        let played = shadow.play(m).map_err(|_| RejectedMove::Illegal(m))?;

        if played.castle.is_some() {
            return Err(RejectedMove::Illegal(m));
        }

        let primary = self.board.fen();
        let after = shadow.fen();

        // Every other fused square goes back to its true occupant.
        let restored: Vec<_> = self
            .overlay
            .iter()
            .map(|f| f.square())
            .filter(|&s| s != m.whence() && s != m.whither() && after.piece(s).is_some())
            .map(|s| (s, self.board.piece(s)))
            .collect();

        let fen = after
            .with(restored)
            .with_castling_rights_of(&primary, &[m.whence(), m.whither()]);

        let mut overlay = self.overlay.clone();
        overlay.clear(m.whither());
        overlay.set(m.whence(), mover.role());
        overlay.relocate(m.whence(), m.whither());
        overlay.retain(|s, _| fen.piece(s).is_some());

        if exposes_king(&fen, &overlay, mover.color()) {
            return Err(RejectedMove::ExposesKing(m, mover.color()));
        }

        let board = match R::load(fen.clone()) {
            Ok(board) => board,
            Err(e) => {
                debug!(%fen, error = %e, "board is not a playable position");
                return Err(RejectedMove::Illegal(m));
            }
        };

        let record = MoveRecord {
            m,
            piece: mover,
            capture: self
                .board
                .piece(m.whither())
                .or_else(|| played.capture.map(|r| Piece(!mover.color(), r))),
            san: played.san,
            kind: played.kind,
            path: Path::Fused,
            fusion: None,
        };

        Ok(Commit {
            board,
            overlay,
            kings: self.kings,
            record,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chess::Square;
    use std::convert::TryFrom;
    use test_strategy::proptest;

    fn board(fen: &str) -> FusionBoard {
        let fen: Fen = fen.parse().unwrap();
        FusionBoard::new(Position::try_from(fen).unwrap())
    }

    #[proptest]
    fn standard_moves_take_the_standard_path(pos: Position) {
        for m in pos.moves() {
            let mut fb = FusionBoard::new(pos.clone());
            assert_eq!(fb.play(m).map(|r| r.path), Ok(Path::Standard));
        }
    }

    #[proptest]
    fn without_fusions_the_board_follows_the_standard_rules(
        #[by_ref] pos: Position,
        #[filter(#pos.moves().contains(&#m))] m: Move,
    ) {
        let mut fb = FusionBoard::new(pos.clone());
        let mut expected = pos.clone();
        expected.play(m)?;

        fb.play(m)?;
        assert_eq!(fb.board(), &expected);
    }

    #[proptest]
    fn rejected_move_leaves_the_game_untouched(
        #[by_ref] pos: Position,
        #[filter(!#pos.moves().contains(&#m))] m: Move,
    ) {
        let mut fb = FusionBoard::new(pos);
        let before = fb.clone();
        assert_eq!(fb.play(m), Err(RejectedMove::Illegal(m)));
        assert_eq!(fb, before);
    }

    #[proptest]
    fn undo_restores_the_previous_state(
        #[by_ref]
        #[filter(!#pos.moves().is_empty())]
        pos: Position,
        #[strategy(0..#pos.moves().len())] i: usize,
    ) {
        let mut fb = FusionBoard::new(pos.clone());
        let before = fb.clone();
        let record = fb.play(pos.moves()[i])?;

        assert_eq!(fb.history().collect::<Vec<_>>(), vec![&record]);
        assert_eq!(fb.undo(), Some(record));
        assert_eq!(fb, before);
        assert_eq!(fb.undo(), None);
    }

    #[proptest]
    fn positions_is_idempotent(pos: Position) {
        let fb = FusionBoard::new(pos);
        assert_eq!(fb.positions(), fb.positions());
    }

    #[test]
    fn set_fused_drops_fusions_without_carrier() {
        let mut fb = FusionBoard::<Position>::default();
        fb.set_fused(["b1=q", "e4=n", "e1=r"]).unwrap();
        assert_eq!(fb.overlay().export(), vec![Fusion(Square::B1, Role::Queen)]);
    }

    #[test]
    fn set_fused_leaves_the_overlay_untouched_on_error() {
        let mut fb = FusionBoard::<Position>::default();
        fb.set_fused(["b1=q"]).unwrap();
        assert!(fb.set_fused(["g1=b", "g1"]).is_err());
        assert_eq!(fb.overlay().export(), vec![Fusion(Square::B1, Role::Queen)]);
    }

    #[test]
    fn reset_discards_every_fusion() {
        let mut fb = board("4k3/8/8/3p4/8/2N5/8/4K3 w - - 0 1");
        fb.play(Move(Square::C3, Square::D5)).unwrap();
        fb.reset(Position::default());

        assert_eq!(fb, FusionBoard::<Position>::default());
    }

    #[test]
    fn castling_carries_the_fused_rook_along() {
        let mut fb = board("4k3/8/8/8/8/8/8/4K2R w K - 0 1");
        fb.set_fused(["h1=b"]).unwrap();

        let record = fb.play(Move(Square::E1, Square::G1)).unwrap();
        assert_eq!(record.path, Path::Standard);
        assert_eq!(fb.overlay().export(), vec![Fusion(Square::F1, Role::Bishop)]);
    }

    #[test]
    fn en_passant_drops_the_fusion_of_the_captured_pawn() {
        let mut fb = board("4k3/8/8/3pP3/8/8/8/4K3 w - d6 0 1");
        fb.set_fused(["d5=n"]).unwrap();

        let record = fb.play(Move(Square::E5, Square::D6)).unwrap();
        assert_eq!(record.capture, Some(Piece(Color::Black, Role::Pawn)));
        assert_eq!(record.fusion, None);
        assert!(fb.overlay().is_empty());
    }

    #[test]
    fn move_exposing_the_king_to_a_fused_piece_is_rejected() {
        let mut fb = board("4k3/8/8/8/8/8/3n4/4K3 w - - 0 1");
        fb.set_fused(["d2=r"]).unwrap();

        assert_eq!(
            fb.play(Move(Square::E1, Square::D1)),
            Err(RejectedMove::ExposesKing(
                Move(Square::E1, Square::D1),
                Color::White
            ))
        );
    }

    #[test]
    fn positions_lists_every_part_of_the_state() {
        let mut fb = FusionBoard::<Position>::default();
        fb.set_fused(["b1=q"]).unwrap();

        assert_eq!(
            fb.positions().to_string(),
            [
                "position: rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
                "fused: b1=q",
                "kings:",
                "virtual: rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RQBQKBNR w KQkq - 0 1",
            ]
            .join("\n")
        );
    }
}
