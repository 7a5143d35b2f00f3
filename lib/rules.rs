use crate::chess::{Color, Fen, IllegalMove, IllegalPosition, Move, Piece, Played, Position, Square};

/// Trait for types that implement the standard rules of chess.
///
/// Fusion chess is built on top of an engine that only understands a single
/// piece per square; this is everything it needs from one.
pub trait Rules: Clone + Sized {
    /// The side to move.
    fn turn(&self) -> Color;

    /// The number of halfmoves since the last capture or pawn advance.
    fn halfmoves(&self) -> u32;

    /// The [`Piece`] on a [`Square`], if any.
    fn piece(&self, s: Square) -> Option<Piece>;

    /// The current position in [`Fen`].
    fn fen(&self) -> Fen;

    /// The current position in [`Fen`], keeping the en passant square after
    /// every double pawn push, even if no pawn can take.
    fn fen_with_en_passant(&self) -> Fen;

    /// Loads a position from [`Fen`].
    fn load(fen: Fen) -> Result<Self, IllegalPosition>;

    /// The legal [`Move`]s of the side to move.
    fn moves(&self) -> Vec<Move>;

    /// Plays a [`Move`] if legal, otherwise leaves the position untouched.
    fn play(&mut self, m: Move) -> Result<Played, IllegalMove>;

    /// Whether the side to move is in check.
    fn is_check(&self) -> bool;

    /// Whether the side to move is checkmated.
    fn is_checkmate(&self) -> bool;

    /// Whether the side to move is stalemated.
    fn is_stalemate(&self) -> bool;

    /// Whether neither side has enough material to checkmate.
    fn is_material_insufficient(&self) -> bool;
}

impl Rules for Position {
    fn turn(&self) -> Color {
        Position::turn(self)
    }

    fn halfmoves(&self) -> u32 {
        Position::halfmoves(self)
    }

    fn piece(&self, s: Square) -> Option<Piece> {
        Position::piece(self, s)
    }

    fn fen(&self) -> Fen {
        Position::fen(self)
    }

    fn fen_with_en_passant(&self) -> Fen {
        Position::fen_with_en_passant(self)
    }

    fn load(fen: Fen) -> Result<Self, IllegalPosition> {
        Position::load(fen)
    }

    fn moves(&self) -> Vec<Move> {
        Position::moves(self)
    }

    fn play(&mut self, m: Move) -> Result<Played, IllegalMove> {
        Position::play(self, m)
    }

    fn is_check(&self) -> bool {
        Position::is_check(self)
    }

    fn is_checkmate(&self) -> bool {
        Position::is_checkmate(self)
    }

    fn is_stalemate(&self) -> bool {
        Position::is_stalemate(self)
    }

    fn is_material_insufficient(&self) -> bool {
        Position::is_material_insufficient(self)
    }
}
