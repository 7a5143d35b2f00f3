use super::{Color, Piece, Square};
use derive_more::{DebugCustom, Display, Error};
use shakmaty as sm;
use std::{collections::HashMap, str::FromStr};

/// A representation of the [Forsyth–Edwards Notation].
///
/// Unlike [`Position`][`super::Position`], a [`Fen`] may describe a board that
/// is not a legal chess position, which makes it suitable for editing.
///
/// [Forsyth–Edwards Notation]: https://www.chessprogramming.org/Forsyth-Edwards_Notation
#[derive(DebugCustom, Display, Clone, Eq, PartialEq, Hash)]
#[debug(fmt = "Fen(\"{}\")", self)]
#[display(fmt = "{}", _0)]
pub struct Fen(sm::fen::Fen);

impl Fen {
    fn setup(&self) -> &sm::Setup {
        &self.0 .0
    }

    /// The side to move.
    pub fn turn(&self) -> Color {
        self.setup().turn.into()
    }

    /// The [`Piece`] on a [`Square`], if any.
    pub fn piece(&self, s: Square) -> Option<Piece> {
        self.setup().board.piece_at(s.into()).map(Into::into)
    }

    /// The [`Square`] of the king of a [`Color`], if any.
    pub fn king(&self, c: Color) -> Option<Square> {
        self.setup().board.king_of(c.into()).map(Square::from)
    }

    /// From where pieces of a [`Color`] attack a [`Square`].
    pub fn attackers(&self, s: Square, c: Color) -> impl Iterator<Item = Square> {
        let board = &self.setup().board;
        board
            .attacks_to(s.into(), c.into(), board.occupied())
            .into_iter()
            .map(Square::from)
    }

    /// Whether the king of a [`Color`] is attacked by the opponent.
    pub fn is_exposed(&self, c: Color) -> bool {
        self.king(c)
            .map_or(false, |k| self.attackers(k, !c).next().is_some())
    }

    /// A copy of this board with some [`Square`]s overwritten.
    ///
    /// Everything but the piece placement is left untouched.
    pub fn with<I>(&self, changes: I) -> Self
    where
        I: IntoIterator<Item = (Square, Option<Piece>)>,
    {
        let changes: HashMap<_, _> = changes.into_iter().collect();

        let board = Square::iter()
            .filter_map(|s| {
                let p = changes.get(&s).copied().unwrap_or_else(|| self.piece(s))?;
                Some((sm::Square::from(s), sm::Piece::from(p)))
            })
            .collect();

        let mut fen = self.clone();
        fen.0 .0.board = board;
        fen
    }

    /// Replaces the castling rights with those of another board, except for
    /// rights tied to the given [`Square`]s.
    pub fn with_castling_rights_of(mut self, other: &Fen, except: &[Square]) -> Self {
        let mut rights = other.setup().castling_rights;
        for &s in except {
            rights = rights & !sm::Bitboard::from_square(s.into());
        }

        self.0 .0.castling_rights = rights;
        self
    }
}

/// The reason why the string is not valid FEN.
#[derive(Debug, Display, Clone, Eq, PartialEq, Error)]
pub enum ParseFenError {
    #[display(fmt = "syntax error at the piece placement field")]
    InvalidPlacement,
    #[display(fmt = "syntax error at the side to move field")]
    InvalidTurn,
    #[display(fmt = "syntax error at the castling rights field")]
    InvalidCastlingRights,
    #[display(fmt = "syntax error at the en passant square field")]
    InvalidEnPassantSquare,
    #[display(fmt = "syntax error at the halfmove clock field")]
    InvalidHalfmoveClock,
    #[display(fmt = "syntax error at the fullmove counter field")]
    InvalidFullmoves,
    #[display(fmt = "unspecified syntax error")]
    InvalidSyntax,
}

#[doc(hidden)]
impl From<sm::fen::ParseFenError> for ParseFenError {
    fn from(e: sm::fen::ParseFenError) -> Self {
        use ParseFenError::*;
        match e {
            sm::fen::ParseFenError::InvalidBoard => InvalidPlacement,
            sm::fen::ParseFenError::InvalidTurn => InvalidTurn,
            sm::fen::ParseFenError::InvalidCastling => InvalidCastlingRights,
            sm::fen::ParseFenError::InvalidEpSquare => InvalidEnPassantSquare,
            sm::fen::ParseFenError::InvalidHalfmoveClock => InvalidHalfmoveClock,
            sm::fen::ParseFenError::InvalidFullmoves => InvalidFullmoves,
            _ => InvalidSyntax,
        }
    }
}

impl FromStr for Fen {
    type Err = ParseFenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Fen(s.parse()?))
    }
}

#[doc(hidden)]
impl From<sm::Setup> for Fen {
    fn from(setup: sm::Setup) -> Self {
        Fen(sm::fen::Fen(setup))
    }
}

#[doc(hidden)]
impl From<Fen> for sm::Setup {
    fn from(fen: Fen) -> Self {
        fen.0 .0
    }
}
