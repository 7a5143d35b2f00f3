//! Rules engine for fusion chess, a variant where a capture grants the capturing
//! piece the movement of the piece it took.

/// Chess domain types.
pub mod chess;
/// Fusion chess rules.
pub mod fusion;
/// The interface to the standard rules of chess.
pub mod rules;
