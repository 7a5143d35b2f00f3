mod color;
mod fen;
mod r#move;
mod outcome;
mod piece;
mod position;
mod role;
mod san;
mod square;

pub use color::*;
pub use fen::*;
pub use outcome::*;
pub use piece::*;
pub use position::*;
pub use r#move::*;
pub use role::*;
pub use san::*;
pub use square::*;
