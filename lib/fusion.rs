mod board;
mod detector;
mod highlight;
mod overlay;
mod projection;
mod record;
mod target;

pub use board::*;
pub use overlay::*;
pub use projection::*;
pub use record::*;
pub use target::*;
