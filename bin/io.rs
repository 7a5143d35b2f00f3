use async_trait::async_trait;
use std::io;

mod pipe;
mod process;

pub use pipe::*;
pub use process::*;

/// A peer that talks one line at a time, such as the terminal or a UCI engine.
#[async_trait]
#[cfg_attr(test, mockall::automock)]
pub trait Io {
    /// Waits for the next line that is not blank.
    async fn recv(&mut self) -> io::Result<String>;

    /// Queues a line.
    async fn send(&mut self, line: &str) -> io::Result<()>;

    /// Delivers every queued line.
    async fn flush(&mut self) -> io::Result<()>;
}
