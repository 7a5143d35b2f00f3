use super::{Io, Pipe};
use async_trait::async_trait;
use std::{io, process::Stdio};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tracing::{debug, instrument};

/// An [`Io`] over the standard streams of an engine running as a child process.
///
/// The child is killed once the [`Process`] is dropped, so it lives exactly as
/// long as the evaluations it serves.
#[derive(Debug)]
pub struct Process {
    pipe: Pipe<ChildStdin, ChildStdout>,
    _child: Child,
}

impl Process {
    /// Spawns `program` with piped standard input and output.
    #[instrument(level = "debug", err)]
    pub fn spawn(program: &str) -> io::Result<Self> {
        let mut child = Command::new(program)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()?;

        let broken = || io::Error::from(io::ErrorKind::BrokenPipe);
        let stdin = child.stdin.take().ok_or_else(broken)?;
        let stdout = child.stdout.take().ok_or_else(broken)?;

        debug!(pid = ?child.id(), "engine started");

        Ok(Process {
            pipe: Pipe::new(stdin, stdout),
            _child: child,
        })
    }
}

#[async_trait]
impl Io for Process {
    async fn recv(&mut self) -> io::Result<String> {
        self.pipe.recv().await
    }

    async fn send(&mut self, line: &str) -> io::Result<()> {
        self.pipe.send(line).await
    }

    async fn flush(&mut self) -> io::Result<()> {
        self.pipe.flush().await
    }
}
