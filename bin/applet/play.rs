use crate::io::{Io, Pipe};
use anyhow::{Context, Error as Anyhow};
use clap::Parser;
use lib::chess::{Fen, Move, MoveKind, Position, Role, Square};
use lib::fusion::{Fusion, FusionBoard};
use std::{collections::BTreeSet, io::ErrorKind};
use tokio::io::{stdin, stdout};
use tracing::{instrument, warn};

/// Plays a game of fusion chess, one command per line.
///
/// Commands are a move such as `e2e4`, `moves [square]`, `fused <square>`,
/// `undo`, `reset`, `restore [fusion...]`, `positions` and `quit`.
#[derive(Debug, Default, Parser)]
#[clap(disable_help_flag = true, disable_version_flag = true)]
pub struct Play {
    /// The starting position in FEN notation.
    #[clap(long)]
    fen: Option<Fen>,

    /// Roles fused at the start, such as `d5=p`.
    #[clap(long, num_args = 1..)]
    fused: Vec<Fusion>,
}

impl Play {
    #[instrument(level = "trace", skip(self), err)]
    pub async fn execute(self) -> Result<(), Anyhow> {
        let board = match self.fen {
            None => Position::default(),
            Some(fen) => Position::load(fen).context("illegal starting position")?,
        };

        let mut game = FusionBoard::new(board);
        game.set_fused(self.fused.iter().map(ToString::to_string))?;

        Session::new(game, Pipe::new(stdout(), stdin())).run().await
    }
}

struct Session<T: Io> {
    start: FusionBoard,
    game: FusionBoard,
    io: T,
}

impl<T: Io> Session<T> {
    fn new(game: FusionBoard, io: T) -> Self {
        Session {
            start: game.clone(),
            game,
            io,
        }
    }

    async fn show(&mut self) -> Result<(), Anyhow> {
        let turn = self.game.turn();
        self.io.send(&self.game.positions().to_string()).await?;

        match self.game.outcome() {
            Some(o) => self.io.send(&format!("game over: {}", o)).await?,
            None if self.game.is_check() => self.io.send(&format!("{} to move, in check", turn)).await?,
            None => self.io.send(&format!("{} to move", turn)).await?,
        }

        Ok(())
    }

    async fn moves(&mut self, square: Option<&str>) -> Result<(), Anyhow> {
        let whence = square.map(str::parse::<Square>).transpose()?;

        let mut moves: Vec<_> = self
            .game
            .moves()
            .into_iter()
            .filter(|m| whence.map_or(true, |s| m.whence() == s))
            .collect();

        moves.sort();
        let moves: Vec<_> = moves.iter().map(Move::to_string).collect();
        self.io.send(&format!("moves: {}", moves.join(" "))).await?;
        Ok(())
    }

    async fn fused(&mut self, square: Option<&str>) -> Result<(), Anyhow> {
        let whence: Square = square.context("expected a square")?.parse()?;

        let hovering = match self.game.overlay().get(whence) {
            Some(r) => r,
            None => {
                self.io.send(&format!("no fusion on {}", whence)).await?;
                return Ok(());
            }
        };

        let in_play: BTreeSet<Role> = self.game.overlay().iter().map(|f| f.role()).collect();
        let in_play: Vec<_> = in_play.into_iter().collect();

        let moves: Vec<_> = self
            .game
            .fused_moves(whence, &in_play, hovering)
            .into_iter()
            .map(|m| m.to_string())
            .collect();

        self.io.send(&format!("fused moves: {}", moves.join(" "))).await?;
        Ok(())
    }

    async fn execute(&mut self, cmd: &str, args: Vec<&str>) -> Result<(), Anyhow> {
        match cmd {
            "positions" => self.show().await?,
            "moves" => self.moves(args.first().copied()).await?,
            "fused" => self.fused(args.first().copied()).await?,

            "undo" => match self.game.undo() {
                Some(record) => {
                    self.io.send(&format!("took back {}", record)).await?;
                    self.show().await?;
                }

                None => self.io.send("nothing to take back").await?,
            },

            "reset" => {
                self.game.reset(self.start.board().clone());
                self.game.set_fused(self.start.overlay().iter().map(|f| f.to_string()))?;
                self.show().await?;
            }

            "restore" => {
                self.game.set_fused(args)?;
                self.show().await?;
            }

            _ => {
                let m: Move = cmd.parse()?;
                let record = self.game.play(m)?;

                let mut notes = vec![record.path.to_string()];
                for (kind, note) in [
                    (MoveKind::CASTLE, "castle"),
                    (MoveKind::PROMOTION, "promotion"),
                    (MoveKind::EN_PASSANT, "en passant"),
                ] {
                    if record.kind.contains(kind) {
                        notes.push(note.to_string());
                    }
                }

                self.io.send(&format!("played {} ({})", record, notes.join(", "))).await?;
                self.show().await?;
            }
        }

        Ok(())
    }

    async fn run(&mut self) -> Result<(), Anyhow> {
        self.show().await?;
        self.io.flush().await?;

        loop {
            let line = match self.io.recv().await {
                Ok(line) => line,
                Err(e) if e.kind() == ErrorKind::UnexpectedEof => break,
                Err(e) => return Err(e.into()),
            };

            let mut tokens = line.split_whitespace();
            let cmd = match tokens.next() {
                None => continue,
                Some("quit") => break,
                Some(cmd) => cmd,
            };

            if let Err(e) = self.execute(cmd, tokens.collect()).await {
                warn!(%cmd, "{:#}", e);
                self.io.send(&format!("error: {:#}", e)).await?;
            }

            self.io.flush().await?;
        }

        self.io.flush().await?;
        Ok(())
    }
}
