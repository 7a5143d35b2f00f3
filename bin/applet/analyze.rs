use crate::eval::{EngineConfig, Uci};
use crate::io::{Io, Pipe, Process};
use anyhow::{Context, Error as Anyhow};
use clap::Parser;
use lib::chess::{Fen, Position};
use lib::fusion::{Fusion, FusionBoard};
use tokio::io::{empty, stdout};
use tracing::{info, instrument};

/// Evaluates a position with an external engine.
///
/// The virtual board is evaluated too whenever fusions change it.
#[derive(Debug, Parser)]
#[clap(disable_help_flag = true, disable_version_flag = true)]
pub struct Analyze {
    /// The engine configuration.
    #[clap(short, long, default_value = "uci(\"stockfish\")")]
    engine: EngineConfig,

    /// How deep the engine should search.
    #[clap(short, long, default_value_t = 16)]
    depth: u8,

    /// The position to analyze in FEN notation.
    fen: Fen,

    /// The roles fused onto the board, such as `d5=p`.
    fused: Vec<Fusion>,
}

impl Analyze {
    #[instrument(level = "trace", skip(self), err)]
    pub async fn execute(self) -> Result<(), Anyhow> {
        let mut game = FusionBoard::new(Position::load(self.fen).context("illegal position")?);
        game.set_fused(self.fused.iter().map(ToString::to_string))?;
        let positions = game.positions();

        let EngineConfig::Uci(program, options) = self.engine;
        let process = Process::spawn(&program).with_context(|| format!("failed to spawn `{}`", program))?;
        let mut engine = Uci::new(process, options);
        let mut out = Pipe::new(stdout(), empty());

        let score = engine.evaluate(&positions.primary, self.depth).await?;
        info!(fen = %positions.primary, %score);
        out.send(&format!("position: {}", score)).await?;

        if positions.virtualized != positions.primary {
            let score = engine.evaluate(&positions.virtualized, self.depth).await?;
            info!(fen = %positions.virtualized, %score);
            out.send(&format!("virtual: {}", score)).await?;
        }

        out.flush().await?;
        Ok(())
    }
}
