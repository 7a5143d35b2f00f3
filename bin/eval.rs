use crate::io::Io;
use anyhow::{Context, Error as Anyhow};
use derive_more::{DebugCustom, Display, Error, From};
use lib::chess::{Color, Fen};
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, fmt, future::Future, io, pin::Pin, str::FromStr};
use test_strategy::Arbitrary;
use tokio::{runtime, task::block_in_place};
use tracing::{error, instrument};
use vampirc_uci::{self as uci, UciFen, UciInfoAttribute, UciMessage, UciSearchControl};

pub type UciOptions = HashMap<String, Option<String>>;

/// The reason why parsing [`EngineConfig`] failed.
#[derive(Debug, Display, Eq, PartialEq, Error, From)]
#[display(fmt = "failed to parse engine configuration")]
pub struct ParseEngineConfigError(ron::de::SpannedError);

/// How to reach an external engine.
#[derive(Debug, Clone, Eq, PartialEq, Arbitrary, Deserialize, Serialize)]
#[serde(deny_unknown_fields, rename_all = "lowercase")]
pub enum EngineConfig {
    /// An executable that speaks the Universal Chess Interface.
    Uci(String, #[serde(default)] UciOptions),
}

impl fmt::Display for EngineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&ron::ser::to_string(self).map_err(|_| fmt::Error)?)
    }
}

impl FromStr for EngineConfig {
    type Err = ParseEngineConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(ron::de::from_str(s)?)
    }
}

/// An engine's assessment of a position.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Arbitrary)]
pub enum Score {
    /// An advantage in hundredths of a pawn.
    Centipawns(i32),
    /// A forced mate in a number of moves, negative if getting mated.
    Mate(i32),
}

impl Score {
    /// This score as seen by the other side.
    pub fn flip(self) -> Self {
        match self {
            Score::Centipawns(cp) => Score::Centipawns(-cp),
            Score::Mate(n) => Score::Mate(-n),
        }
    }

    /// Converts a score relative to the side to move into one relative to white.
    pub fn for_white(self, turn: Color) -> Self {
        match turn {
            Color::White => self,
            Color::Black => self.flip(),
        }
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Score::Centipawns(cp) => write!(f, "{:+.2}", f64::from(cp) / 100.),
            Score::Mate(n) if n < 0 => write!(f, "-M{}", -n),
            Score::Mate(n) => write!(f, "M{}", n),
        }
    }
}

#[derive(DebugCustom)]
#[debug(bound = "T: fmt::Debug")]
enum Lazy<T, E> {
    #[debug(fmt = "{:?}", _0)]
    Initialized(T),
    #[debug(fmt = "?")]
    Uninitialized(Pin<Box<dyn Future<Output = Result<T, E>> + Send + 'static>>),
}

impl<T, E> Lazy<T, E> {
    async fn get_or_init(&mut self) -> Result<&mut T, E> {
        if let Lazy::Uninitialized(f) = self {
            *self = Lazy::Initialized(f.await?);
        }

        match self {
            Lazy::Initialized(v) => Ok(v),
            Lazy::Uninitialized(_) => unreachable!(),
        }
    }
}

/// The reason why a position could not be evaluated.
#[derive(Debug, Display, Error, From)]
pub enum UciError {
    #[display(fmt = "the UCI server encountered an error")]
    Io(io::Error),

    #[display(fmt = "the UCI server reported no score")]
    #[from(ignore)]
    MissingScore,
}

/// A Universal Chess Interface client that evaluates positions.
#[derive(Debug)]
pub struct Uci<T: Io> {
    io: Lazy<T, UciError>,
}

impl<T: Io + Send + 'static> Uci<T> {
    /// Constructs [`Uci`] with the given [`UciOptions`].
    ///
    /// The handshake is deferred until the first evaluation.
    pub fn new(mut io: T, options: UciOptions) -> Self {
        Uci {
            io: Lazy::Uninitialized(Box::pin(async move {
                io.send(&UciMessage::Uci.to_string()).await?;
                io.flush().await?;

                while !matches!(uci::parse_one(io.recv().await?.trim()), UciMessage::UciOk) {}

                for (name, value) in options {
                    let set_option = UciMessage::SetOption { name, value };
                    io.send(&set_option.to_string()).await?;
                }

                io.send(&UciMessage::UciNewGame.to_string()).await?;
                io.send(&UciMessage::IsReady.to_string()).await?;
                io.flush().await?;

                while !matches!(uci::parse_one(io.recv().await?.trim()), UciMessage::ReadyOk) {}

                Ok(io)
            })),
        }
    }

    /// Searches a position to a fixed depth and reports the last score, relative to white.
    #[instrument(level = "debug", skip(self, fen), ret, err, fields(%fen))]
    pub async fn evaluate(&mut self, fen: &Fen, depth: u8) -> Result<Score, UciError> {
        let position = UciMessage::Position {
            startpos: false,
            fen: Some(UciFen(fen.to_string())),
            moves: Vec::new(),
        };

        let go = UciMessage::Go {
            search_control: Some(UciSearchControl::depth(depth)),
            time_control: None,
        };

        let io = self.io.get_or_init().await?;
        io.send(&position.to_string()).await?;
        io.send(&go.to_string()).await?;
        io.flush().await?;

        let mut score = None;

        loop {
            match uci::parse_one(io.recv().await?.trim()) {
                UciMessage::BestMove { .. } => break,
                UciMessage::Info(info) => {
                    for i in info {
                        match i {
                            UciInfoAttribute::Score { mate: Some(n), .. } => {
                                score = Some(Score::Mate(n.into()))
                            }

                            UciInfoAttribute::Score { cp: Some(cp), .. } => {
                                score = Some(Score::Centipawns(cp))
                            }

                            _ => {}
                        }
                    }
                }

                _ => {}
            }
        }

        Ok(score.ok_or(UciError::MissingScore)?.for_white(fen.turn()))
    }
}

/// Asks the engine to quit, if it was ever started.
impl<T: Io> Drop for Uci<T> {
    #[instrument(level = "trace", skip(self))]
    fn drop(&mut self) {
        let io = match &mut self.io {
            Lazy::Initialized(io) => io,
            Lazy::Uninitialized(_) => return,
        };

        let result: Result<(), Anyhow> = block_in_place(|| {
            runtime::Handle::try_current()?.block_on(async {
                io.send(&UciMessage::Quit.to_string()).await?;
                io.flush().await?;
                Ok(())
            })
        });

        if let Err(e) = result.context("failed to gracefully shutdown the UCI server") {
            error!("{:?}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::MockIo;
    use mockall::Sequence;
    use std::future::ready;
    use test_strategy::proptest;
    use tokio::runtime;

    const START: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";
    const AFTER_E4: &str = "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1";

    fn handshake(io: &mut MockIo) {
        io.expect_recv()
            .once()
            .returning(|| Box::pin(ready(Ok(UciMessage::UciOk.to_string()))));

        io.expect_recv()
            .once()
            .returning(|| Box::pin(ready(Ok(UciMessage::ReadyOk.to_string()))));
    }

    fn reply(io: &mut MockIo, lines: &'static [&'static str]) {
        for line in lines {
            io.expect_recv()
                .once()
                .returning(move || Box::pin(ready(Ok(line.to_string()))));
        }
    }

    #[proptest]
    fn uci_config_is_deserializable(p: String, o: UciOptions) {
        assert_eq!(
            format!("uci({:?})", p).parse(),
            Ok(EngineConfig::Uci(p.clone(), UciOptions::default()))
        );

        assert_eq!(
            format!("uci({:?}, {})", p, ron::ser::to_string(&o)?).parse(),
            Ok(EngineConfig::Uci(p, o))
        );
    }

    #[proptest]
    fn parsing_printed_engine_config_is_an_identity(c: EngineConfig) {
        assert_eq!(c.to_string().parse(), Ok(c));
    }

    #[test]
    fn scores_are_printed_from_whites_point_of_view() {
        assert_eq!(Score::Centipawns(35).to_string(), "+0.35");
        assert_eq!(Score::Centipawns(-120).to_string(), "-1.20");
        assert_eq!(Score::Mate(3).to_string(), "M3");
        assert_eq!(Score::Mate(-2).to_string(), "-M2");
        assert_eq!(Score::Mate(2).for_white(Color::Black), Score::Mate(-2));
    }

    #[proptest]
    fn flipping_twice_is_an_identity(s: Score) {
        assert_eq!(s.flip().flip(), s);
    }

    #[proptest]
    fn new_schedules_engine_for_lazy_initialization(o: UciOptions) {
        assert!(matches!(
            Uci::new(MockIo::new(), o),
            Uci {
                io: Lazy::Uninitialized(_),
            }
        ));
    }

    #[proptest]
    fn engine_is_initialized_with_the_options_configured(o: UciOptions, #[strategy(1u8..)] d: u8) {
        let rt = runtime::Builder::new_multi_thread().build()?;
        let mut io = MockIo::new();
        let mut seq = Sequence::new();

        io.expect_send()
            .once()
            .in_sequence(&mut seq)
            .withf(|msg| msg == UciMessage::Uci.to_string())
            .returning(|_| Box::pin(ready(Ok(()))));

        for (name, value) in o.clone() {
            let set_option = UciMessage::SetOption { name, value };
            io.expect_send()
                .once()
                .in_sequence(&mut seq)
                .withf(move |msg| msg == set_option.to_string())
                .returning(|_| Box::pin(ready(Ok(()))));
        }

        io.expect_send()
            .once()
            .in_sequence(&mut seq)
            .withf(|msg| msg == UciMessage::UciNewGame.to_string())
            .returning(|_| Box::pin(ready(Ok(()))));

        io.expect_send()
            .once()
            .in_sequence(&mut seq)
            .withf(|msg| msg == UciMessage::IsReady.to_string())
            .returning(|_| Box::pin(ready(Ok(()))));

        io.expect_send().returning(|_| Box::pin(ready(Ok(()))));
        io.expect_flush().returning(|| Box::pin(ready(Ok(()))));

        handshake(&mut io);
        reply(&mut io, &["info depth 1 score cp 20", "bestmove e2e4"]);

        let mut uci = Uci::new(io, o);
        let fen = START.parse()?;

        assert_eq!(
            rt.block_on(uci.evaluate(&fen, d)).map_err(|e| e.to_string()),
            Ok(Score::Centipawns(20))
        );

        rt.block_on(async move { drop(uci) });
    }

    #[proptest]
    fn evaluate_reports_the_last_score_relative_to_white(#[strategy(1u8..)] d: u8) {
        let rt = runtime::Builder::new_multi_thread().build()?;
        let mut io = MockIo::new();

        io.expect_send().returning(|_| Box::pin(ready(Ok(()))));
        io.expect_flush().returning(|| Box::pin(ready(Ok(()))));

        handshake(&mut io);
        reply(
            &mut io,
            &[
                "info depth 1 score cp 20",
                "info string thinking",
                "info depth 2 score cp 35 pv e7e5",
                "bestmove e7e5",
            ],
        );

        let mut uci = Uci::new(io, UciOptions::default());
        let fen = AFTER_E4.parse()?;

        assert_eq!(
            rt.block_on(uci.evaluate(&fen, d)).map_err(|e| e.to_string()),
            Ok(Score::Centipawns(-35))
        );

        rt.block_on(async move { drop(uci) });
    }

    #[proptest]
    fn evaluate_reports_mates(#[strategy(1u8..)] d: u8) {
        let rt = runtime::Builder::new_multi_thread().build()?;
        let mut io = MockIo::new();

        io.expect_send().returning(|_| Box::pin(ready(Ok(()))));
        io.expect_flush().returning(|| Box::pin(ready(Ok(()))));

        handshake(&mut io);
        reply(&mut io, &["info depth 5 score mate 3", "bestmove d1h5"]);

        let mut uci = Uci::new(io, UciOptions::default());
        let fen = START.parse()?;

        assert_eq!(
            rt.block_on(uci.evaluate(&fen, d)).map_err(|e| e.to_string()),
            Ok(Score::Mate(3))
        );

        rt.block_on(async move { drop(uci) });
    }

    #[proptest]
    fn evaluate_fails_without_a_score(#[strategy(1u8..)] d: u8) {
        let rt = runtime::Builder::new_multi_thread().build()?;
        let mut io = MockIo::new();

        io.expect_send().returning(|_| Box::pin(ready(Ok(()))));
        io.expect_flush().returning(|| Box::pin(ready(Ok(()))));

        handshake(&mut io);
        reply(&mut io, &["bestmove e2e4"]);

        let mut uci = Uci::new(io, UciOptions::default());
        let fen = START.parse()?;

        assert!(matches!(
            rt.block_on(uci.evaluate(&fen, d)),
            Err(UciError::MissingScore)
        ));

        rt.block_on(async move { drop(uci) });
    }

    #[proptest]
    fn evaluate_fails_if_the_engine_fails(e: io::Error) {
        let rt = runtime::Builder::new_multi_thread().build()?;
        let mut io = MockIo::new();

        let kind = e.kind();
        io.expect_send()
            .return_once(move |_| Box::pin(ready(Err(e))));

        let mut uci = Uci::new(io, UciOptions::default());
        let fen = START.parse()?;

        assert!(matches!(
            rt.block_on(uci.evaluate(&fen, 1)),
            Err(UciError::Io(e)) if e.kind() == kind
        ));
    }
}
