use anyhow::Error as Anyhow;
use clap::Subcommand;
use derive_more::From;

mod analyze;
mod play;

#[derive(Debug, From, Subcommand)]
pub enum Applet {
    Play(play::Play),
    Analyze(analyze::Analyze),
}

impl Default for Applet {
    fn default() -> Self {
        play::Play::default().into()
    }
}

impl Applet {
    pub async fn execute(self) -> Result<(), Anyhow> {
        match self {
            Applet::Play(a) => a.execute().await,
            Applet::Analyze(a) => a.execute().await,
        }
    }
}
