use anyhow::Result;
use clap::{Parser, Subcommand};

mod list_formats;
mod probe;

pub use list_formats::ListFormatsCommand;
pub use probe::ProbeCommand;

#[derive(Parser, Debug)]
#[command(name = "probe-harness")]
#[command(about = "Probe FFmpeg's demuxer open path against an in-memory source")]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Open an input through the memory source and report the status (default)
    Probe(ProbeCommand),
    /// List the demuxers FFmpeg was built with and exit
    ListFormats(ListFormatsCommand),
}

impl Args {
    pub fn run(self) -> Result<()> {
        let command = self
            .command
            .unwrap_or(Command::Probe(ProbeCommand::default()));

        match command {
            Command::Probe(cmd) => cmd.run(),
            Command::ListFormats(cmd) => cmd.run(),
        }
    }
}
