use anyhow::Result;
use clap::Parser;

mod cli;
mod logging;

fn main() -> Result<()> {
    logging::init_logging();
    cli::Args::parse().run()
}
