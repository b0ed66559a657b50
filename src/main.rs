mod cli;
mod commands;
mod config;
mod error;
mod generate;
mod ico;
mod img;
mod logging;
mod png;
mod raster;
mod util;

use clap::Parser;
use std::process::ExitCode;

fn main() -> ExitCode {
    cli::Cli::parse().run()
}
