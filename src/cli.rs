use crate::commands::Command;
use crate::logging;
use clap::Parser;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

impl Cli {
    pub fn run(self) -> ExitCode {
        if let Err(e) = logging::init(self.verbose) {
            eprintln!("Failed to initialize logging: {e}");
            return ExitCode::FAILURE;
        }

        match self.command.run() {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                tracing::error!("{e:#}");
                ExitCode::FAILURE
            }
        }
    }
}
