//! Logging configuration using tracing

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Log to stderr so stdout stays free for command output.
///
/// `RUST_LOG` is honoured unless `verbose` forces debug level.
pub fn init(verbose: bool) -> anyhow::Result<()> {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .try_init()?;

    Ok(())
}
