use clap::Parser;
use mvnget_core::logging;

mod cli;

use crate::cli::Cli;

fn main() {
    let cli = Cli::parse();

    // Initialize logging as early as possible; stderr only if the state dir is unusable.
    if let Err(e) = logging::init_logging(cli.verbose) {
        logging::init_logging_stderr(cli.verbose);
        tracing::warn!("file logging unavailable: {e:#}");
    }

    if let Err(err) = cli.run() {
        eprintln!("mvnget error: {:#}", err);
        std::process::exit(1);
    }
}
