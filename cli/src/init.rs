use crate::cli::UitrackCli;
use clap::Parser;

/// Initialise logging and parse the command line.
pub fn init() -> UitrackCli {
    env_logger::init();

    UitrackCli::parse()
}
