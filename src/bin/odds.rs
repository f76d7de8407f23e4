//! Texas Holdem equity calculator for the command line, uses the [oddsrs::cli] module.

use clap::Parser;

use oddsrs::cli;

/// Entrypoint: set up logging, then parse and run the CLI arguments.
fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    cli::Args::parse().run()
}
