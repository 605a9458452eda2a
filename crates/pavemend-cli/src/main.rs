//! Pavemend CLI - survey import validation and repair.

mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Validate {
            file,
            profile,
            year,
            json,
        } => commands::validate::run(file, profile, year, json, cli.verbose),

        Commands::Suggest {
            file,
            profile,
            year,
            json,
        } => commands::suggest::run(file, profile, year, json, cli.verbose),

        Commands::Apply {
            file,
            profile,
            year,
            output,
            drop_unresolved,
        } => commands::apply::run(file, profile, year, output, drop_unresolved, cli.verbose),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
