//! CLI argument definitions using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Pavemend: validation and auto-repair for pavement survey imports
#[derive(Parser)]
#[command(name = "pavemend")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Validate a survey export against a schema profile
    Validate {
        /// Path to the data file (CSV)
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Schema profile (deflection, lte_season, lte_crack)
        #[arg(short, long)]
        profile: String,

        /// Upper bound for year checks (default: current calendar year)
        #[arg(long)]
        year: Option<i32>,

        /// Output the full report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the fixes pavemend would propose for a defective file
    Suggest {
        /// Path to the data file (CSV)
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Schema profile (deflection, lte_season, lte_crack)
        #[arg(short, long)]
        profile: String,

        /// Upper bound for year checks (default: current calendar year)
        #[arg(long)]
        year: Option<i32>,

        /// Output the suggestion set as JSON
        #[arg(long)]
        json: bool,
    },

    /// Apply unambiguous fixes and write the cleaned dataset
    Apply {
        /// Path to the data file (CSV)
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Schema profile (deflection, lte_season, lte_crack)
        #[arg(short, long)]
        profile: String,

        /// Upper bound for year checks (default: current calendar year)
        #[arg(long)]
        year: Option<i32>,

        /// Output path for the cleaned CSV (default: <file>.cleaned.csv)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Delete columns nothing could resolve instead of failing
        #[arg(long)]
        drop_unresolved: bool,
    },
}
