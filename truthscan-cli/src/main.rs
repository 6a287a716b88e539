//! TruthScan CLI - offline misinformation checks.

use std::path::PathBuf;

use clap::{ArgGroup, Parser, Subcommand};
use colored::Colorize;
use truthscan_core::{EngineConfig, Verdict};
use tracing_subscriber::{fmt, EnvFilter};

mod commands;
mod exit_codes;
mod utils;

use exit_codes::ExitCode;

const EXIT_CODES_HELP: &str = "\
Exit codes:
  0   Success
  1   General error
  66  Input file missing or unreadable";

#[derive(Parser)]
#[command(name = "truthscan")]
#[command(author, version, about = "Offline hoax matching and image forensics", long_about = None)]
#[command(after_help = EXIT_CODES_HELP)]
struct Cli {
    /// Directory holding the index and record store (overrides TRUTHSCAN_DATA_DIR)
    #[arg(long, global = true, value_name = "DIR")]
    data_dir: Option<PathBuf>,

    /// Print machine-readable JSON instead of formatted text
    #[arg(long, global = true)]
    json: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check a statement against the index of known hoaxes
    Check {
        /// Statement to check
        #[arg(value_name = "TEXT")]
        text: String,

        /// Maximum number of matches to report
        #[arg(short, long)]
        k: Option<usize>,

        /// Minimum similarity for a match
        #[arg(short, long)]
        threshold: Option<f32>,

        /// Record the analysis in the history
        #[arg(long)]
        save: bool,
    },

    /// Add a debunked statement to the index
    AddHoax {
        /// Statement text
        #[arg(value_name = "TEXT")]
        text: String,

        /// Who debunked it
        #[arg(long, default_value = "")]
        source: String,

        /// Topic bucket, e.g. health_misinformation
        #[arg(long, default_value = "")]
        category: String,

        /// FAKE, REAL, MISLEADING or UNVERIFIED
        #[arg(long, default_value = "FAKE")]
        verdict: Verdict,
    },

    /// Run forensics on an image file
    Image {
        /// Path to the image
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Record the analysis in the history
        #[arg(long)]
        save: bool,
    },

    /// Record whether a previous analysis was right
    #[command(group(ArgGroup::new("assessment").required(true).args(["correct", "incorrect"])))]
    Feedback {
        /// Identifier printed when the analysis was saved
        #[arg(value_name = "ANALYSIS_ID")]
        analysis_id: String,

        /// The analysis was correct
        #[arg(long)]
        correct: bool,

        /// The analysis was wrong
        #[arg(long)]
        incorrect: bool,

        /// Free-form comment
        #[arg(long)]
        comment: Option<String>,
    },

    /// Show the most recent saved analyses
    Recent {
        /// Number of analyses to show
        #[arg(short, long, default_value_t = 10)]
        limit: usize,
    },

    /// Show index and record store statistics
    Stats,

    /// Delete every stored record
    Clear {
        /// Confirm deletion
        #[arg(long)]
        yes: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    let filter = match cli.verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let mut config = EngineConfig::from_env();
    if let Some(dir) = cli.data_dir {
        config = config.relocate(dir);
    }
    let json = cli.json;

    let result = match cli.command {
        Commands::Check {
            text,
            k,
            threshold,
            save,
        } => commands::check::execute(&config, &text, k, threshold, save, json),
        Commands::AddHoax {
            text,
            source,
            category,
            verdict,
        } => commands::hoax::execute(&config, &text, verdict, source, category, json),
        Commands::Image { file, save } => commands::image::execute(&config, &file, save, json),
        Commands::Feedback {
            analysis_id,
            correct,
            incorrect: _,
            comment,
        } => commands::history::feedback(&config, analysis_id, correct, comment, json),
        Commands::Recent { limit } => commands::history::recent(&config, limit, json),
        Commands::Stats => commands::history::stats(&config, json),
        Commands::Clear { yes } => commands::history::clear(&config, yes, json),
    };

    if let Err(err) = result {
        let exit = ExitCode::from_anyhow(&err);
        if let Some(message) = exit.message {
            eprintln!("{} {}", "error:".red().bold(), message);
        }
        std::process::exit(exit.code);
    }
}
