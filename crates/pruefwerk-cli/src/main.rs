// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Pruefwerk: read a photographed multiple-choice answer sheet.
//
// Entry point. Initialises logging, parses the command line and runs the
// requested command.

mod scan;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand, ValueEnum};
use pruefwerk_core::config::DetectionMode;
use pruefwerk_core::human_errors::humanize_error;
use pruefwerk_core::ScanConfig;

#[derive(Parser)]
#[command(name = "pruefwerk")]
#[command(about = "Read the marked answers from a photographed bubble sheet")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan a photograph and print the answers as JSON.
    Scan(ScanArgs),

    /// Print the default configuration as JSON.
    Config,
}

#[derive(Debug, Clone, Args)]
pub struct ScanArgs {
    /// Path to the photograph.
    #[arg(long)]
    pub image: PathBuf,

    /// JSON configuration file; unset keys keep their defaults.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Override the bubble detection mode.
    #[arg(long, value_enum)]
    pub mode: Option<ModeArg>,

    /// Write the report here instead of stdout.
    #[arg(long)]
    pub out: Option<PathBuf>,

    /// Write the rectified sheet with candidates and picks drawn on it (PNG).
    #[arg(long)]
    pub overlay: Option<PathBuf>,

    /// Write the rectified sheet as-is (PNG).
    #[arg(long)]
    pub rectified: Option<PathBuf>,

    /// Write the input photo with the detected sheet outline (PNG).
    #[arg(long)]
    pub boundary: Option<PathBuf>,

    /// Pretty-print the JSON report.
    #[arg(long)]
    pub pretty: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    /// Fixed threshold; only inked bubbles are candidates.
    Contour,
    /// Adaptive threshold; every bubble is a candidate.
    Strict,
}

impl From<ModeArg> for DetectionMode {
    fn from(value: ModeArg) -> Self {
        match value {
            ModeArg::Contour => DetectionMode::Contour,
            ModeArg::Strict => DetectionMode::Strict,
        }
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Scan(args) => scan::run(&args).map(|outcome| {
            if let Some(notice) = outcome.notice {
                eprintln!("{}\n  {}", notice.message, notice.suggestion);
            }
            if args.out.is_none() {
                println!("{}", outcome.json);
            }
        }),
        Commands::Config => serde_json::to_string_pretty(&ScanConfig::default())
            .map(|json| println!("{json}"))
            .map_err(Into::into),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %err, "command failed");
            let human = humanize_error(&err);
            eprintln!("{}\n  {}", human.message, human.suggestion);
            ExitCode::FAILURE
        }
    }
}
