// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Legible — command-line front end.
//
// Entry point. Initialises logging, parses the command line and hands off to
// the matching command.

mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};

use commands::{ConvertRequest, exit_code_for};

#[derive(Parser)]
#[command(name = "legible")]
#[command(version)]
#[command(about = "Re-lay out PDFs in a dyslexia-friendly typeface, spacing and colour", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Convert a PDF
    Convert(ConvertArgs),

    /// Validate a settings file and print the formatting it resolves to
    CheckConfig {
        /// JSON settings file
        #[arg(value_name = "FILE")]
        config: PathBuf,
    },
}

#[derive(Args)]
struct ConvertArgs {
    /// Input PDF file
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Output PDF file (defaults to INPUT with a `.legible.pdf` extension)
    #[arg(short, long, value_name = "OUTPUT")]
    output: Option<PathBuf>,

    /// JSON settings file; flags override its values
    #[arg(long, value_name = "FILE", env = "LEGIBLE_CONFIG")]
    config: Option<PathBuf>,

    /// Body typeface
    #[arg(long)]
    font_name: Option<String>,

    /// Font size in points
    #[arg(long)]
    font_size: Option<f32>,

    /// Vertical advance per line in points
    #[arg(long)]
    line_spacing: Option<f32>,

    /// Extra spacing after every character in points
    #[arg(long, allow_hyphen_values = true)]
    letter_spacing: Option<f32>,

    /// Colour name or #RRGGBB
    #[arg(long)]
    text_color: Option<String>,

    /// Directory searched for font files (repeatable)
    #[arg(long = "font-dir", value_name = "DIR")]
    font_dirs: Vec<PathBuf>,

    /// Print the conversion report as JSON on stdout
    #[arg(long)]
    report: bool,
}

impl From<ConvertArgs> for ConvertRequest {
    fn from(args: ConvertArgs) -> Self {
        Self {
            input: args.input,
            output: args.output,
            config: args.config,
            font_name: args.font_name,
            font_size: args.font_size,
            line_spacing: args.line_spacing,
            letter_spacing: args.letter_spacing,
            text_color: args.text_color,
            font_dirs: args.font_dirs,
            report: args.report,
        }
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Command::Convert(args) => commands::convert(&ConvertRequest::from(args)).map(|_| ()),
        Command::CheckConfig { config } => {
            commands::check_config(&config).map(|resolved| println!("{resolved}"))
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let human = legible_core::human_errors::humanize_error(&err);
            tracing::error!(error = %err, "legible failed");
            eprintln!("{}\n{}", human.message, human.suggestion);
            ExitCode::from(exit_code_for(&err))
        }
    }
}
