use clap::{Parser, Subcommand};
use miette::Report;

use moonc_lang_driver::{DriverError, render_reports_io};
use moonc_lang_printer::StandardStream;

use crate::global_settings::GlobalSettings;

mod build;
mod compile;
mod format;
mod ignore_colors;
mod lex;
mod parse;

pub fn exec(settings: &GlobalSettings) -> u8 {
    use Command::*;
    let cli = Cli::parse();
    let status = match cli.command {
        Lex(args) => lex::exec(args, settings),
        Parse(args) => parse::exec(args, settings),
        Build(args) => build::exec(args, settings),
        Fmt(args) => format::exec(args, settings),
    };
    status as u8
}

#[derive(Parser)]
#[clap(version, author, about, long_about = None)]
struct Cli {
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Write the tokens and lexical errors of each input
    Lex(lex::Args),
    /// Write the derivation, syntax errors and tree of each input
    Parse(parse::Args),
    /// Check each input and generate MOON assembly
    Build(build::Args),
    /// Print a source file through the pretty-printer
    Fmt(format::Args),
}

/// The process exit status. When inputs fail differently the largest code wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Status {
    Success = 0,
    Failure = 1,
    CannotOpenInput = 66,
    CannotCreateOutput = 73,
}

impl Status {
    pub fn of(err: &DriverError) -> Self {
        match err {
            DriverError::FileNotFound(_) | DriverError::CannotOpenInput { .. } => Status::CannotOpenInput,
            DriverError::CannotCreateOutput { .. } => Status::CannotCreateOutput,
            DriverError::Impossible(_) => Status::Failure,
        }
    }
}

/// Render reports to stderr.
pub fn report(reports: &[Report], settings: &GlobalSettings) {
    if reports.is_empty() {
        return;
    }
    let mut stderr = StandardStream::stderr(settings.colorize);
    if render_reports_io(&mut stderr, reports, settings.colorize).is_err() {
        log::error!("Failed to write diagnostics to stderr");
    }
}
