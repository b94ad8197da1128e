use std::path::PathBuf;

use moonc_lang_driver::Phase;

use super::Status;
use super::compile::{self, OutputArgs};
use crate::global_settings::GlobalSettings;

#[derive(clap::Args)]
pub struct Args {
    /// Files to tokenize; standard input if none are given
    #[clap(value_parser, value_name = "FILES")]
    files: Vec<PathBuf>,
    #[clap(flatten)]
    output: OutputArgs,
}

pub fn exec(args: Args, settings: &GlobalSettings) -> Status {
    compile::exec(Phase::Lex, args.files, args.output, settings)
}
