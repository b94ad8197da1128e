use std::fs::File;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use moonc_lang_driver::{Database, DriverError, MainError, Phase};
use moonc_lang_printer::{PrintCfg, PrintExt, StandardStream, WriteColor};

use super::ignore_colors::IgnoreColors;
use super::{Status, report};
use crate::global_settings::GlobalSettings;

#[derive(clap::Args)]
pub struct Args {
    #[clap(value_parser, value_name = "FILE")]
    filepath: PathBuf,
    /// Line width the printer breaks at
    #[clap(long)]
    width: Option<usize>,
    /// Spaces per indentation level
    #[clap(long)]
    indent: Option<isize>,
    /// Keep declarations on consecutive lines
    #[clap(long)]
    compact: bool,
    #[clap(short, long, value_name = "FILE")]
    output: Option<PathBuf>,
}

pub fn exec(cmd: Args, settings: &GlobalSettings) -> Status {
    let mut db = Database::from_path(".");
    let parsed = match db.parsed(&cmd.filepath) {
        Ok(parsed) => parsed,
        Err(err) => return fail(&db, &cmd, err, settings),
    };
    let Some(ast) = &parsed.outcome.ast else {
        let errors = db.errors(&cmd.filepath, Phase::Parse).unwrap_or_default();
        report(&db.pretty_errors(&cmd.filepath, errors), settings);
        return Status::Failure;
    };

    let defaults = PrintCfg::default();
    let cfg = PrintCfg {
        width: cmd.width.unwrap_or(defaults.width),
        indent: cmd.indent.unwrap_or(defaults.indent),
        omit_decl_sep: cmd.compact,
    };

    // Write to file or to stdout
    let target = cmd.output.clone().unwrap_or_else(|| PathBuf::from("-"));
    let mut stream: Box<dyn WriteColor> = match &cmd.output {
        Some(path) => match File::create(path) {
            Ok(file) => Box::new(IgnoreColors::new(file)),
            Err(err) => {
                let err = DriverError::CannotCreateOutput { path: path.clone(), source: Arc::new(err) };
                return fail(&db, &cmd, err, settings);
            }
        },
        None => Box::new(StandardStream::stdout(settings.colorize)),
    };
    let printed = ast.print_colored(&cfg, &mut stream).and_then(|()| writeln!(stream));
    if let Err(err) = printed {
        let err = DriverError::CannotCreateOutput { path: target, source: Arc::new(err) };
        return fail(&db, &cmd, err, settings);
    }
    Status::Success
}

fn fail(db: &Database, cmd: &Args, err: DriverError, settings: &GlobalSettings) -> Status {
    let status = Status::of(&err);
    report(&[db.pretty_error(&cmd.filepath, MainError::from(err))], settings);
    status
}
