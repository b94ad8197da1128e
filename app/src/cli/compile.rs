//! Shared by `lex`, `parse` and `build`: run the pipeline up to a phase for
//! every input and write the resulting artifacts.

use std::fs::File;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures::future::join_all;
use log::{debug, warn};
use miette::Report;

use moonc_lang_driver::{Database, DriverError, FileSystemSource, InMemorySource, MainError, Phase};

use super::{Status, report};
use crate::global_settings::GlobalSettings;

/// The name under which standard input is compiled.
const STDIN: &str = "stdin";

#[derive(clap::Args, Debug, Clone)]
pub struct OutputArgs {
    /// Write only the primary artifact of every input to PATH, `-` for stdout
    #[clap(short, long, value_name = "PATH")]
    output: Option<PathBuf>,
    /// Directory the artifact files are written to
    #[clap(short = 'd', long, value_name = "DIR", default_value = ".")]
    outdir: PathBuf,
    /// Also write the artifacts of earlier phases
    #[clap(short = 'D', long)]
    debug: bool,
}

enum Input {
    File(PathBuf),
    Stdin(String),
}

/// What compiling one input produced.
struct Compiled {
    primary: Option<String>,
    reports: Vec<Report>,
    status: Status,
}

pub fn exec(phase: Phase, files: Vec<PathBuf>, output: OutputArgs, settings: &GlobalSettings) -> Status {
    let inputs = if files.is_empty() {
        let mut text = String::new();
        if let Err(err) = io::stdin().read_to_string(&mut text) {
            let err = DriverError::CannotOpenInput { path: PathBuf::from(STDIN), source: Arc::new(err) };
            let status = Status::of(&err);
            report(&[MainError::from(err).into()], settings);
            return status;
        }
        vec![Input::Stdin(text)]
    } else {
        files.into_iter().map(Input::File).collect()
    };

    let results = compile_all(inputs, phase, &output);

    let mut status = Status::Success;
    let mut primaries = Vec::new();
    for compiled in results {
        report(&compiled.reports, settings);
        status = status.max(compiled.status);
        primaries.extend(compiled.primary);
    }
    if let Some(target) = &output.output {
        if let Err(err) = write_primaries(target, &primaries) {
            status = status.max(Status::of(&err));
            report(&[MainError::from(err).into()], settings);
        }
    }
    status
}

/// Several inputs are compiled in parallel, each with its own database.
/// Results keep the order of the inputs.
fn compile_all(inputs: Vec<Input>, phase: Phase, output: &OutputArgs) -> Vec<Compiled> {
    if inputs.len() < 2 {
        return inputs.into_iter().map(|input| compile(input, phase, output)).collect();
    }
    let runtime = match tokio::runtime::Builder::new_multi_thread().build() {
        Ok(runtime) => runtime,
        Err(err) => {
            warn!("Cannot start worker threads, compiling sequentially: {err}");
            return inputs.into_iter().map(|input| compile(input, phase, output)).collect();
        }
    };
    let joined = runtime.block_on(async {
        let tasks = inputs.into_iter().map(|input| {
            let output = output.clone();
            tokio::task::spawn_blocking(move || compile(input, phase, &output))
        });
        join_all(tasks).await
    });
    joined
        .into_iter()
        .map(|result| result.unwrap_or_else(|err| std::panic::resume_unwind(err.into_panic())))
        .collect()
}

fn compile(input: Input, phase: Phase, output: &OutputArgs) -> Compiled {
    let (mut db, path) = match input {
        Input::File(path) => (Database::from_path("."), path),
        Input::Stdin(text) => {
            let mut source = InMemorySource::new();
            source.insert(STDIN, text);
            (Database::from_source(source), PathBuf::from(STDIN))
        }
    };
    debug!("Compiling {} up to {phase:?}", path.display());
    match run_phases(&mut db, &path, phase, output) {
        Ok(compiled) => compiled,
        Err(err) => {
            let status = Status::of(&err);
            Compiled { primary: None, reports: vec![db.pretty_error(&path, err.into())], status }
        }
    }
}

fn run_phases(db: &mut Database, path: &Path, phase: Phase, output: &OutputArgs) -> Result<Compiled, DriverError> {
    let errors = db.errors(path, phase)?;
    let primary = if output.output.is_some() {
        db.render(path, phase.primary())?
    } else {
        let mut target = FileSystemSource::new("");
        db.write_artifacts(path, phase, output.debug, &mut target, &output.outdir)?;
        None
    };
    let status = if errors.iter().all(MainError::is_warning) { Status::Success } else { Status::Failure };
    Ok(Compiled { primary, reports: db.pretty_errors(path, errors), status })
}

fn write_primaries(target: &Path, primaries: &[String]) -> Result<(), DriverError> {
    let failed = |err: io::Error| DriverError::CannotCreateOutput { path: target.to_path_buf(), source: Arc::new(err) };
    if target == Path::new("-") {
        let mut stdout = io::stdout().lock();
        for primary in primaries {
            stdout.write_all(primary.as_bytes()).map_err(failed)?;
        }
        return stdout.flush().map_err(failed);
    }
    let mut file = File::create(target).map_err(failed)?;
    for primary in primaries {
        file.write_all(primary.as_bytes()).map_err(failed)?;
    }
    Ok(())
}
