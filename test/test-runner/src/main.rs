mod infallible;
mod phases;
mod runner;
mod suites;

use clap::Parser;

pub const TEST_SUITES_PATH: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/../suites");

/// moonc Testsuite Runner
#[derive(Parser)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Only run cases whose `<suite>/<name>` contains this text
    #[clap(long)]
    filter: Option<String>,
    #[clap(long, num_args = 0)]
    debug: bool,
    #[clap(long, num_args = 0)]
    update_expected: bool,
}

fn main() {
    env_logger::builder().format_timestamp(None).format_level(false).format_target(false).init();
    let args = Args::parse();
    let runner = runner::Runner::load(TEST_SUITES_PATH);
    let config = runner::Config { filter: args.filter, debug: args.debug };
    let res = runner.run(&config);
    let written = if args.update_expected {
        res.update_expected().map(|()| println!("Updated expected outputs."))
    } else {
        res.print()
    };
    if let Err(err) = written {
        eprintln!("{err}");
        std::process::exit(2);
    }
    if !res.success() {
        std::process::exit(1);
    }
}
