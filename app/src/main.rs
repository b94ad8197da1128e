use std::process::ExitCode;

mod cli;
mod global_settings;

use global_settings::GlobalSettings;

fn main() -> ExitCode {
    let settings = GlobalSettings::from_env();
    env_logger::builder()
        .filter_level(settings.log_level)
        .format_timestamp(None)
        .format_target(false)
        .init();
    ExitCode::from(cli::exec(&settings))
}
