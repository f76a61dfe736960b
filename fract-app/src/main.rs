mod app;
mod app_dir;
mod input;
mod preferences;
mod ui;

use std::path::PathBuf;
use std::process::ExitCode;

use tracing::error;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let mut args = std::env::args_os().skip(1);
    let (Some(gradient), None) = (args.next(), args.next()) else {
        error!("Usage: fract <gradient-image>");
        return ExitCode::FAILURE;
    };

    match app::run(&PathBuf::from(gradient)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Window failed: {e}");
            ExitCode::FAILURE
        }
    }
}
