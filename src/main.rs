use std::process::ExitCode;

use clap::Parser;
use labrisk_lib::cli::{export_reference, run, Cli};
use labrisk_lib::config;

fn main() -> ExitCode {
    let cli = Cli::parse();
    labrisk_lib::init_tracing();

    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);

    let outcome = match &cli.export_reference {
        Some(dir) => export_reference(&cli, dir),
        None => run(&cli).map(|report| {
            tracing::info!(report_id = %report.report_id, "Done");
        }),
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Analysis failed");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
