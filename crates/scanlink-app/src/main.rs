// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scanlink — page capture preprocessing and recognizer hand-off.
//
// Entry point. Initialises logging, runs the capture-to-text or listen flow
// and prints the recognized text to stdout.

mod args;
mod services;

use std::process::ExitCode;

use tracing::Level;

use scanlink_core::human_errors::humanize_error;

use args::Args;

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::new();
    init_logging(args.log_level);

    tracing::info!("Scanlink starting");

    let outcome = match services::scan::resolve_config(&args) {
        Ok(config) => services::scan::ScanService::new(config).run(&args).await,
        Err(e) => Err(e),
    };

    match outcome {
        Ok(outcome) => {
            if let Some(angle) = outcome.angle {
                tracing::info!(angle = angle.degrees(), "Applied skew correction");
            }
            match outcome.result {
                Some(result) => {
                    tracing::info!(
                        session = %result.session_id,
                        lines = result.lines,
                        completed_at = %result.completed_at,
                        "Recognition finished"
                    );
                    println!("{}", result.text);
                }
                None => tracing::info!(png_bytes = outcome.png_bytes, "Page prepared"),
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "Scan failed");
            let human = humanize_error(&e);
            eprintln!("{}", human.message);
            eprintln!("{}", human.suggestion);
            ExitCode::FAILURE
        }
    }
}

/// `RUST_LOG` wins over the command-line level.
fn init_logging(level: Option<Level>) {
    let fallback = level.unwrap_or(Level::INFO).to_string().to_ascii_lowercase();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(fallback)),
        )
        .with_writer(std::io::stderr)
        .init();
}
