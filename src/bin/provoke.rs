//! Provoke CLI Binary
//!
//! Generates one provocation for text given on the command line or stdin.

use clap::Parser;
use provoke::cli::{render_response, Cli, CliOutcome, RunContext};
use provoke::config::ProvokeConfig;
use provoke::logging::{init_logging, LoggingConfig};
use std::process;
use tokio::io::AsyncReadExt;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match cli.resolve_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", e);
            process::exit(1);
        }
    };

    let logging_config = build_logging_config(&cli, &config);
    if let Err(e) = init_logging(Some(&logging_config)) {
        eprintln!("Failed to initialize logging: {}", e);
        process::exit(1);
    }

    if cli.print_config {
        match config.to_toml_string() {
            Ok(rendered) => print!("{}", rendered),
            Err(e) => {
                eprintln!("{}", e);
                process::exit(1);
            }
        }
        return;
    }

    let text = match cli.text.clone() {
        Some(text) => text,
        None => {
            let mut buffer = String::new();
            if let Err(e) = tokio::io::stdin().read_to_string(&mut buffer).await {
                eprintln!("Failed to read stdin: {}", e);
                process::exit(1);
            }
            buffer
        }
    };

    let context = match RunContext::new(config) {
        Ok(ctx) => ctx,
        Err(e) => {
            error!("Failed to set up backend: {}", e);
            eprintln!("{}", e);
            process::exit(1);
        }
    };

    info!("Provoke run starting");
    match context.execute(text).await {
        CliOutcome::Response(response) => println!("{}", render_response(&response)),
        CliOutcome::Error(message) => {
            eprintln!("{}", message);
            process::exit(1);
        }
    }
}

/// CLI flags override the config file, which overrides defaults.
fn build_logging_config(cli: &Cli, config: &ProvokeConfig) -> LoggingConfig {
    let mut logging = config.logging.clone();
    if cli.verbose {
        logging.level = "debug".to_string();
    }
    if let Some(ref level) = cli.log_level {
        logging.level = level.clone();
    }
    logging
}
