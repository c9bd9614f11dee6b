// SPDX-FileCopyrightText: 2026 Tunebot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tunebot - a multi-platform music bot with hot-reloadable script plugins.
//!
//! This is the binary entry point.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod app;
mod commands;
mod reload;
mod serve;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use crate::app::ConfigSource;

/// Tunebot - a multi-platform music bot.
#[derive(Parser, Debug)]
#[command(name = "tunebot", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the default locations.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the bot: load plugins, supervise recognition, reload on SIGHUP.
    Serve,
    /// Resolve a message to a track the way the bot would.
    Match {
        /// Message text, e.g. "/music 163 12345 lossless" or a share link.
        text: Vec<String>,
    },
    /// List registered platforms and plugin states.
    Platforms,
    /// Recognize an audio file with the external recognition service.
    Recognize {
        /// Audio file to send.
        file: PathBuf,
    },
    /// Validate configuration and exit.
    CheckConfig,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let source = ConfigSource::from_flag(cli.config);

    let config = match source.load() {
        Ok(config) => config,
        Err(errors) => {
            tunebot_config::render_errors(&errors);
            return ExitCode::FAILURE;
        }
    };

    let result = match cli.command {
        Some(Commands::Serve) => {
            init_tracing(&config.bot.log_level);
            serve::run_serve(config, source).await
        }
        Some(Commands::Match { text }) => {
            init_tracing(&config.bot.log_level);
            commands::run_match(&config, &text.join(" ")).await
        }
        Some(Commands::Platforms) => {
            init_tracing(&config.bot.log_level);
            commands::run_platforms(&config).await
        }
        Some(Commands::Recognize { file }) => {
            init_tracing(&config.bot.log_level);
            commands::run_recognize(&config, &file).await
        }
        Some(Commands::CheckConfig) => {
            commands::run_check_config(&config, &source);
            Ok(())
        }
        None => {
            println!("tunebot: use --help for available commands");
            Ok(())
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Initializes the tracing subscriber with the given log level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("tunebot={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
