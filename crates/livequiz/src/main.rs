// SPDX-FileCopyrightText: 2026 Blufio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `livequiz` - a live, synchronized, multi-participant quiz session server.
//!
//! This is the binary entry point: it loads configuration, then dispatches to
//! one of the CLI subcommands below.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod migrate;
mod serve;

use clap::{Parser, Subcommand};

/// `livequiz` - a live, synchronized, multi-participant quiz session server.
#[derive(Parser, Debug)]
#[command(name = "livequiz", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the gateway and session engine.
    Serve,
    /// Run pending SQLite migrations against the configured database and exit.
    Migrate,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match livequiz_config::load_and_validate() {
        Ok(config) => config,
        Err(errors) => {
            for err in &errors {
                eprintln!("config error: {err}");
            }
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Some(Commands::Serve) | None => serve::run_serve(config).await,
        Some(Commands::Migrate) => migrate::run_migrate(config).await,
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[cfg(not(target_env = "msvc"))]
    fn jemalloc_is_active() {
        use tikv_jemalloc_ctl::{epoch, stats};
        epoch::advance().unwrap();
        let allocated = stats::allocated::read().unwrap();
        assert!(allocated > 0, "jemalloc should report non-zero allocation");
    }

    #[test]
    fn cli_parses_serve_subcommand() {
        let cli = Cli::parse_from(["livequiz", "serve"]);
        assert!(matches!(cli.command, Some(Commands::Serve)));
    }

    #[test]
    fn cli_parses_migrate_subcommand() {
        let cli = Cli::parse_from(["livequiz", "migrate"]);
        assert!(matches!(cli.command, Some(Commands::Migrate)));
    }

    #[test]
    fn cli_defaults_to_none_command() {
        let cli = Cli::parse_from(["livequiz"]);
        assert!(cli.command.is_none());
    }

    #[test]
    fn binary_loads_config_defaults() {
        let config = livequiz_config::load_and_validate().expect("default config should be valid");
        assert_eq!(config.server.bind_address, "127.0.0.1");
    }
}
