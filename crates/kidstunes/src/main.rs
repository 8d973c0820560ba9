// SPDX-FileCopyrightText: 2026 KidsTunes Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! KidsTunes - a moderated music-request bot.
//!
//! This is the binary entry point.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod serve;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use kidstunes_config::{ConfigError, KidsTunesConfig};

/// KidsTunes - a moderated music-request bot.
#[derive(Parser, Debug)]
#[command(name = "kidstunes", version, about, long_about = None)]
struct Cli {
    /// Load this file (plus `KIDSTUNES_*` env vars) instead of the XDG hierarchy.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Connect to Discord and start taking requests.
    Serve,
    /// Validate the configuration and exit.
    CheckConfig,
}

fn load(path: Option<&PathBuf>) -> Result<KidsTunesConfig, Vec<ConfigError>> {
    let config = match path {
        Some(path) => kidstunes_config::load_and_validate_path(path)?,
        None => kidstunes_config::load_and_validate()?,
    };
    kidstunes_config::validate_for_serve(&config)?;
    Ok(config)
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        println!("kidstunes: use --help for available commands");
        return;
    };

    let config = match load(cli.config.as_ref()) {
        Ok(config) => config,
        Err(errors) => {
            kidstunes_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    match command {
        Commands::CheckConfig => {
            println!(
                "kidstunes: config OK (output_dir={}, database={}, resolver={}, beets={})",
                config.paths.output_dir,
                config.paths.database,
                if config.resolver.is_enabled() { "enabled" } else { "disabled" },
                if config.beets.enabled { "enabled" } else { "disabled" },
            );
        }
        Commands::Serve => {
            if let Err(e) = serve::run_serve(config).await {
                eprintln!("error: {e}");
                std::process::exit(1);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[cfg(not(target_env = "msvc"))]
    fn jemalloc_is_active() {
        // Only jemalloc supports advancing the stats epoch.
        use tikv_jemalloc_ctl::{epoch, stats};
        epoch::advance().unwrap();
        let allocated = stats::allocated::read().unwrap();
        assert!(allocated > 0, "jemalloc should report non-zero allocation");
    }

    #[test]
    fn cli_parses_global_config_flag() {
        let cli = Cli::try_parse_from(["kidstunes", "check-config", "--config", "bot.toml"])
            .unwrap();
        assert!(matches!(cli.command, Some(Commands::CheckConfig)));
        assert_eq!(cli.config, Some(PathBuf::from("bot.toml")));

        let cli = Cli::try_parse_from(["kidstunes", "serve"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Serve)));
        assert_eq!(cli.config, None);
    }

    #[test]
    fn unknown_subcommand_is_rejected() {
        assert!(Cli::try_parse_from(["kidstunes", "shell"]).is_err());
    }

    #[test]
    fn missing_config_file_is_reported() {
        let errors = load(Some(&PathBuf::from("/nonexistent/kidstunes.toml"))).unwrap_err();
        assert!(errors[0].to_string().contains("does not exist"));
    }
}
