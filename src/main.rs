// mass-file-edit: batch file edits across hosted repositories
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Entry point.
//!
//! ```text
//! cli::parse() --> Config --> Logging --> Command Dispatch
//!   Version | Options | Inis | Edit | Resolve
//! ```

use std::process::ExitCode;

use mass_file_edit::cli::global::GlobalOptions;
use mass_file_edit::cli::{self, Command};
use mass_file_edit::cmd::config::{run_inis_command, run_options_command};
use mass_file_edit::cmd::edit::run_edit_command;
use mass_file_edit::cmd::resolve::run_resolve_command;
use mass_file_edit::config::Config;
use mass_file_edit::config::loader::ConfigLoader;
use mass_file_edit::error::MassEditError;
use mass_file_edit::logging::init_logging;
use mass_file_edit::logging::{LogConfig, LogLevel};

use mimalloc::MiMalloc;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

const DEFAULT_CONFIG_FILE: &str = "mass-edit.toml";
const ENV_PREFIX: &str = "MFE";

#[tokio::main]
async fn main() -> ExitCode {
    let cli = cli::parse();

    let config = load_config(&cli.global);
    let log_config = build_log_config(&cli.global, config.as_ref().ok());
    let _log_guard = match init_logging(&log_config) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {e}");
            return ExitCode::FAILURE;
        }
    };

    dispatch_command(&cli, config).await
}

fn build_log_config(global: &GlobalOptions, config: Option<&Config>) -> LogConfig {
    let console_level = global
        .log_level
        .and_then(LogLevel::from_u8)
        .or_else(|| config.map(|c| c.global.output_log_level))
        .unwrap_or(LogLevel::INFO);

    let file_level = global
        .file_log_level
        .and_then(LogLevel::from_u8)
        .or_else(|| config.map(|c| c.global.file_log_level))
        .unwrap_or(console_level);

    let log_file = global
        .log_file
        .clone()
        .or_else(|| config.and_then(|c| c.global.log_file.clone()));

    LogConfig::builder()
        .with_console_level(console_level)
        .with_file_level(file_level)
        .maybe_with_log_file(log_file.map(|p| p.display().to_string()))
        .with_json(global.json_logs || config.is_some_and(|c| c.global.json_logs))
        .build()
}

async fn dispatch_command(cli: &cli::Cli, config: mass_file_edit::error::Result<Config>) -> ExitCode {
    let result = match &cli.command {
        Some(Command::Version) => {
            handle_version_command();
            Ok(())
        }
        Some(Command::Options) => config.map(|config| run_options_command(&config)),
        Some(Command::Inis) => {
            let loader = build_config_loader(&cli.global);
            run_inis_command(&loader.format_loaded_files());
            Ok(())
        }
        Some(Command::Edit(args)) => match config {
            Ok(config) => run_edit_command(args, &config, config.global.dry).await,
            Err(e) => Err(e),
        },
        Some(Command::Resolve(args)) => match config {
            Ok(config) => run_resolve_command(args, &config).await,
            Err(e) => Err(e),
        },
        None => {
            eprintln!("No command specified. Use --help for usage information.");
            Err(anyhow::anyhow!("No command specified"))
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            exit_code_for(&e)
        }
    }
}

/// Rejected input exits with 2, everything else with 1.
fn exit_code_for(error: &anyhow::Error) -> ExitCode {
    match error.downcast_ref::<MassEditError>() {
        Some(e) if e.is_usage() => ExitCode::from(2),
        _ => ExitCode::FAILURE,
    }
}

fn handle_version_command() {
    println!("{}", env!("CARGO_PKG_VERSION"));
}

fn build_config_loader(global: &GlobalOptions) -> ConfigLoader {
    let mut loader = ConfigLoader::new();
    if !global.no_default_inis {
        loader = loader.add_toml_file_optional(DEFAULT_CONFIG_FILE);
    }
    for ini_path in &global.inis {
        loader = loader.add_toml_file(ini_path);
    }
    loader.with_env_prefix(ENV_PREFIX)
}

fn load_config(global: &GlobalOptions) -> mass_file_edit::error::Result<Config> {
    let mut loader = build_config_loader(global);
    for (key, value) in global.to_config_overrides() {
        loader = loader.set(&key, value)?;
    }
    loader.build().map_err(|e| {
        eprintln!("Failed to load config: {e}");
        anyhow::Error::from(e)
    })
}
