// mass-file-edit: batch file edits across hosted repositories
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! CLI module for mass-file-edit using clap derive.
//!
//! # Command Structure
//!
//! ```text
//! mfe [global options] <command>
//! version
//! options
//! inis
//! edit    [--request FILE] [--repo R].. [--topic T].. [--replace P PAT REP]..
//! resolve [--repo R].. [--topic T]..
//! ```

pub mod edit;
pub mod global;


use crate::cli::edit::{EditArgs, ResolveArgs};
use crate::cli::global::GlobalOptions;
use clap::{Parser, Subcommand};

/// Batch file edits across hosted repositories.
#[derive(Debug, Parser)]
#[command(
    name = "mfe",
    author,
    version,
    about = "Mass file editor for hosted Git repositories",
    long_about = "mass-file-edit Copyright (C) 2026 Romeo Ahmed\n\
                  This program comes with ABSOLUTELY NO WARRANTY\n\
                  This is free software, and you are welcome to redistribute it\n\
                  under certain conditions; see LICENSE for details.\n\n\
                  Applies the same file operations to many repositories through\n\
                  the hosting service API, one working branch per repository,\n\
                  optionally opening a pull request for each modified one.\n\n\
                  `mfe edit --repo svcA --replace deploy.yaml 'v1.0.0' 'v1.1.0' -m Bump`\n\
                  edits one repository. See `mfe <command> --help` for more.",
    after_help = "CONFIG FILES:\n\n\
                  mfe loads `mass-edit.toml` from the current directory if present.\n\
                  Additional files can be given with --ini and are loaded after it.\n\
                  MFE_SECTION__KEY environment variables and --set override both."
)]
pub struct Cli {
    /// Global options shared by all commands
    #[command(flatten)]
    pub global: GlobalOptions,

    /// Command to execute
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Shows the version.
    #[command(visible_alias = "-v")]
    Version,

    /// Lists all options and their values.
    Options,

    /// Lists the configuration files used.
    Inis,

    /// Applies file operations to the selected repositories.
    Edit(EditArgs),

    /// Lists the repositories a selection resolves to.
    Resolve(ResolveArgs),
}

/// Parses command-line arguments.
#[must_use]
pub fn parse() -> Cli {
    Cli::parse()
}

/// Parses command-line arguments from an iterator.
pub fn parse_from<I, T>(iter: I) -> Cli
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    Cli::parse_from(iter)
}

/// Tries to parse command-line arguments, returning an error on failure.
///
/// # Errors
///
/// Returns a `clap::Error` if the arguments are invalid or if help/version information
/// was requested.
pub fn try_parse() -> Result<Cli, clap::Error> {
    Cli::try_parse()
}
