// Copyright 2025 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use log::LevelFilter;

mod commands;

use crate::commands::StoreArgs;

#[derive(Parser)]
#[command(name = "qmeas", version, about = "Inspect and edit qmeas parameter stores")]
struct Cli {
    /// Log diagnostics, e.g. every file write.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the parameters of a store file.
    Show { file: PathBuf },
    /// Add a parameter, or replace it with `--update`.
    Set {
        #[command(flatten)]
        store: StoreArgs,
        key: String,
        /// JSON value; anything that is not valid JSON is stored as a string.
        value: String,
        #[arg(long)]
        update: bool,
    },
    /// Remove a parameter.
    Delete {
        #[command(flatten)]
        store: StoreArgs,
        key: String,
    },
}

fn init_logger(verbose: bool) {
    let level = if verbose {
        LevelFilter::Info
    } else {
        LevelFilter::Warn
    };
    env_logger::Builder::new()
        .filter_module(qmeas_log::TARGET_PREFIX, level)
        .parse_default_env()
        .init();
    qmeas_log::init_logging(verbose);
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logger(cli.verbose);
    let output = match cli.command {
        Command::Show { file } => commands::show(&file),
        Command::Set {
            store,
            key,
            value,
            update,
        } => commands::set(&store, &key, &value, update),
        Command::Delete { store, key } => commands::delete(&store, &key),
    };
    match output {
        Ok(text) => {
            print!("{text}");
            ExitCode::SUCCESS
        }
        Err(error) => {
            eprintln!("Error: {error:#}");
            ExitCode::FAILURE
        }
    }
}
