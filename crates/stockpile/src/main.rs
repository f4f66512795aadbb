//! `stockpile` - CLI for the stockpile inventory store
//!
//! Each invocation loads the backing file, runs one command, and exits with a
//! non-zero status if the command failed.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;

use stockpile::cli::render::{self, StatusReport};
use stockpile::cli::{Cli, Command, ConfigCommand};
use stockpile::{init_logging, Config, Outcome, Store};

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    init_logging(cli.verbosity());

    let mut config = Config::load_from(cli.config.clone()).context("loading configuration")?;
    if let Some(path) = cli.data_file {
        config.storage.data_file = Some(path);
    }

    match cli.command {
        Command::Config(config_cmd) => handle_config(&config, config_cmd),
        command => {
            let mut store = Store::from_config(&config);
            let loaded = store.load();
            if !loaded.ok {
                eprintln!("{}", loaded.message);
            }
            run(&mut store, &config, command)
        }
    }
}

fn run(store: &mut Store, config: &Config, command: Command) -> anyhow::Result<ExitCode> {
    let outcome = match command {
        Command::List(cmd) => {
            println!("{}", render::records(&store.list(), cmd.format)?);
            return Ok(ExitCode::SUCCESS);
        }
        Command::Show(cmd) => {
            return match store.lookup(&cmd.id) {
                Some(record) => {
                    println!("{}", render::record(&record, cmd.format)?);
                    Ok(ExitCode::SUCCESS)
                }
                None => {
                    eprintln!("no record with id '{}'", cmd.id.trim());
                    Ok(ExitCode::FAILURE)
                }
            };
        }
        Command::Search(cmd) => {
            println!("{}", render::records(&store.search(&cmd.query), cmd.format)?);
            return Ok(ExitCode::SUCCESS);
        }
        Command::Status(cmd) => {
            let report = StatusReport {
                data_file: store.path().to_path_buf(),
                records: store.len(),
                load: store
                    .load_message()
                    .cloned()
                    .unwrap_or_else(|| Outcome::success("not loaded")),
            };
            println!("{}", render::status(&report, cmd.json)?);
            return Ok(ExitCode::SUCCESS);
        }
        Command::Add(cmd) => store.add(cmd.to_record()),
        Command::Update(cmd) => store.update(&cmd.id, &cmd.to_patch()),
        Command::Remove(cmd) => store.remove(&cmd.id),
        Command::Export(cmd) => {
            let path = cmd.path.unwrap_or_else(|| config.export.csv_path.clone());
            store.export_csv(&path, &config.export_options())
        }
        Command::Config(cmd) => return handle_config(config, cmd),
    };
    Ok(report(&outcome))
}

fn report(outcome: &Outcome) -> ExitCode {
    if outcome.ok {
        println!("{}", outcome.message);
        ExitCode::SUCCESS
    } else {
        eprintln!("{}", outcome.message);
        ExitCode::FAILURE
    }
}

fn handle_config(config: &Config, cmd: ConfigCommand) -> anyhow::Result<ExitCode> {
    match cmd {
        ConfigCommand::Show { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(config)?);
            } else {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Storage]");
                println!("  Data file:          {}", config.data_file().display());
                println!("  Pretty JSON:        {}", config.storage.pretty);
                println!();
                println!("[Export]");
                println!("  CSV path:           {}", config.export.csv_path.display());
                println!("  Delimiter:          {:?}", config.export.delimiter);
                println!("  Price decimals:     {}", config.export.price_decimals);
            }
        }
        ConfigCommand::Path => {
            println!("{}", Config::default_config_path().display());
        }
        ConfigCommand::Validate { file } => {
            let path = file.unwrap_or_else(Config::default_config_path);
            println!("Validating configuration: {}", path.display());
            match Config::load_from(Some(path)) {
                Ok(_) => println!("Configuration is valid."),
                Err(e) => {
                    eprintln!("Configuration error: {e}");
                    return Ok(ExitCode::FAILURE);
                }
            }
        }
    }
    Ok(ExitCode::SUCCESS)
}
