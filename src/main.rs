//! pfe - a CLI tool for inspecting and editing typed XML preference files.

use std::process;

use clap::Parser;
use prefedit::cli::{Cli, Commands};
use prefedit::commands::{self, Output};
use prefedit::config::{Config, OutputFormat, Settings};

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            // A broken config file should not be silently ignored, but it
            // also should not block read-only commands; complain and use
            // the defaults.
            eprintln!("Warning: {}", e);
            Config::default()
        }
    };
    let settings = config.resolved();

    let human = cli.human_readable || settings.output_format == OutputFormat::Human;

    match run_command(cli.command, &settings) {
        Ok(output) => println!("{}", output.render(human)),
        Err(e) => {
            if human {
                eprintln!("Error: {}", e);
            } else {
                eprintln!(
                    "{}",
                    serde_json::json!({ "error": e.to_string() })
                );
            }
            process::exit(1);
        }
    }
}

fn run_command(command: Commands, settings: &Settings) -> Result<Output, prefedit::Error> {
    match command {
        Commands::Cat { file } => commands::cat(&file),
        Commands::Get { file, key } => commands::get(&file, &key),
        Commands::Keys { file } => commands::keys(&file),
        Commands::Set {
            file,
            key,
            value,
            kind,
            rename_from,
            save,
        } => commands::set(
            &file,
            &key,
            &value,
            kind,
            rename_from.as_deref(),
            &save,
            settings,
        ),
        Commands::Rm { file, key, save } => commands::rm(&file, &key, &save, settings),
        Commands::Save { file, from, save } => {
            commands::save(&file, from.as_deref(), &save, settings)
        }
        Commands::Validate { file } => commands::validate(&file),
    }
}
