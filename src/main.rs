//! Settings resolver CLI
//!
//! Resolves the layered settings once at startup, then prints or queries
//! the result.

use anyhow::Result;
use clap::Parser;
use settings_resolver::cli::{Cli, Command, FormatArg};
use settings_resolver::config::{Resolution, Settings, SettingsLoader, SettingsPaths};
use settings_resolver::format::{OutputFormat, Presentation, format_diagnostics, format_error};
use settings_resolver::logging::{self, LogTarget};
use std::sync::Arc;
use tracing::debug;

fn output_format(arg: FormatArg) -> OutputFormat {
    match arg {
        FormatArg::Json => OutputFormat::Json,
        FormatArg::Yaml => OutputFormat::Yaml,
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    logging::init(&LogTarget::parse(&cli.log), cli.verbose)?;

    let presentation = if cli.html {
        Presentation::Html
    } else {
        Presentation::Plain
    };

    let paths = match cli.dir {
        Some(ref dir) => SettingsPaths::with_dir(dir),
        None => SettingsPaths::discover(),
    };
    debug!(dir = %paths.dir.display(), "Resolving settings");

    // Missing or broken settings halt everything before any work starts
    let Resolution {
        settings,
        diagnostics,
        source,
    } = match SettingsLoader::new(paths).resolve() {
        Ok(resolution) => resolution,
        Err(err) => {
            print!("{}", format_error(&err, presentation));
            std::process::exit(1);
        }
    };
    let settings: Arc<Settings> = Arc::new(settings);

    match cli.command.unwrap_or(Command::Show {
        format: FormatArg::Json,
    }) {
        Command::Show { format } => {
            // Diagnostics go to stderr so stdout stays parseable
            eprint!("{}", format_diagnostics(&diagnostics, presentation));
            println!("{}", output_format(format).render(&settings)?);
        }
        Command::Get { path } => match settings.get(&path) {
            Some(value) => println!("{}", value),
            None => {
                eprintln!("No setting at '{}'", path);
                std::process::exit(1);
            }
        },
        Command::Check => {
            println!("source: {}", source);
            println!("diagnostics: {}", diagnostics.len());
            print!("{}", format_diagnostics(&diagnostics, presentation));
            if settings.display_errors() {
                println!("display_errors: on");
            }
            if let Some(dir) = settings.linked_modules_dir() {
                println!("modules: {}", dir.display());
            }
        }
    }

    Ok(())
}
