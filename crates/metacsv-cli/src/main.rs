//! MetaCSV CLI - convert and inspect documentation-aware CSV files.

mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};

fn main() {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    let result = match cli.command {
        Commands::Convert {
            format,
            readfile,
            writefile,
            header,
        } => commands::convert::run(format, readfile, writefile, header, cli.verbose),

        Commands::Header {
            readfile,
            writefile,
        } => commands::header::run(readfile, writefile, cli.verbose),

        Commands::Version { readfile } => commands::version::run(readfile, cli.verbose),

        Commands::Info {
            readfile,
            header,
            json,
        } => commands::info::run(readfile, header, json, cli.verbose),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
