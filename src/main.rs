mod cli;
mod config;
mod error;
mod fmt;
mod models;
mod normalizer;
mod parser;
mod reader;
mod render;
mod sepa;
mod variants;

use clap::Parser;

use cli::{Cli, Commands};

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Convert {
            file,
            bic,
            delimiter,
            encoding,
            date_format,
            format,
            output,
        } => cli::convert::run(
            &file,
            &bic,
            delimiter,
            encoding.as_deref(),
            date_format.as_deref(),
            format,
            output.as_deref(),
        ),
        Commands::Banks => cli::banks::run(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
