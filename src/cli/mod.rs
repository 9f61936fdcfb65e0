pub mod banks;
pub mod convert;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(
    name = "umsatz",
    about = "Normalize Sparda-Bank CSV exports into accounting-ready transactions."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Parse one CSV statement export and print or write the result.
    Convert {
        /// Path to the CSV export
        file: String,
        /// Bank identifier code; selects the institution's format rules
        #[arg(long)]
        bic: String,
        /// Override the variant's field delimiter (single ASCII character)
        #[arg(long)]
        delimiter: Option<char>,
        /// Override the variant's encoding: latin1 | utf8
        #[arg(long)]
        encoding: Option<String>,
        /// Override the variant's date format (chrono pattern, e.g. %d.%m.%Y)
        #[arg(long = "date-format")]
        date_format: Option<String>,
        /// Output format
        #[arg(long, value_enum, default_value = "table")]
        format: OutputFormat,
        /// Write to a file instead of stdout
        #[arg(long)]
        output: Option<String>,
    },
    /// List supported bank identifier codes.
    Banks,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
    Csv,
}
