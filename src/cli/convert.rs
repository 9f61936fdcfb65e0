use std::path::PathBuf;

use colored::Colorize;

use crate::cli::OutputFormat;
use crate::config::ParseConfig;
use crate::error::{Result, UmsatzError};
use crate::parser::parse_statement;
use crate::render;
use crate::variants::Encoding;

#[allow(clippy::too_many_arguments)]
pub fn run(
    file: &str,
    bic: &str,
    delimiter: Option<char>,
    encoding: Option<&str>,
    date_format: Option<&str>,
    format: OutputFormat,
    output: Option<&str>,
) -> Result<()> {
    let mut cfg = ParseConfig::new(bic)?;
    if let Some(d) = delimiter {
        if !d.is_ascii() {
            return Err(UmsatzError::Format(format!(
                "delimiter must be a single ASCII character, got {d:?}"
            )));
        }
        cfg.delimiter_override = Some(d as u8);
    }
    if let Some(e) = encoding {
        cfg.encoding_override = Some(Encoding::from_flag(e).ok_or_else(|| {
            UmsatzError::Format(format!("unknown encoding {e:?} (expected latin1 or utf8)"))
        })?);
    }
    if let Some(f) = date_format {
        cfg.date_format_override = Some(f.to_string());
    }

    let statement = parse_statement(&PathBuf::from(file), &cfg)?;

    let rendered = match format {
        OutputFormat::Table => render::to_table(&statement),
        OutputFormat::Json => render::to_json(&statement)?,
        OutputFormat::Csv => render::to_csv(&statement)?,
    };

    match output {
        Some(path) => {
            std::fs::write(path, rendered.as_bytes())?;
            println!("Wrote {path}");
        }
        None => println!("{rendered}"),
    }

    let range = match (statement.metadata.start_date, statement.metadata.end_date) {
        (Some(start), Some(end)) => {
            format!(", {} to {}", start.format("%d.%m.%Y"), end.format("%d.%m.%Y"))
        }
        _ => String::new(),
    };
    println!(
        "{}",
        format!(
            "{} transactions ({}{})",
            statement.transactions.len(),
            statement.metadata.currency,
            range
        )
        .green()
    );
    Ok(())
}
