//! One-pass statement assembly: stream raw rows through the normalizer and
//! derive statement metadata once all rows are read. Any row failure aborts
//! the whole parse; a statement is never partially emitted.

use std::path::Path;

use crate::config::ParseConfig;
use crate::error::Result;
use crate::models::{Statement, StatementMetadata};
use crate::normalizer::{self, Normalizer};
use crate::reader::{self, StatementReader};

/// Sentinel the portal writes into the date column for bookings that are not
/// yet executed. Those rows are not part of the statement.
const PENDING_SENTINEL: &str = "* noch nicht ausgeführte Umsätze";

pub fn parse_statement(path: &Path, cfg: &ParseConfig) -> Result<Statement> {
    build(reader::open(path, cfg)?, cfg)
}

pub fn parse_bytes(bytes: &[u8], cfg: &ParseConfig) -> Result<Statement> {
    build(reader::from_bytes(bytes, cfg)?, cfg)
}

fn build(statement_reader: StatementReader, cfg: &ParseConfig) -> Result<Statement> {
    let preamble = statement_reader.preamble;
    let date_column = cfg.variant().columns.date;
    let account_id = preamble.account_number.clone();
    let namespace = account_id.clone().unwrap_or_else(|| cfg.bic.clone());

    let mut normalizer = Normalizer::new(cfg, namespace);
    let mut transactions = Vec::new();
    for row in statement_reader.rows {
        let row = row?;
        if row.get(date_column).map(str::trim) == Some(PENDING_SENTINEL) {
            continue;
        }
        transactions.push(normalizer.normalize(&row)?);
    }

    let metadata = StatementMetadata {
        bic: cfg.bic.clone(),
        currency: preamble
            .currency
            .unwrap_or_else(|| cfg.variant().currency.to_string()),
        account_id,
        start_date: transactions.iter().map(|t| t.date).min(),
        end_date: transactions.iter().map(|t| t.date).max(),
        closing_balance: preamble
            .closing_balance
            .as_deref()
            .and_then(normalizer::parse_decimal),
    };

    Ok(Statement {
        metadata,
        transactions,
    })
}
