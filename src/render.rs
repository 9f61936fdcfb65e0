//! Serialize a parsed statement for the host: human-readable table, JSON,
//! or flat CSV.

use comfy_table::{Cell, Table};

use crate::error::Result;
use crate::fmt::money;
use crate::models::Statement;

pub fn to_table(statement: &Statement) -> String {
    let mut table = Table::new();
    table.set_header(vec!["ID", "Date", "Amount", "Type", "Payee", "Memo"]);
    for txn in &statement.transactions {
        table.add_row(vec![
            Cell::new(&txn.id),
            Cell::new(txn.date.format("%d.%m.%Y")),
            Cell::new(money(txn.amount)),
            Cell::new(txn.transaction_type.label()),
            Cell::new(&txn.payee),
            Cell::new(txn.memo.as_deref().unwrap_or_default()),
        ]);
    }
    table.to_string()
}

pub fn to_json(statement: &Statement) -> Result<String> {
    serde_json::to_string_pretty(statement)
        .map_err(|e| crate::error::UmsatzError::Format(format!("JSON serialization: {e}")))
}

pub fn to_csv(statement: &Statement) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(Vec::new());
    wtr.write_record(["id", "date", "amount", "type", "payee", "memo"])?;
    for txn in &statement.transactions {
        let date = txn.date.format("%Y-%m-%d").to_string();
        let amount = txn.amount.to_string();
        wtr.write_record([
            txn.id.as_str(),
            date.as_str(),
            amount.as_str(),
            txn.transaction_type.label(),
            txn.payee.as_str(),
            txn.memo.as_deref().unwrap_or_default(),
        ])?;
    }
    let bytes = wtr
        .into_inner()
        .map_err(|e| crate::error::UmsatzError::Format(format!("CSV output: {e}")))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}
