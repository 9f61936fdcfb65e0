use comfy_table::{Cell, Table};

use crate::error::Result;
use crate::variants;

pub fn run() -> Result<()> {
    let mut table = Table::new();
    table.set_header(vec!["BIC", "Institution", "Format"]);
    for (bic, institution, variant) in variants::SUPPORTED {
        table.add_row(vec![
            Cell::new(bic),
            Cell::new(institution),
            Cell::new(variant.key),
        ]);
    }
    println!("Supported banks\n{table}");
    Ok(())
}
