//! Statement reader: decodes the export, captures preamble metadata, locates
//! the transaction header within a bounded lookahead window, and yields raw
//! rows lazily in file order.

use std::io::Cursor;
use std::path::Path;

use crate::config::ParseConfig;
use crate::error::{Result, UmsatzError};
use crate::models::RawRow;
use crate::variants::Encoding;

/// Whatever the export prepends before the transaction header. Sparda files
/// carry a title line, account-holder lines, and a summary row with account
/// number, balance, and currency. All of it is optional.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Preamble {
    pub account_number: Option<String>,
    pub currency: Option<String>,
    /// Raw balance string, still in the regional decimal format.
    pub closing_balance: Option<String>,
}

pub struct StatementReader {
    pub preamble: Preamble,
    pub rows: StatementRows,
}

/// Lazy iterator over data rows. Finite, consumed once, file order.
pub struct StatementRows {
    header: Vec<String>,
    records: csv::StringRecordsIntoIter<Cursor<Vec<u8>>>,
    next_index: usize,
}

impl Iterator for StatementRows {
    type Item = Result<RawRow>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let record = match self.records.next()? {
                Ok(record) => record,
                Err(e) => return Some(Err(e.into())),
            };
            // Trailing blank lines and all-empty separator rows.
            if record.iter().all(|f| f.trim().is_empty()) {
                continue;
            }
            self.next_index += 1;
            if record.len() != self.header.len() {
                return Some(Err(UmsatzError::Format(format!(
                    "data row {} has {} columns, header has {}",
                    self.next_index,
                    record.len(),
                    self.header.len()
                ))));
            }
            let fields = self
                .header
                .iter()
                .cloned()
                .zip(record.iter().map(|v| v.to_string()))
                .collect();
            return Some(Ok(RawRow {
                index: self.next_index,
                fields,
            }));
        }
    }
}

pub fn open(path: &Path, cfg: &ParseConfig) -> Result<StatementReader> {
    let bytes = std::fs::read(path)?;
    from_bytes(&bytes, cfg)
}

pub fn from_bytes(bytes: &[u8], cfg: &ParseConfig) -> Result<StatementReader> {
    let text = decode(bytes, cfg.encoding())?;
    let rdr = csv::ReaderBuilder::new()
        .delimiter(cfg.delimiter())
        .has_headers(false)
        .flexible(true)
        .from_reader(Cursor::new(text.into_bytes()));

    let variant = cfg.variant();
    let tokens = variant.required_header_tokens();
    let mut records = rdr.into_records();
    let mut preamble = Preamble::default();
    let mut summary_header: Option<Vec<String>> = None;
    let mut header: Option<Vec<String>> = None;
    let mut scanned = 0;

    while scanned < variant.header_lookahead {
        let Some(record) = records.next() else { break };
        let record = record?;
        scanned += 1;
        let fields: Vec<String> = record.iter().map(|f| f.trim().to_string()).collect();

        if tokens.iter().all(|t| fields.iter().any(|f| f == t)) {
            header = Some(fields);
            break;
        }
        capture_preamble(&mut preamble, &mut summary_header, &fields);
    }

    let header = header.ok_or_else(|| {
        UmsatzError::Format(format!(
            "no header row containing {:?} within the first {} lines",
            tokens, variant.header_lookahead
        ))
    })?;

    Ok(StatementReader {
        preamble,
        rows: StatementRows {
            header,
            records,
            next_index: 0,
        },
    })
}

/// Picks account number, currency, and balance out of the preamble lines.
/// Two shapes occur: a summary header row ("Kontonummer";"Saldo";"Währung";…)
/// followed by a value row, and plain key/value pairs ("Kontonummer:";"123").
fn capture_preamble(
    preamble: &mut Preamble,
    summary_header: &mut Option<Vec<String>>,
    fields: &[String],
) {
    if let Some(names) = summary_header.take() {
        for (name, value) in names.iter().zip(fields.iter()) {
            let value = value.trim();
            if value.is_empty() {
                continue;
            }
            match name.as_str() {
                "Kontonummer" => preamble.account_number = Some(value.to_string()),
                "Währung" => preamble.currency = Some(value.to_string()),
                "Saldo" => preamble.closing_balance = Some(value.to_string()),
                _ => {}
            }
        }
        return;
    }

    if fields.len() > 1 && fields.iter().any(|f| f == "Kontonummer") {
        *summary_header = Some(fields.to_vec());
        return;
    }

    if fields.len() == 2 {
        let value = fields[1].trim();
        if value.is_empty() {
            return;
        }
        match fields[0].trim_end_matches(':').trim() {
            "Kontonummer" => preamble.account_number = Some(value.to_string()),
            "Währung" => preamble.currency = Some(value.to_string()),
            "Saldo" => preamble.closing_balance = Some(value.to_string()),
            _ => {}
        }
    }
}

fn decode(bytes: &[u8], encoding: Encoding) -> Result<String> {
    match encoding {
        Encoding::Latin1 => Ok(bytes.iter().map(|&b| b as char).collect()),
        Encoding::Utf8 => {
            let bytes = bytes.strip_prefix(b"\xef\xbb\xbf").unwrap_or(bytes);
            String::from_utf8(bytes.to_vec())
                .map_err(|_| UmsatzError::Format("input is not valid UTF-8".to_string()))
        }
    }
}
