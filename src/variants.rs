//! Per-institution format descriptors, keyed by BIC.
//!
//! Every regional Sparda bank exports the same data but not the same CSV:
//! delimiters, encodings, column names and sign conventions differ. Each
//! supported layout is one plain-data descriptor; the parser never branches
//! on the institution itself.

use crate::error::{Result, UmsatzError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    Latin1,
    Utf8,
}

impl Encoding {
    pub fn from_flag(flag: &str) -> Option<Self> {
        match flag.to_ascii_lowercase().as_str() {
            "latin1" | "latin-1" | "iso-8859-1" => Some(Self::Latin1),
            "utf8" | "utf-8" => Some(Self::Utf8),
            _ => None,
        }
    }
}

/// How a row encodes whether money left or entered the account.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignRule {
    /// The amount column carries a numeric sign ("-12,34").
    Signed,
    /// Separate debit and credit amount columns; exactly one is filled.
    DebitCredit {
        debit: &'static str,
        credit: &'static str,
    },
    /// A dedicated column holds a debit/credit marker letter.
    MarkerColumn {
        column: &'static str,
        debit: char,
        credit: char,
    },
    /// The amount value itself ends in the marker ("1.234,56S").
    TrailingMarker { debit: char, credit: char },
}

#[derive(Debug, Clone, Copy)]
pub struct Columns {
    pub date: &'static str,
    pub amount: Option<&'static str>,
    pub payee: Option<&'static str>,
    pub purpose: Option<&'static str>,
    pub reference: Option<&'static str>,
    pub currency: Option<&'static str>,
    pub txn_type: Option<&'static str>,
}

#[derive(Debug, Clone, Copy)]
pub struct BankVariant {
    pub key: &'static str,
    pub delimiter: u8,
    pub encoding: Encoding,
    pub date_format: &'static str,
    pub columns: Columns,
    pub sign: SignRule,
    /// ISO 4217 fallback when the file does not name its currency.
    pub currency: &'static str,
    /// How many leading lines may precede the column header.
    pub header_lookahead: usize,
}

impl BankVariant {
    /// Column names a line must contain to count as the transaction header.
    pub fn required_header_tokens(&self) -> Vec<&'static str> {
        let mut tokens = vec![self.columns.date];
        if let Some(amount) = self.columns.amount {
            tokens.push(amount);
        }
        match self.sign {
            SignRule::DebitCredit { debit, credit } => {
                tokens.push(debit);
                tokens.push(credit);
            }
            SignRule::MarkerColumn { column, .. } => tokens.push(column),
            SignRule::Signed | SignRule::TrailingMarker { .. } => {}
        }
        tokens
    }
}

/// Online-banking export: quoted-all, semicolon, Latin-1, preamble block with
/// account holder and a summary row, signed amount column.
const NETBANK: BankVariant = BankVariant {
    key: "sparda_netbank",
    delimiter: b';',
    encoding: Encoding::Latin1,
    date_format: "%d.%m.%Y",
    columns: Columns {
        date: "Buchungstag",
        amount: Some("Umsatz"),
        payee: None,
        purpose: Some("Verwendungszweck"),
        reference: None,
        currency: Some("Währung"),
        txn_type: None,
    },
    sign: SignRule::Signed,
    currency: "EUR",
    header_lookahead: 20,
};

/// Newer web-portal export: UTF-8, payee in its own column, signed amount.
const PORTAL: BankVariant = BankVariant {
    key: "sparda_portal",
    delimiter: b';',
    encoding: Encoding::Utf8,
    date_format: "%d.%m.%Y",
    columns: Columns {
        date: "Buchungstag",
        amount: Some("Betrag"),
        payee: Some("Empfänger"),
        purpose: Some("Verwendungszweck"),
        reference: Some("Referenz"),
        currency: None,
        txn_type: None,
    },
    sign: SignRule::Signed,
    currency: "EUR",
    header_lookahead: 10,
};

/// Branch-terminal export: unsigned Soll/Haben amount columns.
const FILIALE: BankVariant = BankVariant {
    key: "sparda_filiale",
    delimiter: b';',
    encoding: Encoding::Latin1,
    date_format: "%d.%m.%Y",
    columns: Columns {
        date: "Buchungstag",
        amount: None,
        payee: None,
        purpose: Some("Verwendungszweck"),
        reference: None,
        currency: Some("Währung"),
        txn_type: None,
    },
    sign: SignRule::DebitCredit {
        debit: "Soll",
        credit: "Haben",
    },
    currency: "EUR",
    header_lookahead: 20,
};

/// Umsatzanzeige export: unsigned amount plus an S/H marker column and an
/// explicit booking-kind column.
const UMSATZANZEIGE: BankVariant = BankVariant {
    key: "sparda_umsatzanzeige",
    delimiter: b';',
    encoding: Encoding::Latin1,
    date_format: "%d.%m.%Y",
    columns: Columns {
        date: "Buchungstag",
        amount: Some("Umsatz"),
        payee: Some("Name Zahlungsbeteiligter"),
        purpose: Some("Verwendungszweck"),
        reference: None,
        currency: Some("Währung"),
        txn_type: Some("Umsatzart"),
    },
    sign: SignRule::MarkerColumn {
        column: "Soll/Haben",
        debit: 'S',
        credit: 'H',
    },
    currency: "EUR",
    header_lookahead: 20,
};

/// Legacy archive export: the amount string carries a trailing S/H marker.
const ARCHIV: BankVariant = BankVariant {
    key: "sparda_archiv",
    delimiter: b';',
    encoding: Encoding::Latin1,
    date_format: "%d.%m.%y",
    columns: Columns {
        date: "Buchungstag",
        amount: Some("Betrag"),
        payee: Some("Empfänger"),
        purpose: Some("Verwendungszweck"),
        reference: None,
        currency: None,
        txn_type: None,
    },
    sign: SignRule::TrailingMarker {
        debit: 'S',
        credit: 'H',
    },
    currency: "EUR",
    header_lookahead: 20,
};

/// Supported institutions: (BIC, institution name, format descriptor).
pub const SUPPORTED: &[(&str, &str, &BankVariant)] = &[
    ("GENODED1SPE", "Sparda-Bank West", &NETBANK),
    ("GENODEF1S04", "Sparda-Bank Hannover", &NETBANK),
    ("GENODEF1S08", "Sparda-Bank München", &NETBANK),
    ("GENODEF1S11", "Sparda-Bank Hamburg", &NETBANK),
    ("GENODEF1S02", "Sparda-Bank Baden-Württemberg", &PORTAL),
    ("GENODEF1S06", "Sparda-Bank Augsburg", &PORTAL),
    ("GENODEF1S09", "Sparda-Bank Ostbayern", &FILIALE),
    ("GENODEF1S10", "Sparda-Bank Berlin", &UMSATZANZEIGE),
    ("GENODEF1S03", "Sparda-Bank Nürnberg", &ARCHIV),
];

pub fn for_bic(bic: &str) -> Result<&'static BankVariant> {
    SUPPORTED
        .iter()
        .find(|(code, _, _)| code.eq_ignore_ascii_case(bic.trim()))
        .map(|(_, _, variant)| *variant)
        .ok_or_else(|| UmsatzError::UnknownBank(bic.to_string()))
}
