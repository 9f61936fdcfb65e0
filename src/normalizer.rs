//! Row normalizer: turns one raw CSV row into one canonical transaction.
//! Pure per-row except for the sequence counter that disambiguates derived
//! identifiers within a statement.

use std::collections::HashMap;
use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sha2::{Digest, Sha256};

use crate::config::ParseConfig;
use crate::error::{Result, UmsatzError};
use crate::models::{RawRow, Transaction, TransactionType};
use crate::sepa::{self, SepaFields};
use crate::variants::SignRule;

/// Placeholder banks put into the end-to-end reference when none was given.
const NO_REFERENCE: &str = "NOTPROVIDED";

pub struct Normalizer<'a> {
    cfg: &'a ParseConfig,
    /// Identifier namespace: the statement's account number, or the BIC when
    /// the preamble carried none.
    account: String,
    seen_ids: HashMap<String, u32>,
}

impl<'a> Normalizer<'a> {
    pub fn new(cfg: &'a ParseConfig, account: impl Into<String>) -> Self {
        Self {
            cfg,
            account: account.into(),
            seen_ids: HashMap::new(),
        }
    }

    pub fn normalize(&mut self, row: &RawRow) -> Result<Transaction> {
        let cols = &self.cfg.variant().columns;

        let date = self.parse_date_field(row, cols.date)?;
        let amount = self.parse_amount_field(row)?;

        let purpose_text = cols
            .purpose
            .and_then(|c| row.get_non_empty(c))
            .map(sepa::repair_wrapped_text);
        let fields = purpose_text.as_deref().map(sepa::split_fields);

        let payee = assemble_payee(row, cols.payee, fields.as_ref());
        let memo = assemble_memo(fields.as_ref(), purpose_text.as_deref(), &payee);

        let transaction_type = cols
            .txn_type
            .and_then(|c| row.get_non_empty(c))
            .and_then(type_from_text)
            .or_else(|| {
                fields
                    .as_ref()
                    .and_then(|f| f.kind.as_deref())
                    .and_then(type_from_text)
            })
            .or_else(|| purpose_text.as_deref().and_then(type_from_text))
            .unwrap_or(if amount.is_sign_negative() {
                TransactionType::Debit
            } else {
                TransactionType::Credit
            });

        let reference = cols
            .reference
            .and_then(|c| row.get_non_empty(c))
            .map(str::to_string)
            .or_else(|| {
                fields
                    .as_ref()
                    .and_then(|f| f.end_to_end_ref.clone())
                    .filter(|r| r != NO_REFERENCE)
            });

        let id = match reference {
            Some(reference) => self.uniquify(format!("{}:{}", self.account, reference)),
            None => self.derive_id(date, amount, &payee, memo.as_deref()),
        };

        Ok(Transaction {
            id,
            date,
            amount,
            transaction_type,
            payee,
            memo,
        })
    }

    fn parse_date_field(&self, row: &RawRow, column: &str) -> Result<NaiveDate> {
        let raw = row.get(column).unwrap_or("").trim();
        NaiveDate::parse_from_str(raw, self.cfg.date_format())
            .map_err(|_| self.parse_err(row, column, raw))
    }

    /// Signed amount per the variant's sign rule: negative = debit.
    fn parse_amount_field(&self, row: &RawRow) -> Result<Decimal> {
        let variant = self.cfg.variant();
        match variant.sign {
            SignRule::Signed => {
                let column = self.amount_column()?;
                let raw = row.get(column).unwrap_or("").trim();
                parse_decimal(raw).ok_or_else(|| self.parse_err(row, column, raw))
            }
            SignRule::DebitCredit { debit, credit } => {
                match (row.get_non_empty(debit), row.get_non_empty(credit)) {
                    (Some(raw), None) => parse_decimal(raw)
                        .map(|v| -v.abs())
                        .ok_or_else(|| self.parse_err(row, debit, raw)),
                    (None, Some(raw)) => parse_decimal(raw)
                        .map(|v| v.abs())
                        .ok_or_else(|| self.parse_err(row, credit, raw)),
                    _ => Err(UmsatzError::Parse {
                        row: row.index,
                        field: format!("{debit}/{credit}"),
                        value: "exactly one of the two columns must be filled".to_string(),
                    }),
                }
            }
            SignRule::MarkerColumn {
                column: marker_col,
                debit,
                credit,
            } => {
                let column = self.amount_column()?;
                let raw = row.get(column).unwrap_or("").trim();
                let value = parse_decimal(raw)
                    .map(|v| v.abs())
                    .ok_or_else(|| self.parse_err(row, column, raw))?;
                let marker = row.get(marker_col).unwrap_or("").trim();
                if marker.eq_ignore_ascii_case(&debit.to_string()) {
                    Ok(-value)
                } else if marker.eq_ignore_ascii_case(&credit.to_string()) {
                    Ok(value)
                } else {
                    Err(self.parse_err(row, marker_col, marker))
                }
            }
            SignRule::TrailingMarker { debit, credit } => {
                let column = self.amount_column()?;
                let raw = row.get(column).unwrap_or("").trim();
                let (magnitude, negative) = if let Some(rest) = strip_marker(raw, debit) {
                    (rest, true)
                } else if let Some(rest) = strip_marker(raw, credit) {
                    (rest, false)
                } else {
                    return Err(self.parse_err(row, column, raw));
                };
                let value = parse_decimal(magnitude)
                    .map(|v| v.abs())
                    .ok_or_else(|| self.parse_err(row, column, raw))?;
                Ok(if negative { -value } else { value })
            }
        }
    }

    fn amount_column(&self) -> Result<&'static str> {
        self.cfg.variant().columns.amount.ok_or_else(|| {
            UmsatzError::Format(format!(
                "variant {} declares no amount column",
                self.cfg.variant().key
            ))
        })
    }

    fn parse_err(&self, row: &RawRow, field: &str, value: &str) -> UmsatzError {
        UmsatzError::Parse {
            row: row.index,
            field: field.to_string(),
            value: value.to_string(),
        }
    }

    /// No bank reference: hash the row's stable fields. The date prefix keeps
    /// ids sortable; a running suffix separates same-day repeats of the same
    /// hash, in row order.
    fn derive_id(
        &mut self,
        date: NaiveDate,
        amount: Decimal,
        payee: &str,
        memo: Option<&str>,
    ) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.account.as_bytes());
        hasher.update(b"|");
        hasher.update(date.format("%Y-%m-%d").to_string().as_bytes());
        hasher.update(b"|");
        hasher.update(amount.to_string().as_bytes());
        hasher.update(b"|");
        hasher.update(payee.as_bytes());
        hasher.update(b"|");
        hasher.update(memo.unwrap_or("").as_bytes());
        let digest = hex::encode(hasher.finalize());
        self.uniquify(format!("{}-{}", date.format("%Y%m%d"), &digest[..12]))
    }

    fn uniquify(&mut self, id: String) -> String {
        let count = self.seen_ids.entry(id.clone()).or_insert(0);
        *count += 1;
        if *count == 1 {
            id
        } else {
            format!("{id}-{count}")
        }
    }
}

/// Regional decimal convention: '.' groups thousands, ',' separates cents.
/// Returns a value rescaled to two fractional digits.
pub fn parse_decimal(raw: &str) -> Option<Decimal> {
    let s = raw
        .trim()
        .trim_matches('"')
        .trim_end_matches('€')
        .trim()
        .replace(['.', ' ', '\u{a0}'], "")
        .replace(',', ".");
    if s.is_empty() {
        return None;
    }
    let mut value = Decimal::from_str(&s).ok()?;
    value.rescale(2);
    Some(value)
}

fn strip_marker(raw: &str, marker: char) -> Option<&str> {
    let rest = raw.strip_suffix(marker)?;
    Some(rest.trim_end())
}

/// Payee assembly order: explicit payee column, then the counterparty split
/// off the purpose text, then deviating originator/recipient tags, then the
/// untagged leading text.
fn assemble_payee(row: &RawRow, payee_col: Option<&'static str>, fields: Option<&SepaFields>) -> String {
    payee_col
        .and_then(|c| row.get_non_empty(c))
        .map(sepa::collapse_whitespace)
        .or_else(|| fields.and_then(|f| f.recipient.clone()))
        .or_else(|| fields.and_then(|f| f.alt_payer.clone()))
        .or_else(|| fields.and_then(|f| f.alt_recipient.clone()))
        .or_else(|| fields.and_then(|f| f.leading.clone()))
        .unwrap_or_default()
}

/// The SVWZ+ remittance text when tagged, the merchant reference for card
/// payments, otherwise the whole purpose field; dropped when it would just
/// repeat the payee.
fn assemble_memo(
    fields: Option<&SepaFields>,
    purpose_text: Option<&str>,
    payee: &str,
) -> Option<String> {
    fields
        .and_then(|f| f.purpose.clone())
        .or_else(|| fields.and_then(|f| f.card_reference.clone()))
        .or_else(|| purpose_text.map(sepa::collapse_whitespace))
        .filter(|memo| !memo.is_empty() && memo != payee)
}

/// Keyword table for the coarse transaction type. Checked against the type
/// column, the SEPA kind token, and finally the whole purpose text.
fn type_from_text(text: &str) -> Option<TransactionType> {
    let haystack = text.to_uppercase();
    for (needle, transaction_type) in [
        ("ÜBERWEISUNG", TransactionType::Transfer),
        ("LOHN/GEHALT", TransactionType::Transfer),
        ("DAUERAUFTRAG", TransactionType::Transfer),
        ("GUTSCHRIFT", TransactionType::Credit),
        ("LASTSCHRIFT", TransactionType::Debit),
        ("GIROCARD", TransactionType::Debit),
        ("NICHT GIRO", TransactionType::Debit),
        ("KARTENZAHLUNG", TransactionType::Debit),
        ("ENTGELT", TransactionType::Fee),
        ("GEBÜHR", TransactionType::Fee),
        ("ABSCHLUSS", TransactionType::Fee),
    ] {
        if haystack.contains(needle) {
            return Some(transaction_type);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn row(fields: &[(&str, &str)]) -> RawRow {
        RawRow {
            index: 1,
            fields: fields
                .iter()
                .map(|(n, v)| (n.to_string(), v.to_string()))
                .collect(),
        }
    }

    fn cfg(bic: &str) -> ParseConfig {
        ParseConfig::new(bic).unwrap()
    }

    #[test]
    fn test_parse_decimal_german_formats() {
        assert_eq!(parse_decimal("-12,34"), Some(dec("-12.34")));
        assert_eq!(parse_decimal("1.234,56"), Some(dec("1234.56")));
        assert_eq!(parse_decimal("\"2.000,00\""), Some(dec("2000.00")));
        assert_eq!(parse_decimal("15"), Some(dec("15.00")));
        assert_eq!(parse_decimal("0,5"), Some(dec("0.50")));
        assert_eq!(parse_decimal(""), None);
        assert_eq!(parse_decimal("abc"), None);
    }

    #[test]
    fn test_normalize_portal_row() {
        let config = cfg("GENODEF1S06");
        let mut normalizer = Normalizer::new(&config, "GENODEF1S06");
        let txn = normalizer
            .normalize(&row(&[
                ("Buchungstag", "01.03.2024"),
                ("Betrag", "-12,34"),
                ("Empfänger", "Supermarkt"),
            ]))
            .unwrap();
        assert_eq!(txn.date, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
        assert_eq!(txn.amount, dec("-12.34"));
        assert_eq!(txn.payee, "Supermarkt");
        assert_eq!(txn.transaction_type, TransactionType::Debit);
        assert!(txn.id.starts_with("20240301-"));
    }

    #[test]
    fn test_bad_date_names_row_and_field() {
        let config = cfg("GENODEF1S06");
        let mut normalizer = Normalizer::new(&config, "acct");
        let err = normalizer
            .normalize(&row(&[
                ("Buchungstag", "2024-03-01"),
                ("Betrag", "-12,34"),
                ("Empfänger", "Supermarkt"),
            ]))
            .unwrap_err();
        match err {
            UmsatzError::Parse { row, field, value } => {
                assert_eq!(row, 1);
                assert_eq!(field, "Buchungstag");
                assert_eq!(value, "2024-03-01");
            }
            other => panic!("expected Parse error, got {other:?}"),
        }
    }

    #[test]
    fn test_bad_amount_is_parse_error() {
        let config = cfg("GENODEF1S06");
        let mut normalizer = Normalizer::new(&config, "acct");
        let err = normalizer
            .normalize(&row(&[
                ("Buchungstag", "01.03.2024"),
                ("Betrag", "zwölf"),
                ("Empfänger", "Supermarkt"),
            ]))
            .unwrap_err();
        assert!(matches!(err, UmsatzError::Parse { ref field, .. } if field == "Betrag"));
    }

    #[test]
    fn test_debit_credit_split_columns() {
        let config = cfg("GENODEF1S09");
        let mut normalizer = Normalizer::new(&config, "acct");
        let debit = normalizer
            .normalize(&row(&[
                ("Buchungstag", "05.04.2024"),
                ("Verwendungszweck", "Strom Abschlag"),
                ("Soll", "80,00"),
                ("Haben", ""),
            ]))
            .unwrap();
        assert_eq!(debit.amount, dec("-80.00"));

        let credit = normalizer
            .normalize(&row(&[
                ("Buchungstag", "06.04.2024"),
                ("Verwendungszweck", "Erstattung"),
                ("Soll", ""),
                ("Haben", "80,00"),
            ]))
            .unwrap();
        assert_eq!(credit.amount, dec("80.00"));
    }

    #[test]
    fn test_debit_credit_both_empty_fails() {
        let config = cfg("GENODEF1S09");
        let mut normalizer = Normalizer::new(&config, "acct");
        let err = normalizer
            .normalize(&row(&[
                ("Buchungstag", "05.04.2024"),
                ("Verwendungszweck", "x"),
                ("Soll", ""),
                ("Haben", ""),
            ]))
            .unwrap_err();
        assert!(matches!(err, UmsatzError::Parse { .. }));
    }

    #[test]
    fn test_marker_column_sign() {
        let config = cfg("GENODEF1S10");
        let mut normalizer = Normalizer::new(&config, "acct");
        let txn = normalizer
            .normalize(&row(&[
                ("Buchungstag", "10.05.2024"),
                ("Umsatz", "12,34"),
                ("Soll/Haben", "S"),
                ("Umsatzart", "Lastschrift"),
                ("Name Zahlungsbeteiligter", "Stadtwerke"),
                ("Verwendungszweck", "Abschlag Mai"),
            ]))
            .unwrap();
        assert_eq!(txn.amount, dec("-12.34"));
        assert_eq!(txn.transaction_type, TransactionType::Debit);
        assert_eq!(txn.payee, "Stadtwerke");
    }

    #[test]
    fn test_trailing_marker_sign() {
        let config = cfg("GENODEF1S03");
        let mut normalizer = Normalizer::new(&config, "acct");
        let debit = normalizer
            .normalize(&row(&[
                ("Buchungstag", "01.03.24"),
                ("Betrag", "1.234,56S"),
                ("Empfänger", "Vermieter"),
            ]))
            .unwrap();
        assert_eq!(debit.amount, dec("-1234.56"));

        let credit = normalizer
            .normalize(&row(&[
                ("Buchungstag", "02.03.24"),
                ("Betrag", "99,00H"),
                ("Empfänger", "Arbeitgeber"),
            ]))
            .unwrap();
        assert_eq!(credit.amount, dec("99.00"));
    }

    #[test]
    fn test_type_column_beats_keywords() {
        let config = cfg("GENODEF1S10");
        let mut normalizer = Normalizer::new(&config, "acct");
        let txn = normalizer
            .normalize(&row(&[
                ("Buchungstag", "10.05.2024"),
                ("Umsatz", "500,00"),
                ("Soll/Haben", "H"),
                ("Umsatzart", "Überweisung"),
                ("Name Zahlungsbeteiligter", "Kunde"),
                ("Verwendungszweck", "Rechnung 4711"),
            ]))
            .unwrap();
        assert_eq!(txn.transaction_type, TransactionType::Transfer);
    }

    #[test]
    fn test_sepa_purpose_becomes_memo_and_payee() {
        let config = cfg("GENODED1SPE");
        let mut normalizer = Normalizer::new(&config, "1234567");
        let txn = normalizer
            .normalize(&row(&[
                ("Buchungstag", "01.02.2024"),
                ("Umsatz", "-850,00"),
                (
                    "Verwendungszweck",
                    "Hausverwaltung Muster SEPA-ÜBERWEISUNG SVWZ+ Miete Februar",
                ),
            ]))
            .unwrap();
        assert_eq!(txn.payee, "Hausverwaltung Muster");
        assert_eq!(txn.memo.as_deref(), Some("Miete Februar"));
        assert_eq!(txn.transaction_type, TransactionType::Transfer);
    }

    #[test]
    fn test_end_to_end_ref_becomes_namespaced_id() {
        let config = cfg("GENODED1SPE");
        let mut normalizer = Normalizer::new(&config, "1234567");
        let txn = normalizer
            .normalize(&row(&[
                ("Buchungstag", "03.02.2024"),
                ("Umsatz", "-59,99"),
                (
                    "Verwendungszweck",
                    "Shop GmbH SEPA-BASISLASTSCHRIFT EREF+ RG-2024-001 SVWZ+ Bestellung 77",
                ),
            ]))
            .unwrap();
        assert_eq!(txn.id, "1234567:RG-2024-001");
    }

    #[test]
    fn test_notprovided_reference_falls_back_to_hash() {
        let config = cfg("GENODED1SPE");
        let mut normalizer = Normalizer::new(&config, "1234567");
        let txn = normalizer
            .normalize(&row(&[
                ("Buchungstag", "03.02.2024"),
                ("Umsatz", "-59,99"),
                ("Verwendungszweck", "Shop SEPA-BASISLASTSCHRIFT EREF+ NOTPROVIDED SVWZ+ Kauf"),
            ]))
            .unwrap();
        assert!(txn.id.starts_with("20240203-"));
    }

    #[test]
    fn test_same_day_same_amount_rows_get_distinct_ids() {
        let config = cfg("GENODEF1S06");
        let mut normalizer = Normalizer::new(&config, "acct");
        let fields = [
            ("Buchungstag", "01.03.2024"),
            ("Betrag", "-3,50"),
            ("Empfänger", "Bäckerei"),
        ];
        let first = normalizer.normalize(&row(&fields)).unwrap();
        let second = normalizer.normalize(&row(&fields)).unwrap();
        assert_ne!(first.id, second.id);
        assert_eq!(second.id, format!("{}-2", first.id));
    }

    #[test]
    fn test_derived_ids_are_deterministic() {
        let config = cfg("GENODEF1S06");
        let fields = [
            ("Buchungstag", "01.03.2024"),
            ("Betrag", "-3,50"),
            ("Empfänger", "Bäckerei"),
        ];
        let mut first_run = Normalizer::new(&config, "acct");
        let mut second_run = Normalizer::new(&config, "acct");
        assert_eq!(
            first_run.normalize(&row(&fields)).unwrap().id,
            second_run.normalize(&row(&fields)).unwrap().id
        );
    }

    #[test]
    fn test_girocard_row_extracts_merchant_and_reference() {
        let config = cfg("GENODED1SPE");
        let mut normalizer = Normalizer::new(&config, "1234567");
        let txn = normalizer
            .normalize(&row(&[
                ("Buchungstag", "02.01.2024"),
                ("Umsatz", "-12,34"),
                (
                    "Verwendungszweck",
                    "REWE SAGT DANKE 02.01.2024 12.30.45 OFFLIN EUR 12,34 \
                     EC 61234567 090880 PAN 1234567890 REWE MUENCHEN123 01/2026 \
                     GIROCARD ECTL/ONLN//0",
                ),
            ]))
            .unwrap();
        assert_eq!(txn.payee, "REWE MUENCHEN");
        assert_eq!(txn.memo.as_deref(), Some("REWE SAGT DANKE"));
        assert_eq!(txn.transaction_type, TransactionType::Debit);
    }

    #[test]
    fn test_fee_keyword() {
        let config = cfg("GENODED1SPE");
        let mut normalizer = Normalizer::new(&config, "acct");
        let txn = normalizer
            .normalize(&row(&[
                ("Buchungstag", "28.02.2024"),
                ("Umsatz", "-4,50"),
                ("Verwendungszweck", "KONTOFÜHRUNGSENTGELT"),
            ]))
            .unwrap();
        assert_eq!(txn.transaction_type, TransactionType::Fee);
        assert_eq!(txn.payee, "KONTOFÜHRUNGSENTGELT");
    }
}
