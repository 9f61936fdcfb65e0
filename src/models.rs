use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

/// Coarse classification for downstream categorization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Credit,
    Debit,
    Transfer,
    Fee,
    Other,
}

impl TransactionType {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Credit => "credit",
            Self::Debit => "debit",
            Self::Transfer => "transfer",
            Self::Fee => "fee",
            Self::Other => "other",
        }
    }
}

/// One normalized booking. Negative amount = debit/outflow.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Transaction {
    /// Unique within the parent statement; stable across re-parses of the
    /// same file.
    pub id: String,
    pub date: NaiveDate,
    pub amount: Decimal,
    pub transaction_type: TransactionType,
    pub payee: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memo: Option<String>,
}

/// Statement-level facts, derived after all rows are read.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatementMetadata {
    pub bic: String,
    pub currency: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub closing_balance: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Statement {
    pub metadata: StatementMetadata,
    pub transactions: Vec<Transaction>,
}

/// One CSV data line as read: ordered column name / value pairs plus its
/// 1-based position among the data rows. Header, preamble, and blank lines
/// are not counted, so the index is not a file line number. Consumed
/// immediately by the normalizer.
#[derive(Debug, Clone)]
pub struct RawRow {
    pub index: usize,
    pub fields: Vec<(String, String)>,
}

impl RawRow {
    pub fn get(&self, column: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value.as_str())
    }

    /// Like `get`, but treats a whitespace-only value as absent.
    pub fn get_non_empty(&self, column: &str) -> Option<&str> {
        self.get(column).map(str::trim).filter(|v| !v.is_empty())
    }
}
