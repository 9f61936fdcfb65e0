use thiserror::Error;

#[derive(Error, Debug)]
pub enum UmsatzError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Structural problem: the file does not look like the expected export.
    #[error("Format error: {0}")]
    Format(String),

    /// Value-level problem in an otherwise well-formed data row.
    #[error("Parse error in row {row}, field '{field}': cannot parse {value:?}")]
    Parse {
        row: usize,
        field: String,
        value: String,
    },

    #[error("Unknown bank identifier code: {0}")]
    UnknownBank(String),
}

pub type Result<T> = std::result::Result<T, UmsatzError>;
