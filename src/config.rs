use crate::error::Result;
use crate::variants::{self, BankVariant, Encoding};

/// Active parse settings: the BIC-selected variant plus any host overrides.
#[derive(Debug, Clone)]
pub struct ParseConfig {
    pub bic: String,
    variant: &'static BankVariant,
    pub delimiter_override: Option<u8>,
    pub encoding_override: Option<Encoding>,
    pub date_format_override: Option<String>,
}

impl ParseConfig {
    pub fn new(bic: &str) -> Result<Self> {
        let variant = variants::for_bic(bic)?;
        Ok(Self {
            bic: bic.trim().to_uppercase(),
            variant,
            delimiter_override: None,
            encoding_override: None,
            date_format_override: None,
        })
    }

    pub fn variant(&self) -> &'static BankVariant {
        self.variant
    }

    pub fn delimiter(&self) -> u8 {
        self.delimiter_override.unwrap_or(self.variant.delimiter)
    }

    pub fn encoding(&self) -> Encoding {
        self.encoding_override.unwrap_or(self.variant.encoding)
    }

    pub fn date_format(&self) -> &str {
        self.date_format_override
            .as_deref()
            .unwrap_or(self.variant.date_format)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_come_from_variant() {
        let cfg = ParseConfig::new("GENODED1SPE").unwrap();
        assert_eq!(cfg.delimiter(), b';');
        assert_eq!(cfg.encoding(), Encoding::Latin1);
        assert_eq!(cfg.date_format(), "%d.%m.%Y");
    }

    #[test]
    fn test_overrides_win() {
        let mut cfg = ParseConfig::new("GENODED1SPE").unwrap();
        cfg.delimiter_override = Some(b',');
        cfg.encoding_override = Some(Encoding::Utf8);
        cfg.date_format_override = Some("%d-%m-%Y".to_string());
        assert_eq!(cfg.delimiter(), b',');
        assert_eq!(cfg.encoding(), Encoding::Utf8);
        assert_eq!(cfg.date_format(), "%d-%m-%Y");
    }

    #[test]
    fn test_bic_is_normalized() {
        let cfg = ParseConfig::new(" genodef1s06 ").unwrap();
        assert_eq!(cfg.bic, "GENODEF1S06");
    }
}
