use rust_decimal::Decimal;

/// Format an amount the German way, with thousands dots and a decimal
/// comma: -1.234,56
pub fn money(value: Decimal) -> String {
    let negative = value.is_sign_negative();
    let abs = value.abs();
    let cents = format!("{abs:.2}");
    let (int_part, dec_part) = cents.split_once('.').unwrap_or((cents.as_str(), "00"));

    let mut grouped = String::new();
    for (i, c) in int_part.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(c);
    }
    let grouped: String = grouped.chars().rev().collect();

    if negative {
        format!("-{grouped},{dec_part}")
    } else {
        format!("{grouped},{dec_part}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_money_formatting() {
        assert_eq!(money(dec("1234.56")), "1.234,56");
        assert_eq!(money(dec("-500.00")), "-500,00");
        assert_eq!(money(dec("0")), "0,00");
        assert_eq!(money(dec("1000000.99")), "1.000.000,99");
        assert_eq!(money(dec("42.10")), "42,10");
    }
}
