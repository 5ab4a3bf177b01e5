//! Decoding of valuation entry values.

use super::ValuationError;
use crate::domain::{Decimal, ExternalSymbol, MassUnit, ValuationValue};

/// Parse a decoded valuation value.
///
/// Shapes, in precedence order:
/// 1. `<SYMBOL> <quantity><unit>` with unit `g` or `oz`, e.g. `AU 2.5oz`
/// 2. a bare external symbol, e.g. `BTC`
/// 3. a positive reference-currency amount, locale separators allowed
pub fn parse_value(raw: &str) -> Result<ValuationValue, ValuationError> {
    let trimmed = raw.trim();

    if let Some(value) = parse_compound(trimmed) {
        return Ok(value);
    }

    if let Ok(symbol) = trimmed.parse::<ExternalSymbol>() {
        return Ok(ValuationValue::ExternalQuote {
            symbol,
            quantity: None,
            unit: None,
        });
    }

    let amount = parse_locale_decimal(trimmed).ok_or_else(|| ValuationError::Parse {
        raw: raw.to_string(),
        reason: "not a symbol, quantity or number".to_string(),
    })?;
    if !amount.is_positive() {
        return Err(ValuationError::Parse {
            raw: raw.to_string(),
            reason: "value must be positive".to_string(),
        });
    }
    Ok(ValuationValue::ReferenceCurrency { amount })
}

/// Rewrite locale separators into a plain decimal string.
///
/// With both `.` and `,` present, `.` groups thousands and `,` is the decimal
/// point. A lone `,` is the decimal point. A lone `.` is left alone.
pub fn normalize_locale(s: &str) -> String {
    let s = s.trim();
    if s.contains('.') && s.contains(',') {
        s.replace('.', "").replace(',', ".")
    } else if s.contains(',') {
        s.replace(',', ".")
    } else {
        s.to_string()
    }
}

fn parse_locale_decimal(s: &str) -> Option<Decimal> {
    if s.is_empty() {
        return None;
    }
    Decimal::from_str_canonical(&normalize_locale(s)).ok()
}

fn parse_compound(s: &str) -> Option<ValuationValue> {
    let (symbol, rest) = s.split_once(char::is_whitespace)?;
    let symbol = symbol.parse::<ExternalSymbol>().ok()?;
    let rest = rest.trim();

    let (number, unit) = if let Some(number) = rest.strip_suffix("oz") {
        (number, MassUnit::Oz)
    } else if let Some(number) = rest.strip_suffix('g') {
        (number, MassUnit::G)
    } else {
        return None;
    };

    let quantity = parse_locale_decimal(number.trim())?;
    if !quantity.is_positive() {
        return None;
    }
    Some(ValuationValue::ExternalQuote {
        symbol,
        quantity: Some(quantity),
        unit: Some(unit),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_normalize_locale() {
        assert_eq!(normalize_locale("0,8"), "0.8");
        assert_eq!(normalize_locale("1.234,56"), "1234.56");
        assert_eq!(normalize_locale("1.5"), "1.5");
    }

    #[test]
    fn test_parse_reference_amounts() {
        assert_eq!(
            parse_value("0,8").unwrap(),
            ValuationValue::ReferenceCurrency { amount: dec("0.8") }
        );
        assert_eq!(
            parse_value(" 1.234,56 ").unwrap(),
            ValuationValue::ReferenceCurrency {
                amount: dec("1234.56")
            }
        );
        assert_eq!(
            parse_value("1.5").unwrap(),
            ValuationValue::ReferenceCurrency { amount: dec("1.5") }
        );
    }

    #[test]
    fn test_parse_compound_external() {
        assert_eq!(
            parse_value("AU 2.5oz").unwrap(),
            ValuationValue::ExternalQuote {
                symbol: ExternalSymbol::Au,
                quantity: Some(dec("2.5")),
                unit: Some(MassUnit::Oz),
            }
        );
        assert_eq!(
            parse_value("AG 100g").unwrap(),
            ValuationValue::ExternalQuote {
                symbol: ExternalSymbol::Ag,
                quantity: Some(dec("100")),
                unit: Some(MassUnit::G),
            }
        );
    }

    #[test]
    fn test_parse_bare_symbol() {
        assert_eq!(
            parse_value("BTC").unwrap(),
            ValuationValue::ExternalQuote {
                symbol: ExternalSymbol::Btc,
                quantity: None,
                unit: None,
            }
        );
    }

    #[test]
    fn test_parse_rejects_non_positive_and_garbage() {
        assert!(matches!(parse_value("0"), Err(ValuationError::Parse { .. })));
        assert!(matches!(parse_value("-3,5"), Err(ValuationError::Parse { .. })));
        assert!(matches!(parse_value("btc"), Err(ValuationError::Parse { .. })));
        assert!(matches!(parse_value("AU 0g"), Err(ValuationError::Parse { .. })));
        assert!(matches!(parse_value(""), Err(ValuationError::Parse { .. })));
    }
}
