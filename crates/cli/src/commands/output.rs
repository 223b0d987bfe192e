//! Terminal output.

use std::fmt::Display;

use causehive_core::CurrencyCode;

/// Print one line to stdout.
#[allow(clippy::print_stdout)]
pub fn line(text: impl Display) {
    println!("{text}");
}

/// Print a JSON value, pretty-printed.
pub fn json(value: &serde_json::Value) {
    match serde_json::to_string_pretty(value) {
        Ok(text) => line(text),
        Err(_) => line(value),
    }
}

/// Format an amount in the settlement currency.
pub fn money(amount: impl Display) -> String {
    format!("{}{amount:.2}", CurrencyCode::default().symbol())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_money_uses_cedi_symbol() {
        assert!(money(12.5).ends_with("12.50"));
        assert!(money(12.5).starts_with(CurrencyCode::GHS.symbol()));
    }
}
