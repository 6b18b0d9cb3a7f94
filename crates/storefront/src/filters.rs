//! Custom Askama template filters.

#![allow(clippy::unnecessary_wraps)]

use std::fmt::Display;

use rust_decimal::Decimal;

/// Returns the current year.
///
/// Usage in templates: `{{ ""|current_year }}`
#[allow(clippy::unnecessary_wraps)]
#[askama::filter_fn]
pub fn current_year(_value: impl Display, _env: &dyn askama::Values) -> askama::Result<i32> {
    use chrono::Datelike;
    Ok(chrono::Utc::now().year())
}

/// Formats a decimal amount as a dollar price with two decimal places.
///
/// Usage in templates: `{{ price|money }}`
#[allow(clippy::unnecessary_wraps)]
#[askama::filter_fn]
pub fn money(value: &Decimal, _env: &dyn askama::Values) -> askama::Result<String> {
    Ok(format!("${:.2}", value.round_dp(2)))
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    #[test]
    fn test_money_formats_two_decimals() {
        let value = Decimal::new(1990, 2); // 19.90
        assert_eq!(format!("${:.2}", value.round_dp(2)), "$19.90");

        let whole = Decimal::from(25);
        assert_eq!(format!("${whole:.2}"), "$25.00");
    }
}
