use serde::{Deserialize, Deserializer};

/// Parses a balance-like decimal string. Negative, non-finite or malformed
/// values are rejected.
pub fn parse_amount(value: &str) -> Option<f64> {
    match value.trim().parse::<f64>() {
        Ok(amount) if amount.is_finite() && amount >= 0.0 => Some(amount),
        _ => None,
    }
}

pub fn format_amount(amount: f64) -> String {
    format!("{:.2}", amount)
}

/// Adds `amount` to a stored balance string, treating an unknown balance as zero.
pub fn credit_amount(balance: Option<&str>, amount: f64) -> String {
    let current = balance.and_then(parse_amount).unwrap_or(0.0);
    format_amount(current + amount)
}

/// Renders a balance for display; unknown balances show as zero.
pub fn display_amount(balance: Option<&str>) -> String {
    format_amount(balance.and_then(parse_amount).unwrap_or(0.0))
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawDecimal {
    Text(String),
    Number(f64),
}

/// Accepts a decimal sent either as a JSON string or a JSON number and keeps
/// it as a string. Values that are not valid non-negative decimals become
/// `None` so that they read as "unknown".
pub fn de_decimal_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<RawDecimal> = Option::deserialize(deserializer)?;

    let value = match raw {
        Some(RawDecimal::Text(text)) => match parse_amount(&text) {
            Some(_) => Some(text.trim().to_string()),
            None => {
                log::warn!("Ignoring invalid decimal value: {:?}", text);
                None
            }
        },
        Some(RawDecimal::Number(number)) => {
            if number.is_finite() && number >= 0.0 {
                Some(number.to_string())
            } else {
                log::warn!("Ignoring invalid decimal value: {}", number);
                None
            }
        }
        None => None,
    };

    Ok(value)
}
