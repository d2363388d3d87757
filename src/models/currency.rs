//! Checkout currencies.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Currency a checkout session can be charged in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum CurrencyCode {
    #[default]
    Usd,
    Eur,
    Gbp,
}

impl CurrencyCode {
    /// ISO 4217 code.
    pub fn code(self) -> &'static str {
        match self {
            CurrencyCode::Usd => "USD",
            CurrencyCode::Eur => "EUR",
            CurrencyCode::Gbp => "GBP",
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            CurrencyCode::Usd => "$",
            CurrencyCode::Eur => "€",
            CurrencyCode::Gbp => "£",
        }
    }

    /// Parse an ISO code case-insensitively. Anything unsupported charges in USD.
    pub fn parse_or_default(raw: &str) -> Self {
        match raw.trim().to_ascii_uppercase().as_str() {
            "EUR" => CurrencyCode::Eur,
            "GBP" => CurrencyCode::Gbp,
            _ => CurrencyCode::Usd,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsupported_codes_fall_back_to_usd() {
        assert_eq!(CurrencyCode::parse_or_default("eur"), CurrencyCode::Eur);
        assert_eq!(CurrencyCode::parse_or_default(" GBP "), CurrencyCode::Gbp);
        assert_eq!(CurrencyCode::parse_or_default("INR"), CurrencyCode::Usd);
        assert_eq!(CurrencyCode::parse_or_default(""), CurrencyCode::Usd);
    }

    #[test]
    fn symbols_match_codes() {
        assert_eq!(CurrencyCode::Eur.symbol(), "€");
        assert_eq!(CurrencyCode::Gbp.code(), "GBP");
    }
}
