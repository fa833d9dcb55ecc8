//! Token amount to USD estimate.

use std::str::FromStr;

use rust_decimal::prelude::FromPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;

use crate::market_data::price_table::PriceTable;
use crate::market_data::types::Token;

/// Best-effort numeric parse. Anything unparseable is zero.
pub fn parse_amount(text: &str) -> Decimal {
    let text = text.trim();
    // Digit separators are not numeric input.
    if text.is_empty() || text.contains('_') {
        return Decimal::ZERO;
    }
    Decimal::from_str(text)
        .ok()
        .or_else(|| Decimal::from_scientific(text).ok())
        .or_else(|| text.parse::<f64>().ok().and_then(Decimal::from_f64))
        .unwrap_or(Decimal::ZERO)
}

/// `price(token) * amount`, two decimals, half away from zero.
pub fn usd_value(prices: &PriceTable, token: Token, amount_text: &str) -> String {
    let value = prices
        .price(token)
        .checked_mul(parse_amount(amount_text))
        .unwrap_or(Decimal::ZERO)
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    format!("{value:.2}")
}

/// The calculator's two inputs. Owned by the view, not validated.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CalculatorState {
    token: Token,
    amount: String,
}

impl Default for CalculatorState {
    fn default() -> Self {
        Self::new(Token::Sol, "")
    }
}

impl CalculatorState {
    pub fn new(token: Token, amount: impl Into<String>) -> Self {
        Self {
            token,
            amount: amount.into(),
        }
    }

    pub fn token(&self) -> Token {
        self.token
    }

    pub fn amount(&self) -> &str {
        &self.amount
    }

    pub fn set_token(&mut self, token: Token) {
        self.token = token;
    }

    pub fn set_amount(&mut self, amount: impl Into<String>) {
        self.amount = amount.into();
    }

    pub fn usd_value(&self, prices: &PriceTable) -> String {
        usd_value(prices, self.token, &self.amount)
    }

    /// What the estimate line shows, e.g. `$300.00`.
    pub fn readout(&self, prices: &PriceTable) -> String {
        format!("${}", self.usd_value(prices))
    }
}
