use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::Serialize;

use super::types::{QuoteResponse, Token};

/// Latest known USD prices for every quoted token.
///
/// Always complete: a token the API left out carries its fallback price.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PriceTable {
    prices: BTreeMap<Token, Decimal>,
    /// Unix seconds of the poll that produced this table; `None` for defaults.
    refreshed_at: Option<u64>,
}

impl Default for PriceTable {
    fn default() -> Self {
        Self {
            prices: Token::ALL
                .iter()
                .map(|t| (*t, t.fallback_price()))
                .collect(),
            refreshed_at: None,
        }
    }
}

impl PriceTable {
    /// Builds a whole table from a price API response.
    pub fn from_quotes(quotes: &QuoteResponse, refreshed_at: u64) -> Self {
        let prices = Token::ALL
            .iter()
            .map(|token| {
                let price = quotes
                    .get(token.coin_id())
                    .and_then(|q| q.usd)
                    .filter(|p| !p.is_sign_negative())
                    .unwrap_or_else(|| token.fallback_price());
                (*token, price)
            })
            .collect();

        Self {
            prices,
            refreshed_at: Some(refreshed_at),
        }
    }

    pub fn price(&self, token: Token) -> Decimal {
        self.prices
            .get(&token)
            .copied()
            .unwrap_or_else(|| token.fallback_price())
    }

    pub fn refreshed_at(&self) -> Option<u64> {
        self.refreshed_at
    }

    pub fn is_live(&self) -> bool {
        self.refreshed_at.is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Token, Decimal)> + '_ {
        self.prices.iter().map(|(t, p)| (*t, *p))
    }
}
