use std::collections::HashMap;
use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// The fixed set of quoted tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Token {
    Sol,
    Usdt,
    Usdc,
    Eth,
}

impl Token {
    pub const ALL: [Token; 4] = [Token::Sol, Token::Usdt, Token::Usdc, Token::Eth];

    /// Tokens offered by the calculator's selector.
    pub const CALCULATOR_CHOICES: [Token; 3] = [Token::Sol, Token::Usdt, Token::Usdc];

    /// Resolves a selector choice by symbol, case-insensitively.
    pub fn calculator_choice(symbol: &str) -> Option<Token> {
        let symbol = symbol.trim();
        Self::CALCULATOR_CHOICES
            .into_iter()
            .find(|token| token.symbol().eq_ignore_ascii_case(symbol))
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Token::Sol => "SOL",
            Token::Usdt => "USDT",
            Token::Usdc => "USDC",
            Token::Eth => "ETH",
        }
    }

    /// Price API asset id.
    pub fn coin_id(&self) -> &'static str {
        match self {
            Token::Sol => "solana",
            Token::Usdt => "tether",
            Token::Usdc => "usd-coin",
            Token::Eth => "ethereum",
        }
    }

    pub fn is_stable(&self) -> bool {
        matches!(self, Token::Usdt | Token::Usdc)
    }

    /// Price assumed when the API has nothing for this token.
    pub fn fallback_price(&self) -> Decimal {
        if self.is_stable() {
            Decimal::ONE
        } else {
            Decimal::ZERO
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// One entry of a `/simple/price` response. Unknown currencies are ignored.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CoinQuote {
    #[serde(default)]
    pub usd: Option<Decimal>,
}

/// Raw response, keyed by coin id.
pub type QuoteResponse = HashMap<String, CoinQuote>;
