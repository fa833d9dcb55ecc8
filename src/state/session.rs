use rust_decimal::Decimal;
use serde::Serialize;

/// Lamports per SOL.
pub const LAMPORTS_PER_SOL: u32 = 1_000_000_000;

/// What the injected provider has granted us. Empty when no access.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct EvmSession {
    pub address: Option<String>,
    /// Hex-encoded, as reported by `eth_chainId` (e.g. "0x1").
    pub chain_id: Option<String>,
}

impl EvmSession {
    pub fn is_active(&self) -> bool {
        self.address.is_some()
    }
}

/// Snapshot of the Solana side: adapter connection plus the fetched balance.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SolanaSession {
    pub connected: bool,
    pub public_key: Option<String>,
    /// Whole SOL. `None` until fetched, and whenever no key is present.
    pub balance: Option<Decimal>,
}

/// Exact lamports -> SOL conversion.
pub fn lamports_to_sol(lamports: u64) -> Decimal {
    Decimal::from_i128_with_scale(lamports as i128, 9)
}
