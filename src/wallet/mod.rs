//! Wallet capability interface shared by the Solana and EVM sides.

pub mod evm;
pub mod solana;

use async_trait::async_trait;
use serde::Serialize;

use crate::error::WalletError;
use crate::lifecycle::Subscription;
use crate::state::chain::Chain;

/// Result of a best-effort network switch.
///
/// `Err(WalletError)` is reserved for failures the user has to see; anything
/// the UI can carry on without is a `Skipped`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum SwitchOutcome {
    Switched { chain_id: String },
    Skipped(SkipReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SkipReason {
    /// The wallet has no notion of switching networks.
    Unsupported,
    /// Wallet does not know the chain and we have no parameters to register it.
    UnknownNetwork,
    RegistrationFailed,
    SwitchFailed,
    /// The owning view went away before the result arrived.
    Unmounted,
}

impl SwitchOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            SwitchOutcome::Switched { .. } => "switched",
            SwitchOutcome::Skipped(SkipReason::Unsupported) => "unsupported",
            SwitchOutcome::Skipped(SkipReason::UnknownNetwork) => "unknown_network",
            SwitchOutcome::Skipped(SkipReason::RegistrationFailed) => "registration_failed",
            SwitchOutcome::Skipped(SkipReason::SwitchFailed) => "switch_failed",
            SwitchOutcome::Skipped(SkipReason::Unmounted) => "unmounted",
        }
    }
}

/// What the coordinator needs from either wallet subsystem.
#[async_trait]
pub trait WalletSession: Send + Sync {
    fn chain(&self) -> Chain;

    /// A wallet exists to talk to (injected provider present, adapter ready).
    fn is_available(&self) -> bool;

    fn address(&self) -> Option<String>;

    fn is_connected(&self) -> bool {
        self.address().is_some()
    }

    async fn connect(&self) -> Result<(), WalletError>;

    async fn disconnect(&self) -> Result<(), WalletError>;

    /// Starts mirroring wallet-side changes into local state until the
    /// returned disposer is released.
    fn subscribe(&self) -> Subscription;

    async fn switch_network(&self, _chain_id: &str) -> Result<SwitchOutcome, WalletError> {
        Ok(SwitchOutcome::Skipped(SkipReason::Unsupported))
    }
}
