use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Value, json};
use tokio::sync::{broadcast, watch};
use tracing::{debug, info, warn};

use super::networks;
use super::provider::{InjectedProvider, ProviderEvent, ProviderRpcError, methods};
use crate::error::WalletError;
use crate::lifecycle::{Liveness, Subscription};
use crate::state::chain::Chain;
use crate::state::session::EvmSession;
use crate::telemetry::prometheus as telemetry;
use crate::wallet::{SkipReason, SwitchOutcome, WalletSession};

/// Ethereum wallet reached through an injected provider.
///
/// Disconnecting only forgets the account locally. Injected wallets offer no
/// programmatic revoke; the site permission stays until the user removes it
/// in the wallet.
pub struct EvmWalletConnector {
    provider: Option<Arc<dyn InjectedProvider>>,
    session: Arc<watch::Sender<EvmSession>>,
    mounted: Liveness,
}

impl EvmWalletConnector {
    pub fn new(provider: Option<Arc<dyn InjectedProvider>>) -> Self {
        let (tx, _) = watch::channel(EvmSession::default());
        Self {
            provider,
            session: Arc::new(tx),
            mounted: Liveness::new(),
        }
    }

    pub fn session(&self) -> EvmSession {
        self.session.borrow().clone()
    }

    pub fn watch_session(&self) -> watch::Receiver<EvmSession> {
        self.session.subscribe()
    }

    /// Marks the owning view gone; pending requests stop committing.
    pub fn unmount(&self) {
        self.mounted.end();
    }

    fn provider(&self) -> Result<&Arc<dyn InjectedProvider>, WalletError> {
        self.provider.as_ref().ok_or(WalletError::NoProvider)
    }

    /// Asks the wallet for account access and records the first account.
    pub async fn request_access(&self) -> Result<EvmSession, WalletError> {
        let provider = self.provider()?;

        let accounts = provider
            .request(methods::REQUEST_ACCOUNTS, json!([]))
            .await
            .map_err(|err| {
                warn!(code = err.code, error = %err.message, "account request failed");
                WalletError::from(err)
            })?;
        let accounts: Vec<String> = serde_json::from_value(accounts)
            .map_err(|e| WalletError::MalformedResponse(format!("{}: {e}", methods::REQUEST_ACCOUNTS)))?;

        let Some(address) = accounts.into_iter().next() else {
            warn!("wallet granted no accounts");
            return Err(WalletError::MalformedResponse(format!(
                "{}: no accounts granted",
                methods::REQUEST_ACCOUNTS
            )));
        };

        let chain_id = match read_chain_id(provider.as_ref()).await {
            Ok(id) => Some(id),
            Err(err) => {
                warn!(error = %err, "could not read chain id after connecting");
                None
            }
        };

        let session = EvmSession {
            address: Some(address),
            chain_id,
        };

        if self.mounted.is_alive() {
            info!(
                address = ?session.address,
                chain_id = ?session.chain_id,
                "evm wallet connected"
            );
            self.session.send_replace(session.clone());
            telemetry::record_wallet_event(Chain::Ethereum, "connected");
        }

        Ok(session)
    }

    pub fn forget(&self) {
        info!("evm wallet disconnected locally");
        self.session.send_replace(EvmSession::default());
        telemetry::record_wallet_event(Chain::Ethereum, "disconnected");
    }

    /// Best-effort switch to `target` (hex chain id).
    ///
    /// An unrecognised chain is registered once and the switch retried once.
    /// Only user rejection and a missing provider come back as errors.
    pub async fn switch_chain(&self, target: &str) -> Result<SwitchOutcome, WalletError> {
        let provider = self.provider()?;
        let outcome = self.try_switch(provider.as_ref(), target).await;

        match &outcome {
            Ok(outcome) => {
                telemetry::record_chain_switch(outcome.label());
                debug!(target_chain = target, outcome = outcome.label(), "chain switch finished");
            }
            Err(err) => {
                telemetry::record_chain_switch("rejected");
                warn!(target_chain = target, error = %err, "chain switch rejected");
            }
        }
        outcome
    }

    async fn try_switch(
        &self,
        provider: &dyn InjectedProvider,
        target: &str,
    ) -> Result<SwitchOutcome, WalletError> {
        match request_switch(provider, target).await {
            Ok(()) => {}
            Err(WalletError::UnrecognizedChain(_)) => {
                let Some(params) = networks::registration_params(target) else {
                    debug!(target_chain = target, "no registration parameters for chain, leaving wallet as is");
                    return Ok(SwitchOutcome::Skipped(SkipReason::UnknownNetwork));
                };

                info!(target_chain = target, chain_name = %params.chain_name, "registering chain in wallet");
                match provider.request(methods::ADD_CHAIN, json!([params])).await {
                    Ok(_) => {}
                    Err(err) => return swallow(err, SkipReason::RegistrationFailed),
                }

                match request_switch(provider, target).await {
                    Ok(()) => {}
                    Err(WalletError::UserRejected) => return Err(WalletError::UserRejected),
                    Err(err) => {
                        warn!(target_chain = target, error = %err, "switch after registration failed");
                        return Ok(SwitchOutcome::Skipped(SkipReason::SwitchFailed));
                    }
                }
            }
            Err(WalletError::UserRejected) => return Err(WalletError::UserRejected),
            Err(err) => {
                warn!(target_chain = target, error = %err, "chain switch failed");
                return Ok(SwitchOutcome::Skipped(SkipReason::SwitchFailed));
            }
        }

        let chain_id = match read_chain_id(provider).await {
            Ok(id) => id,
            Err(err) => {
                warn!(target_chain = target, error = %err, "could not read chain id after switch");
                target.to_string()
            }
        };

        if !self.mounted.is_alive() {
            return Ok(SwitchOutcome::Skipped(SkipReason::Unmounted));
        }
        self.session.send_if_modified(|s| {
            if s.address.is_none() {
                return false;
            }
            s.chain_id = Some(chain_id.clone());
            true
        });
        Ok(SwitchOutcome::Switched { chain_id })
    }

    /// Mirrors wallet-side account and network changes into the session.
    pub fn watch_provider_events(&self) -> Subscription {
        let Some(provider) = &self.provider else {
            return Subscription::inert("evm-provider-events");
        };

        let mut events = provider.events();
        let session = self.session.clone();
        let liveness = Liveness::new();
        let alive = liveness.clone();
        let mounted = self.mounted.clone();

        Subscription::spawn("evm-provider-events", liveness, async move {
            loop {
                match events.recv().await {
                    Ok(event) => {
                        if !alive.is_alive() || !mounted.is_alive() {
                            break;
                        }
                        apply_event(&session, event);
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "provider event listener lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        debug!("provider event channel closed");
                        break;
                    }
                }
            }
        })
    }
}

fn apply_event(session: &watch::Sender<EvmSession>, event: ProviderEvent) {
    match event {
        ProviderEvent::AccountsChanged(accounts) => match accounts.into_iter().next() {
            Some(address) => {
                info!(%address, "wallet switched account");
                session.send_modify(|s| s.address = Some(address));
                telemetry::record_wallet_event(Chain::Ethereum, "account_changed");
            }
            None => {
                info!("wallet reports no accounts, clearing session");
                session.send_replace(EvmSession::default());
                telemetry::record_wallet_event(Chain::Ethereum, "accounts_revoked");
            }
        },
        ProviderEvent::ChainChanged(chain_id) => {
            // Only a connected session tracks the network.
            let mirrored = session.send_if_modified(|s| {
                if s.address.is_none() {
                    return false;
                }
                s.chain_id = Some(chain_id.clone());
                true
            });
            if mirrored {
                info!(%chain_id, "wallet switched network");
                telemetry::record_wallet_event(Chain::Ethereum, "chain_changed");
            } else {
                debug!(%chain_id, "network change ignored while disconnected");
            }
        }
    }
}

async fn request_switch(provider: &dyn InjectedProvider, target: &str) -> Result<(), WalletError> {
    provider
        .request(methods::SWITCH_CHAIN, json!([{ "chainId": target }]))
        .await
        .map(|_| ())
        .map_err(WalletError::from)
}

async fn read_chain_id(provider: &dyn InjectedProvider) -> Result<String, WalletError> {
    match provider.request(methods::CHAIN_ID, json!([])).await? {
        Value::String(id) => Ok(id),
        other => Err(WalletError::MalformedResponse(format!(
            "{}: expected hex string, got {other}",
            methods::CHAIN_ID
        ))),
    }
}

fn swallow(err: ProviderRpcError, reason: SkipReason) -> Result<SwitchOutcome, WalletError> {
    match WalletError::from(err) {
        WalletError::UserRejected => Err(WalletError::UserRejected),
        err => {
            warn!(error = %err, ?reason, "chain registration failed");
            Ok(SwitchOutcome::Skipped(reason))
        }
    }
}

#[async_trait]
impl WalletSession for EvmWalletConnector {
    fn chain(&self) -> Chain {
        Chain::Ethereum
    }

    fn is_available(&self) -> bool {
        self.provider.is_some()
    }

    fn address(&self) -> Option<String> {
        self.session.borrow().address.clone()
    }

    async fn connect(&self) -> Result<(), WalletError> {
        self.request_access().await.map(|_| ())
    }

    async fn disconnect(&self) -> Result<(), WalletError> {
        self.forget();
        Ok(())
    }

    fn subscribe(&self) -> Subscription {
        self.watch_provider_events()
    }

    async fn switch_network(&self, chain_id: &str) -> Result<SwitchOutcome, WalletError> {
        self.switch_chain(chain_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeProvider;
    use crate::wallet::evm::provider::{UNRECOGNIZED_CHAIN, USER_REJECTED_REQUEST};
    use std::time::Duration;

    fn connector(provider: &Arc<FakeProvider>) -> EvmWalletConnector {
        EvmWalletConnector::new(Some(provider.clone() as Arc<dyn InjectedProvider>))
    }

    async fn settle() {
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    #[tokio::test]
    async fn connect_without_provider_fails() {
        let evm = EvmWalletConnector::new(None);
        assert!(!evm.is_available());
        assert_eq!(evm.connect().await, Err(WalletError::NoProvider));
        assert_eq!(evm.switch_chain("0x1").await, Err(WalletError::NoProvider));
        assert!(!evm.watch_provider_events().is_active());
    }

    #[tokio::test]
    async fn connect_records_first_account_and_chain() {
        let provider = Arc::new(FakeProvider::new(&["0xaaa", "0xbbb"], "0x89"));
        let evm = connector(&provider);

        evm.connect().await.unwrap();

        assert_eq!(
            evm.session(),
            EvmSession {
                address: Some("0xaaa".into()),
                chain_id: Some("0x89".into()),
            }
        );
        assert!(evm.is_connected());
    }

    #[tokio::test]
    async fn empty_account_grant_fails_and_leaves_session_empty() {
        let provider = Arc::new(FakeProvider::new(&[], "0x1"));
        let evm = connector(&provider);

        assert!(matches!(
            evm.connect().await,
            Err(WalletError::MalformedResponse(_))
        ));
        assert_eq!(evm.session(), EvmSession::default());
        assert!(!evm.is_connected());
        assert_eq!(provider.calls_to(methods::CHAIN_ID), 0);
    }

    #[tokio::test]
    async fn failed_chain_read_still_records_account() {
        let provider = Arc::new(FakeProvider::new(&["0xaaa"], "0x89"));
        provider.fail_next(methods::CHAIN_ID, ProviderRpcError::new(-32603, "Internal error"));
        let evm = connector(&provider);

        evm.connect().await.unwrap();

        assert_eq!(
            evm.session(),
            EvmSession {
                address: Some("0xaaa".into()),
                chain_id: None,
            }
        );
        assert!(evm.is_connected());
    }

    #[tokio::test]
    async fn network_change_after_disconnect_is_ignored() {
        let provider = Arc::new(FakeProvider::new(&["0xaaa"], "0x1"));
        let evm = connector(&provider);
        evm.connect().await.unwrap();
        let sub = evm.subscribe();

        evm.disconnect().await.unwrap();
        provider.emit(ProviderEvent::ChainChanged("0x89".into()));
        settle().await;
        assert_eq!(evm.session(), EvmSession::default());

        evm.connect().await.unwrap();
        provider.emit(ProviderEvent::AccountsChanged(vec![]));
        provider.emit(ProviderEvent::ChainChanged("0x89".into()));
        settle().await;
        assert_eq!(evm.session(), EvmSession::default());

        sub.unsubscribe();
    }

    #[tokio::test]
    async fn user_rejection_propagates_and_leaves_session_empty() {
        let provider = Arc::new(FakeProvider::new(&["0xaaa"], "0x1"));
        provider.fail_next(
            methods::REQUEST_ACCOUNTS,
            ProviderRpcError::new(USER_REJECTED_REQUEST, "User rejected the request."),
        );
        let evm = connector(&provider);

        assert_eq!(evm.connect().await, Err(WalletError::UserRejected));
        assert_eq!(evm.session(), EvmSession::default());
    }

    #[tokio::test]
    async fn disconnect_is_local_only() {
        let provider = Arc::new(FakeProvider::new(&["0xaaa"], "0x1"));
        let evm = connector(&provider);
        evm.connect().await.unwrap();
        let requests_before = provider.total_calls();

        evm.disconnect().await.unwrap();

        assert_eq!(evm.address(), None);
        assert_eq!(provider.total_calls(), requests_before);
    }

    #[tokio::test]
    async fn switch_updates_chain_from_provider() {
        let provider = Arc::new(FakeProvider::new(&["0xaaa"], "0x89"));
        let evm = connector(&provider);
        evm.connect().await.unwrap();

        let outcome = evm.switch_chain("0x1").await.unwrap();

        assert_eq!(
            outcome,
            SwitchOutcome::Switched {
                chain_id: "0x1".into()
            }
        );
        assert_eq!(evm.session().chain_id.as_deref(), Some("0x1"));
        assert_eq!(provider.calls_to(methods::ADD_CHAIN), 0);
    }

    #[tokio::test]
    async fn unrecognized_mainnet_is_registered_then_switched_once() {
        let provider = Arc::new(FakeProvider::new(&["0xaaa"], "0x89"));
        provider.fail_next(
            methods::SWITCH_CHAIN,
            ProviderRpcError::new(UNRECOGNIZED_CHAIN, "Unrecognized chain ID \"0x1\""),
        );
        let evm = connector(&provider);
        evm.connect().await.unwrap();

        let outcome = evm.switch_chain("0x1").await.unwrap();

        assert!(matches!(outcome, SwitchOutcome::Switched { .. }));
        assert_eq!(provider.calls_to(methods::ADD_CHAIN), 1);
        assert_eq!(provider.calls_to(methods::SWITCH_CHAIN), 2);
        let (_, params) = provider.last_call(methods::ADD_CHAIN).unwrap();
        assert_eq!(params[0]["chainId"], "0x1");
    }

    #[tokio::test]
    async fn unrecognized_unknown_chain_is_silent_noop() {
        let provider = Arc::new(FakeProvider::new(&["0xaaa"], "0x1"));
        provider.fail_next(
            methods::SWITCH_CHAIN,
            ProviderRpcError::new(UNRECOGNIZED_CHAIN, "Unrecognized chain ID \"0x2105\""),
        );
        let evm = connector(&provider);
        evm.connect().await.unwrap();

        let outcome = evm.switch_chain("0x2105").await.unwrap();

        assert_eq!(outcome, SwitchOutcome::Skipped(SkipReason::UnknownNetwork));
        assert_eq!(provider.calls_to(methods::ADD_CHAIN), 0);
        assert_eq!(evm.session().chain_id.as_deref(), Some("0x1"));
    }

    #[tokio::test]
    async fn registration_failure_is_swallowed() {
        let provider = Arc::new(FakeProvider::new(&["0xaaa"], "0x89"));
        provider.fail_next(
            methods::SWITCH_CHAIN,
            ProviderRpcError::new(UNRECOGNIZED_CHAIN, "Unrecognized chain"),
        );
        provider.fail_next(methods::ADD_CHAIN, ProviderRpcError::new(-32603, "Internal error"));
        let evm = connector(&provider);
        evm.connect().await.unwrap();

        let outcome = evm.switch_chain("0x1").await.unwrap();

        assert_eq!(outcome, SwitchOutcome::Skipped(SkipReason::RegistrationFailed));
        assert_eq!(evm.session().chain_id.as_deref(), Some("0x89"));
    }

    #[tokio::test]
    async fn switch_rejection_propagates() {
        let provider = Arc::new(FakeProvider::new(&["0xaaa"], "0x89"));
        provider.fail_next(
            methods::SWITCH_CHAIN,
            ProviderRpcError::new(USER_REJECTED_REQUEST, "User rejected the request."),
        );
        let evm = connector(&provider);
        evm.connect().await.unwrap();

        assert_eq!(evm.switch_chain("0x1").await, Err(WalletError::UserRejected));
        assert_eq!(evm.session().chain_id.as_deref(), Some("0x89"));
    }

    #[tokio::test]
    async fn provider_events_are_mirrored_until_unsubscribed() {
        let provider = Arc::new(FakeProvider::new(&["0xaaa"], "0x1"));
        let evm = connector(&provider);
        evm.connect().await.unwrap();
        let sub = evm.subscribe();

        provider.emit(ProviderEvent::AccountsChanged(vec!["0xccc".into()]));
        provider.emit(ProviderEvent::ChainChanged("0x89".into()));
        settle().await;
        assert_eq!(
            evm.session(),
            EvmSession {
                address: Some("0xccc".into()),
                chain_id: Some("0x89".into()),
            }
        );

        provider.emit(ProviderEvent::AccountsChanged(vec![]));
        settle().await;
        assert_eq!(evm.session(), EvmSession::default());

        sub.unsubscribe();
        provider.emit(ProviderEvent::AccountsChanged(vec!["0xddd".into()]));
        settle().await;
        assert_eq!(evm.address(), None);
    }

    #[tokio::test]
    async fn connect_resolving_after_unmount_does_not_commit() {
        let provider = Arc::new(FakeProvider::new(&["0xaaa"], "0x1"));
        let evm = connector(&provider);
        evm.unmount();

        let session = evm.request_access().await.unwrap();

        assert_eq!(session.address.as_deref(), Some("0xaaa"));
        assert_eq!(evm.session(), EvmSession::default());
    }
}
