use dashmap::DashMap;
use tracing::debug;

/// Key browser wallet adapters use to remember the last selected wallet.
pub const WALLET_NAME_KEY: &str = "walletName";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageScope {
    /// Survives reloads (`localStorage`).
    Local,
    /// Cleared with the tab (`sessionStorage`).
    Session,
}

/// Persisted key/value storage the wallet adapters read and write.
pub trait BrowserStorage: Send + Sync {
    fn get(&self, scope: StorageScope, key: &str) -> Option<String>;
    fn set(&self, scope: StorageScope, key: &str, value: String);
    fn remove(&self, scope: StorageScope, key: &str);
    /// Drops every entry in `scope`, whoever wrote it.
    fn clear(&self, scope: StorageScope);
}

/// In-process storage with the same two scopes a browser offers.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    local: DashMap<String, String>,
    session: DashMap<String, String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn scope(&self, scope: StorageScope) -> &DashMap<String, String> {
        match scope {
            StorageScope::Local => &self.local,
            StorageScope::Session => &self.session,
        }
    }

    pub fn len(&self, scope: StorageScope) -> usize {
        self.scope(scope).len()
    }

    pub fn is_empty(&self, scope: StorageScope) -> bool {
        self.scope(scope).is_empty()
    }
}

impl BrowserStorage for MemoryStorage {
    fn get(&self, scope: StorageScope, key: &str) -> Option<String> {
        self.scope(scope).get(key).map(|v| v.value().clone())
    }

    fn set(&self, scope: StorageScope, key: &str, value: String) {
        self.scope(scope).insert(key.to_string(), value);
    }

    fn remove(&self, scope: StorageScope, key: &str) {
        self.scope(scope).remove(key);
    }

    fn clear(&self, scope: StorageScope) {
        let map = self.scope(scope);
        debug!(?scope, entries = map.len(), "clearing storage");
        map.clear();
    }
}
