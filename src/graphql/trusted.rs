use std::collections::HashMap;

use sha2::{Digest, Sha256};
use tracing::warn;

use crate::runtime_config::ExecutionMode;

/// Error message returned for operations outside the trusted store.
pub const TRUSTED_REJECTION_MESSAGE: &str = "Use Trusted Only!";

/// The current-user query clients send on boot; always executable even when
/// trusted operations are enforced, since auth providers issue it before the
/// client has any persisted documents.
const CURRENT_USER_QUERY: &str = "query __FNGATE__AUTH_GET_CURRENT_USER { auth { currentUser } }";

/// Dev-console maintenance mutations, executable in development only.
const DEV_CONSOLE_MUTATIONS: [&str; 2] = [
    "mutation StoreConsoleConfig($config: JSON!) { storeConsoleConfig(config: $config) }",
    "mutation ClearConsoleCache { clearConsoleCache }",
];

fn canonicalize(document: &str) -> String {
    document.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Store of persisted operations keyed by their sha256 hash.
///
/// When enforced, only three kinds of operation execute: a hash-identified
/// document from the store, the current-user query, and (in development) the
/// dev-console maintenance mutations. Everything else is rejected with
/// [`TRUSTED_REJECTION_MESSAGE`] as a GraphQL-level error.
#[derive(Debug, Clone, Default)]
pub struct TrustedOperationStore {
    documents: HashMap<String, String>,
}

impl TrustedOperationStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Hash a document the way the store keys it.
    #[must_use]
    pub fn hash(document: &str) -> String {
        let digest = Sha256::digest(document.as_bytes());
        let mut out = String::with_capacity(digest.len() * 2);
        for byte in digest {
            out.push_str(&format!("{byte:02x}"));
        }
        out
    }

    /// Insert a persisted document, returning its hash.
    pub fn insert(&mut self, document: impl Into<String>) -> String {
        let document = document.into();
        let hash = Self::hash(&document);
        self.documents.insert(hash.clone(), document);
        hash
    }

    /// Look up a persisted document by hash.
    #[must_use]
    pub fn lookup(&self, hash: &str) -> Option<&str> {
        self.documents.get(hash).map(String::as_str)
    }

    /// Whether raw query text may execute without a hash.
    #[must_use]
    pub fn allows_raw(&self, document: &str, mode: ExecutionMode) -> bool {
        let canonical = canonicalize(document);
        if canonical == canonicalize(CURRENT_USER_QUERY) {
            return true;
        }
        if mode.is_development()
            && DEV_CONSOLE_MUTATIONS
                .iter()
                .any(|m| canonicalize(m) == canonical)
        {
            return true;
        }
        warn!(operation = %canonical.chars().take(64).collect::<String>(), "Untrusted operation rejected");
        false
    }
}
