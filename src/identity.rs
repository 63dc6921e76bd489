//! Bearer-token identity resolution.
//!
//! The HTTP layer never trusts an owner id from a request body; it asks an
//! `IdentityProvider` to turn the bearer token into an `OwnerId`. The
//! bundled `TokenRegistry` keeps SHA-256 hashes of known tokens in memory.

use std::collections::HashMap;
use std::sync::RwLock;

use thiserror::Error;

use crate::models::OwnerId;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum IdentityError {
    #[error("Malformed token entry {0:?}, expected owner=token")]
    MalformedEntry(String),
    #[error("Token registry lock poisoned")]
    LockPoisoned,
}

/// Resolves an opaque bearer token to the user it was issued for.
pub trait IdentityProvider: Send + Sync {
    fn resolve(&self, token: &str) -> Option<OwnerId>;
}

/// Hash a bearer token string using SHA-256.
pub fn hash_token(token: &str) -> [u8; 32] {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hasher.finalize().into()
}

/// Generate a random bearer token (URL-safe base64, 32 bytes of entropy).
pub fn generate_token() -> String {
    use base64::Engine;
    let bytes: [u8; 32] = rand::random();
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes)
}

/// In-memory token → owner map. Only hashes are retained.
#[derive(Default)]
pub struct TokenRegistry {
    tokens: RwLock<HashMap<[u8; 32], OwnerId>>,
}

impl TokenRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from `owner=token` pairs separated by commas.
    pub fn from_spec(spec: &str) -> Result<Self, IdentityError> {
        let registry = Self::new();
        for entry in spec.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            let (owner, token) = entry
                .split_once('=')
                .map(|(o, t)| (o.trim(), t.trim()))
                .filter(|(_, t)| !t.is_empty())
                .ok_or_else(|| IdentityError::MalformedEntry(entry.to_string()))?;
            let owner =
                OwnerId::new(owner).ok_or_else(|| IdentityError::MalformedEntry(entry.to_string()))?;
            registry.register(owner, token)?;
        }
        Ok(registry)
    }

    /// Associate an existing token with `owner`.
    pub fn register(&self, owner: OwnerId, token: &str) -> Result<(), IdentityError> {
        let mut tokens = self.tokens.write().map_err(|_| IdentityError::LockPoisoned)?;
        tokens.insert(hash_token(token), owner);
        Ok(())
    }

    /// Mint a fresh token for `owner` and return it. The plain token is not kept.
    pub fn issue(&self, owner: OwnerId) -> Result<String, IdentityError> {
        let token = generate_token();
        self.register(owner, &token)?;
        Ok(token)
    }

    pub fn revoke(&self, token: &str) -> Result<bool, IdentityError> {
        let mut tokens = self.tokens.write().map_err(|_| IdentityError::LockPoisoned)?;
        Ok(tokens.remove(&hash_token(token)).is_some())
    }

    pub fn len(&self) -> usize {
        self.tokens.read().map(|t| t.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl IdentityProvider for TokenRegistry {
    fn resolve(&self, token: &str) -> Option<OwnerId> {
        let tokens = self.tokens.read().ok()?;
        tokens.get(&hash_token(token)).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn owner(raw: &str) -> OwnerId {
        OwnerId::new(raw).unwrap()
    }

    #[test]
    fn issued_token_resolves_to_owner() {
        let registry = TokenRegistry::new();
        let token = registry.issue(owner("alice")).unwrap();
        assert_eq!(registry.resolve(&token), Some(owner("alice")));
        assert_eq!(registry.resolve("not-a-token"), None);
    }

    #[test]
    fn revoked_token_no_longer_resolves() {
        let registry = TokenRegistry::new();
        let token = registry.issue(owner("alice")).unwrap();
        assert!(registry.revoke(&token).unwrap());
        assert!(!registry.revoke(&token).unwrap());
        assert_eq!(registry.resolve(&token), None);
    }

    #[test]
    fn from_spec_parses_pairs() {
        let registry = TokenRegistry::from_spec("alice=tok-a, bob = tok-b ,").unwrap();
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.resolve("tok-a"), Some(owner("alice")));
        assert_eq!(registry.resolve("tok-b"), Some(owner("bob")));
    }

    #[test]
    fn from_spec_empty_is_empty() {
        assert!(TokenRegistry::from_spec("").unwrap().is_empty());
    }

    #[test]
    fn from_spec_rejects_malformed() {
        for bad in ["alice", "=tok", "alice=", "alice=tok,bob"] {
            assert!(
                matches!(TokenRegistry::from_spec(bad), Err(IdentityError::MalformedEntry(_))),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn generate_token_is_unique() {
        let t1 = generate_token();
        let t2 = generate_token();
        assert_ne!(t1, t2);
        assert!(!t1.is_empty());
    }

    #[test]
    fn hash_token_is_deterministic() {
        assert_eq!(hash_token("test"), hash_token("test"));
        assert_ne!(hash_token("token-a"), hash_token("token-b"));
    }
}
