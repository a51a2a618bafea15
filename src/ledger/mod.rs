// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 CipherPay

//! On-chain nullifier ledger client.
//!
//! When a caller asks for `checkOnChain=true`, the spent status of a
//! nullifier is looked up against the relayer's ledger endpoint, which is
//! ground truth and supersedes the local spent set. The lookup is bounded by
//! a timeout and may fail; callers degrade to the local answer on any error
//! (see the account overview aggregator), so nothing here is fatal.
//!
//! Confirmed-spent answers are cached in an in-process LRU: a spent
//! nullifier never becomes unspent again, so positive answers are immutable
//! facts. Negative answers are never cached.

#[cfg(test)]
use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::sync::Mutex;
use std::time::Duration;

use lru::LruCache;
use serde::Deserialize;
use url::Url;

/// Max nullifiers kept in the confirmed-spent cache.
const SPENT_CACHE_CAPACITY: usize = 4096;

#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("ledger request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("ledger lookup timed out after {0:?}")]
    Timeout(Duration),

    #[error("ledger returned a malformed response: {0}")]
    Malformed(String),

    #[error("no ledger endpoint configured")]
    NotConfigured,
}

/// Wire shape of the relayer's nullifier status response.
#[derive(Debug, Deserialize)]
struct NullifierStatus {
    spent: bool,
}

/// Client for the authoritative on-chain nullifier ledger.
pub enum LedgerClient {
    /// HTTP client against the relayer's ledger API.
    Http {
        client: reqwest::Client,
        base_url: Url,
        timeout: Duration,
        spent_cache: Mutex<LruCache<String, ()>>,
    },
    /// No endpoint configured; every lookup fails with `NotConfigured` and
    /// callers fall back to the local spent set.
    Disabled,
    /// Fixed answers for tests.
    #[cfg(test)]
    Fixed(HashMap<String, bool>),
}

impl LedgerClient {
    /// Build an HTTP-backed client.
    pub fn http(base_url: Url, timeout: Duration) -> Self {
        Self::Http {
            client: reqwest::Client::new(),
            base_url,
            timeout,
            spent_cache: Mutex::new(LruCache::new(
                NonZeroUsize::new(SPENT_CACHE_CAPACITY).unwrap_or(NonZeroUsize::new(1).unwrap()),
            )),
        }
    }

    /// Build a disabled client (no `LEDGER_RPC_URL` configured).
    pub fn disabled() -> Self {
        Self::Disabled
    }

    /// Query whether a nullifier has been spent on chain.
    ///
    /// The HTTP round trip is bounded by the configured timeout; a timeout
    /// surfaces as [`LedgerError::Timeout`] rather than hanging the caller.
    pub async fn is_nullifier_spent(&self, nullifier_hex: &str) -> Result<bool, LedgerError> {
        match self {
            Self::Http {
                client,
                base_url,
                timeout,
                spent_cache,
            } => {
                if let Ok(mut cache) = spent_cache.lock() {
                    if cache.get(nullifier_hex).is_some() {
                        return Ok(true);
                    }
                }

                let url = base_url
                    .join(&format!("nullifiers/{nullifier_hex}"))
                    .map_err(|e| LedgerError::Malformed(format!("bad nullifier URL: {e}")))?;

                let request = async {
                    let response = client.get(url).send().await?.error_for_status()?;
                    let status: NullifierStatus = response.json().await?;
                    Ok::<bool, LedgerError>(status.spent)
                };

                let spent = tokio::time::timeout(*timeout, request)
                    .await
                    .map_err(|_| LedgerError::Timeout(*timeout))??;

                if spent {
                    if let Ok(mut cache) = spent_cache.lock() {
                        cache.put(nullifier_hex.to_string(), ());
                    }
                }
                Ok(spent)
            }
            Self::Disabled => Err(LedgerError::NotConfigured),
            #[cfg(test)]
            Self::Fixed(answers) => answers
                .get(nullifier_hex)
                .copied()
                .ok_or_else(|| LedgerError::Malformed("unknown nullifier".to_string())),
        }
    }
}

#[cfg(test)]
impl LedgerClient {
    /// Client that answers from a fixed map and errors on unknown keys.
    pub(crate) fn fixed(answers: HashMap<String, bool>) -> Self {
        Self::Fixed(answers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn disabled_client_reports_not_configured() {
        let ledger = LedgerClient::disabled();
        assert!(matches!(
            ledger.is_nullifier_spent("ab").await,
            Err(LedgerError::NotConfigured)
        ));
    }

    #[tokio::test]
    async fn fixed_client_answers() {
        let ledger = LedgerClient::fixed(HashMap::from([
            ("aa".to_string(), true),
            ("bb".to_string(), false),
        ]));
        assert!(ledger.is_nullifier_spent("aa").await.unwrap());
        assert!(!ledger.is_nullifier_spent("bb").await.unwrap());
        assert!(ledger.is_nullifier_spent("cc").await.is_err());
    }
}
