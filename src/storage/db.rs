// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 CipherPay

//! Embedded database backed by redb (pure Rust, ACID).

use std::path::Path;

use chrono::{DateTime, Utc};
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};
use serde::{Deserialize, Serialize};

// =============================================================================
// Table Definitions
// =============================================================================

/// Identities: owner_key → serialized IdentityRecord (JSON bytes).
const IDENTITIES: TableDefinition<&str, &[u8]> = TableDefinition::new("identities");

/// Challenges: composite key `owner_key|nonce` → serialized ChallengeRecord.
const CHALLENGES: TableDefinition<&[u8], &[u8]> = TableDefinition::new("challenges");

/// Spent nullifiers: nullifier hex → marked-at unix seconds.
const SPENT_NULLIFIERS: TableDefinition<&str, u64> = TableDefinition::new("spent_nullifiers");

/// Messages: content_hash → serialized MessageRecord. The key doubles as the
/// uniqueness constraint for content-addressed dedupe.
const MESSAGES: TableDefinition<&str, &[u8]> = TableDefinition::new("messages");

// =============================================================================
// Error Type
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("redb error: {0}")]
    Redb(#[from] redb::Error),

    #[error("redb database error: {0}")]
    RedbDatabase(#[from] redb::DatabaseError),

    #[error("redb transaction error: {0}")]
    RedbTransaction(#[from] redb::TransactionError),

    #[error("redb table error: {0}")]
    RedbTable(#[from] redb::TableError),

    #[error("redb storage error: {0}")]
    RedbStorage(#[from] redb::StorageError),

    #[error("redb commit error: {0}")]
    RedbCommit(#[from] redb::CommitError),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// Uniqueness violation: the entity already exists. For messages this is
    /// the duplicate-content signal the API maps to a 409 conflict.
    #[error("already exists: {0}")]
    AlreadyExists(String),

    #[error("not found: {0}")]
    NotFound(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

// =============================================================================
// Records
// =============================================================================

/// A user identity keyed by its opaque owner key.
///
/// The bound auth public key is immutable once set: the only transition is
/// unset → set, performed by [`Store::bind_auth_key_if_unset`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityRecord {
    /// Stable internal identifier (UUID), used as the JWT subject.
    pub id: String,
    /// Hex-encoded owner public key (`0x`-prefixed).
    pub owner_key: String,
    /// Bound EdDSA public key x coordinate, if bound.
    pub auth_pub_x: Option<String>,
    /// Bound EdDSA public key y coordinate, if bound.
    pub auth_pub_y: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl IdentityRecord {
    /// Whether an auth key has been bound to this identity.
    pub fn has_auth_key(&self) -> bool {
        self.auth_pub_x.is_some() && self.auth_pub_y.is_some()
    }
}

/// A single-use login challenge scoped to one identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChallengeRecord {
    pub owner_key: String,
    /// 64-char lowercase hex nonce.
    pub nonce: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub consumed: bool,
}

/// A stored encrypted message, keyed by its content hash.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageRecord {
    pub id: String,
    pub recipient_key: String,
    pub sender_key: Option<String>,
    /// Opaque encrypted envelope, base64-encoded as received.
    pub ciphertext_b64: String,
    pub kind: String,
    /// 0x-prefixed content hash (the table key, repeated for convenience).
    pub content_hash: String,
    /// Content hash scheme version the hash was computed under.
    pub scheme: String,
    pub created_at: DateTime<Utc>,
}

/// Composite key for the challenges table: `owner_key|nonce`.
fn challenge_key(owner_key: &str, nonce: &str) -> Vec<u8> {
    let mut key = Vec::with_capacity(owner_key.len() + 1 + nonce.len());
    key.extend_from_slice(owner_key.as_bytes());
    key.push(b'|');
    key.extend_from_slice(nonce.as_bytes());
    key
}

// =============================================================================
// Store
// =============================================================================

/// Embedded ACID store for the authentication and messaging core.
pub struct Store {
    db: Database,
}

impl Store {
    /// Open (or create) the database at the given path and ensure all tables
    /// exist.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let db = Database::create(path)?;
        // Opening each table once makes later read transactions infallible
        // with respect to missing tables.
        let txn = db.begin_write()?;
        {
            txn.open_table(IDENTITIES)?;
            txn.open_table(CHALLENGES)?;
            txn.open_table(SPENT_NULLIFIERS)?;
            txn.open_table(MESSAGES)?;
        }
        txn.commit()?;
        Ok(Self { db })
    }

    // -------------------------------------------------------------------------
    // Identities
    // -------------------------------------------------------------------------

    /// Look up an identity by owner key.
    pub fn find_identity(&self, owner_key: &str) -> StoreResult<Option<IdentityRecord>> {
        let txn = self.db.begin_read()?;
        let table = txn.open_table(IDENTITIES)?;
        match table.get(owner_key)? {
            Some(guard) => Ok(Some(serde_json::from_slice(guard.value())?)),
            None => Ok(None),
        }
    }

    /// Insert an identity if absent; return the stored record either way.
    ///
    /// Two concurrent provisioning calls for the same owner key serialize on
    /// the write transaction — the loser gets the winner's record back.
    pub fn ensure_identity(&self, record: IdentityRecord) -> StoreResult<IdentityRecord> {
        let txn = self.db.begin_write()?;
        let stored = {
            let mut table = txn.open_table(IDENTITIES)?;
            let existing = match table.get(record.owner_key.as_str())? {
                Some(guard) => Some(serde_json::from_slice::<IdentityRecord>(guard.value())?),
                None => None,
            };
            match existing {
                Some(found) => found,
                None => {
                    let bytes = serde_json::to_vec(&record)?;
                    table.insert(record.owner_key.as_str(), bytes.as_slice())?;
                    record
                }
            }
        };
        txn.commit()?;
        Ok(stored)
    }

    /// Bind an auth public key to an identity, only if none is bound yet.
    ///
    /// Returns `true` if this call performed the binding, `false` if a key
    /// was already bound (the stored key is left untouched). The precondition
    /// check and the write happen in one write transaction, so two racing
    /// first-verifications can never bind different keys.
    pub fn bind_auth_key_if_unset(
        &self,
        owner_key: &str,
        auth_pub_x: &str,
        auth_pub_y: &str,
    ) -> StoreResult<bool> {
        let txn = self.db.begin_write()?;
        let bound = {
            let mut table = txn.open_table(IDENTITIES)?;
            let mut record = match table.get(owner_key)? {
                Some(guard) => serde_json::from_slice::<IdentityRecord>(guard.value())?,
                None => return Err(StoreError::NotFound(format!("identity {owner_key}"))),
            };
            if record.has_auth_key() {
                false
            } else {
                record.auth_pub_x = Some(auth_pub_x.to_string());
                record.auth_pub_y = Some(auth_pub_y.to_string());
                let bytes = serde_json::to_vec(&record)?;
                table.insert(owner_key, bytes.as_slice())?;
                true
            }
        };
        txn.commit()?;
        Ok(bound)
    }

    // -------------------------------------------------------------------------
    // Challenges
    // -------------------------------------------------------------------------

    /// Persist a fresh challenge. Prior challenges for the identity are left
    /// untouched; multiple concurrent challenges per identity are allowed.
    pub fn create_challenge(&self, record: &ChallengeRecord) -> StoreResult<()> {
        let key = challenge_key(&record.owner_key, &record.nonce);
        let bytes = serde_json::to_vec(record)?;
        let txn = self.db.begin_write()?;
        {
            let mut table = txn.open_table(CHALLENGES)?;
            table.insert(key.as_slice(), bytes.as_slice())?;
        }
        txn.commit()?;
        Ok(())
    }

    /// Look up a challenge by (owner key, nonce).
    pub fn find_challenge(
        &self,
        owner_key: &str,
        nonce: &str,
    ) -> StoreResult<Option<ChallengeRecord>> {
        let key = challenge_key(owner_key, nonce);
        let txn = self.db.begin_read()?;
        let table = txn.open_table(CHALLENGES)?;
        match table.get(key.as_slice())? {
            Some(guard) => Ok(Some(serde_json::from_slice(guard.value())?)),
            None => Ok(None),
        }
    }

    /// Atomically consume a challenge if it is present, unconsumed, and
    /// unexpired at `now`.
    ///
    /// Returns `true` exactly once per challenge. The lookup, validity check,
    /// and consumed-flag write are a single serialized write transaction; of
    /// two racing verifications one gets `true` and the other `false`.
    pub fn consume_challenge_if_valid(
        &self,
        owner_key: &str,
        nonce: &str,
        now: DateTime<Utc>,
    ) -> StoreResult<bool> {
        let key = challenge_key(owner_key, nonce);
        let txn = self.db.begin_write()?;
        let consumed_now = {
            let mut table = txn.open_table(CHALLENGES)?;
            let record = match table.get(key.as_slice())? {
                Some(guard) => serde_json::from_slice::<ChallengeRecord>(guard.value())?,
                None => return Ok(false),
            };
            if record.consumed || now > record.expires_at {
                false
            } else {
                let updated = ChallengeRecord {
                    consumed: true,
                    ..record
                };
                let bytes = serde_json::to_vec(&updated)?;
                table.insert(key.as_slice(), bytes.as_slice())?;
                true
            }
        };
        txn.commit()?;
        Ok(consumed_now)
    }

    // -------------------------------------------------------------------------
    // Spent nullifiers
    // -------------------------------------------------------------------------

    /// Local spent-set membership for a nullifier.
    pub fn is_nullifier_spent(&self, nullifier_hex: &str) -> StoreResult<bool> {
        let txn = self.db.begin_read()?;
        let table = txn.open_table(SPENT_NULLIFIERS)?;
        Ok(table.get(nullifier_hex)?.is_some())
    }

    /// Add a nullifier to the local spent set. Idempotent.
    pub fn mark_nullifier_spent(&self, nullifier_hex: &str) -> StoreResult<()> {
        let txn = self.db.begin_write()?;
        {
            let mut table = txn.open_table(SPENT_NULLIFIERS)?;
            table.insert(nullifier_hex, Utc::now().timestamp() as u64)?;
        }
        txn.commit()?;
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Messages
    // -------------------------------------------------------------------------

    /// Insert a message keyed by its content hash.
    ///
    /// Fails with [`StoreError::AlreadyExists`] if a message with the same
    /// content hash is already stored — the duplicate-content signal.
    pub fn insert_message(&self, record: &MessageRecord) -> StoreResult<()> {
        let bytes = serde_json::to_vec(record)?;
        let txn = self.db.begin_write()?;
        {
            let mut table = txn.open_table(MESSAGES)?;
            if table.get(record.content_hash.as_str())?.is_some() {
                return Err(StoreError::AlreadyExists(record.content_hash.clone()));
            }
            table.insert(record.content_hash.as_str(), bytes.as_slice())?;
        }
        txn.commit()?;
        Ok(())
    }

    /// Look up a message by content hash.
    pub fn find_message(&self, content_hash: &str) -> StoreResult<Option<MessageRecord>> {
        let txn = self.db.begin_read()?;
        let table = txn.open_table(MESSAGES)?;
        match table.get(content_hash)? {
            Some(guard) => Ok(Some(serde_json::from_slice(guard.value())?)),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn open_store() -> (tempfile::TempDir, Store) {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(dir.path().join("test.redb")).unwrap();
        (dir, store)
    }

    fn identity(owner_key: &str) -> IdentityRecord {
        IdentityRecord {
            id: uuid::Uuid::new_v4().to_string(),
            owner_key: owner_key.to_string(),
            auth_pub_x: None,
            auth_pub_y: None,
            created_at: Utc::now(),
        }
    }

    fn challenge(owner_key: &str, nonce: &str, ttl_minutes: i64) -> ChallengeRecord {
        let now = Utc::now();
        ChallengeRecord {
            owner_key: owner_key.to_string(),
            nonce: nonce.to_string(),
            issued_at: now,
            expires_at: now + Duration::minutes(ttl_minutes),
            consumed: false,
        }
    }

    #[test]
    fn ensure_identity_is_idempotent() {
        let (_dir, store) = open_store();
        let first = store.ensure_identity(identity("0xa1")).unwrap();
        let second = store.ensure_identity(identity("0xa1")).unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(store.find_identity("0xa1").unwrap().unwrap().id, first.id);
    }

    #[test]
    fn bind_auth_key_only_once() {
        let (_dir, store) = open_store();
        store.ensure_identity(identity("0xa1")).unwrap();

        assert!(store.bind_auth_key_if_unset("0xa1", "12", "34").unwrap());
        // Second bind with a different key is a no-op.
        assert!(!store.bind_auth_key_if_unset("0xa1", "56", "78").unwrap());

        let stored = store.find_identity("0xa1").unwrap().unwrap();
        assert_eq!(stored.auth_pub_x.as_deref(), Some("12"));
        assert_eq!(stored.auth_pub_y.as_deref(), Some("34"));
    }

    #[test]
    fn bind_auth_key_unknown_identity_is_not_found() {
        let (_dir, store) = open_store();
        assert!(matches!(
            store.bind_auth_key_if_unset("0xmissing", "1", "2"),
            Err(StoreError::NotFound(_))
        ));
    }

    #[test]
    fn challenge_consumes_exactly_once() {
        let (_dir, store) = open_store();
        store.create_challenge(&challenge("0xa1", "aa11", 10)).unwrap();

        let now = Utc::now();
        assert!(store.consume_challenge_if_valid("0xa1", "aa11", now).unwrap());
        assert!(!store.consume_challenge_if_valid("0xa1", "aa11", now).unwrap());
    }

    #[test]
    fn expired_challenge_cannot_be_consumed() {
        let (_dir, store) = open_store();
        store.create_challenge(&challenge("0xa1", "bb22", -1)).unwrap();
        assert!(!store
            .consume_challenge_if_valid("0xa1", "bb22", Utc::now())
            .unwrap());
    }

    #[test]
    fn unknown_challenge_is_invalid_not_an_error() {
        let (_dir, store) = open_store();
        assert!(!store
            .consume_challenge_if_valid("0xa1", "nope", Utc::now())
            .unwrap());
    }

    #[test]
    fn concurrent_challenges_coexist() {
        let (_dir, store) = open_store();
        store.create_challenge(&challenge("0xa1", "n1", 10)).unwrap();
        store.create_challenge(&challenge("0xa1", "n2", 10)).unwrap();

        let now = Utc::now();
        assert!(store.consume_challenge_if_valid("0xa1", "n2", now).unwrap());
        // Consuming one challenge leaves the other intact.
        assert!(store.consume_challenge_if_valid("0xa1", "n1", now).unwrap());
    }

    #[test]
    fn spent_set_membership() {
        let (_dir, store) = open_store();
        assert!(!store.is_nullifier_spent("ab").unwrap());
        store.mark_nullifier_spent("ab").unwrap();
        assert!(store.is_nullifier_spent("ab").unwrap());
        // Idempotent.
        store.mark_nullifier_spent("ab").unwrap();
        assert!(store.is_nullifier_spent("ab").unwrap());
    }

    #[test]
    fn duplicate_message_is_rejected() {
        let (_dir, store) = open_store();
        let record = MessageRecord {
            id: uuid::Uuid::new_v4().to_string(),
            recipient_key: "0xa1".to_string(),
            sender_key: None,
            ciphertext_b64: "aGVsbG8=".to_string(),
            kind: "note-transfer".to_string(),
            content_hash: "0x1234".to_string(),
            scheme: "poseidon-sha256-v1".to_string(),
            created_at: Utc::now(),
        };
        store.insert_message(&record).unwrap();
        assert!(matches!(
            store.insert_message(&record),
            Err(StoreError::AlreadyExists(_))
        ));
        assert_eq!(
            store.find_message("0x1234").unwrap().unwrap().recipient_key,
            "0xa1"
        );
    }

    #[test]
    fn store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.redb");
        {
            let store = Store::open(&path).unwrap();
            store.ensure_identity(identity("0xa1")).unwrap();
        }
        let store = Store::open(&path).unwrap();
        assert!(store.find_identity("0xa1").unwrap().is_some());
    }
}
