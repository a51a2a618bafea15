// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 CipherPay

//! Nonce challenge/response login flow.
//!
//! Per identity a challenge moves through
//! `NoChallenge → Issued → {Verified | Expired | Invalidated}`. A challenge
//! verifies at most once: consumption is a conditional store update that only
//! succeeds while the row is still unconsumed and unexpired, so two racing
//! verifications cannot both win — the loser observes
//! [`AuthFlowError::ChallengeExpiredOrInvalid`].
//!
//! The signed login message is `Poseidon([nonce, owner_key])`, the convention
//! the client SDK and circuits share.

use chrono::{DateTime, Duration, Utc};
use rand::RngCore;

use crate::crypto::{eddsa, AuthPublicKey, CryptoError, FieldContext, Signature};
use crate::models::{AuthPublicKeyHex, SignatureHex};
use crate::storage::{ChallengeRecord, IdentityRecord, Store, StoreError};

/// Challenge lifetime. Fixed by the protocol, not configurable.
const CHALLENGE_TTL_MINUTES: i64 = 10;

#[derive(Debug, thiserror::Error)]
pub enum AuthFlowError {
    /// The identity does not exist.
    #[error("unknown user")]
    UnknownUser,

    /// A never-seen identity cannot be provisioned, or verified, without a
    /// verification key.
    #[error("missing auth public key")]
    MissingAuthKey,

    /// No matching challenge, already consumed, or past its expiry.
    #[error("nonce expired or invalid")]
    ChallengeExpiredOrInvalid,

    /// The signature did not verify under the resolved key.
    #[error("bad signature")]
    BadSignature,

    /// Malformed or non-canonical input, or a broken crypto backend.
    #[error(transparent)]
    Crypto(#[from] CryptoError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// A freshly issued challenge, returned to the caller.
#[derive(Debug, Clone)]
pub struct IssuedChallenge {
    /// 64-char lowercase hex nonce, always a canonical field encoding.
    pub nonce: String,
    pub expires_at: DateTime<Utc>,
}

/// An authenticated session descriptor, handed to the token issuer.
#[derive(Debug, Clone)]
pub struct Session {
    /// Internal identity id (JWT subject).
    pub subject: String,
    pub owner_key: String,
}

/// Drives the challenge/verify authentication flow.
pub struct ChallengeManager<'a> {
    ctx: &'a FieldContext,
    store: &'a Store,
}

impl<'a> ChallengeManager<'a> {
    pub fn new(ctx: &'a FieldContext, store: &'a Store) -> Self {
        Self { ctx, store }
    }

    /// Issue a fresh single-use challenge for an identity.
    ///
    /// Unknown identities are provisioned on the fly when `auth_pub_key` is
    /// supplied, and rejected with [`AuthFlowError::MissingAuthKey`] when it
    /// is not. Prior unconsumed challenges stay valid; concurrent challenges
    /// per identity are allowed.
    pub fn issue_challenge(
        &self,
        owner_key: &str,
        auth_pub_key: Option<&AuthPublicKeyHex>,
    ) -> Result<IssuedChallenge, AuthFlowError> {
        // Validate encodings before touching storage.
        self.ctx.field_element_from_hex(owner_key)?;
        if let Some(key) = auth_pub_key {
            self.parse_auth_key(key)?;
        }

        let identity = self.store.find_identity(owner_key)?;
        if identity.is_none() {
            let key = auth_pub_key.ok_or(AuthFlowError::MissingAuthKey)?;
            self.store.ensure_identity(IdentityRecord {
                id: uuid::Uuid::new_v4().to_string(),
                owner_key: owner_key.to_string(),
                auth_pub_x: Some(key.x.clone()),
                auth_pub_y: Some(key.y.clone()),
                created_at: Utc::now(),
            })?;
            tracing::info!(owner_key, "Provisioned new identity at challenge time");
        }

        let nonce = self.generate_nonce();
        let issued_at = Utc::now();
        let expires_at = issued_at + Duration::minutes(CHALLENGE_TTL_MINUTES);
        self.store.create_challenge(&ChallengeRecord {
            owner_key: owner_key.to_string(),
            nonce: nonce.clone(),
            issued_at,
            expires_at,
            consumed: false,
        })?;

        Ok(IssuedChallenge { nonce, expires_at })
    }

    /// Verify a signed challenge response and consume the challenge.
    ///
    /// On the first successful verification of an identity that has no bound
    /// auth key, the caller-supplied key is bound (a conditional store
    /// operation — a concurrent first verification cannot bind a different
    /// key).
    pub fn verify_challenge(
        &self,
        owner_key: &str,
        nonce: &str,
        signature: &SignatureHex,
        auth_pub_key: Option<&AuthPublicKeyHex>,
    ) -> Result<Session, AuthFlowError> {
        let identity = self
            .store
            .find_identity(owner_key)?
            .ok_or(AuthFlowError::UnknownUser)?;

        let now = Utc::now();
        let challenge = self
            .store
            .find_challenge(owner_key, nonce)?
            .ok_or(AuthFlowError::ChallengeExpiredOrInvalid)?;
        if challenge.consumed || now > challenge.expires_at {
            return Err(AuthFlowError::ChallengeExpiredOrInvalid);
        }

        let nonce_field = self.ctx.field_element_from_hex(nonce)?;
        let owner_field = self.ctx.field_element_from_hex(owner_key)?;
        let message = self.ctx.hash(&[nonce_field, owner_field]);

        // Bound key wins; the supplied key only matters on the first-time
        // binding path.
        let verification_key = match (identity.auth_pub_x.as_deref(), identity.auth_pub_y.as_deref())
        {
            (Some(x), Some(y)) => self.parse_auth_key(&AuthPublicKeyHex {
                x: x.to_string(),
                y: y.to_string(),
            })?,
            _ => {
                let key = auth_pub_key.ok_or(AuthFlowError::MissingAuthKey)?;
                self.parse_auth_key(key)?
            }
        };

        let sig = self.parse_signature(signature)?;
        if !eddsa::verify(self.ctx, message, &sig, &verification_key)? {
            return Err(AuthFlowError::BadSignature);
        }

        // Single-use enforcement: the conditional update rechecks
        // unconsumed-and-unexpired inside one write transaction. A racing
        // verifier that lost gets ChallengeExpiredOrInvalid here.
        if !self.store.consume_challenge_if_valid(owner_key, nonce, now)? {
            return Err(AuthFlowError::ChallengeExpiredOrInvalid);
        }

        if !identity.has_auth_key() {
            if let Some(key) = auth_pub_key {
                let bound = self.store.bind_auth_key_if_unset(owner_key, &key.x, &key.y)?;
                if bound {
                    tracing::info!(owner_key, "Bound auth public key on first verification");
                }
            }
        }

        Ok(Session {
            subject: identity.id,
            owner_key: identity.owner_key,
        })
    }

    /// Generate a 256-bit nonce whose hex form is a canonical field encoding.
    ///
    /// Rejection-sampled below the field order so `field_element_from_hex`
    /// accepts every nonce we hand out (expected iterations ≈ 1.04 for the
    /// 254-bit BN254 order).
    fn generate_nonce(&self) -> String {
        let mut rng = rand::rngs::OsRng;
        loop {
            let mut bytes = [0u8; 32];
            rng.fill_bytes(&mut bytes);
            if &num_bigint::BigUint::from_bytes_be(&bytes) < self.ctx.modulus() {
                return hex::encode(bytes);
            }
        }
    }

    fn parse_auth_key(&self, key: &AuthPublicKeyHex) -> Result<AuthPublicKey, AuthFlowError> {
        Ok(AuthPublicKey {
            x: self.ctx.field_element_from_hex(&key.x)?,
            y: self.ctx.field_element_from_hex(&key.y)?,
        })
    }

    fn parse_signature(&self, signature: &SignatureHex) -> Result<Signature, AuthFlowError> {
        Ok(Signature {
            r8_x: self.ctx.field_element_from_hex(&signature.r8x)?,
            r8_y: self.ctx.field_element_from_hex(&signature.r8y)?,
            s: self.ctx.field_element_from_hex(&signature.s)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::eddsa::testkey::SigningKey;

    fn setup() -> (tempfile::TempDir, FieldContext, Store) {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(dir.path().join("test.redb")).unwrap();
        let ctx = FieldContext::bootstrap().unwrap();
        (dir, ctx, store)
    }

    fn key_hex(ctx: &FieldContext, key: &SigningKey) -> AuthPublicKeyHex {
        AuthPublicKeyHex {
            x: ctx.fr_to_hex(key.public.x),
            y: ctx.fr_to_hex(key.public.y),
        }
    }

    fn sign_login(
        ctx: &FieldContext,
        key: &SigningKey,
        nonce: &str,
        owner_key: &str,
    ) -> SignatureHex {
        let message = ctx.hash(&[
            ctx.field_element_from_hex(nonce).unwrap(),
            ctx.field_element_from_hex(owner_key).unwrap(),
        ]);
        let sig = key.sign(ctx, message);
        SignatureHex {
            r8x: ctx.fr_to_hex(sig.r8_x),
            r8y: ctx.fr_to_hex(sig.r8_y),
            s: ctx.fr_to_hex(sig.s),
        }
    }

    #[test]
    fn unknown_identity_without_key_is_rejected() {
        let (_dir, ctx, store) = setup();
        let manager = ChallengeManager::new(&ctx, &store);
        assert!(matches!(
            manager.issue_challenge("0xa1", None),
            Err(AuthFlowError::MissingAuthKey)
        ));
    }

    #[test]
    fn issue_validates_owner_key_encoding() {
        let (_dir, ctx, store) = setup();
        let manager = ChallengeManager::new(&ctx, &store);
        assert!(matches!(
            manager.issue_challenge("not-hex", None),
            Err(AuthFlowError::Crypto(CryptoError::InvalidEncoding(_)))
        ));
    }

    #[test]
    fn nonce_is_canonical_hex() {
        let (_dir, ctx, store) = setup();
        let manager = ChallengeManager::new(&ctx, &store);
        let key = SigningKey::from_seed(1);
        let issued = manager
            .issue_challenge("0xa1", Some(&key_hex(&ctx, &key)))
            .unwrap();
        assert_eq!(issued.nonce.len(), 64);
        assert!(ctx.field_element_from_hex(&issued.nonce).is_ok());
        assert!(issued.expires_at > Utc::now());
    }

    #[test]
    fn full_flow_verifies_exactly_once() {
        let (_dir, ctx, store) = setup();
        let manager = ChallengeManager::new(&ctx, &store);
        let key = SigningKey::from_seed(2);
        let owner = "0xa1";

        let issued = manager
            .issue_challenge(owner, Some(&key_hex(&ctx, &key)))
            .unwrap();
        let sig = sign_login(&ctx, &key, &issued.nonce, owner);

        let session = manager
            .verify_challenge(owner, &issued.nonce, &sig, None)
            .unwrap();
        assert_eq!(session.owner_key, owner);

        // Replay with the same nonce fails.
        assert!(matches!(
            manager.verify_challenge(owner, &issued.nonce, &sig, None),
            Err(AuthFlowError::ChallengeExpiredOrInvalid)
        ));
    }

    #[test]
    fn unknown_user_fails_verification() {
        let (_dir, ctx, store) = setup();
        let manager = ChallengeManager::new(&ctx, &store);
        let key = SigningKey::from_seed(3);
        let sig = sign_login(&ctx, &key, &"11".repeat(32), "0xa1");
        assert!(matches!(
            manager.verify_challenge("0xa1", &"11".repeat(32), &sig, None),
            Err(AuthFlowError::UnknownUser)
        ));
    }

    #[test]
    fn bad_signature_is_rejected_and_challenge_stays_valid() {
        let (_dir, ctx, store) = setup();
        let manager = ChallengeManager::new(&ctx, &store);
        let key = SigningKey::from_seed(4);
        let owner = "0xa1";

        let issued = manager
            .issue_challenge(owner, Some(&key_hex(&ctx, &key)))
            .unwrap();
        let mut sig = sign_login(&ctx, &key, &issued.nonce, owner);
        sig.s = ctx.fr_to_hex(ark_bn254::Fr::from(12345u64));

        assert!(matches!(
            manager.verify_challenge(owner, &issued.nonce, &sig, None),
            Err(AuthFlowError::BadSignature)
        ));

        // A bad signature does not consume the challenge; a correct one
        // afterwards still succeeds.
        let good = sign_login(&ctx, &key, &issued.nonce, owner);
        assert!(manager
            .verify_challenge(owner, &issued.nonce, &good, None)
            .is_ok());
    }

    #[test]
    fn expired_challenge_fails_despite_correct_signature() {
        let (_dir, ctx, store) = setup();
        let manager = ChallengeManager::new(&ctx, &store);
        let key = SigningKey::from_seed(5);
        let owner = "0xa1";
        manager
            .issue_challenge(owner, Some(&key_hex(&ctx, &key)))
            .unwrap();

        // Write an already-expired challenge directly.
        let nonce = "22".repeat(32);
        store
            .create_challenge(&ChallengeRecord {
                owner_key: owner.to_string(),
                nonce: nonce.clone(),
                issued_at: Utc::now() - Duration::minutes(20),
                expires_at: Utc::now() - Duration::minutes(10),
                consumed: false,
            })
            .unwrap();

        let sig = sign_login(&ctx, &key, &nonce, owner);
        assert!(matches!(
            manager.verify_challenge(owner, &nonce, &sig, None),
            Err(AuthFlowError::ChallengeExpiredOrInvalid)
        ));
    }

    #[test]
    fn first_use_binding_is_permanent() {
        let (_dir, ctx, store) = setup();
        let manager = ChallengeManager::new(&ctx, &store);
        let key = SigningKey::from_seed(6);
        let other = SigningKey::from_seed(7);
        let owner = "0xa1";

        // Provision the identity without a bound key.
        store
            .ensure_identity(IdentityRecord {
                id: uuid::Uuid::new_v4().to_string(),
                owner_key: owner.to_string(),
                auth_pub_x: None,
                auth_pub_y: None,
                created_at: Utc::now(),
            })
            .unwrap();

        let issued = manager.issue_challenge(owner, None).unwrap();
        let sig = sign_login(&ctx, &key, &issued.nonce, owner);

        // Never-bound identity with no supplied key cannot verify.
        assert!(matches!(
            manager.verify_challenge(owner, &issued.nonce, &sig, None),
            Err(AuthFlowError::MissingAuthKey)
        ));

        // First verification with a supplied key binds it.
        manager
            .verify_challenge(owner, &issued.nonce, &sig, Some(&key_hex(&ctx, &key)))
            .unwrap();
        let stored = store.find_identity(owner).unwrap().unwrap();
        assert_eq!(stored.auth_pub_x, Some(ctx.fr_to_hex(key.public.x)));

        // Re-issuing with a different key is accepted for issuance, but the
        // bound key remains and still verifies.
        let issued = manager
            .issue_challenge(owner, Some(&key_hex(&ctx, &other)))
            .unwrap();
        let sig = sign_login(&ctx, &key, &issued.nonce, owner);
        manager
            .verify_challenge(owner, &issued.nonce, &sig, None)
            .unwrap();
        let stored = store.find_identity(owner).unwrap().unwrap();
        assert_eq!(stored.auth_pub_x, Some(ctx.fr_to_hex(key.public.x)));

        // The other key does not verify against the bound identity.
        let issued = manager.issue_challenge(owner, None).unwrap();
        let sig = sign_login(&ctx, &other, &issued.nonce, owner);
        assert!(matches!(
            manager.verify_challenge(owner, &issued.nonce, &sig, None),
            Err(AuthFlowError::BadSignature)
        ));
    }
}
