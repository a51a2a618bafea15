// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 CipherPay

//! Nullifier derivation for shielded notes.
//!
//! A nullifier is the deterministic tag a note reveals when spent. The
//! derivation mirrors the `NullifierFromCipherKey` circuit template:
//!
//! ```text
//! nullifier = Poseidon([owner_key, randomness.r, token_id])
//! ```
//!
//! The input order and arity are the circuit contract — reordering them would
//! silently orphan every deployed note. The canonical wire encoding is the
//! 32-byte little-endian hex form (64 lowercase chars, no prefix), a bijection
//! on `[0, r)`.

use ark_bn254::Fr;
use ark_ff::{BigInteger, PrimeField};
use num_bigint::BigUint;

use super::error::CryptoError;
use super::field::{field_modulus, FieldContext};

/// A client-held shielded note. The server never mutates one, it only
/// derives values from it.
#[derive(Debug, Clone, Copy)]
pub struct Note {
    /// Amount in the token's smallest unit.
    pub amount: u128,
    /// Token identifier as a field element.
    pub token_id: Fr,
    /// Owner's CipherPay public key as a field element.
    pub owner_key: Fr,
    /// Primary note randomness, part of the nullifier preimage.
    pub r: Fr,
    /// Secondary randomness; carried by some note versions, unused in the
    /// nullifier derivation.
    pub s: Option<Fr>,
}

/// A derived nullifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Nullifier(Fr);

impl Nullifier {
    /// Encode as 64 lowercase hex chars of the 32-byte little-endian field
    /// representation. Exact inverse of [`Nullifier::from_hex`].
    pub fn to_hex(&self) -> String {
        let mut bytes = self.0.into_bigint().to_bytes_le();
        bytes.resize(32, 0);
        hex::encode(bytes)
    }

    /// Decode the canonical 32-byte little-endian hex form.
    ///
    /// Rejects anything that is not exactly 64 hex chars or whose value is
    /// not canonically reduced modulo the field order.
    pub fn from_hex(input: &str) -> Result<Self, CryptoError> {
        if input.len() != 64 {
            return Err(CryptoError::InvalidEncoding(format!(
                "nullifier must be 64 hex chars, got {}",
                input.len()
            )));
        }
        let bytes = hex::decode(input)
            .map_err(|e| CryptoError::InvalidEncoding(format!("nullifier hex: {e}")))?;

        let value = BigUint::from_bytes_le(&bytes);
        if value >= field_modulus() {
            return Err(CryptoError::InvalidEncoding(
                "nullifier not canonically reduced modulo the field order".to_string(),
            ));
        }
        Ok(Self(Fr::from_le_bytes_mod_order(&bytes)))
    }

    /// The underlying field element.
    pub fn as_field(&self) -> Fr {
        self.0
    }
}

/// Derive the nullifier for a note.
pub fn compute_nullifier(ctx: &FieldContext, note: &Note) -> Nullifier {
    Nullifier(ctx.hash(&[note.owner_key, note.r, note.token_id]))
}
