// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 CipherPay

//! Baby Jubjub EdDSA-Poseidon signature verification.
//!
//! Clients sign the Poseidon login message with an EdDSA key on the Baby
//! Jubjub twisted-Edwards curve (defined over the same BN254 scalar field the
//! sponge hashes in). The server only ever verifies; signing lives in the
//! client SDK and the proof circuits.
//!
//! The verification equation is the cofactor-cleared form used by the
//! circuits:
//!
//! ```text
//! h = Poseidon([R8.x, R8.y, A.x, A.y, msg])
//! accept iff (8·S)·B == 8·R8 + (8·h)·A
//! ```
//!
//! where `B` is the prime-order subgroup generator. A cryptographically
//! invalid signature yields `Ok(false)`, never an error: malformed encodings
//! are rejected upstream by [`FieldContext`](super::FieldContext) before any
//! curve work happens.

use ark_bn254::Fr;
use ark_ec::{AffineRepr, CurveGroup};
use ark_ed_on_bn254::{EdwardsAffine, EdwardsProjective, Fr as JubScalar};
use ark_ff::{BigInteger, PrimeField};
use num_bigint::BigUint;

use super::error::CryptoError;
use super::field::FieldContext;

/// An identity's bound verification key: an affine Baby Jubjub point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthPublicKey {
    pub x: Fr,
    pub y: Fr,
}

/// An EdDSA-Poseidon signature `(R8, S)` with `R8` in affine coordinates.
#[derive(Debug, Clone, Copy)]
pub struct Signature {
    pub r8_x: Fr,
    pub r8_y: Fr,
    pub s: Fr,
}

/// The Baby Jubjub prime subgroup order `l` as an arbitrary-precision integer.
fn subgroup_order() -> BigUint {
    BigUint::from_bytes_le(&JubScalar::MODULUS.to_bytes_le())
}

/// Reduce a base-field element into the Baby Jubjub scalar field.
fn to_scalar(value: &BigUint) -> JubScalar {
    JubScalar::from_le_bytes_mod_order(&value.to_bytes_le())
}

/// Verify an EdDSA-Poseidon signature over a single field element message.
///
/// Returns `Ok(false)` when:
/// - `R8` is not a point on the curve,
/// - the public key is not a valid point of the prime-order subgroup,
/// - `S >= l` (rejected outright, never wrapped into range),
/// - or the verification equation does not hold.
///
/// `Err(CryptoError::Internal)` is reserved for malfunction of the curve
/// backend itself and is fatal for the caller.
pub fn verify(
    ctx: &FieldContext,
    message: Fr,
    signature: &Signature,
    public_key: &AuthPublicKey,
) -> Result<bool, CryptoError> {
    let r8 = EdwardsAffine::new_unchecked(signature.r8_x, signature.r8_y);
    if !r8.is_on_curve() {
        return Ok(false);
    }

    let a = EdwardsAffine::new_unchecked(public_key.x, public_key.y);
    if !a.is_on_curve() || !a.is_in_correct_subgroup_assuming_on_curve() {
        return Ok(false);
    }

    let s_value = BigUint::from_bytes_le(&signature.s.into_bigint().to_bytes_le());
    if s_value >= subgroup_order() {
        return Ok(false);
    }

    let challenge = ctx.hash(&[
        signature.r8_x,
        signature.r8_y,
        public_key.x,
        public_key.y,
        message,
    ]);
    let challenge_value = BigUint::from_bytes_le(&challenge.into_bigint().to_bytes_le());

    let s8 = to_scalar(&(s_value * 8u8));
    let h8 = to_scalar(&(challenge_value * 8u8));
    let cofactor = JubScalar::from(8u64);

    let lhs = EdwardsProjective::from(EdwardsAffine::generator()) * s8;
    let rhs = EdwardsProjective::from(r8) * cofactor + EdwardsProjective::from(a) * h8;

    Ok(lhs.into_affine() == rhs.into_affine())
}
