// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 CipherPay

//! Content addressing for stored messages.
//!
//! Every encrypted message is keyed by a deterministic field element derived
//! from (recipient identity, ciphertext). Two submissions with identical
//! inputs collide on purpose — that is the idempotency guarantee — and the
//! storage layer's uniqueness constraint turns the collision into a 409
//! rather than a second row.
//!
//! ## Scheme
//!
//! The canonical scheme is digest-first and versioned:
//!
//! ```text
//! content_hash = Poseidon([recipient, SHA-256(ciphertext) mod r])
//! ```
//!
//! The version tag is persisted with every message so a future scheme change
//! can never be confused with this one. Hashing raw ciphertext limbs into the
//! sponge directly is NOT this scheme and must never coexist with it in one
//! deployment.

use ark_bn254::Fr;
use ark_ff::PrimeField;
use sha2::{Digest, Sha256};

use super::field::FieldContext;

/// Version tag for the digest-first content hash scheme.
pub const CONTENT_HASH_SCHEME: &str = "poseidon-sha256-v1";

/// Compute the content hash of a ciphertext addressed to a recipient.
///
/// Pure and restart-stable: no randomness, no timestamps.
pub fn compute_content_hash(ctx: &FieldContext, recipient: Fr, ciphertext: &[u8]) -> Fr {
    let digest = Sha256::digest(ciphertext);
    // The 256-bit digest may exceed the 254-bit field order; reduction here
    // is part of the scheme, not an encoding error.
    let digest_field = Fr::from_be_bytes_mod_order(&digest);
    ctx.hash(&[recipient, digest_field])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> FieldContext {
        FieldContext::bootstrap().unwrap()
    }

    #[test]
    fn identical_inputs_collide_on_purpose() {
        let ctx = ctx();
        let recipient = Fr::from(0xa1u64);
        let a = compute_content_hash(&ctx, recipient, b"ciphertext bytes");
        let b = compute_content_hash(&ctx, recipient, b"ciphertext bytes");
        assert_eq!(a, b);
    }

    #[test]
    fn one_flipped_bit_changes_the_hash() {
        let ctx = ctx();
        let recipient = Fr::from(0xa1u64);
        let mut ciphertext = b"ciphertext bytes".to_vec();
        let original = compute_content_hash(&ctx, recipient, &ciphertext);
        ciphertext[3] ^= 0x01;
        let flipped = compute_content_hash(&ctx, recipient, &ciphertext);
        assert_ne!(original, flipped);
    }

    #[test]
    fn recipient_is_part_of_the_address() {
        let ctx = ctx();
        let a = compute_content_hash(&ctx, Fr::from(1u64), b"same bytes");
        let b = compute_content_hash(&ctx, Fr::from(2u64), b"same bytes");
        assert_ne!(a, b);
    }

    #[test]
    fn empty_ciphertext_is_well_defined() {
        let ctx = ctx();
        let a = compute_content_hash(&ctx, Fr::from(1u64), b"");
        let b = compute_content_hash(&ctx, Fr::from(1u64), b"");
        assert_eq!(a, b);
    }
}
