// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 CipherPay

//! BN254 scalar field context with a Poseidon sponge hash.
//!
//! Every other cryptographic component (EdDSA verification, content
//! addressing, nullifier derivation, the login challenge message) hashes
//! through this one context. It is built exactly once at startup via
//! [`FieldContext::bootstrap`] and then shared read-only behind an `Arc` —
//! there is no lazy global, and the Poseidon parameter set never varies at
//! runtime.
//!
//! ## Circuit Contract
//!
//! The Poseidon parameters (rate 2, capacity 1, 8 full rounds, 57 partial
//! rounds, alpha 5 over the 254-bit BN254 scalar field) are the convention
//! shared with the companion proof circuits. Changing any of them silently
//! breaks signature verification, content dedupe, and nullifier checks for
//! every existing client, so they are pinned here and nowhere else.

use ark_bn254::Fr;
use ark_crypto_primitives::sponge::{
    poseidon::{find_poseidon_ark_and_mds, PoseidonConfig, PoseidonSponge},
    CryptographicSponge,
};
use ark_ff::{BigInteger, One, PrimeField};
use num_bigint::BigUint;

use super::error::CryptoError;

/// The BN254 scalar field modulus as an arbitrary-precision integer.
///
/// Used for canonical-range checks when decoding hex inputs.
pub(crate) fn field_modulus() -> BigUint {
    BigUint::from_bytes_le(&Fr::MODULUS.to_bytes_le())
}

/// Shared field arithmetic context: the BN254 scalar field plus a Poseidon
/// sponge configured with the pinned circuit parameters.
pub struct FieldContext {
    poseidon: PoseidonConfig<Fr>,
    modulus: BigUint,
}

impl FieldContext {
    /// Build the context and run the startup self-check.
    ///
    /// Returns `CryptoError::Internal` if the Poseidon backend misbehaves;
    /// callers must treat that as fatal and abort startup.
    pub fn bootstrap() -> Result<Self, CryptoError> {
        let ctx = Self {
            poseidon: poseidon_config(),
            modulus: field_modulus(),
        };
        ctx.self_check()?;
        Ok(ctx)
    }

    /// Poseidon hash over a sequence of field elements.
    ///
    /// Deterministic and side-effect free. The absorb order is significant:
    /// callers own their input ordering as part of the circuit contract.
    pub fn hash(&self, elements: &[Fr]) -> Fr {
        let mut sponge = PoseidonSponge::new(&self.poseidon);
        for element in elements {
            sponge.absorb(element);
        }
        sponge.squeeze_field_elements::<Fr>(1)[0]
    }

    /// Decode a big-endian hex string (with or without `0x` prefix) into a
    /// canonical field element.
    ///
    /// Rejects empty strings, non-hex characters, and any value `>= r`.
    /// Non-canonical values are an encoding error, never silently reduced.
    pub fn field_element_from_hex(&self, input: &str) -> Result<Fr, CryptoError> {
        let digits = input
            .strip_prefix("0x")
            .or_else(|| input.strip_prefix("0X"))
            .unwrap_or(input);

        if digits.is_empty() {
            return Err(CryptoError::InvalidEncoding("empty hex string".to_string()));
        }
        if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(CryptoError::InvalidEncoding(format!(
                "not a hex string: {input:?}"
            )));
        }

        let value = BigUint::parse_bytes(digits.as_bytes(), 16)
            .ok_or_else(|| CryptoError::InvalidEncoding(format!("not a hex string: {input:?}")))?;

        if value >= self.modulus {
            return Err(CryptoError::InvalidEncoding(
                "value not canonically reduced modulo the field order".to_string(),
            ));
        }

        Ok(Fr::from_le_bytes_mod_order(&value.to_bytes_le()))
    }

    /// Encode a field element as minimal 0x-prefixed big-endian hex.
    ///
    /// This is the API display form (`"0x" + n.toString(16)` on the client
    /// side); fixed-width little-endian encoding lives on
    /// [`crate::crypto::Nullifier`].
    pub fn fr_to_hex(&self, value: Fr) -> String {
        let n = BigUint::from_bytes_le(&value.into_bigint().to_bytes_le());
        format!("0x{}", n.to_str_radix(16))
    }

    /// The field modulus, for range checks outside the context.
    pub fn modulus(&self) -> &BigUint {
        &self.modulus
    }

    /// Startup sanity check of the field and sponge machinery.
    fn self_check(&self) -> Result<(), CryptoError> {
        let a = self.hash(&[Fr::from(1u64), Fr::from(2u64)]);
        let b = self.hash(&[Fr::from(1u64), Fr::from(2u64)]);
        if a != b {
            return Err(CryptoError::Internal(
                "poseidon self-check failed: hash is not deterministic".to_string(),
            ));
        }
        if a == self.hash(&[Fr::from(2u64), Fr::from(1u64)]) {
            return Err(CryptoError::Internal(
                "poseidon self-check failed: hash ignores input order".to_string(),
            ));
        }
        let one = self
            .field_element_from_hex("0x1")
            .map_err(|e| CryptoError::Internal(format!("field decode self-check failed: {e}")))?;
        if one != Fr::one() {
            return Err(CryptoError::Internal(
                "field decode self-check failed: 0x1 != 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Poseidon configuration pinned to the circuit convention.
///
/// Field: BN254 Fr (254 bits), rate 2, capacity 1, 8 full rounds,
/// 57 partial rounds, alpha 5, first generated matrix.
fn poseidon_config() -> PoseidonConfig<Fr> {
    let prime_bits: u64 = 254;
    let rate: usize = 2;
    let capacity: usize = 1;

    let full_rounds: u64 = 8;
    let partial_rounds: u64 = 57;

    // alpha = 5 is the standard S-box exponent for large prime fields
    let alpha: u64 = 5;

    let skip_matrices: u64 = 0;

    let (ark, mds) = find_poseidon_ark_and_mds::<Fr>(
        prime_bits,
        rate,
        full_rounds,
        partial_rounds,
        skip_matrices,
    );

    PoseidonConfig::new(
        full_rounds as usize,
        partial_rounds as usize,
        alpha,
        mds,
        ark,
        rate,
        capacity,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bootstrap_succeeds() {
        FieldContext::bootstrap().expect("bootstrap must pass the self-check");
    }

    #[test]
    fn hash_is_deterministic_and_order_sensitive() {
        let ctx = FieldContext::bootstrap().unwrap();
        let a = ctx.hash(&[Fr::from(7u64), Fr::from(11u64)]);
        let b = ctx.hash(&[Fr::from(7u64), Fr::from(11u64)]);
        let c = ctx.hash(&[Fr::from(11u64), Fr::from(7u64)]);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn hex_decoding_accepts_prefixed_and_bare() {
        let ctx = FieldContext::bootstrap().unwrap();
        assert_eq!(
            ctx.field_element_from_hex("0x2a").unwrap(),
            Fr::from(42u64)
        );
        assert_eq!(ctx.field_element_from_hex("2a").unwrap(), Fr::from(42u64));
        assert_eq!(ctx.field_element_from_hex("0X2A").unwrap(), Fr::from(42u64));
    }

    #[test]
    fn hex_decoding_rejects_garbage() {
        let ctx = FieldContext::bootstrap().unwrap();
        assert!(ctx.field_element_from_hex("").is_err());
        assert!(ctx.field_element_from_hex("0x").is_err());
        assert!(ctx.field_element_from_hex("0xzz").is_err());
        assert!(ctx.field_element_from_hex("hello").is_err());
    }

    #[test]
    fn hex_decoding_rejects_non_canonical_values() {
        let ctx = FieldContext::bootstrap().unwrap();
        // The modulus itself is the smallest non-canonical value.
        let modulus_hex = format!("0x{}", ctx.modulus().to_str_radix(16));
        assert!(ctx.field_element_from_hex(&modulus_hex).is_err());
        // One below the modulus is canonical.
        let max_hex = format!("0x{}", (ctx.modulus() - 1u8).to_str_radix(16));
        assert!(ctx.field_element_from_hex(&max_hex).is_ok());
    }

    #[test]
    fn fr_hex_round_trips() {
        let ctx = FieldContext::bootstrap().unwrap();
        let value = Fr::from(0xdeadbeefu64);
        let encoded = ctx.fr_to_hex(value);
        assert_eq!(encoded, "0xdeadbeef");
        assert_eq!(ctx.field_element_from_hex(&encoded).unwrap(), value);
    }
}
