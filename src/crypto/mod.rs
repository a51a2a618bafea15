// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 CipherPay

//! # Cryptographic Core
//!
//! The identity and commitment layer shared with the CipherPay proof
//! circuits:
//!
//! - `field` - BN254 field context and Poseidon sponge (built once at startup)
//! - `eddsa` - Baby Jubjub EdDSA-Poseidon signature verification
//! - `content_hash` - content addressing for encrypted message dedupe
//! - `nullifier` - nullifier derivation and canonical encoding for notes
//!
//! Everything here is pure computation over validated field elements. Hex
//! parsing and canonical-range checks happen at the edge
//! ([`FieldContext::field_element_from_hex`]); past that point the types
//! guarantee well-formed inputs.

pub mod content_hash;
pub mod eddsa;
pub mod error;
pub mod field;
pub mod nullifier;

pub use content_hash::{compute_content_hash, CONTENT_HASH_SCHEME};
pub use eddsa::{AuthPublicKey, Signature};
pub use error::CryptoError;
pub use field::FieldContext;
pub use nullifier::{compute_nullifier, Note, Nullifier};
