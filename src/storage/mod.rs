// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 CipherPay

//! # Persistence Module
//!
//! Embedded storage for identities, login challenges, the spent-nullifier
//! set, and content-addressed messages, backed by redb (pure Rust, ACID).
//!
//! redb serializes write transactions (single writer). The two operations the
//! authentication flow needs to be atomic — consume-challenge-if-valid and
//! bind-auth-key-if-unset — are each one write transaction, so a racing
//! second caller always observes the committed outcome of the first, never an
//! intermediate state.
//!
//! ## Table Layout
//!
//! - `identities`: owner_key → serialized IdentityRecord
//! - `challenges`: composite key (owner_key|nonce) → serialized ChallengeRecord
//! - `spent_nullifiers`: nullifier hex → marked-at unix seconds
//! - `messages`: content_hash → serialized MessageRecord (uniqueness key)

pub mod db;

pub use db::{ChallengeRecord, IdentityRecord, MessageRecord, Store, StoreError, StoreResult};
