// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 CipherPay

//! CipherPay - Privacy-Preserving Payment Backend
//!
//! REST backend for the CipherPay shielded payment application. Clients
//! authenticate by signing server-issued nonces with Baby Jubjub EdDSA,
//! deposit end-to-end-encrypted messages addressed by Poseidon content
//! commitments, and compute shielded balances from nullifier spent status.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers (Axum)
//! - `auth` - Challenge/response authentication and bearer tokens
//! - `crypto` - Poseidon hashing, EdDSA verification, nullifiers
//! - `accounts` - Account overview aggregation
//! - `ledger` - On-chain spent-status lookups
//! - `storage` - Embedded persistent storage (redb)

pub mod accounts;
pub mod api;
pub mod auth;
pub mod config;
pub mod crypto;
pub mod error;
pub mod ledger;
pub mod models;
pub mod state;
pub mod storage;
