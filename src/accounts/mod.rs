// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 CipherPay

//! # Account Overview Aggregation
//!
//! Combines nullifier derivation with spent-status lookups to compute a
//! user's shielded balance and note counts from their decrypted notes.
//!
//! Per-note work (nullifier derivation, local spent-set lookup, optional
//! on-chain lookup) is independent and fans out across tasks; aggregation is
//! commutative so join order does not matter. The on-chain ledger is ground
//! truth when it answers; when it fails or times out the note falls back to
//! the local spent set and the degradation is logged at warning level —
//! ledger unavailability is never fatal for an overview.
//!
//! The balance sum uses arbitrary-precision arithmetic: individual amounts
//! fit in a u128, their sum need not.

use std::sync::Arc;

use num_bigint::BigUint;
use tokio::task::JoinSet;

use crate::crypto::{compute_nullifier, FieldContext, Note};
use crate::ledger::LedgerClient;
use crate::storage::{Store, StoreError};

#[derive(Debug, thiserror::Error)]
pub enum OverviewError {
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A fan-out task failed to join (panic or cancellation).
    #[error("overview task failed: {0}")]
    Join(String),
}

/// Spent status and identifying detail for one note.
#[derive(Debug, Clone)]
pub struct NoteStatus {
    /// Canonical 64-char hex encoding of the note's nullifier.
    pub nullifier_hex: String,
    pub is_spent: bool,
    pub amount: u128,
}

/// Aggregated view over a set of notes.
#[derive(Debug, Clone)]
pub struct AccountOverview {
    /// Sum of amounts over unspent notes (unbounded precision).
    pub shielded_balance: BigUint,
    /// Number of notes not yet spent.
    pub spendable_notes: usize,
    /// Total number of notes considered.
    pub total_notes: usize,
    /// Per-note detail, in input order.
    pub notes: Vec<NoteStatus>,
}

/// Compute the account overview for a set of notes.
///
/// Input notes are taken by value and never mutated; the result is a fresh
/// value, safe to discard and recompute. Empty input yields zero balance and
/// zero counts.
pub async fn compute_account_overview(
    ctx: Arc<FieldContext>,
    store: Arc<Store>,
    ledger: Arc<LedgerClient>,
    notes: Vec<Note>,
    check_on_chain: bool,
) -> Result<AccountOverview, OverviewError> {
    let total_notes = notes.len();
    let mut tasks = JoinSet::new();

    for (index, note) in notes.into_iter().enumerate() {
        let ctx = Arc::clone(&ctx);
        let store = Arc::clone(&store);
        let ledger = Arc::clone(&ledger);
        tasks.spawn(async move {
            let status = note_status(&ctx, &store, &ledger, &note, check_on_chain).await?;
            Ok::<(usize, NoteStatus), StoreError>((index, status))
        });
    }

    // Join in completion order, then restore input order for the detail list.
    let mut slots: Vec<Option<NoteStatus>> = std::iter::repeat_with(|| None)
        .take(total_notes)
        .collect();
    while let Some(joined) = tasks.join_next().await {
        let (index, status) = joined.map_err(|e| OverviewError::Join(e.to_string()))??;
        slots[index] = Some(status);
    }

    let notes: Vec<NoteStatus> = slots.into_iter().flatten().collect();
    debug_assert_eq!(notes.len(), total_notes);

    let shielded_balance: BigUint = notes
        .iter()
        .filter(|n| !n.is_spent)
        .map(|n| BigUint::from(n.amount))
        .sum();
    let spendable_notes = notes.iter().filter(|n| !n.is_spent).count();

    Ok(AccountOverview {
        shielded_balance,
        spendable_notes,
        total_notes,
        notes,
    })
}

/// Resolve the spent status of a single note.
async fn note_status(
    ctx: &FieldContext,
    store: &Store,
    ledger: &LedgerClient,
    note: &Note,
    check_on_chain: bool,
) -> Result<NoteStatus, StoreError> {
    let nullifier_hex = compute_nullifier(ctx, note).to_hex();
    let local = store.is_nullifier_spent(&nullifier_hex)?;

    let is_spent = if check_on_chain {
        match ledger.is_nullifier_spent(&nullifier_hex).await {
            // The chain is ground truth and supersedes the local set.
            Ok(on_chain) => on_chain,
            Err(e) => {
                tracing::warn!(
                    nullifier = %nullifier_hex,
                    error = %e,
                    "On-chain spent lookup unavailable, falling back to local spent set"
                );
                local
            }
        }
    } else {
        local
    };

    Ok(NoteStatus {
        nullifier_hex,
        is_spent,
        amount: note.amount,
    })
}
