// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 CipherPay

use std::sync::Arc;

use crate::auth::TokenIssuer;
use crate::crypto::FieldContext;
use crate::ledger::LedgerClient;
use crate::storage::Store;

/// Shared application state handed to every handler.
///
/// All members are cheaply cloneable handles; the state itself is immutable
/// after startup.
#[derive(Clone)]
pub struct AppState {
    /// Poseidon parameters and field encoding helpers.
    pub ctx: Arc<FieldContext>,
    /// Persistent identity, challenge, message, and spent-set storage.
    pub store: Arc<Store>,
    /// On-chain ledger client (may be disabled).
    pub ledger: Arc<LedgerClient>,
    /// Bearer-token issuer and verifier.
    pub tokens: Arc<TokenIssuer>,
}

impl AppState {
    pub fn new(
        ctx: FieldContext,
        store: Store,
        ledger: LedgerClient,
        tokens: TokenIssuer,
    ) -> Self {
        Self {
            ctx: Arc::new(ctx),
            store: Arc::new(store),
            ledger: Arc::new(ledger),
            tokens: Arc::new(tokens),
        }
    }
}
