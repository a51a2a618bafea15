// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 CipherPay

//! Shielded balance and nullifier status endpoints.
//!
//! The overview endpoint accepts the caller's decrypted notes (decryption
//! is client-side; the server only ever sees note fields the caller chose
//! to reveal for balance computation) and returns spent statuses and the
//! spendable balance. The nullifier endpoint answers for a single
//! nullifier, optionally consulting the on-chain ledger.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::{
    accounts::compute_account_overview,
    auth::Auth,
    crypto::Nullifier,
    error::ApiError,
    models::{NoteStatusDto, NullifierStatusResponse, OverviewRequest, OverviewResponse},
    state::AppState,
};

#[utoipa::path(
    post,
    path = "/v1/account/overview",
    request_body = OverviewRequest,
    tag = "Overview",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Aggregated balance and note statuses", body = OverviewResponse),
        (status = 400, description = "A note field is malformed"),
        (status = 401, description = "Missing or invalid bearer token")
    )
)]
pub async fn account_overview(
    State(state): State<AppState>,
    Auth(_user): Auth,
    Json(request): Json<OverviewRequest>,
) -> Result<Json<OverviewResponse>, ApiError> {
    let notes = request
        .notes
        .iter()
        .map(|dto| dto.parse(&state.ctx))
        .collect::<Result<Vec<_>, _>>()?;

    let overview = compute_account_overview(
        state.ctx.clone(),
        state.store.clone(),
        state.ledger.clone(),
        notes,
        request.check_on_chain,
    )
    .await?;

    Ok(Json(OverviewResponse {
        shielded_balance: overview.shielded_balance.to_string(),
        spendable_notes: overview.spendable_notes,
        total_notes: overview.total_notes,
        notes: overview
            .notes
            .into_iter()
            .map(|n| NoteStatusDto {
                nullifier: n.nullifier_hex,
                spent: n.is_spent,
                amount: n.amount.to_string(),
            })
            .collect(),
    }))
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct NullifierQuery {
    /// When true, consult the on-chain ledger in addition to the local set.
    #[serde(default)]
    pub on_chain: bool,
}

#[utoipa::path(
    get,
    path = "/v1/nullifiers/{nullifier}",
    params(
        ("nullifier" = String, Path, description = "Canonical 64-char hex nullifier"),
        NullifierQuery
    ),
    tag = "Overview",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Spent status", body = NullifierStatusResponse),
        (status = 400, description = "Not a canonical nullifier encoding")
    )
)]
pub async fn nullifier_status(
    State(state): State<AppState>,
    Auth(_user): Auth,
    Path(nullifier): Path<String>,
    Query(query): Query<NullifierQuery>,
) -> Result<Json<NullifierStatusResponse>, ApiError> {
    // Canonicality check before any lookup; a non-canonical encoding can
    // never name a stored nullifier.
    Nullifier::from_hex(&nullifier)?;

    let local = state.store.is_nullifier_spent(&nullifier)?;
    let spent = if query.on_chain {
        match state.ledger.is_nullifier_spent(&nullifier).await {
            Ok(on_chain) => on_chain,
            Err(e) => {
                tracing::warn!(
                    nullifier = %nullifier,
                    error = %e,
                    "On-chain spent lookup unavailable, answering from local spent set"
                );
                local
            }
        }
    } else {
        local
    };

    Ok(Json(NullifierStatusResponse { nullifier, spent }))
}
