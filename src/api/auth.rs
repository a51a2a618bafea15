// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 CipherPay

//! Challenge/response authentication endpoints.
//!
//! `POST /v1/auth/challenge` issues a single-use nonce for an owner key,
//! provisioning the identity on first contact. `POST /v1/auth/verify`
//! redeems the signed nonce for a bearer token. The flow semantics live in
//! [`crate::auth::ChallengeManager`]; these handlers only translate between
//! the wire and the domain.

use axum::{extract::State, Json};

use crate::{
    auth::ChallengeManager,
    error::ApiError,
    models::{ChallengeRequest, ChallengeResponse, UserInfo, VerifyRequest, VerifyResponse},
    state::AppState,
};

#[utoipa::path(
    post,
    path = "/v1/auth/challenge",
    request_body = ChallengeRequest,
    tag = "Auth",
    responses(
        (status = 200, description = "Challenge issued", body = ChallengeResponse),
        (status = 400, description = "Invalid encoding or missing auth key for a new identity")
    )
)]
pub async fn challenge(
    State(state): State<AppState>,
    Json(request): Json<ChallengeRequest>,
) -> Result<Json<ChallengeResponse>, ApiError> {
    let manager = ChallengeManager::new(&state.ctx, &state.store);
    let issued = manager.issue_challenge(&request.owner_key, request.auth_pub_key.as_ref())?;
    Ok(Json(ChallengeResponse {
        nonce: issued.nonce,
        expires_at: issued.expires_at,
    }))
}

#[utoipa::path(
    post,
    path = "/v1/auth/verify",
    request_body = VerifyRequest,
    tag = "Auth",
    responses(
        (status = 200, description = "Signature accepted, token issued", body = VerifyResponse),
        (status = 400, description = "Unknown user or expired/invalid nonce"),
        (status = 401, description = "Signature verification failed")
    )
)]
pub async fn verify(
    State(state): State<AppState>,
    Json(request): Json<VerifyRequest>,
) -> Result<Json<VerifyResponse>, ApiError> {
    let manager = ChallengeManager::new(&state.ctx, &state.store);
    let session = manager.verify_challenge(
        &request.owner_key,
        &request.nonce,
        &request.signature,
        request.auth_pub_key.as_ref(),
    )?;

    let token = state.tokens.issue(&session)?;
    tracing::info!(owner_key = %session.owner_key, "Issued bearer token");

    Ok(Json(VerifyResponse {
        token,
        user: UserInfo {
            id: session.subject,
            owner_key: session.owner_key,
        },
    }))
}
