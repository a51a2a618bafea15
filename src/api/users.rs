// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 CipherPay

use axum::{extract::State, Json};

use crate::{auth::Auth, error::ApiError, models::UserInfo, state::AppState};

/// Return the identity behind the presented bearer token.
#[utoipa::path(
    get,
    path = "/v1/users/me",
    tag = "Users",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "The authenticated identity", body = UserInfo),
        (status = 401, description = "Missing or invalid bearer token")
    )
)]
pub async fn me(
    State(state): State<AppState>,
    Auth(user): Auth,
) -> Result<Json<UserInfo>, ApiError> {
    // The token is self-contained, but reconfirm the identity still exists.
    let identity = state
        .store
        .find_identity(&user.owner_key)?
        .ok_or_else(|| ApiError::not_found("not_found", "Identity no longer exists"))?;

    Ok(Json(UserInfo {
        id: identity.id,
        owner_key: identity.owner_key,
    }))
}
