// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 CipherPay

//! Axum extractor for authenticated users.
//!
//! Use the `Auth` extractor in handlers to require authentication:
//!
//! ```rust,ignore
//! async fn my_handler(Auth(user): Auth) -> impl IntoResponse {
//!     // user.owner_key is the verified owner key
//! }
//! ```

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};

use super::error::AuthError;
use crate::state::AppState;

/// The verified identity behind a bearer token.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    /// Internal identity id (JWT subject).
    pub user_id: String,
    /// Owner public key, 0x-prefixed hex.
    pub owner_key: String,
}

/// Extractor that validates the JWT from the Authorization header.
pub struct Auth(pub AuthenticatedUser);

impl FromRequestParts<AppState> for Auth {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(AUTHORIZATION)
            .ok_or(AuthError::MissingAuthHeader)?
            .to_str()
            .map_err(|_| AuthError::InvalidAuthHeader)?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or(AuthError::InvalidAuthHeader)?;

        let claims = state.tokens.verify(token)?;

        Ok(Auth(AuthenticatedUser {
            user_id: claims.sub,
            owner_key: claims.owner_key,
        }))
    }
}
