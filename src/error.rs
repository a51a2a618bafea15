// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 CipherPay

//! API error type.
//!
//! Every handler failure is funneled into [`ApiError`], which renders the
//! uniform `{"error": ..., "error_code": ...}` JSON body. The `From`
//! implementations centralize the mapping from domain errors to HTTP
//! statuses so handlers can use `?` throughout.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::accounts::OverviewError;
use crate::auth::AuthFlowError;
use crate::crypto::CryptoError;
use crate::storage::StoreError;

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: &'static str,
    pub message: String,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    error_code: String,
}

impl ApiError {
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
        }
    }

    pub fn bad_request(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, code, message)
    }

    pub fn forbidden(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, code, message)
    }

    pub fn not_found(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, code, message)
    }

    pub fn conflict(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, code, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "internal_error", message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorBody {
            error: self.message,
            error_code: self.code.to_string(),
        });
        (self.status, body).into_response()
    }
}

impl From<CryptoError> for ApiError {
    fn from(e: CryptoError) -> Self {
        match e {
            CryptoError::InvalidEncoding(msg) => Self::bad_request("invalid_encoding", msg),
            CryptoError::Internal(msg) => {
                tracing::error!(error = %msg, "crypto failure");
                Self::internal("Internal cryptographic error")
            }
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::AlreadyExists(msg) => Self::conflict("duplicate_message", msg),
            StoreError::NotFound(msg) => Self::not_found("not_found", msg),
            other => {
                tracing::error!(error = %other, "storage failure");
                Self::internal("Storage error")
            }
        }
    }
}

impl From<AuthFlowError> for ApiError {
    fn from(e: AuthFlowError) -> Self {
        match e {
            AuthFlowError::UnknownUser => {
                Self::bad_request("unknown_user", "No identity exists for this owner key")
            }
            AuthFlowError::MissingAuthKey => Self::bad_request(
                "missing_auth_pub_key",
                "An authentication public key is required for a new identity",
            ),
            AuthFlowError::ChallengeExpiredOrInvalid => Self::bad_request(
                "nonce_expired_or_invalid",
                "The challenge nonce is unknown, already used, or expired",
            ),
            AuthFlowError::BadSignature => Self::new(
                StatusCode::UNAUTHORIZED,
                "bad_signature",
                "Signature verification failed",
            ),
            AuthFlowError::Crypto(e) => e.into(),
            AuthFlowError::Store(e) => e.into(),
        }
    }
}

impl From<OverviewError> for ApiError {
    fn from(e: OverviewError) -> Self {
        match e {
            OverviewError::Store(e) => e.into(),
            OverviewError::Join(msg) => {
                tracing::error!(error = %msg, "overview aggregation failure");
                Self::internal("Overview aggregation failed")
            }
        }
    }
}

impl From<jsonwebtoken::errors::Error> for ApiError {
    fn from(e: jsonwebtoken::errors::Error) -> Self {
        tracing::error!(error = %e, "token issuance failure");
        Self::internal("Token issuance failed")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    #[test]
    fn auth_flow_errors_map_to_statuses() {
        let e: ApiError = AuthFlowError::UnknownUser.into();
        assert_eq!(e.status, StatusCode::BAD_REQUEST);
        assert_eq!(e.code, "unknown_user");

        let e: ApiError = AuthFlowError::BadSignature.into();
        assert_eq!(e.status, StatusCode::UNAUTHORIZED);
        assert_eq!(e.code, "bad_signature");

        let e: ApiError = AuthFlowError::ChallengeExpiredOrInvalid.into();
        assert_eq!(e.code, "nonce_expired_or_invalid");
    }

    #[test]
    fn duplicate_message_is_conflict() {
        let e: ApiError = StoreError::AlreadyExists("message m1".to_string()).into();
        assert_eq!(e.status, StatusCode::CONFLICT);
        assert_eq!(e.code, "duplicate_message");
    }

    #[test]
    fn invalid_encoding_is_bad_request() {
        let e: ApiError = CryptoError::InvalidEncoding("bad hex".to_string()).into();
        assert_eq!(e.status, StatusCode::BAD_REQUEST);
        assert_eq!(e.code, "invalid_encoding");
    }

    #[tokio::test]
    async fn into_response_returns_json_body() {
        let response = ApiError::bad_request("invalid_encoding", "bad data").into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body_bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();
        assert_eq!(body["error"], "bad data");
        assert_eq!(body["error_code"], "invalid_encoding");
    }
}
