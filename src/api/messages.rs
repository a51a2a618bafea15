// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 CipherPay

//! Encrypted message intake.
//!
//! The server never sees plaintext: it stores the ciphertext as received
//! and binds it to the recipient with a Poseidon content commitment, which
//! doubles as the storage key and the idempotency token. Submitting the
//! same ciphertext to the same recipient twice is a conflict.

use axum::{extract::State, http::StatusCode, Json};
use base64::Engine;

use crate::{
    auth::Auth,
    crypto::{compute_content_hash, CONTENT_HASH_SCHEME},
    error::ApiError,
    models::{CreateMessageRequest, CreateMessageResponse, MessageKind},
    state::AppState,
    storage::MessageRecord,
};

#[utoipa::path(
    post,
    path = "/v1/messages",
    request_body = CreateMessageRequest,
    tag = "Messages",
    security(("bearer" = [])),
    responses(
        (status = 201, description = "Message stored", body = CreateMessageResponse),
        (status = 400, description = "Invalid encoding"),
        (status = 403, description = "Sender key does not match the authenticated identity"),
        (status = 409, description = "Identical content already stored for this recipient")
    )
)]
pub async fn create_message(
    State(state): State<AppState>,
    Auth(user): Auth,
    Json(request): Json<CreateMessageRequest>,
) -> Result<(StatusCode, Json<CreateMessageResponse>), ApiError> {
    if let Some(sender) = request.sender_key.as_deref() {
        if sender != user.owner_key {
            return Err(ApiError::forbidden(
                "sender_key_mismatch",
                "senderKey does not match the authenticated identity",
            ));
        }
    }

    // Deposits are self-addressed records of on-chain activity; the
    // authenticated identity is the only valid recipient.
    let recipient_key = if request.kind == MessageKind::NoteDeposit
        && request.recipient_key != user.owner_key
    {
        tracing::warn!(
            requested = %request.recipient_key,
            owner_key = %user.owner_key,
            "Overriding note-deposit recipient with the authenticated identity"
        );
        user.owner_key.clone()
    } else {
        request.recipient_key.clone()
    };

    let recipient = state.ctx.field_element_from_hex(&recipient_key)?;
    let ciphertext = base64::engine::general_purpose::STANDARD
        .decode(&request.ciphertext_b64)
        .map_err(|_| {
            ApiError::bad_request("invalid_encoding", "ciphertextB64 is not valid base64")
        })?;

    let content_hash = state
        .ctx
        .fr_to_hex(compute_content_hash(&state.ctx, recipient, &ciphertext));

    let record = MessageRecord {
        id: uuid::Uuid::new_v4().to_string(),
        recipient_key,
        sender_key: Some(user.owner_key),
        ciphertext_b64: request.ciphertext_b64,
        kind: request.kind.as_str().to_string(),
        content_hash: content_hash.clone(),
        scheme: CONTENT_HASH_SCHEME.to_string(),
        created_at: chrono::Utc::now(),
    };
    state.store.insert_message(&record)?;

    tracing::info!(content_hash = %content_hash, kind = %record.kind, "Stored message");

    Ok((
        StatusCode::CREATED,
        Json(CreateMessageResponse {
            id: record.id,
            content_hash,
            scheme: record.scheme,
        }),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{AuthenticatedUser, TokenIssuer};
    use crate::crypto::FieldContext;
    use crate::ledger::LedgerClient;
    use crate::storage::Store;

    fn state() -> (tempfile::TempDir, AppState) {
        let dir = tempfile::tempdir().unwrap();
        let state = AppState::new(
            FieldContext::bootstrap().unwrap(),
            Store::open(dir.path().join("test.redb")).unwrap(),
            LedgerClient::disabled(),
            TokenIssuer::new("test-secret", "cipherpay"),
        );
        (dir, state)
    }

    fn auth(owner_key: &str) -> Auth {
        Auth(AuthenticatedUser {
            user_id: "user-1".to_string(),
            owner_key: owner_key.to_string(),
        })
    }

    fn request(recipient: &str) -> CreateMessageRequest {
        CreateMessageRequest {
            recipient_key: recipient.to_string(),
            ciphertext_b64: base64::engine::general_purpose::STANDARD.encode(b"ciphertext"),
            kind: MessageKind::NoteTransfer,
            sender_key: None,
        }
    }

    #[tokio::test]
    async fn stores_message_and_returns_content_hash() {
        let (_dir, state) = state();
        let (status, Json(response)) =
            create_message(State(state.clone()), auth("0xa"), Json(request("0xb")))
                .await
                .expect("message stored");

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(response.scheme, CONTENT_HASH_SCHEME);

        let stored = state
            .store
            .find_message(&response.content_hash)
            .unwrap()
            .expect("message retrievable by content hash");
        assert_eq!(stored.recipient_key, "0xb");
        assert_eq!(stored.sender_key.as_deref(), Some("0xa"));
    }

    #[tokio::test]
    async fn duplicate_submission_is_a_conflict() {
        let (_dir, state) = state();
        create_message(State(state.clone()), auth("0xa"), Json(request("0xb")))
            .await
            .expect("first submission succeeds");

        let err = create_message(State(state), auth("0xa"), Json(request("0xb")))
            .await
            .err()
            .expect("second submission rejected");
        assert_eq!(err.status, StatusCode::CONFLICT);
        assert_eq!(err.code, "duplicate_message");
    }

    #[tokio::test]
    async fn same_ciphertext_to_different_recipients_is_allowed() {
        let (_dir, state) = state();
        create_message(State(state.clone()), auth("0xa"), Json(request("0xb")))
            .await
            .expect("first recipient succeeds");
        create_message(State(state), auth("0xa"), Json(request("0xc")))
            .await
            .expect("second recipient succeeds");
    }

    #[tokio::test]
    async fn sender_mismatch_is_forbidden() {
        let (_dir, state) = state();
        let mut req = request("0xb");
        req.sender_key = Some("0xdead".to_string());

        let err = create_message(State(state), auth("0xa"), Json(req))
            .await
            .err()
            .expect("mismatched sender rejected");
        assert_eq!(err.status, StatusCode::FORBIDDEN);
        assert_eq!(err.code, "sender_key_mismatch");
    }

    #[tokio::test]
    async fn deposit_recipient_is_overridden_to_self() {
        let (_dir, state) = state();
        let mut req = request("0xb");
        req.kind = MessageKind::NoteDeposit;

        let (_, Json(response)) = create_message(State(state.clone()), auth("0xa"), Json(req))
            .await
            .expect("deposit stored");

        let stored = state
            .store
            .find_message(&response.content_hash)
            .unwrap()
            .unwrap();
        assert_eq!(stored.recipient_key, "0xa");
    }

    #[tokio::test]
    async fn invalid_base64_is_rejected() {
        let (_dir, state) = state();
        let mut req = request("0xb");
        req.ciphertext_b64 = "!!not-base64!!".to_string();

        let err = create_message(State(state), auth("0xa"), Json(req))
            .await
            .err()
            .expect("bad base64 rejected");
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.code, "invalid_encoding");
    }
}
