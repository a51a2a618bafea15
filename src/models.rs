// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 CipherPay

//! # API Data Models
//!
//! This module defines the request and response data structures used by
//! the REST API. All types derive `Serialize`, `Deserialize`, and `ToSchema`
//! for automatic JSON handling and OpenAPI documentation.
//!
//! ## Encoding Conventions
//!
//! Field elements cross the wire as hex strings: inputs accept an optional
//! `0x` prefix and any length up to the field size, outputs are minimal
//! big-endian hex with a `0x` prefix. Nullifiers are the exception and use
//! the canonical 64-character little-endian form without a prefix. Amounts
//! travel as decimal strings because JSON numbers cannot carry them safely.
//!
//! ## Model Categories
//!
//! - **Auth**: challenge issuance and signature verification
//! - **Messages**: encrypted payload submission
//! - **Overview**: note sets in, balances and spent statuses out

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::crypto::{CryptoError, FieldContext, Note};

// =============================================================================
// Shared Crypto Encodings
// =============================================================================

/// A Baby Jubjub public key as affine coordinates, hex-encoded.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct AuthPublicKeyHex {
    /// X coordinate of the point.
    pub x: String,
    /// Y coordinate of the point.
    pub y: String,
}

/// An EdDSA-Poseidon signature as hex-encoded components.
///
/// Field names mirror the circomlibjs convention (`R8` for the commitment
/// point, `S` for the scalar).
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct SignatureHex {
    /// X coordinate of the signature commitment point R8.
    #[serde(rename = "R8x")]
    pub r8x: String,
    /// Y coordinate of the signature commitment point R8.
    #[serde(rename = "R8y")]
    pub r8y: String,
    /// The signature scalar, reduced modulo the subgroup order.
    #[serde(rename = "S")]
    pub s: String,
}

// =============================================================================
// Auth Models
// =============================================================================

/// Request for a fresh login challenge.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChallengeRequest {
    /// The owner public key identifying the account, as a hex field element.
    pub owner_key: String,
    /// Authentication public key, required on first contact for a new
    /// identity so the challenge can later be verified.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_pub_key: Option<AuthPublicKeyHex>,
}

/// An issued challenge the client must sign.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChallengeResponse {
    /// The nonce to sign, a hex-encoded field element.
    pub nonce: String,
    /// RFC 3339 expiry of the challenge.
    pub expires_at: chrono::DateTime<chrono::Utc>,
}

/// Request to redeem a signed challenge for a bearer token.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VerifyRequest {
    /// The owner public key the challenge was issued for.
    pub owner_key: String,
    /// The nonce from the challenge response, unchanged.
    pub nonce: String,
    /// EdDSA-Poseidon signature over the challenge message.
    pub signature: SignatureHex,
    /// Authentication public key; used (and bound) only when the identity
    /// has no key on record yet.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_pub_key: Option<AuthPublicKeyHex>,
}

/// Successful verification: a bearer token plus the identity it names.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct VerifyResponse {
    /// Signed JWT for subsequent authenticated requests.
    pub token: String,
    pub user: UserInfo,
}

/// Public view of an identity.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserInfo {
    /// Internal identity id.
    pub id: String,
    /// Owner public key of the identity.
    pub owner_key: String,
}

// =============================================================================
// Message Models
// =============================================================================

/// Classification of an encrypted message payload.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum MessageKind {
    /// A note sent from one user to another.
    NoteTransfer,
    /// A self-addressed note recording an on-chain deposit.
    NoteDeposit,
    /// Free-form encrypted mail.
    NoteMessage,
}

impl Default for MessageKind {
    fn default() -> Self {
        MessageKind::NoteTransfer
    }
}

impl MessageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageKind::NoteTransfer => "note-transfer",
            MessageKind::NoteDeposit => "note-deposit",
            MessageKind::NoteMessage => "note-message",
        }
    }
}

/// Request to store an encrypted message for a recipient.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateMessageRequest {
    /// Recipient owner public key, as a hex field element.
    pub recipient_key: String,
    /// The encrypted payload, base64-encoded.
    pub ciphertext_b64: String,
    /// Payload classification; defaults to a note transfer.
    #[serde(default)]
    pub kind: MessageKind,
    /// Sender owner key; must match the authenticated identity when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender_key: Option<String>,
}

/// A stored message acknowledgment.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateMessageResponse {
    /// Server-assigned message id.
    pub id: String,
    /// Content commitment binding recipient and ciphertext.
    pub content_hash: String,
    /// Versioned name of the hashing scheme used for `content_hash`.
    pub scheme: String,
}

// =============================================================================
// Overview Models
// =============================================================================

/// Wire form of a decrypted note.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NoteDto {
    /// Note amount as a decimal string (up to 128 bits).
    pub amount: String,
    /// Token identifier, as a hex field element.
    pub token_id: String,
    /// Owner public key of the note, as a hex field element.
    pub owner_key: String,
    /// Commitment randomness `r`.
    pub r: String,
    /// Secondary randomness `s`, when the note format carries one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub s: Option<String>,
}

impl NoteDto {
    /// Parse the wire form into a domain note, validating every encoding.
    pub fn parse(&self, ctx: &FieldContext) -> Result<Note, CryptoError> {
        let amount: u128 = self
            .amount
            .parse()
            .map_err(|_| CryptoError::InvalidEncoding(format!("invalid amount: {}", self.amount)))?;
        Ok(Note {
            amount,
            token_id: ctx.field_element_from_hex(&self.token_id)?,
            owner_key: ctx.field_element_from_hex(&self.owner_key)?,
            r: ctx.field_element_from_hex(&self.r)?,
            s: self
                .s
                .as_deref()
                .map(|s| ctx.field_element_from_hex(s))
                .transpose()?,
        })
    }
}

/// Request for an account overview over a set of notes.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OverviewRequest {
    /// The caller's decrypted notes.
    pub notes: Vec<NoteDto>,
    /// When true, consult the on-chain ledger for spent statuses.
    #[serde(default)]
    pub check_on_chain: bool,
}

/// Per-note entry in an overview response.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NoteStatusDto {
    /// Canonical nullifier encoding for the note.
    pub nullifier: String,
    pub spent: bool,
    /// Note amount as a decimal string.
    pub amount: String,
}

/// Aggregated account overview.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OverviewResponse {
    /// Sum of unspent note amounts, as a decimal string.
    pub shielded_balance: String,
    /// Number of unspent notes.
    pub spendable_notes: usize,
    /// Total notes considered.
    pub total_notes: usize,
    /// Per-note detail, in request order.
    pub notes: Vec<NoteStatusDto>,
}

/// Spent status of a single nullifier.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct NullifierStatusResponse {
    /// The canonical nullifier that was queried.
    pub nullifier: String,
    pub spent: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_kind_defaults_to_transfer() {
        let req: CreateMessageRequest = serde_json::from_str(
            r#"{"recipientKey":"0x1","ciphertextB64":"aGk="}"#,
        )
        .unwrap();
        assert_eq!(req.kind, MessageKind::NoteTransfer);
        assert!(req.sender_key.is_none());
    }

    #[test]
    fn message_kind_uses_kebab_case_on_the_wire() {
        let kind: MessageKind = serde_json::from_str(r#""note-deposit""#).unwrap();
        assert_eq!(kind, MessageKind::NoteDeposit);
        assert_eq!(serde_json::to_string(&kind).unwrap(), r#""note-deposit""#);
    }

    #[test]
    fn signature_hex_uses_circom_field_names() {
        let sig: SignatureHex =
            serde_json::from_str(r#"{"R8x":"0x1","R8y":"0x2","S":"0x3"}"#).unwrap();
        assert_eq!(sig.r8x, "0x1");
        assert_eq!(sig.s, "0x3");
    }

    #[test]
    fn note_dto_parses_valid_input() {
        let ctx = FieldContext::bootstrap().unwrap();
        let dto = NoteDto {
            amount: "1000".to_string(),
            token_id: "0x1".to_string(),
            owner_key: "0x2".to_string(),
            r: "0x3".to_string(),
            s: None,
        };
        let note = dto.parse(&ctx).unwrap();
        assert_eq!(note.amount, 1000);
        assert!(note.s.is_none());
    }

    #[test]
    fn note_dto_rejects_bad_amount_and_bad_hex() {
        let ctx = FieldContext::bootstrap().unwrap();
        let mut dto = NoteDto {
            amount: "not-a-number".to_string(),
            token_id: "0x1".to_string(),
            owner_key: "0x2".to_string(),
            r: "0x3".to_string(),
            s: None,
        };
        assert!(dto.parse(&ctx).is_err());

        dto.amount = "5".to_string();
        dto.r = "zz".to_string();
        assert!(dto.parse(&ctx).is_err());
    }
}
