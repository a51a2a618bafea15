// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 CipherPay

//! Bearer-token issuance for verified sessions.
//!
//! The challenge flow hands a [`Session`](super::Session) to the issuer,
//! which signs an HS256 JWT carrying the identity id as subject and the
//! owner key as a custom claim. The core does not interpret tokens beyond
//! this module; the token format is a collaborator contract with the client
//! SDK.

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use super::challenge::Session;

/// Token lifetime in seconds (1 hour).
const TOKEN_TTL_SECS: i64 = 3600;

/// Claims carried by a CipherPay bearer token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: internal identity id.
    pub sub: String,
    /// Owner public key of the authenticated identity.
    #[serde(rename = "ownerKey")]
    pub owner_key: String,
    pub iss: String,
    pub iat: i64,
    pub exp: i64,
}

/// Issues and verifies HS256 bearer tokens.
pub struct TokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    issuer: String,
}

impl TokenIssuer {
    pub fn new(secret: &str, issuer: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            issuer: issuer.to_string(),
        }
    }

    /// Sign a token for a verified session.
    pub fn issue(&self, session: &Session) -> Result<String, jsonwebtoken::errors::Error> {
        let now = chrono::Utc::now().timestamp();
        let claims = Claims {
            sub: session.subject.clone(),
            owner_key: session.owner_key.clone(),
            iss: self.issuer.clone(),
            iat: now,
            exp: now + TOKEN_TTL_SECS,
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
    }

    /// Verify a bearer token and return its claims.
    pub fn verify(&self, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&self.issuer]);
        let data = decode::<Claims>(token, &self.decoding, &validation)?;
        Ok(data.claims)
    }
}
