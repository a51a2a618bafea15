// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 CipherPay

//! Authentication: nonce challenge/response flow and bearer tokens.
//!
//! - `challenge` - issue and verify single-use, time-bound login challenges
//! - `token` - JWT issuance for verified sessions (HS256)
//! - `extractor` - axum extractor guarding authenticated routes
//! - `error` - HTTP-facing bearer-token errors

pub mod challenge;
pub mod error;
pub mod extractor;
pub mod token;

pub use challenge::{AuthFlowError, ChallengeManager, IssuedChallenge, Session};
pub use error::AuthError;
pub use extractor::{Auth, AuthenticatedUser};
pub use token::{Claims, TokenIssuer};
