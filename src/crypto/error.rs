// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 CipherPay

//! Error types for the cryptographic core.

#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    /// Malformed hex or a value that is not canonically reduced modulo the
    /// field order. Raised before any cryptographic work is attempted.
    #[error("invalid encoding: {0}")]
    InvalidEncoding(String),

    /// The underlying field/curve implementation is broken or misconfigured.
    /// Fatal: detected at bootstrap this aborts startup, and it is never
    /// caught-and-ignored anywhere in the core.
    #[error("crypto backend failure: {0}")]
    Internal(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_detail() {
        let err = CryptoError::InvalidEncoding("bad hex".to_string());
        assert!(format!("{err}").contains("bad hex"));

        let err = CryptoError::Internal("poseidon self-check failed".to_string());
        assert!(format!("{err}").contains("poseidon self-check"));
    }
}
