// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 CipherPay

//! # Runtime Configuration Constants
//!
//! This module defines environment variable names and default values used
//! throughout the application. Configuration is loaded from the environment
//! at startup.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `DATA_DIR` | Root directory for persistent storage | `./data` |
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `JWT_SECRET` | HS256 signing secret for bearer tokens | Dev fallback, required for production |
//! | `JWT_ISSUER` | Issuer claim stamped into tokens | `cipherpay` |
//! | `LEDGER_RPC_URL` | Base URL of the on-chain ledger indexer | Unset disables on-chain lookups |
//! | `LEDGER_TIMEOUT_MS` | Per-request ledger timeout in milliseconds | `3000` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

/// Environment variable name for the persistent data directory path.
///
/// The challenge, identity, message, and spent-nullifier tables live in a
/// single redb file under this directory.
pub const DATA_DIR_ENV: &str = "DATA_DIR";

/// Default data directory when `DATA_DIR` is unset.
pub const DEFAULT_DATA_DIR: &str = "./data";

/// Filename of the database inside the data directory.
pub const DATABASE_FILE: &str = "cipherpay.redb";

/// Environment variable name for the server bind address.
pub const HOST_ENV: &str = "HOST";

/// Default bind address.
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Environment variable name for the server bind port.
pub const PORT_ENV: &str = "PORT";

/// Default bind port.
pub const DEFAULT_PORT: u16 = 8080;

/// Environment variable name for the bearer-token signing secret.
///
/// When unset the server starts with a development secret and logs a
/// warning; production deployments must set this.
pub const JWT_SECRET_ENV: &str = "JWT_SECRET";

/// Development-only signing secret used when `JWT_SECRET` is unset.
pub const DEV_JWT_SECRET: &str = "cipherpay-dev-secret";

/// Environment variable name for the token issuer claim.
pub const JWT_ISSUER_ENV: &str = "JWT_ISSUER";

/// Default issuer claim.
pub const DEFAULT_JWT_ISSUER: &str = "cipherpay";

/// Environment variable name for the ledger indexer base URL.
///
/// When unset, on-chain spent-status lookups are disabled and overviews use
/// the local spent set only.
pub const LEDGER_RPC_URL_ENV: &str = "LEDGER_RPC_URL";

/// Environment variable name for the per-request ledger timeout.
pub const LEDGER_TIMEOUT_MS_ENV: &str = "LEDGER_TIMEOUT_MS";

/// Default ledger timeout in milliseconds.
pub const DEFAULT_LEDGER_TIMEOUT_MS: u64 = 3000;

/// Environment variable name for the logging format (`json` or `pretty`).
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";
