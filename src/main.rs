// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 CipherPay

use std::{env, net::SocketAddr, time::Duration};

use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;
use url::Url;

use cipherpay_rust_server::{
    api::router,
    auth::TokenIssuer,
    config::{
        DATABASE_FILE, DATA_DIR_ENV, DEFAULT_DATA_DIR, DEFAULT_HOST, DEFAULT_JWT_ISSUER,
        DEFAULT_LEDGER_TIMEOUT_MS, DEFAULT_PORT, DEV_JWT_SECRET, HOST_ENV, JWT_ISSUER_ENV,
        JWT_SECRET_ENV, LEDGER_RPC_URL_ENV, LEDGER_TIMEOUT_MS_ENV, LOG_FORMAT_ENV, PORT_ENV,
    },
    crypto::FieldContext,
    ledger::LedgerClient,
    state::AppState,
    storage::Store,
};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug"));
    let json = env::var(LOG_FORMAT_ENV).as_deref() == Ok("json");
    if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

fn ledger_from_env() -> LedgerClient {
    let Ok(raw) = env::var(LEDGER_RPC_URL_ENV) else {
        tracing::warn!(
            "{LEDGER_RPC_URL_ENV} not set, on-chain spent-status lookups are disabled"
        );
        return LedgerClient::disabled();
    };
    match Url::parse(&raw) {
        Ok(url) => {
            let timeout_ms = env::var(LEDGER_TIMEOUT_MS_ENV)
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_LEDGER_TIMEOUT_MS);
            tracing::info!(url = %url, timeout_ms, "On-chain ledger lookups enabled");
            LedgerClient::http(url, Duration::from_millis(timeout_ms))
        }
        Err(e) => {
            tracing::error!(error = %e, url = %raw, "Invalid {LEDGER_RPC_URL_ENV}, on-chain lookups disabled");
            LedgerClient::disabled()
        }
    }
}

#[tokio::main]
async fn main() {
    init_tracing();

    // The parameter self-check gates startup: a process that cannot
    // reproduce the Poseidon test vectors must not serve traffic.
    let ctx = FieldContext::bootstrap()
        .expect("cryptographic self-check failed, refusing to start");

    let data_dir = env::var(DATA_DIR_ENV).unwrap_or_else(|_| DEFAULT_DATA_DIR.to_string());
    std::fs::create_dir_all(&data_dir).expect("failed to create data directory");
    let store = Store::open(std::path::Path::new(&data_dir).join(DATABASE_FILE))
        .expect("failed to open database");

    let jwt_secret = env::var(JWT_SECRET_ENV).unwrap_or_else(|_| {
        tracing::warn!("{JWT_SECRET_ENV} not set, using the development signing secret");
        DEV_JWT_SECRET.to_string()
    });
    let jwt_issuer = env::var(JWT_ISSUER_ENV).unwrap_or_else(|_| DEFAULT_JWT_ISSUER.to_string());
    let tokens = TokenIssuer::new(&jwt_secret, &jwt_issuer);

    let state = AppState::new(ctx, store, ledger_from_env(), tokens);
    let app = router(state);

    let host = env::var(HOST_ENV).unwrap_or_else(|_| DEFAULT_HOST.to_string());
    let port: u16 = env::var(PORT_ENV)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(DEFAULT_PORT);
    let addr: SocketAddr = format!("{host}:{port}")
        .parse()
        .expect("failed to parse bind address");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("failed to bind");
    tracing::info!(%addr, "CipherPay server listening (docs at /docs)");

    let shutdown = CancellationToken::new();
    let signal_token = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Shutdown signal received, draining connections");
            signal_token.cancel();
        }
    });

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
        .expect("server failed");
}
