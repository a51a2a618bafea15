// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 CipherPay

use axum::{
    routing::{get, post},
    Router,
};
use axum::http::HeaderName;
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    models::{
        AuthPublicKeyHex, ChallengeRequest, ChallengeResponse, CreateMessageRequest,
        CreateMessageResponse, MessageKind, NoteDto, NoteStatusDto, NullifierStatusResponse,
        OverviewRequest, OverviewResponse, SignatureHex, UserInfo, VerifyRequest, VerifyResponse,
    },
    state::AppState,
};

pub mod auth;
pub mod health;
pub mod messages;
pub mod overview;
pub mod users;

pub fn router(state: AppState) -> Router {
    let v1_routes = Router::new()
        .route("/auth/challenge", post(auth::challenge))
        .route("/auth/verify", post(auth::verify))
        .route("/users/me", get(users::me))
        .route("/messages", post(messages::create_message))
        .route("/account/overview", post(overview::account_overview))
        .route("/nullifiers/{nullifier}", get(overview::nullifier_status))
        .with_state(state.clone());

    let request_id = HeaderName::from_static("x-request-id");
    Router::new()
        .route("/health", get(health::health))
        .with_state(state)
        .nest("/v1", v1_routes)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
        .layer(PropagateRequestIdLayer::new(request_id.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::new(request_id, MakeRequestUuid))
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health,
        auth::challenge,
        auth::verify,
        users::me,
        messages::create_message,
        overview::account_overview,
        overview::nullifier_status
    ),
    components(
        schemas(
            AuthPublicKeyHex,
            SignatureHex,
            ChallengeRequest,
            ChallengeResponse,
            VerifyRequest,
            VerifyResponse,
            UserInfo,
            MessageKind,
            CreateMessageRequest,
            CreateMessageResponse,
            NoteDto,
            OverviewRequest,
            OverviewResponse,
            NoteStatusDto,
            NullifierStatusResponse
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Liveness probes"),
        (name = "Auth", description = "Challenge/response authentication"),
        (name = "Users", description = "Identity information"),
        (name = "Messages", description = "Encrypted message intake"),
        (name = "Overview", description = "Shielded balance and nullifier status")
    )
)]
struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}
