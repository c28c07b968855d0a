// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    models::{
        IssueTokenRequest, OwnerAddress, TokenResponse, TransferTokenRequest, VerifyResponse,
    },
    state::AppState,
    store::TokenStatus,
};

pub mod health;
pub mod tokens;

pub fn router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/token/issue", post(tokens::issue_token))
        .route(
            "/token/{id}",
            get(tokens::get_token)
                .put(tokens::transfer_token)
                .delete(tokens::remove_token),
        )
        .route("/token/verify/{owner_id}", get(tokens::verify_owner))
        .route("/health", get(health::liveness))
        .route("/ready", get(health::readiness))
        .with_state(state);

    Router::new()
        .merge(api_routes)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

#[derive(OpenApi)]
#[openapi(
    paths(
        tokens::issue_token,
        tokens::get_token,
        tokens::transfer_token,
        tokens::remove_token,
        tokens::verify_owner,
        health::liveness,
        health::readiness
    ),
    components(
        schemas(
            IssueTokenRequest,
            TransferTokenRequest,
            TokenResponse,
            VerifyResponse,
            OwnerAddress,
            TokenStatus,
            health::HealthResponse,
            health::ReadyResponse,
            health::ReadyChecks
        )
    ),
    tags(
        (name = "Tokens", description = "Soulbound token issuance and verification"),
        (name = "Health", description = "Liveness and readiness probes")
    )
)]
struct ApiDoc;
