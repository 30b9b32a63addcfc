// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use utoipa::ToSchema;

use crate::state::AppState;

/// Health check response with individual component status.
#[derive(Debug, Serialize, ToSchema)]
pub struct ReadyResponse {
    /// Overall health status ("ok" or "degraded").
    pub status: String,
    pub checks: HealthChecks,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HealthChecks {
    pub service: String,
    /// "ok", or "unconfigured" without Reclaim credentials or trusted witnesses.
    pub reclaim: String,
    /// Tweet lookup source: "twitter_api" or "oembed".
    pub post_lookup: String,
    /// Live sessions held in memory.
    pub sessions: usize,
}

/// Simple health check response for liveness probes.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
}

/// Returns 503 while Reclaim is unconfigured (credentials or trusted
/// witnesses missing); comment checks still work.
#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses(
        (status = 200, description = "Service is healthy", body = ReadyResponse),
        (status = 503, description = "Reclaim is not configured", body = ReadyResponse)
    )
)]
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<ReadyResponse>) {
    let reclaim_ok = state.proofs.is_configured();
    let sessions = state.sessions.read().await.len();

    let response = ReadyResponse {
        status: if reclaim_ok { "ok" } else { "degraded" }.to_string(),
        checks: HealthChecks {
            service: "ok".to_string(),
            reclaim: if reclaim_ok { "ok" } else { "unconfigured" }.to_string(),
            post_lookup: state.posts.source().to_string(),
            sessions,
        },
    };

    let status = if reclaim_ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status, Json(response))
}

/// Liveness probe. Does not look at dependencies.
#[utoipa::path(
    get,
    path = "/health/live",
    tag = "Health",
    responses(
        (status = 200, description = "Service is alive", body = HealthResponse)
    )
)]
pub async fn liveness() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

#[utoipa::path(
    get,
    path = "/health/ready",
    tag = "Health",
    responses(
        (status = 200, description = "Service is ready", body = ReadyResponse),
        (status = 503, description = "Service is not ready", body = ReadyResponse)
    )
)]
pub async fn readiness(state: State<AppState>) -> (StatusCode, Json<ReadyResponse>) {
    health(state).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::testing::{test_state, FakeProofProvider};
    use crate::verification::tests::FakeLookup;

    #[tokio::test]
    async fn configured_provider_is_healthy() {
        let state = test_state(FakeProofProvider::new(true), FakeLookup::Author(None));
        let (status, Json(body)) = health(State(state)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.status, "ok");
        assert_eq!(body.checks.reclaim, "ok");
        assert_eq!(body.checks.post_lookup, "fake");
        assert_eq!(body.checks.sessions, 0);
    }

    #[tokio::test]
    async fn unconfigured_provider_degrades() {
        let state = test_state(
            FakeProofProvider::failing_init("missing app id"),
            FakeLookup::Author(None),
        );
        let (status, Json(body)) = readiness(State(state)).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body.status, "degraded");
        assert_eq!(body.checks.reclaim, "unconfigured");
    }

    #[tokio::test]
    async fn liveness_is_always_ok() {
        let Json(body) = liveness().await;
        assert_eq!(body.status, "ok");
    }
}
