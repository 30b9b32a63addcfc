// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    http::{header, HeaderMap, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::warn;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    error::{ApiError, ErrorBody},
    models::{
        CallbackResponse, CommentCheckData, CommentCheckRequest, CommentCheckResponse,
        DirectVerifyData, DirectVerifyRequest, DirectVerifyResponse, InitData, InitResponse,
        SessionResult, SessionStatus, StatusResponse, VerificationSession,
    },
    state::AppState,
};

pub mod comments;
pub mod health;
pub mod reclaim;

pub fn router(state: AppState) -> Router {
    let cors = cors_layer(state.config.allowed_origins.as_deref());

    let api_routes = Router::new()
        .route("/reclaim/init", get(reclaim::init_verification))
        .route("/reclaim/callback", post(reclaim::receive_callback))
        .route("/reclaim/status", get(reclaim::session_status))
        .route("/reclaim/verify_comment", post(comments::verify_comment))
        .route("/verify-comment-direct", post(comments::verify_comment_direct));

    Router::new()
        .nest("/api", api_routes)
        .route("/health", get(health::health))
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness))
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(TraceLayer::new_for_http())
                .layer(PropagateRequestIdLayer::x_request_id()),
        )
        .layer(cors)
}

/// Permissive without an allow-list; otherwise only the listed origins, with
/// credentials.
fn cors_layer(allowed_origins: Option<&[String]>) -> CorsLayer {
    let Some(origins) = allowed_origins else {
        return CorsLayer::permissive();
    };

    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true)
}

/// Trimmed value, or `None` when absent or blank.
pub(crate) fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Request body as JSON, or as form fields when the client sends
/// `application/x-www-form-urlencoded`. An empty body reads as the type's
/// default.
pub(crate) fn parse_body<T>(headers: &HeaderMap, body: &[u8]) -> Result<T, ApiError>
where
    T: DeserializeOwned + Default,
{
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }

    if is_form(headers) {
        let fields: Map<String, Value> = url::form_urlencoded::parse(body)
            .into_owned()
            .map(|(key, value)| (key, Value::String(value)))
            .collect();
        return serde_json::from_value(Value::Object(fields))
            .map_err(|e| ApiError::bad_request(format!("invalid form body: {e}")));
    }

    serde_json::from_slice(body).map_err(|e| ApiError::bad_request(format!("invalid JSON body: {e}")))
}

fn is_form(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .is_some_and(|mime| {
            mime.trim()
                .eq_ignore_ascii_case("application/x-www-form-urlencoded")
        })
}

#[derive(OpenApi)]
#[openapi(
    paths(
        reclaim::init_verification,
        reclaim::receive_callback,
        reclaim::session_status,
        comments::verify_comment,
        comments::verify_comment_direct,
        health::health,
        health::liveness,
        health::readiness
    ),
    components(
        schemas(
            ErrorBody,
            InitData,
            InitResponse,
            CallbackResponse,
            StatusResponse,
            VerificationSession,
            SessionStatus,
            SessionResult,
            DirectVerifyRequest,
            DirectVerifyData,
            DirectVerifyResponse,
            CommentCheckRequest,
            CommentCheckData,
            CommentCheckResponse,
            health::ReadyResponse,
            health::HealthChecks,
            health::HealthResponse
        )
    ),
    tags(
        (name = "Reclaim", description = "Reclaim proof sessions"),
        (name = "Comments", description = "Tweet authorship checks"),
        (name = "Health", description = "Liveness and readiness probes")
    )
)]
struct ApiDoc;
