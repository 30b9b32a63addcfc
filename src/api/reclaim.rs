// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Reclaim proof sessions: open, receive the proof callback, poll status.

use axum::{
    body::Bytes,
    extract::{Query, State},
    Json,
};
use serde_json::Value;
use tracing::{debug, error, info, warn};

use super::non_empty;
use crate::{
    error::{ApiError, ErrorBody},
    models::{
        CallbackResponse, InitData, InitQuery, InitResponse, NewSession, StatusQuery,
        StatusResponse,
    },
    proof::{extract_session_id, normalize_proofs},
    providers::ProofRequestParams,
    state::AppState,
    store::SessionError,
};

#[utoipa::path(
    get,
    path = "/api/reclaim/init",
    params(InitQuery),
    tag = "Reclaim",
    responses(
        (status = 200, description = "Proof request created", body = InitResponse),
        (status = 400, description = "validationLink missing", body = ErrorBody),
        (status = 500, description = "Reclaim initialization failed", body = ErrorBody)
    )
)]
pub async fn init_verification(
    State(state): State<AppState>,
    Query(query): Query<InitQuery>,
) -> Result<Json<InitResponse>, ApiError> {
    let validation_link = non_empty(query.validation_link)
        .ok_or_else(|| ApiError::bad_request("validationLink is required"))?;
    let user_id = non_empty(query.user_id);
    let user_address = non_empty(query.user_address);

    let request = state
        .proofs
        .create_request(ProofRequestParams {
            callback_url: state.config.callback_url(),
            validation_link: validation_link.clone(),
            user_id: user_id.clone(),
            user_address: user_address.clone(),
        })
        .await
        .map_err(|e| {
            error!(error = %e, "Error initializing Reclaim request");
            ApiError::internal(e.to_string())
        })?;

    state
        .sessions
        .write()
        .await
        .create(
            request.session_id.clone(),
            NewSession {
                user_id,
                user_address,
                validation_link,
            },
        )
        .map_err(|e| {
            error!(session_id = %request.session_id, error = %e, "Failed to register session");
            ApiError::internal(e.to_string())
        })?;

    info!(session_id = %request.session_id, "Verification session opened");

    Ok(Json(InitResponse {
        success: true,
        data: InitData {
            request_url: request.request_url,
            status_url: request.status_url,
            session_id: request.session_id,
            reclaim_proof_request_config: request.config,
        },
    }))
}

/// Proof callback posted by Reclaim.
///
/// Answers `success: true` with the verification outcome even when the
/// session is unknown; only a repeated callback for a completed session is
/// refused.
#[utoipa::path(
    post,
    path = "/api/reclaim/callback",
    tag = "Reclaim",
    request_body(content = Object, description = "Reclaim proof payload, JSON or URL-encoded"),
    responses(
        (status = 200, description = "Callback processed", body = CallbackResponse),
        (status = 400, description = "Body is neither JSON nor an encoded proof", body = ErrorBody),
        (status = 409, description = "Session already completed", body = ErrorBody)
    )
)]
pub async fn receive_callback(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<CallbackResponse>, ApiError> {
    let payload = parse_callback_body(&body)?;
    let session_id = extract_session_id(&payload);
    let proofs = normalize_proofs(&payload);

    let verified = match state.proofs.verify_proofs(&proofs).await {
        Ok(()) => true,
        Err(e) => {
            warn!(
                session_id = session_id.as_deref().unwrap_or("no-session"),
                error = %e,
                "Reclaim proof did not verify"
            );
            false
        }
    };

    if let Some(id) = session_id.as_deref() {
        let outcome = state.sessions.write().await.complete(id, payload, verified);
        match outcome {
            Ok(_) => {}
            Err(SessionError::NotFound) => {
                debug!(session_id = %id, "Callback for unknown session");
            }
            Err(SessionError::AlreadyCompleted) => {
                warn!(session_id = %id, verified, "Duplicate callback for completed session");
                return Err(ApiError::conflict("session already completed"));
            }
            Err(e) => return Err(ApiError::internal(e.to_string())),
        }
    }

    info!(
        session_id = session_id.as_deref().unwrap_or("no-session"),
        verified,
        "Received reclaim callback"
    );
    Ok(Json(CallbackResponse {
        success: true,
        verified,
    }))
}

#[utoipa::path(
    get,
    path = "/api/reclaim/status",
    params(StatusQuery),
    tag = "Reclaim",
    responses(
        (status = 200, description = "Stored session", body = StatusResponse),
        (status = 400, description = "sessionId missing", body = ErrorBody),
        (status = 404, description = "Unknown or expired session", body = ErrorBody)
    )
)]
pub async fn session_status(
    State(state): State<AppState>,
    Query(query): Query<StatusQuery>,
) -> Result<Json<StatusResponse>, ApiError> {
    let session_id =
        non_empty(query.session_id).ok_or_else(|| ApiError::bad_request("sessionId is required"))?;

    let session = state
        .sessions
        .read()
        .await
        .get(&session_id)
        .cloned()
        .ok_or_else(|| ApiError::not_found("session not found"))?;

    Ok(Json(StatusResponse {
        success: true,
        session,
    }))
}

/// JSON first; otherwise a URL-encoded body, either one encoded JSON
/// document or `key=value` pairs whose values may themselves be JSON.
fn parse_callback_body(body: &[u8]) -> Result<Value, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Object(Default::default()));
    }
    if let Ok(value) = serde_json::from_slice::<Value>(body) {
        return Ok(value);
    }

    let invalid = || ApiError::bad_request("invalid callback payload");
    let pairs: Vec<(String, String)> = url::form_urlencoded::parse(body).into_owned().collect();
    match pairs.as_slice() {
        [] => Err(invalid()),
        [(document, value)] if value.is_empty() => {
            serde_json::from_str(document).map_err(|_| invalid())
        }
        _ => {
            let fields = pairs
                .into_iter()
                .map(|(key, value)| {
                    let value = serde_json::from_str(&value).unwrap_or(Value::String(value));
                    (key, value)
                })
                .collect();
            Ok(Value::Object(fields))
        }
    }
}
