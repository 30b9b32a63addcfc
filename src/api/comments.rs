// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Comment (tweet) authorship checks.

use axum::{
    body::Bytes,
    extract::{Query, State},
    http::HeaderMap,
    Json,
};
use tracing::{info, warn};

use super::{non_empty, parse_body};
use crate::{
    error::{ApiError, ErrorBody},
    models::{
        CommentCheckData, CommentCheckRequest, CommentCheckResponse, DirectVerifyData,
        DirectVerifyRequest, DirectVerifyResponse,
    },
    state::AppState,
    verification::{verify_post, VerificationPolicy, VerifyError},
};

/// Proof-only check: reports whether the tweet belongs to the handle in its
/// URL, without disclosing either username. Accepts JSON or form bodies.
#[utoipa::path(
    post,
    path = "/api/verify-comment-direct",
    tag = "Comments",
    request_body = DirectVerifyRequest,
    responses(
        (status = 200, description = "Verification outcome", body = DirectVerifyResponse),
        (status = 400, description = "Missing or invalid url", body = ErrorBody),
        (status = 502, description = "Upstream lookup failed (strict policy)", body = ErrorBody)
    )
)]
pub async fn verify_comment_direct(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<DirectVerifyResponse>, ApiError> {
    let request: DirectVerifyRequest = parse_body(&headers, &body)?;
    let url = non_empty(request.url).ok_or_else(|| ApiError::bad_request("url is required"))?;

    let result = verify_post(state.posts.as_ref(), &url, state.config.comment_policy)
        .await
        .map_err(verify_error)?;

    info!(
        tweet_id = %result.tweet.tweet_id,
        verified = result.verified,
        has_user_address = request.user_address.is_some(),
        "Direct comment verification"
    );

    Ok(Json(DirectVerifyResponse {
        success: true,
        data: DirectVerifyData {
            verified: result.verified,
            tweet_id: result.tweet.tweet_id,
        },
    }))
}

/// Detailed check returning both handles. Upstream failures are errors.
#[utoipa::path(
    post,
    path = "/api/reclaim/verify_comment",
    tag = "Comments",
    params(CommentCheckRequest),
    request_body = CommentCheckRequest,
    responses(
        (status = 200, description = "Author comparison", body = CommentCheckResponse),
        (status = 400, description = "Missing or invalid url", body = ErrorBody),
        (status = 502, description = "Twitter API or oEmbed failure", body = ErrorBody)
    )
)]
pub async fn verify_comment(
    State(state): State<AppState>,
    Query(query): Query<CommentCheckRequest>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<CommentCheckResponse>, ApiError> {
    let request: CommentCheckRequest = parse_body(&headers, &body)?;
    let url = non_empty(request.url)
        .or_else(|| non_empty(query.url))
        .ok_or_else(|| ApiError::bad_request("url is required"))?;

    let result = verify_post(state.posts.as_ref(), &url, VerificationPolicy::Strict)
        .await
        .map_err(verify_error)?;

    Ok(Json(CommentCheckResponse {
        success: true,
        data: CommentCheckData {
            tweet_id: result.tweet.tweet_id,
            url_username: result.tweet.username,
            fetched_username: result.fetched_username,
            matches: result.matches,
            tweet_data: result.tweet_data,
        },
    }))
}

fn verify_error(err: VerifyError) -> ApiError {
    match err {
        VerifyError::InvalidUrl => ApiError::bad_request(err.to_string()),
        VerifyError::Lookup(e) => {
            warn!(error = %e, detail = %e.detail(), "Tweet author lookup failed");
            ApiError::bad_gateway(e.to_string(), e.detail())
        }
    }
}
