// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # API Data Models
//!
//! Request and response structures used by the REST API, plus the stored
//! [`VerificationSession`] record. JSON field names are camelCase to match
//! the GO BUZZ frontend.
//!
//! ## Model Categories
//!
//! - **Sessions**: Reclaim verification sessions and their callback results
//! - **Reclaim**: init / callback / status envelopes
//! - **Comments**: tweet authorship checks

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::{IntoParams, ToSchema};

// =============================================================================
// Sessions
// =============================================================================

/// Lifecycle state of a verification session.
///
/// `Completed` is terminal. A failed proof is recorded as
/// `result.verified = false` inside a completed session.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionStatus {
    Pending,
    Completed,
}

/// Callback outcome stored on a completed session.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct SessionResult {
    /// Raw callback payload as received.
    #[schema(value_type = Object)]
    pub payload: Value,
    /// Whether the proof(s) in the payload verified.
    pub verified: bool,
}

/// Server-side record of one verification attempt.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VerificationSession {
    /// Session identifier issued by Reclaim.
    pub session_id: String,
    pub user_id: Option<String>,
    pub user_address: Option<String>,
    /// URL of the tweet or comment being proven.
    pub validation_link: String,
    pub created_at: DateTime<Utc>,
    /// After this instant the session is no longer visible.
    pub expires_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    pub status: SessionStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<SessionResult>,
}

/// Fields supplied when a session is opened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSession {
    pub user_id: Option<String>,
    pub user_address: Option<String>,
    pub validation_link: String,
}

// =============================================================================
// Reclaim
// =============================================================================

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct InitQuery {
    /// Caller-supplied user identifier.
    pub user_id: Option<String>,
    /// Wallet address the proof should be bound to.
    pub user_address: Option<String>,
    /// Tweet or comment URL the proof is extracted from.
    pub validation_link: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InitData {
    /// URL the user opens to generate the proof.
    pub request_url: String,
    /// Reclaim status-polling URL.
    pub status_url: String,
    pub session_id: String,
    /// Serialized proof request, for clients that resume the flow.
    pub reclaim_proof_request_config: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct InitResponse {
    pub success: bool,
    pub data: InitData,
}

#[derive(Debug, Clone, Serialize, ToSchema, PartialEq, Eq)]
pub struct CallbackResponse {
    pub success: bool,
    pub verified: bool,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct StatusQuery {
    pub session_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct StatusResponse {
    pub success: bool,
    pub session: VerificationSession,
}

// =============================================================================
// Comments
// =============================================================================

/// Body of `POST /api/verify-comment-direct`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DirectVerifyRequest {
    /// Tweet URL, e.g. `https://x.com/alice/status/12345`.
    pub url: Option<String>,
    pub user_address: Option<String>,
}

/// Proof-only result: no usernames are returned.
#[derive(Debug, Clone, Serialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DirectVerifyData {
    pub verified: bool,
    pub tweet_id: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DirectVerifyResponse {
    pub success: bool,
    pub data: DirectVerifyData,
}

/// Body (or query) of `POST /api/reclaim/verify_comment`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CommentCheckRequest {
    pub url: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CommentCheckData {
    pub tweet_id: String,
    pub url_username: String,
    pub fetched_username: Option<String>,
    pub matches: bool,
    /// Tweet object from the Twitter API, when it was used.
    #[schema(value_type = Option<Object>)]
    pub tweet_data: Option<Value>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CommentCheckResponse {
    pub success: bool,
    pub data: CommentCheckData,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn session_serializes_with_camel_case_fields() {
        let created = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        let session = VerificationSession {
            session_id: "sess-1".into(),
            user_id: Some("user-1".into()),
            user_address: None,
            validation_link: "https://x.com/alice/status/1".into(),
            created_at: created,
            expires_at: created + chrono::Duration::hours(1),
            completed_at: None,
            status: SessionStatus::Pending,
            result: None,
        };

        let value = serde_json::to_value(&session).unwrap();
        assert_eq!(value["sessionId"], "sess-1");
        assert_eq!(value["userId"], "user-1");
        assert_eq!(value["userAddress"], Value::Null);
        assert_eq!(value["validationLink"], "https://x.com/alice/status/1");
        assert_eq!(value["status"], "PENDING");
        assert!(value.get("result").is_none());
        assert!(value.get("completedAt").is_none());
    }

    #[test]
    fn completed_status_is_upper_case() {
        assert_eq!(
            serde_json::to_value(SessionStatus::Completed).unwrap(),
            json!("COMPLETED")
        );
    }

    #[test]
    fn direct_verify_data_exposes_only_outcome_and_tweet_id() {
        let value = serde_json::to_value(DirectVerifyData {
            verified: true,
            tweet_id: "12345".into(),
        })
        .unwrap();
        assert_eq!(value, json!({ "verified": true, "tweetId": "12345" }));
    }
}
