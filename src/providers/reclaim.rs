// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Reclaim Protocol integration for tweet proofs.
//!
//! Only the subset the relay needs is implemented: opening a session on the
//! Reclaim backend, building the verifier link the user opens, and checking
//! the signed claims that come back through the callback.

use std::time::Duration;

use alloy::primitives::{hex, keccak256};
use alloy::signers::local::PrivateKeySigner;
use alloy::signers::SignerSync;
use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use super::{ProofProvider, ProofRequest, ProofRequestParams};
use crate::config::{
    ReclaimSettings, RECLAIM_APP_ID_ENV, RECLAIM_APP_SECRET_ENV, RECLAIM_PROVIDER_ID_ENV,
};
use crate::proof::{self, ProofError};

const SDK_VERSION: &str = concat!("gobuzz-relay-", env!("CARGO_PKG_VERSION"));
const DEFAULT_CONTEXT_ADDRESS: &str = "0x0";
const DEFAULT_CONTEXT_MESSAGE: &str = "sample context";

#[derive(Debug, thiserror::Error)]
pub enum ReclaimError {
    #[error("Reclaim configuration missing: {0}")]
    MissingConfig(&'static str),

    #[error("Reclaim signing failed: {0}")]
    Signing(String),

    #[error("Reclaim request failed: {0}")]
    Request(String),

    #[error("Reclaim response was invalid: {0}")]
    InvalidResponse(String),
}

#[derive(Debug, Clone)]
pub struct ReclaimClient {
    settings: ReclaimSettings,
    http: Client,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InitSessionResponse {
    session_id: String,
    #[serde(default)]
    resolved_provider_version: Option<String>,
}

/// Context and parameters attached to a proof request.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestContext {
    pub context: Value,
    pub parameters: Value,
}

impl ReclaimClient {
    pub fn new(settings: ReclaimSettings, timeout: Duration) -> Result<Self, ReclaimError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ReclaimError::Request(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { settings, http })
    }

    async fn init_session(
        &self,
        app_id: &str,
        provider_id: &str,
        signature: &str,
        timestamp: &str,
    ) -> Result<InitSessionResponse, ReclaimError> {
        let path = "/api/sdk/init/session/";
        let response = self
            .http
            .post(format!(
                "{}{}",
                self.settings.api_base_url.trim_end_matches('/'),
                path
            ))
            .json(&json!({
                "providerId": provider_id,
                "appId": app_id,
                "timestamp": timestamp,
                "signature": signature,
            }))
            .send()
            .await
            .map_err(|e| ReclaimError::Request(format!("POST {path} failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<Value>(&body)
                .ok()
                .and_then(|v| v.get("message").and_then(Value::as_str).map(str::to_string))
                .unwrap_or(body);
            return Err(ReclaimError::Request(format!(
                "error initializing session with providerId {provider_id} ({status}): {message}"
            )));
        }

        response
            .json()
            .await
            .map_err(|e| ReclaimError::InvalidResponse(format!("POST {path} invalid JSON: {e}")))
    }
}

#[async_trait]
impl ProofProvider for ReclaimClient {
    /// Credentials to open sessions and witnesses to check proofs against.
    fn is_configured(&self) -> bool {
        self.settings.app_id.is_some()
            && self.settings.app_secret.is_some()
            && self.settings.provider_id.is_some()
            && !self.settings.trusted_witnesses.is_empty()
    }

    async fn create_request(&self, params: ProofRequestParams) -> Result<ProofRequest, ReclaimError> {
        let app_id = self
            .settings
            .app_id
            .as_deref()
            .ok_or(ReclaimError::MissingConfig(RECLAIM_APP_ID_ENV))?;
        let app_secret = self
            .settings
            .app_secret
            .as_deref()
            .ok_or(ReclaimError::MissingConfig(RECLAIM_APP_SECRET_ENV))?;
        let provider_id = self
            .settings
            .provider_id
            .as_deref()
            .ok_or(ReclaimError::MissingConfig(RECLAIM_PROVIDER_ID_ENV))?;

        let now_ms = Utc::now().timestamp_millis();
        let timestamp = now_ms.to_string();
        let signature = app_signature(app_secret, provider_id, &timestamp)?;

        let session = self
            .init_session(app_id, provider_id, &signature, &timestamp)
            .await?;

        let RequestContext {
            context,
            parameters,
        } = build_request_context(&params, now_ms);

        let template = json!({
            "sessionId": session.session_id,
            "providerId": provider_id,
            "applicationId": app_id,
            "signature": signature,
            "timestamp": timestamp,
            "callbackUrl": params.callback_url,
            "context": context.to_string(),
            "parameters": parameters,
            "redirectUrl": "",
            "acceptAiProviders": false,
            "sdkVersion": SDK_VERSION,
            "jsonProofResponse": true,
            "resolvedProviderVersion": session.resolved_provider_version.clone().unwrap_or_default(),
        });

        let request_url = build_request_url(&self.settings.share_base_url, &template);
        let status_url = build_status_url(&self.settings.api_base_url, &session.session_id);

        let config = json!({
            "applicationId": app_id,
            "providerId": provider_id,
            "sessionId": session.session_id,
            "context": context,
            "parameters": parameters,
            "signature": signature,
            "redirectUrl": Value::Null,
            "timeStamp": timestamp,
            "appCallbackUrl": params.callback_url,
            "claimCreationType": "createClaim",
            "options": {},
            "sdkVersion": SDK_VERSION,
            "jsonProofResponse": true,
            "resolvedProviderVersion": session.resolved_provider_version,
        })
        .to_string();

        info!(
            session_id = %session.session_id,
            has_user_address = params.user_address.is_some(),
            "Reclaim proof request created"
        );

        Ok(ProofRequest {
            session_id: session.session_id,
            request_url,
            status_url,
            config,
        })
    }

    async fn verify_proofs(&self, proofs: &[Value]) -> Result<(), ProofError> {
        proof::verify_proofs(proofs, &self.settings.trusted_witnesses)
    }
}

/// Sign `{providerId, timestamp}` with the application key.
///
/// The message is the keccak256 of the canonical JSON, signed as an EIP-191
/// personal message.
pub fn app_signature(app_secret: &str, provider_id: &str, timestamp: &str) -> Result<String, ReclaimError> {
    let signer: PrivateKeySigner = app_secret
        .parse()
        .map_err(|e| ReclaimError::Signing(format!("invalid application secret: {e}")))?;
    let canonical = proof::verify::canonical_json(&json!({
        "providerId": provider_id,
        "timestamp": timestamp,
    }));
    let digest = keccak256(canonical.as_bytes());
    let signature = signer
        .sign_message_sync(digest.as_slice())
        .map_err(|e| ReclaimError::Signing(e.to_string()))?;
    Ok(hex::encode_prefixed(signature.as_bytes()))
}

/// With a wallet address the proof is bound to it through the context;
/// without one the validation link travels as a request parameter.
pub fn build_request_context(params: &ProofRequestParams, timestamp_ms: i64) -> RequestContext {
    match params.user_address.as_deref().filter(|a| !a.is_empty()) {
        Some(address) => {
            let mut message = json!({
                "validationLink": params.validation_link,
                "timestamp": timestamp_ms,
            });
            if let Some(user_id) = params.user_id.as_deref().filter(|u| !u.is_empty()) {
                message["userId"] = json!(user_id);
            }
            RequestContext {
                context: json!({
                    "contextAddress": address,
                    "contextMessage": message.to_string(),
                }),
                parameters: json!({}),
            }
        }
        None => RequestContext {
            context: json!({
                "contextAddress": DEFAULT_CONTEXT_ADDRESS,
                "contextMessage": DEFAULT_CONTEXT_MESSAGE,
            }),
            parameters: json!({ "validationLink": params.validation_link }),
        },
    }
}

fn build_request_url(share_base_url: &str, template: &Value) -> String {
    let encoded: String =
        url::form_urlencoded::byte_serialize(template.to_string().as_bytes()).collect();
    format!(
        "{}/verifier/?template={}",
        share_base_url.trim_end_matches('/'),
        encoded
    )
}

fn build_status_url(api_base_url: &str, session_id: &str) -> String {
    format!(
        "{}/api/sdk/session/{}",
        api_base_url.trim_end_matches('/'),
        session_id
    )
}
