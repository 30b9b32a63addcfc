// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # External Providers
//!
//! Traits at the two seams where the relay talks to third parties, and their
//! HTTP implementations:
//!
//! - [`ProofProvider`]: Reclaim Protocol ([`reclaim::ReclaimClient`])
//! - [`PostLookup`]: Twitter API v2 / oEmbed ([`twitter::TwitterClient`])
//!
//! Handlers only see the traits, so tests swap in in-process fakes.

use async_trait::async_trait;
use serde_json::Value;

use crate::proof::ProofError;
use crate::tweet::TweetRef;

pub mod reclaim;
pub mod twitter;

pub use reclaim::{ReclaimClient, ReclaimError};
pub use twitter::{LookupError, PostAuthor, TwitterClient};

/// Inputs for a new proof request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProofRequestParams {
    /// Where the provider posts the finished proof.
    pub callback_url: String,
    pub validation_link: String,
    pub user_id: Option<String>,
    pub user_address: Option<String>,
}

/// A proof request registered with the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProofRequest {
    pub session_id: String,
    pub request_url: String,
    pub status_url: String,
    /// Serialized request, handed back to the client as-is.
    pub config: String,
}

#[async_trait]
pub trait ProofProvider: Send + Sync {
    /// Whether requests can be opened and their proofs checked.
    fn is_configured(&self) -> bool;

    async fn create_request(&self, params: ProofRequestParams) -> Result<ProofRequest, ReclaimError>;

    /// Verify proofs from a callback. All of them must pass.
    async fn verify_proofs(&self, proofs: &[Value]) -> Result<(), ProofError>;
}

#[async_trait]
pub trait PostLookup: Send + Sync {
    /// Short name of the lookup backend, for health reporting.
    fn source(&self) -> &'static str;

    /// Resolve the author of `tweet`, originally submitted as `url`.
    async fn lookup(&self, tweet: &TweetRef, url: &str) -> Result<PostAuthor, LookupError>;
}
