// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Tweet Authorship Check
//!
//! One routine backs both comment endpoints: parse the submitted status URL,
//! resolve the tweet's author upstream and compare it with the handle in the
//! URL, case-insensitively.
//!
//! The [`VerificationPolicy`] decides what an upstream failure means:
//!
//! | Policy | Upstream failure | No author resolved |
//! |--------|------------------|--------------------|
//! | `Lenient` | logged, treated as no author | `verified` = URL has handle and id |
//! | `Strict` | error (502 at the API) | `matches` = false |

use std::str::FromStr;

use serde_json::Value;
use tracing::warn;

use crate::providers::{LookupError, PostLookup};
use crate::tweet::{parse_tweet_url, TweetRef};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VerificationPolicy {
    #[default]
    Lenient,
    Strict,
}

impl FromStr for VerificationPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lenient" => Ok(VerificationPolicy::Lenient),
            "strict" => Ok(VerificationPolicy::Strict),
            other => Err(format!("unknown verification policy: {other}")),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum VerifyError {
    #[error("invalid twitter/x status url")]
    InvalidUrl,

    #[error(transparent)]
    Lookup(#[from] LookupError),
}

#[derive(Debug, Clone, PartialEq)]
pub struct PostVerification {
    pub tweet: TweetRef,
    pub fetched_username: Option<String>,
    pub tweet_data: Option<Value>,
    /// A resolved author equals the URL handle.
    pub matches: bool,
    /// Outcome under the policy in force.
    pub verified: bool,
}

pub async fn verify_post(
    lookup: &dyn PostLookup,
    url: &str,
    policy: VerificationPolicy,
) -> Result<PostVerification, VerifyError> {
    let tweet = parse_tweet_url(url).ok_or(VerifyError::InvalidUrl)?;

    let author = match lookup.lookup(&tweet, url).await {
        Ok(author) => author,
        Err(e) if policy == VerificationPolicy::Lenient => {
            warn!(
                tweet_id = %tweet.tweet_id,
                source = lookup.source(),
                error = %e,
                detail = %e.detail(),
                "Tweet author lookup failed, falling back to URL check"
            );
            Default::default()
        }
        Err(e) => return Err(e.into()),
    };

    let matches = author
        .username
        .as_deref()
        .is_some_and(|fetched| fetched.eq_ignore_ascii_case(&tweet.username));

    let verified = match (&author.username, policy) {
        (Some(_), _) => matches,
        (None, VerificationPolicy::Lenient) => {
            !tweet.username.is_empty() && !tweet.tweet_id.is_empty()
        }
        (None, VerificationPolicy::Strict) => false,
    };

    Ok(PostVerification {
        tweet,
        fetched_username: author.username,
        tweet_data: author.tweet_data,
        matches,
        verified,
    })
}
