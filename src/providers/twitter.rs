// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Tweet author lookup.
//!
//! With a bearer token the Twitter API v2 tweet endpoint is queried with the
//! `author_id` expansion. Without one, the public oEmbed endpoint is used and
//! the handle is read from its `author_url`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::debug;
use url::Url;

use super::PostLookup;
use crate::tweet::TweetRef;

const DEFAULT_API_BASE_URL: &str = "https://api.twitter.com";
const DEFAULT_OEMBED_URL: &str = "https://publish.twitter.com/oembed";
const TWEET_QUERY: &str =
    "expansions=author_id&tweet.fields=author_id,conversation_id,referenced_tweets&user.fields=username";

/// What a lookup learned about a tweet.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PostAuthor {
    /// Author handle, when the upstream reported one.
    pub username: Option<String>,
    /// Tweet object from the API; oEmbed lookups leave this empty.
    pub tweet_data: Option<Value>,
}

#[derive(Debug, thiserror::Error)]
pub enum LookupError {
    #[error("Twitter API error")]
    Api { status: u16, body: String },

    #[error("oEmbed fetch error")]
    OEmbed { status: u16, body: String },

    #[error("request to {source_name} failed: {message}")]
    Transport {
        source_name: &'static str,
        message: String,
    },

    #[error("invalid response from {source_name}: {message}")]
    InvalidResponse {
        source_name: &'static str,
        message: String,
    },
}

impl LookupError {
    /// Upstream body or failure text, reported to clients as `detail`.
    pub fn detail(&self) -> String {
        match self {
            LookupError::Api { body, .. } | LookupError::OEmbed { body, .. } => body.clone(),
            LookupError::Transport { message, .. }
            | LookupError::InvalidResponse { message, .. } => message.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TwitterClient {
    bearer_token: Option<String>,
    api_base_url: String,
    oembed_url: String,
    http: Client,
}

impl TwitterClient {
    pub fn new(bearer_token: Option<String>, timeout: Duration) -> Result<Self, LookupError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LookupError::Transport {
                source_name: "twitter",
                message: format!("failed to build HTTP client: {e}"),
            })?;

        Ok(Self {
            bearer_token,
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            oembed_url: DEFAULT_OEMBED_URL.to_string(),
            http,
        })
    }

    async fn api_lookup(&self, bearer: &str, tweet_id: &str) -> Result<PostAuthor, LookupError> {
        let url = format!(
            "{}/2/tweets/{}?{}",
            self.api_base_url.trim_end_matches('/'),
            tweet_id,
            TWEET_QUERY
        );

        let response = self
            .http
            .get(url)
            .bearer_auth(bearer)
            .send()
            .await
            .map_err(|e| LookupError::Transport {
                source_name: "twitter_api",
                message: e.to_string(),
            })?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(LookupError::Api { status, body });
        }

        let json: Value = response
            .json()
            .await
            .map_err(|e| LookupError::InvalidResponse {
                source_name: "twitter_api",
                message: e.to_string(),
            })?;
        Ok(author_from_api_response(&json))
    }

    async fn oembed_lookup(&self, tweet_url: &str) -> Result<PostAuthor, LookupError> {
        let url = Url::parse_with_params(&self.oembed_url, &[("url", tweet_url)]).map_err(|e| {
            LookupError::InvalidResponse {
                source_name: "oembed",
                message: format!("bad oEmbed URL: {e}"),
            }
        })?;

        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| LookupError::Transport {
                source_name: "oembed",
                message: e.to_string(),
            })?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(LookupError::OEmbed { status, body });
        }

        let json: Value = response
            .json()
            .await
            .map_err(|e| LookupError::InvalidResponse {
                source_name: "oembed",
                message: e.to_string(),
            })?;
        Ok(PostAuthor {
            username: author_from_oembed(&json),
            tweet_data: None,
        })
    }
}

#[async_trait]
impl PostLookup for TwitterClient {
    fn source(&self) -> &'static str {
        if self.bearer_token.is_some() {
            "twitter_api"
        } else {
            "oembed"
        }
    }

    async fn lookup(&self, tweet: &TweetRef, url: &str) -> Result<PostAuthor, LookupError> {
        debug!(tweet_id = %tweet.tweet_id, source = self.source(), "Looking up tweet author");
        match self.bearer_token.as_deref() {
            Some(bearer) => self.api_lookup(bearer, &tweet.tweet_id).await,
            None => self.oembed_lookup(url).await,
        }
    }
}

/// `data` is the tweet; the author is the first expanded user.
pub fn author_from_api_response(json: &Value) -> PostAuthor {
    PostAuthor {
        username: json
            .pointer("/includes/users/0/username")
            .and_then(Value::as_str)
            .map(str::to_string),
        tweet_data: json.get("data").filter(|v| !v.is_null()).cloned(),
    }
}

/// First path segment of `author_url`, else `author_name`.
pub fn author_from_oembed(json: &Value) -> Option<String> {
    let author_name = || {
        json.get("author_name")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };

    match json
        .get("author_url")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
    {
        Some(author_url) => match Url::parse(author_url) {
            Ok(url) => url
                .path_segments()
                .and_then(|mut segments| segments.find(|s| !s.is_empty()))
                .map(str::to_string),
            Err(_) => author_name(),
        },
        None => author_name(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn api_response_yields_author_and_tweet() {
        let json = json!({
            "data": { "id": "12345", "author_id": "42", "text": "gm" },
            "includes": { "users": [ { "id": "42", "username": "Alice" } ] }
        });
        let author = author_from_api_response(&json);
        assert_eq!(author.username.as_deref(), Some("Alice"));
        assert_eq!(author.tweet_data, Some(json!({ "id": "12345", "author_id": "42", "text": "gm" })));
    }

    #[test]
    fn api_response_without_users_has_no_author() {
        let author = author_from_api_response(&json!({ "data": { "id": "1" } }));
        assert_eq!(author.username, None);
        assert!(author.tweet_data.is_some());

        let author = author_from_api_response(&json!({ "errors": [] }));
        assert_eq!(author, PostAuthor::default());
    }

    #[test]
    fn oembed_author_comes_from_author_url() {
        let json = json!({
            "author_name": "Alice in Chains",
            "author_url": "https://twitter.com/alice"
        });
        assert_eq!(author_from_oembed(&json).as_deref(), Some("alice"));
    }

    #[test]
    fn oembed_falls_back_to_author_name() {
        assert_eq!(
            author_from_oembed(&json!({ "author_name": "alice" })).as_deref(),
            Some("alice")
        );
        assert_eq!(
            author_from_oembed(&json!({ "author_url": "::not a url::", "author_name": "bob" }))
                .as_deref(),
            Some("bob")
        );
        assert_eq!(author_from_oembed(&json!({})), None);
    }

    #[test]
    fn source_reflects_bearer_token() {
        let with = TwitterClient::new(Some("token".into()), Duration::from_secs(5)).unwrap();
        assert_eq!(with.source(), "twitter_api");
        let without = TwitterClient::new(None, Duration::from_secs(5)).unwrap();
        assert_eq!(without.source(), "oembed");
    }

    #[test]
    fn lookup_error_detail_carries_upstream_body() {
        let err = LookupError::Api {
            status: 429,
            body: "Too Many Requests".into(),
        };
        assert_eq!(err.to_string(), "Twitter API error");
        assert_eq!(err.detail(), "Too Many Requests");
    }
}
