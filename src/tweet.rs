// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Tweet status URL parsing.

use url::Url;

const ACCEPTED_DOMAINS: [&str; 2] = ["x.com", "twitter.com"];

/// Author handle and tweet id taken from a status URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TweetRef {
    pub username: String,
    pub tweet_id: String,
}

/// Parse `https://x.com/{username}/status/{tweet_id}`.
///
/// Accepts `x.com`, `twitter.com` and their subdomains. The first `status`
/// path segment must have a segment on each side.
pub fn parse_tweet_url(raw: &str) -> Option<TweetRef> {
    let url = Url::parse(raw.trim()).ok()?;
    if !matches!(url.scheme(), "http" | "https") {
        return None;
    }

    let host = url.host_str()?.to_ascii_lowercase();
    if !ACCEPTED_DOMAINS
        .iter()
        .any(|domain| host == *domain || host.ends_with(&format!(".{domain}")))
    {
        return None;
    }

    let parts: Vec<&str> = url
        .path_segments()?
        .filter(|segment| !segment.is_empty())
        .collect();
    let status_index = parts.iter().position(|segment| *segment == "status")?;
    if status_index < 1 || parts.len() <= status_index + 1 {
        return None;
    }

    Some(TweetRef {
        username: parts[status_index - 1].to_string(),
        tweet_id: parts[status_index + 1].to_string(),
    })
}
