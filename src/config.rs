// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! This module defines environment variable names, default values and the
//! [`Config`] struct loaded once at startup.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `3000` |
//! | `ALLOWED_ORIGINS` | Comma-separated CORS origins | permissive |
//! | `BASE_URL` | Public base URL used to build the Reclaim callback | `http://localhost:{PORT}` |
//! | `RECLAIM_APP_ID` | Reclaim application ID | Required for `/api/reclaim/init` |
//! | `RECLAIM_APP_SECRET` | Reclaim application secret (hex, `0x` optional) | Required for `/api/reclaim/init` |
//! | `RECLAIM_PROVIDER_ID` | Reclaim provider ID | Required for `/api/reclaim/init` |
//! | `RECLAIM_API_BASE_URL` | Reclaim backend | `https://api.reclaimprotocol.org` |
//! | `RECLAIM_SHARE_BASE_URL` | Reclaim verifier share page | `https://share.reclaimprotocol.org` |
//! | `RECLAIM_TRUSTED_WITNESSES` | Comma-separated witness addresses | none (no proof verifies) |
//! | `TWITTER_BEARER_TOKEN` | Twitter API v2 bearer token | Unset (oEmbed fallback) |
//! | `COMMENT_VERIFICATION_POLICY` | `lenient` or `strict` | `lenient` |
//! | `SESSION_TTL_SECS` | Verification session lifetime | `3600` |
//! | `SESSION_SWEEP_INTERVAL_SECS` | Expired session sweep period | `60` |
//! | `UPSTREAM_TIMEOUT_SECS` | Outbound HTTP timeout | `15` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::time::Duration;

use crate::verification::VerificationPolicy;

pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";
pub const ALLOWED_ORIGINS_ENV: &str = "ALLOWED_ORIGINS";
pub const BASE_URL_ENV: &str = "BASE_URL";
pub const RECLAIM_APP_ID_ENV: &str = "RECLAIM_APP_ID";
pub const RECLAIM_APP_SECRET_ENV: &str = "RECLAIM_APP_SECRET";
pub const RECLAIM_PROVIDER_ID_ENV: &str = "RECLAIM_PROVIDER_ID";
pub const RECLAIM_API_BASE_URL_ENV: &str = "RECLAIM_API_BASE_URL";
pub const RECLAIM_SHARE_BASE_URL_ENV: &str = "RECLAIM_SHARE_BASE_URL";
pub const RECLAIM_TRUSTED_WITNESSES_ENV: &str = "RECLAIM_TRUSTED_WITNESSES";
pub const TWITTER_BEARER_TOKEN_ENV: &str = "TWITTER_BEARER_TOKEN";
pub const COMMENT_VERIFICATION_POLICY_ENV: &str = "COMMENT_VERIFICATION_POLICY";
pub const SESSION_TTL_SECS_ENV: &str = "SESSION_TTL_SECS";
pub const SESSION_SWEEP_INTERVAL_SECS_ENV: &str = "SESSION_SWEEP_INTERVAL_SECS";
pub const UPSTREAM_TIMEOUT_SECS_ENV: &str = "UPSTREAM_TIMEOUT_SECS";

/// Logging format selector (`json` or `pretty`).
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

/// Filter used when `RUST_LOG` is not set.
pub const DEFAULT_LOG_FILTER: &str = "info,tower_http=debug";

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_RECLAIM_API_BASE_URL: &str = "https://api.reclaimprotocol.org";
pub const DEFAULT_RECLAIM_SHARE_BASE_URL: &str = "https://share.reclaimprotocol.org";
const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(3600);
const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(60);
const DEFAULT_UPSTREAM_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{name} must be {expected}, got {value:?}")]
    Invalid {
        name: &'static str,
        expected: &'static str,
        value: String,
    },
}

/// Reclaim application credentials and endpoints.
///
/// The credentials stay optional so the server can start without them;
/// initialization requests fail until they are provided.
#[derive(Debug, Clone, Default)]
pub struct ReclaimSettings {
    pub app_id: Option<String>,
    /// Application secret with any `0x` prefix removed.
    pub app_secret: Option<String>,
    pub provider_id: Option<String>,
    pub api_base_url: String,
    pub share_base_url: String,
    /// Lower-cased witness addresses that must sign every proof.
    pub trusted_witnesses: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// `None` means any origin is accepted.
    pub allowed_origins: Option<Vec<String>>,
    pub base_url: String,
    pub reclaim: ReclaimSettings,
    pub twitter_bearer_token: Option<String>,
    pub comment_policy: VerificationPolicy,
    pub session_ttl: Duration,
    pub sweep_interval: Duration,
    pub upstream_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let host = get(HOST_ENV).unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port = match get(PORT_ENV) {
            Some(raw) => raw.parse().map_err(|_| ConfigError::Invalid {
                name: PORT_ENV,
                expected: "a port number",
                value: raw,
            })?,
            None => DEFAULT_PORT,
        };

        let allowed_origins = get(ALLOWED_ORIGINS_ENV).map(|raw| split_list(&raw));
        let base_url = get(BASE_URL_ENV)
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or_else(|| format!("http://localhost:{port}"));

        let reclaim = ReclaimSettings {
            app_id: get(RECLAIM_APP_ID_ENV),
            app_secret: get(RECLAIM_APP_SECRET_ENV).map(|s| strip_hex_prefix(&s).to_string()),
            provider_id: get(RECLAIM_PROVIDER_ID_ENV),
            api_base_url: get(RECLAIM_API_BASE_URL_ENV)
                .unwrap_or_else(|| DEFAULT_RECLAIM_API_BASE_URL.to_string()),
            share_base_url: get(RECLAIM_SHARE_BASE_URL_ENV)
                .unwrap_or_else(|| DEFAULT_RECLAIM_SHARE_BASE_URL.to_string()),
            trusted_witnesses: get(RECLAIM_TRUSTED_WITNESSES_ENV)
                .map(|raw| {
                    split_list(&raw)
                        .into_iter()
                        .map(|w| w.to_ascii_lowercase())
                        .collect()
                })
                .unwrap_or_default(),
        };

        let comment_policy = match get(COMMENT_VERIFICATION_POLICY_ENV) {
            Some(raw) => raw.parse().map_err(|_| ConfigError::Invalid {
                name: COMMENT_VERIFICATION_POLICY_ENV,
                expected: "`lenient` or `strict`",
                value: raw,
            })?,
            None => VerificationPolicy::Lenient,
        };

        Ok(Self {
            host,
            port,
            allowed_origins,
            base_url,
            reclaim,
            twitter_bearer_token: get(TWITTER_BEARER_TOKEN_ENV),
            comment_policy,
            session_ttl: secs_or_default(&get, SESSION_TTL_SECS_ENV, DEFAULT_SESSION_TTL)?,
            sweep_interval: secs_or_default(
                &get,
                SESSION_SWEEP_INTERVAL_SECS_ENV,
                DEFAULT_SWEEP_INTERVAL,
            )?,
            upstream_timeout: secs_or_default(
                &get,
                UPSTREAM_TIMEOUT_SECS_ENV,
                DEFAULT_UPSTREAM_TIMEOUT,
            )?,
        })
    }

    /// URL the proof provider posts proofs to.
    pub fn callback_url(&self) -> String {
        format!("{}/api/reclaim/callback", self.base_url)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            allowed_origins: None,
            base_url: format!("http://localhost:{DEFAULT_PORT}"),
            reclaim: ReclaimSettings {
                api_base_url: DEFAULT_RECLAIM_API_BASE_URL.to_string(),
                share_base_url: DEFAULT_RECLAIM_SHARE_BASE_URL.to_string(),
                ..ReclaimSettings::default()
            },
            twitter_bearer_token: None,
            comment_policy: VerificationPolicy::Lenient,
            session_ttl: DEFAULT_SESSION_TTL,
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
            upstream_timeout: DEFAULT_UPSTREAM_TIMEOUT,
        }
    }
}

fn secs_or_default<G>(get: &G, name: &'static str, default: Duration) -> Result<Duration, ConfigError>
where
    G: Fn(&str) -> Option<String>,
{
    match get(name) {
        Some(raw) => match raw.parse::<u64>() {
            Ok(secs) if secs > 0 => Ok(Duration::from_secs(secs)),
            _ => Err(ConfigError::Invalid {
                name,
                expected: "a positive number of seconds",
                value: raw,
            }),
        },
        None => Ok(default),
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

pub fn strip_hex_prefix(value: &str) -> &str {
    value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
        .unwrap_or(value)
}
