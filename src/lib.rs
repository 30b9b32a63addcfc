// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! GO BUZZ Proof Relay
//!
//! HTTP relay between the GO BUZZ frontend and the Reclaim Protocol: it opens
//! proof sessions, receives and verifies the proofs Reclaim posts back, and
//! checks that a tweet was written by the account named in its URL.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers (Axum)
//! - `proof` - Reclaim proof normalization and witness signature checks
//! - `providers` - Reclaim and Twitter/oEmbed clients
//! - `store` - In-memory session store with TTL expiry

pub mod api;
pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod proof;
pub mod providers;
pub mod session_sweeper;
pub mod state;
pub mod store;
pub mod tweet;
pub mod verification;
