// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use tokio::sync::RwLock;

use crate::config::Config;
use crate::providers::{PostLookup, ProofProvider};
use crate::store::SessionStore;

#[derive(Clone)]
pub struct AppState {
    pub sessions: Arc<RwLock<SessionStore>>,
    pub proofs: Arc<dyn ProofProvider>,
    pub posts: Arc<dyn PostLookup>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(config: Config, proofs: Arc<dyn ProofProvider>, posts: Arc<dyn PostLookup>) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(SessionStore::new(config.session_ttl))),
            proofs,
            posts,
            config: Arc::new(config),
        }
    }
}
