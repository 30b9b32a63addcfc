// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Session Sweeper
//!
//! Background task that drops expired verification sessions every
//! `interval`. Lookups already hide expired sessions; the sweep reclaims
//! their memory.
//!
//! Stops when its `CancellationToken` is cancelled.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::store::SessionStore;

pub struct SessionSweeper {
    sessions: Arc<RwLock<SessionStore>>,
    interval: Duration,
}

impl SessionSweeper {
    pub fn new(sessions: Arc<RwLock<SessionStore>>, interval: Duration) -> Self {
        Self { sessions, interval }
    }

    /// Run until the token is cancelled.
    ///
    /// ```rust,ignore
    /// tokio::spawn(sweeper.run(shutdown.clone()));
    /// ```
    pub async fn run(self, shutdown: CancellationToken) {
        info!(
            interval_secs = self.interval.as_secs(),
            "Session sweeper starting"
        );

        loop {
            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {},
                _ = shutdown.cancelled() => {
                    info!("Session sweeper shutting down");
                    return;
                }
            }

            self.sweep_step().await;
        }
    }

    /// Remove every expired session. Returns how many were dropped.
    pub async fn sweep_step(&self) -> usize {
        let mut sessions = self.sessions.write().await;
        let removed = sessions.sweep_expired(Utc::now());
        if removed > 0 {
            info!(removed, remaining = sessions.len(), "Swept expired sessions");
        } else {
            debug!(remaining = sessions.len(), "No expired sessions");
        }
        removed
    }
}
