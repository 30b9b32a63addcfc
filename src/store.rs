// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! In-memory verification session store.
//!
//! Sessions live for a fixed TTL. An expiry index ordered by expiry time lets
//! [`SessionStore::sweep_expired`] drop stale sessions without scanning the
//! whole map; lookups also treat expired sessions as absent so a missed sweep
//! never resurrects one.
//!
//! The `PENDING -> COMPLETED` transition is a compare-and-set: completing an
//! already completed session fails with [`SessionError::AlreadyCompleted`] and
//! leaves the stored result untouched.

use std::collections::{BTreeSet, HashMap};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::models::{NewSession, SessionResult, SessionStatus, VerificationSession};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("session not found")]
    NotFound,

    #[error("session {0} already exists")]
    AlreadyExists(String),

    #[error("session already completed")]
    AlreadyCompleted,
}

pub struct SessionStore {
    sessions: HashMap<String, VerificationSession>,
    expiry: BTreeSet<(DateTime<Utc>, String)>,
    ttl: chrono::Duration,
}

impl SessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: HashMap::new(),
            expiry: BTreeSet::new(),
            ttl: chrono::Duration::from_std(ttl).unwrap_or(chrono::Duration::MAX),
        }
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn create(
        &mut self,
        session_id: impl Into<String>,
        request: NewSession,
    ) -> Result<VerificationSession, SessionError> {
        self.create_at(session_id, request, Utc::now())
    }

    pub fn create_at(
        &mut self,
        session_id: impl Into<String>,
        request: NewSession,
        now: DateTime<Utc>,
    ) -> Result<VerificationSession, SessionError> {
        let session_id = session_id.into();
        if self.get_at(&session_id, now).is_some() {
            return Err(SessionError::AlreadyExists(session_id));
        }
        // An expired record under the same id may still be waiting for the sweep.
        self.remove(&session_id);

        let expires_at = now.checked_add_signed(self.ttl).unwrap_or(DateTime::<Utc>::MAX_UTC);
        let session = VerificationSession {
            session_id: session_id.clone(),
            user_id: request.user_id,
            user_address: request.user_address,
            validation_link: request.validation_link,
            created_at: now,
            expires_at,
            completed_at: None,
            status: SessionStatus::Pending,
            result: None,
        };

        self.expiry.insert((expires_at, session_id.clone()));
        self.sessions.insert(session_id, session.clone());
        Ok(session)
    }

    pub fn get(&self, session_id: &str) -> Option<&VerificationSession> {
        self.get_at(session_id, Utc::now())
    }

    pub fn get_at(&self, session_id: &str, now: DateTime<Utc>) -> Option<&VerificationSession> {
        self.sessions
            .get(session_id)
            .filter(|session| session.expires_at > now)
    }

    pub fn complete(
        &mut self,
        session_id: &str,
        payload: Value,
        verified: bool,
    ) -> Result<VerificationSession, SessionError> {
        self.complete_at(session_id, payload, verified, Utc::now())
    }

    pub fn complete_at(
        &mut self,
        session_id: &str,
        payload: Value,
        verified: bool,
        now: DateTime<Utc>,
    ) -> Result<VerificationSession, SessionError> {
        let Some(session) = self
            .sessions
            .get_mut(session_id)
            .filter(|session| session.expires_at > now)
        else {
            return Err(SessionError::NotFound);
        };

        if session.status != SessionStatus::Pending {
            return Err(SessionError::AlreadyCompleted);
        }

        session.status = SessionStatus::Completed;
        session.completed_at = Some(now);
        session.result = Some(SessionResult { payload, verified });
        Ok(session.clone())
    }

    /// Remove every session whose expiry is at or before `now`.
    ///
    /// Returns the number of sessions removed.
    pub fn sweep_expired(&mut self, now: DateTime<Utc>) -> usize {
        let mut removed = 0;
        while let Some((expires_at, _)) = self.expiry.first() {
            if *expires_at > now {
                break;
            }
            if let Some((_, session_id)) = self.expiry.pop_first() {
                if self.sessions.remove(&session_id).is_some() {
                    removed += 1;
                }
            }
        }
        removed
    }

    fn remove(&mut self, session_id: &str) {
        if let Some(old) = self.sessions.remove(session_id) {
            self.expiry.remove(&(old.expires_at, old.session_id));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn new_session(link: &str) -> NewSession {
        NewSession {
            user_id: Some("user-1".into()),
            user_address: Some("0x1111111111111111111111111111111111111111".into()),
            validation_link: link.into(),
        }
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 5, 1, 10, 0, 0).unwrap()
    }

    #[test]
    fn create_registers_pending_session() {
        let mut store = SessionStore::new(Duration::from_secs(600));
        let session = store
            .create_at("sess-1", new_session("https://x.com/a/status/1"), t0())
            .expect("create succeeds");

        assert_eq!(session.status, SessionStatus::Pending);
        assert_eq!(session.created_at, t0());
        assert_eq!(session.expires_at, t0() + chrono::Duration::seconds(600));
        assert!(session.result.is_none());
        assert_eq!(store.get_at("sess-1", t0()), Some(&session));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn create_rejects_live_duplicate() {
        let mut store = SessionStore::new(Duration::from_secs(600));
        store
            .create_at("sess-1", new_session("https://x.com/a/status/1"), t0())
            .unwrap();
        let err = store
            .create_at("sess-1", new_session("https://x.com/b/status/2"), t0())
            .unwrap_err();
        assert_eq!(err, SessionError::AlreadyExists("sess-1".into()));
    }

    #[test]
    fn complete_transitions_once() {
        let mut store = SessionStore::new(Duration::from_secs(600));
        store
            .create_at("sess-1", new_session("https://x.com/a/status/1"), t0())
            .unwrap();

        let done = store
            .complete_at("sess-1", json!({ "proof": 1 }), true, t0())
            .expect("first completion succeeds");
        assert_eq!(done.status, SessionStatus::Completed);
        assert_eq!(done.completed_at, Some(t0()));
        assert_eq!(
            done.result,
            Some(SessionResult {
                payload: json!({ "proof": 1 }),
                verified: true
            })
        );

        let second = store.complete_at("sess-1", json!({ "proof": 2 }), false, t0());
        assert_eq!(second, Err(SessionError::AlreadyCompleted));

        let stored = store.get_at("sess-1", t0()).unwrap();
        assert_eq!(stored.result.as_ref().unwrap().payload, json!({ "proof": 1 }));
        assert!(stored.result.as_ref().unwrap().verified);
    }

    #[test]
    fn complete_unknown_session_is_not_found() {
        let mut store = SessionStore::new(Duration::from_secs(600));
        assert_eq!(
            store.complete_at("missing", json!({}), true, t0()),
            Err(SessionError::NotFound)
        );
        assert!(store.is_empty());
    }

    #[test]
    fn expired_sessions_are_hidden_and_swept() {
        let mut store = SessionStore::new(Duration::from_secs(60));
        store
            .create_at("old", new_session("https://x.com/a/status/1"), t0())
            .unwrap();
        store
            .create_at(
                "new",
                new_session("https://x.com/a/status/2"),
                t0() + chrono::Duration::seconds(30),
            )
            .unwrap();

        let later = t0() + chrono::Duration::seconds(60);
        assert!(store.get_at("old", later).is_none());
        assert!(store.get_at("new", later).is_some());
        assert_eq!(
            store.complete_at("old", json!({}), true, later),
            Err(SessionError::NotFound)
        );

        assert_eq!(store.sweep_expired(later), 1);
        assert_eq!(store.len(), 1);
        assert_eq!(store.sweep_expired(later), 0);

        assert_eq!(store.sweep_expired(t0() + chrono::Duration::seconds(120)), 1);
        assert!(store.is_empty());
    }

    #[test]
    fn expired_id_can_be_reused_before_sweep() {
        let mut store = SessionStore::new(Duration::from_secs(60));
        store
            .create_at("sess-1", new_session("https://x.com/a/status/1"), t0())
            .unwrap();

        let later = t0() + chrono::Duration::seconds(90);
        let fresh = store
            .create_at("sess-1", new_session("https://x.com/a/status/9"), later)
            .expect("expired id is replaced");
        assert_eq!(fresh.validation_link, "https://x.com/a/status/9");

        // The stale expiry entry must not evict the fresh session.
        assert_eq!(store.sweep_expired(later), 0);
        assert!(store.get_at("sess-1", later).is_some());
    }
}
