// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Reclaim Callback Payloads
//!
//! Reclaim posts proofs in several shapes depending on SDK version and
//! request options. This module reduces them to a flat list of proof objects
//! and finds the session the callback belongs to.
//!
//! Precedence, first match wins:
//!
//! 1. the payload is an array: its elements
//! 2. `payload.proofs`: its elements (a non-array value counts as one proof)
//! 3. `payload.proof`: one proof
//! 4. otherwise the payload itself is one proof
//!
//! Claim signature checking lives in [`verify`].

use serde_json::Value;

pub mod verify;

pub use verify::{verify_claim_proof, verify_proofs, ProofError};

/// Flatten a callback payload into the proofs it carries.
pub fn normalize_proofs(payload: &Value) -> Vec<Value> {
    if let Value::Array(items) = payload {
        return items.clone();
    }

    if let Some(proofs) = payload.get("proofs").filter(|v| is_truthy(v)) {
        return match proofs {
            Value::Array(items) => items.clone(),
            other => vec![other.clone()],
        };
    }

    if let Some(proof) = payload.get("proof").filter(|v| is_truthy(v)) {
        return vec![proof.clone()];
    }

    if payload.is_null() {
        Vec::new()
    } else {
        vec![payload.clone()]
    }
}

/// Session identifier from `sessionId`, falling back to `session.id`.
pub fn extract_session_id(payload: &Value) -> Option<String> {
    payload
        .get("sessionId")
        .and_then(id_string)
        .or_else(|| payload.pointer("/session/id").and_then(id_string))
}

fn id_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Loose truthiness: `null`, `false`, `0` and `""` are false.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
