// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Claim proof verification.
//!
//! A Reclaim proof is a claim signed by one or more attestor ("witness")
//! keys. Checking it means:
//!
//! 1. recomputing the claim identifier,
//!    `keccak256(provider \n canonical(parameters) \n context)`,
//!    and requiring both identifiers the proof carries to match it;
//! 2. rebuilding the signed message over the recomputed identifier,
//!    `identifier \n owner \n timestampS \n epoch`;
//! 3. recovering each EIP-191 signature and requiring every trusted witness
//!    address among the recovered signers.
//!
//! Witnesses come only from the operator's trusted list. The `witnesses`
//! array inside a proof is chosen by whoever posted it, so it is never
//! consulted; with no trusted list every proof fails with
//! [`ProofError::NoWitnesses`].

use alloy::primitives::{hex, keccak256, Signature};
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ProofError {
    #[error("no proofs in payload")]
    NoProofs,

    #[error("malformed proof: {0}")]
    Malformed(String),

    #[error("proof carries no signatures")]
    NoSignatures,

    #[error("no trusted witnesses configured")]
    NoWitnesses,

    #[error("identifier mismatch: expected {expected}, proof has {actual}")]
    IdentifierMismatch { expected: String, actual: String },

    #[error("invalid signature: {0}")]
    InvalidSignature(String),

    #[error("missing signature from witness {0}")]
    MissingWitnessSignature(String),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimProof {
    pub identifier: String,
    pub claim_data: ClaimData,
    #[serde(default)]
    pub signatures: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimData {
    pub provider: String,
    /// JSON-encoded provider parameters.
    pub parameters: String,
    pub owner: String,
    pub timestamp_s: u64,
    #[serde(default)]
    pub context: String,
    pub epoch: u64,
    #[serde(default)]
    pub identifier: Option<String>,
}

/// Verify every proof; one failure fails the batch.
pub fn verify_proofs(proofs: &[Value], trusted_witnesses: &[String]) -> Result<(), ProofError> {
    if proofs.is_empty() {
        return Err(ProofError::NoProofs);
    }
    proofs
        .iter()
        .try_for_each(|proof| verify_claim_proof(proof, trusted_witnesses))
}

pub fn verify_claim_proof(proof: &Value, trusted_witnesses: &[String]) -> Result<(), ProofError> {
    if trusted_witnesses.is_empty() {
        return Err(ProofError::NoWitnesses);
    }

    let proof = ClaimProof::deserialize(proof).map_err(|e| ProofError::Malformed(e.to_string()))?;

    if proof.signatures.is_empty() {
        return Err(ProofError::NoSignatures);
    }

    let claim = &proof.claim_data;
    let expected = claim_identifier(&claim.provider, &claim.parameters, &claim.context)?;
    let carried = std::iter::once(proof.identifier.as_str()).chain(claim.identifier.as_deref());
    for identifier in carried {
        let actual = normalize_identifier(identifier);
        if actual != expected {
            return Err(ProofError::IdentifierMismatch {
                expected,
                actual,
            });
        }
    }

    let message = claim_sign_data(&expected, &claim.owner, claim.timestamp_s, claim.epoch);

    let signers = proof
        .signatures
        .iter()
        .map(|sig| recover_signer(sig, &message))
        .collect::<Result<Vec<_>, _>>()?;

    match trusted_witnesses
        .iter()
        .map(|w| w.to_ascii_lowercase())
        .find(|w| !signers.contains(w))
    {
        Some(missing) => Err(ProofError::MissingWitnessSignature(missing)),
        None => Ok(()),
    }
}

fn normalize_identifier(identifier: &str) -> String {
    identifier.replace('"', "").to_ascii_lowercase()
}

/// `0x`-prefixed lower-case keccak256 of the claim info.
pub fn claim_identifier(provider: &str, parameters: &str, context: &str) -> Result<String, ProofError> {
    let parameters: Value = serde_json::from_str(parameters)
        .map_err(|e| ProofError::Malformed(format!("claim parameters are not JSON: {e}")))?;
    let info = format!("{provider}\n{}\n{context}", canonical_json(&parameters));
    Ok(hex::encode_prefixed(keccak256(info.as_bytes())))
}

pub fn claim_sign_data(identifier: &str, owner: &str, timestamp_s: u64, epoch: u64) -> String {
    format!(
        "{}\n{}\n{timestamp_s}\n{epoch}",
        identifier,
        owner.to_ascii_lowercase()
    )
}

fn recover_signer(signature: &str, message: &str) -> Result<String, ProofError> {
    let bytes = hex::decode(signature).map_err(|e| ProofError::InvalidSignature(e.to_string()))?;
    let signature = Signature::try_from(bytes.as_slice())
        .map_err(|e| ProofError::InvalidSignature(e.to_string()))?;
    let address = signature
        .recover_address_from_msg(message.as_bytes())
        .map_err(|e| ProofError::InvalidSignature(e.to_string()))?;
    Ok(address.to_string().to_ascii_lowercase())
}

/// JSON with object keys sorted, no insignificant whitespace.
pub fn canonical_json(value: &Value) -> String {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            let fields: Vec<String> = keys
                .into_iter()
                .map(|key| {
                    format!(
                        "{}:{}",
                        Value::String(key.clone()),
                        canonical_json(&map[key.as_str()])
                    )
                })
                .collect();
            format!("{{{}}}", fields.join(","))
        }
        Value::Array(items) => {
            let items: Vec<String> = items.iter().map(canonical_json).collect();
            format!("[{}]", items.join(","))
        }
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::signers::local::PrivateKeySigner;
    use alloy::signers::SignerSync;
    use serde_json::json;

    const WITNESS_KEY: &str = "0x4c0883a69102937d6231471b5dbb6204fe5129617082792ae468d01a3f362318";
    const OTHER_KEY: &str = "0x8da4ef21b864d2cc526dbdb2a120bd2874c36c9d0a1fb7f8c63d7f7a8b41de8f";
    const OWNER: &str = "0xAbC0000000000000000000000000000000000001";

    fn signer(key: &str) -> PrivateKeySigner {
        key.parse().expect("valid test key")
    }

    fn address_of(signer: &PrivateKeySigner) -> String {
        signer.address().to_string().to_ascii_lowercase()
    }

    const PARAMETERS: &str = r#"{"url":"https://x.com/alice/status/12345","method":"GET"}"#;
    const CONTEXT: &str = r#"{"contextAddress":"0x0","contextMessage":"campaign"}"#;

    fn signed_proof(witness: &PrivateKeySigner) -> Value {
        signed_proof_with(witness, PARAMETERS)
    }

    fn signed_proof_with(witness: &PrivateKeySigner, parameters: &str) -> Value {
        let identifier = claim_identifier("http", parameters, CONTEXT).unwrap();
        let message = claim_sign_data(&identifier, OWNER, 1_760_000_000, 1);
        let signature = witness.sign_message_sync(message.as_bytes()).unwrap();

        json!({
            "identifier": identifier,
            "claimData": {
                "provider": "http",
                "parameters": parameters,
                "owner": OWNER,
                "timestampS": 1_760_000_000u64,
                "context": CONTEXT,
                "identifier": identifier,
                "epoch": 1
            },
            "signatures": [hex::encode_prefixed(signature.as_bytes())],
            "witnesses": [{ "id": address_of(witness), "url": "wss://attestor.reclaimprotocol.org/ws" }]
        })
    }

    fn trusted() -> Vec<String> {
        vec![address_of(&signer(WITNESS_KEY))]
    }

    #[test]
    fn canonical_json_sorts_keys_recursively() {
        let value = json!({ "b": 1, "a": { "d": [ { "z": 0, "y": "x" } ], "c": null } });
        assert_eq!(
            canonical_json(&value),
            r#"{"a":{"c":null,"d":[{"y":"x","z":0}]},"b":1}"#
        );
    }

    #[test]
    fn identifier_ignores_parameter_key_order() {
        let a = claim_identifier("http", r#"{"a":1,"b":2}"#, "ctx").unwrap();
        let b = claim_identifier("http", r#"{ "b": 2, "a": 1 }"#, "ctx").unwrap();
        assert_eq!(a, b);
        assert!(a.starts_with("0x"));
        assert_eq!(a.len(), 66);
    }

    #[test]
    fn signed_proof_verifies() {
        let witness = signer(WITNESS_KEY);
        let proof = signed_proof(&witness);
        assert_eq!(verify_claim_proof(&proof, &trusted()), Ok(()));
        assert_eq!(verify_proofs(&[proof.clone(), proof], &trusted()), Ok(()));
    }

    #[test]
    fn trusted_witness_is_compared_case_insensitively() {
        let proof = signed_proof(&signer(WITNESS_KEY));
        let checksummed = signer(WITNESS_KEY).address().to_string();
        assert_eq!(verify_claim_proof(&proof, &[checksummed]), Ok(()));
    }

    #[test]
    fn without_trusted_witnesses_nothing_verifies() {
        let proof = signed_proof(&signer(WITNESS_KEY));
        assert_eq!(verify_claim_proof(&proof, &[]), Err(ProofError::NoWitnesses));
        assert_eq!(verify_proofs(&[proof], &[]), Err(ProofError::NoWitnesses));
    }

    #[test]
    fn witnesses_named_in_proof_are_not_trusted() {
        // Correctly signed by a key of the poster's choosing, which the proof
        // lists as its own witness.
        let self_signed = signed_proof(&signer(OTHER_KEY));
        assert_eq!(
            verify_claim_proof(&self_signed, &[]),
            Err(ProofError::NoWitnesses)
        );
        assert_eq!(
            verify_claim_proof(&self_signed, &trusted()),
            Err(ProofError::MissingWitnessSignature(trusted()[0].clone()))
        );
    }

    #[test]
    fn every_trusted_witness_must_sign() {
        let proof = signed_proof(&signer(WITNESS_KEY));
        let other = address_of(&signer(OTHER_KEY));
        assert_eq!(
            verify_claim_proof(&proof, &[trusted()[0].clone(), other.clone()]),
            Err(ProofError::MissingWitnessSignature(other))
        );
    }

    #[test]
    fn tampered_owner_fails_signature_check() {
        let mut proof = signed_proof(&signer(WITNESS_KEY));
        proof["claimData"]["owner"] = json!("0x0000000000000000000000000000000000000bad");

        assert!(matches!(
            verify_claim_proof(&proof, &trusted()),
            Err(ProofError::MissingWitnessSignature(_))
        ));
    }

    #[test]
    fn tampered_parameters_fail_identifier_check() {
        let mut proof = signed_proof(&signer(WITNESS_KEY));
        proof["claimData"]["parameters"] =
            json!(r#"{"url":"https://x.com/mallory/status/1","method":"GET"}"#);

        assert!(matches!(
            verify_claim_proof(&proof, &trusted()),
            Err(ProofError::IdentifierMismatch { .. })
        ));
    }

    #[test]
    fn signature_over_one_claim_cannot_carry_another() {
        let witness = signer(WITNESS_KEY);
        let genuine = signed_proof(&witness);
        let swapped_parameters = r#"{"url":"https://x.com/mallory/status/1","method":"GET"}"#;
        let swapped_id = claim_identifier("http", swapped_parameters, CONTEXT).unwrap();

        // Outer identifier and parameters describe the new claim; the signed
        // identifier and signature still belong to the genuine one.
        let mut forged = genuine.clone();
        forged["identifier"] = json!(swapped_id);
        forged["claimData"]["parameters"] = json!(swapped_parameters);

        assert_eq!(
            verify_claim_proof(&forged, &trusted()),
            Err(ProofError::IdentifierMismatch {
                expected: swapped_id,
                actual: genuine["identifier"].as_str().unwrap().to_string(),
            })
        );
    }

    #[test]
    fn claim_without_inner_identifier_signs_recomputed_one() {
        let mut proof = signed_proof(&signer(WITNESS_KEY));
        proof["claimData"]
            .as_object_mut()
            .unwrap()
            .remove("identifier");
        assert_eq!(verify_claim_proof(&proof, &trusted()), Ok(()));
    }

    #[test]
    fn quoted_identifier_is_accepted() {
        let mut proof = signed_proof(&signer(WITNESS_KEY));
        let quoted = format!("\"{}\"", proof["identifier"].as_str().unwrap());
        proof["identifier"] = json!(quoted.clone());
        proof["claimData"]["identifier"] = json!(quoted.to_uppercase().replace("0X", "0x"));
        assert_eq!(verify_claim_proof(&proof, &trusted()), Ok(()));
    }

    #[test]
    fn missing_pieces_are_reported() {
        let witness = signer(WITNESS_KEY);

        let mut unsigned = signed_proof(&witness);
        unsigned["signatures"] = json!([]);
        assert_eq!(verify_claim_proof(&unsigned, &trusted()), Err(ProofError::NoSignatures));

        let mut garbage_sig = signed_proof(&witness);
        garbage_sig["signatures"] = json!(["0x1234"]);
        assert!(matches!(
            verify_claim_proof(&garbage_sig, &trusted()),
            Err(ProofError::InvalidSignature(_))
        ));

        assert!(matches!(
            verify_claim_proof(&json!({ "sessionId": "abc" }), &trusted()),
            Err(ProofError::Malformed(_))
        ));

        assert_eq!(verify_proofs(&[], &trusted()), Err(ProofError::NoProofs));
    }
}
