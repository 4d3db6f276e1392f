//! # Proof Derivation
//!
//! A proof binds a gate name, a normalized event, a proof kind (the gate's
//! action tag) and a generation timestamp into a single SHA-256 digest.
//!
//! The hash input is the RFC 8785 (JCS) canonical JSON serialization of
//! `{event, proof_kind, tenant, timestamp}`, so the digest depends only on
//! field values and never on serializer key order or whitespace. The
//! timestamp is part of the input: identical events hashed at different times
//! produce different proofs, while a fixed `(tenant, event, proof_kind,
//! timestamp)` always reproduces the same hash.

use crate::event::NormalizedEvent;
use crate::Timestamp;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Proof derivation errors
#[derive(Debug, thiserror::Error)]
pub enum ProofError {
    #[error("Failed to canonicalize proof input: {message}")]
    Canonicalization { message: String },
}

/// Tamper-evident receipt for one accepted event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofRecord {
    pub tenant: String,
    pub event: NormalizedEvent,
    pub proof_hash: String,
    pub proof_kind: String,
    pub generated_at: Timestamp,
}

impl ProofRecord {
    /// Recompute the hash from the record's own fields and compare
    ///
    /// Returns `Ok(false)` when any field was altered after generation.
    pub fn verify(&self) -> Result<bool, ProofError> {
        let expected = ProofGenerator::compute_hash(
            &self.tenant,
            &self.event,
            &self.proof_kind,
            &self.generated_at,
        )?;
        Ok(expected == self.proof_hash)
    }
}

#[derive(Serialize)]
struct CanonicalProofInput<'a> {
    tenant: &'a str,
    event: &'a NormalizedEvent,
    proof_kind: &'a str,
    timestamp: &'a Timestamp,
}

/// Stateless proof generator
#[derive(Debug, Clone, Copy, Default)]
pub struct ProofGenerator;

impl ProofGenerator {
    /// Generate a proof stamped with the current time
    pub fn generate(
        tenant: &str,
        event: &NormalizedEvent,
        proof_kind: &str,
    ) -> Result<ProofRecord, ProofError> {
        Self::generate_at(tenant, event, proof_kind, Timestamp::now())
    }

    /// Generate a proof for a fixed timestamp
    pub fn generate_at(
        tenant: &str,
        event: &NormalizedEvent,
        proof_kind: &str,
        timestamp: Timestamp,
    ) -> Result<ProofRecord, ProofError> {
        let proof_hash = Self::compute_hash(tenant, event, proof_kind, &timestamp)?;

        Ok(ProofRecord {
            tenant: tenant.to_string(),
            event: event.clone(),
            proof_hash,
            proof_kind: proof_kind.to_string(),
            generated_at: timestamp,
        })
    }

    /// Canonical bytes fed to the hash
    pub fn canonical_input(
        tenant: &str,
        event: &NormalizedEvent,
        proof_kind: &str,
        timestamp: &Timestamp,
    ) -> Result<Vec<u8>, ProofError> {
        let input = CanonicalProofInput {
            tenant,
            event,
            proof_kind,
            timestamp,
        };
        serde_jcs::to_vec(&input).map_err(|e| ProofError::Canonicalization {
            message: e.to_string(),
        })
    }

    /// Lowercase hex SHA-256 of the canonical input
    pub fn compute_hash(
        tenant: &str,
        event: &NormalizedEvent,
        proof_kind: &str,
        timestamp: &Timestamp,
    ) -> Result<String, ProofError> {
        let canonical = Self::canonical_input(tenant, event, proof_kind, timestamp)?;
        Ok(hex::encode(Sha256::digest(&canonical)))
    }
}

#[cfg(test)]
#[path = "proof_tests.rs"]
mod tests;
