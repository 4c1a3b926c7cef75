//! Cryptographic provenance for decision audit trails
//!
//! Every sealed decision gets:
//! - SHA-256 hash over its canonical content
//! - Ed25519 signature over the same bytes
//! - Link to the previously sealed decision's hash
//!
//! Status and timestamps change over a decision's life and are left out of
//! the sealed content, so sealing survives status transitions.

use crate::types::{ProvenanceInfo, StrategicDecision};
use anyhow::{Context, Result};
use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::Path;

/// Provenance manager for cryptographic operations
pub struct Provenance {
    signing_key: SigningKey,
}

impl Provenance {
    /// Create or load provenance keys
    pub fn init(key_path: &Path) -> Result<Self> {
        let signing_key = if key_path.exists() {
            Self::load_key(key_path)?
        } else {
            let key = Self::generate_key();
            Self::save_key(&key, key_path)?;
            key
        };

        Ok(Self { signing_key })
    }

    /// Ephemeral key, nothing written to disk
    pub fn ephemeral() -> Self {
        Self {
            signing_key: Self::generate_key(),
        }
    }

    fn generate_key() -> SigningKey {
        SigningKey::generate(&mut OsRng)
    }

    fn load_key(path: &Path) -> Result<SigningKey> {
        let bytes =
            fs::read(path).with_context(|| format!("Failed to read key from {:?}", path))?;

        if bytes.len() != 32 {
            anyhow::bail!("Invalid key length: expected 32 bytes, got {}", bytes.len());
        }

        let mut key_bytes = [0u8; 32];
        key_bytes.copy_from_slice(&bytes);

        Ok(SigningKey::from_bytes(&key_bytes))
    }

    fn save_key(key: &SigningKey, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        fs::write(path, key.to_bytes())
            .with_context(|| format!("Failed to write key to {:?}", path))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mut perms = fs::metadata(path)?.permissions();
            perms.set_mode(0o600);
            fs::set_permissions(path, perms)?;
        }

        Ok(())
    }

    pub fn public_key_hex(&self) -> String {
        hex::encode(self.signing_key.verifying_key().as_bytes())
    }

    /// Hash content with SHA-256
    pub fn hash(&self, content: &[u8]) -> String {
        sha256_hex(content)
    }

    /// Sign content with Ed25519
    pub fn sign(&self, content: &[u8]) -> String {
        hex::encode(self.signing_key.sign(content).to_bytes())
    }

    /// Verify a signature against any public key
    pub fn verify(&self, content: &[u8], signature_hex: &str, pubkey_hex: &str) -> Result<bool> {
        verify_signature(content, signature_hex, pubkey_hex)
    }

    /// Hash and sign a decision's canonical content
    pub fn seal(
        &self,
        decision: &StrategicDecision,
        previous_hash: Option<String>,
    ) -> Result<ProvenanceInfo> {
        let content = canonical_content(decision)?;
        Ok(ProvenanceInfo {
            content_hash: self.hash(&content),
            previous_hash,
            signature: self.sign(&content),
            agent_pubkey: self.public_key_hex(),
        })
    }
}

/// SHA-256 of `content`, hex encoded
pub fn sha256_hex(content: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content);
    hex::encode(hasher.finalize())
}

/// Check an Ed25519 signature given hex-encoded signature and public key
pub fn verify_signature(content: &[u8], signature_hex: &str, pubkey_hex: &str) -> Result<bool> {
    let sig_bytes = hex::decode(signature_hex).context("Invalid signature hex")?;
    let pubkey_bytes = hex::decode(pubkey_hex).context("Invalid public key hex")?;

    if sig_bytes.len() != 64 {
        anyhow::bail!("Invalid signature length");
    }
    if pubkey_bytes.len() != 32 {
        anyhow::bail!("Invalid public key length");
    }

    let mut sig_arr = [0u8; 64];
    sig_arr.copy_from_slice(&sig_bytes);
    let signature = Signature::from_bytes(&sig_arr);

    let mut pubkey_arr = [0u8; 32];
    pubkey_arr.copy_from_slice(&pubkey_bytes);
    let verifying_key = VerifyingKey::from_bytes(&pubkey_arr).context("Invalid public key")?;

    Ok(verifying_key.verify(content, &signature).is_ok())
}

/// Re-derive the hash and check the signature of one decision
pub fn audit(decision: &StrategicDecision) -> AuditReport {
    let mut errors = Vec::new();

    let Some(info) = &decision.provenance else {
        return AuditReport {
            decision_id: decision.id.clone(),
            sealed: false,
            valid: false,
            errors: vec!["Decision carries no provenance".to_string()],
        };
    };

    match canonical_content(decision) {
        Ok(content) => {
            let computed = sha256_hex(&content);
            if computed != info.content_hash {
                errors.push(format!(
                    "Hash mismatch: computed {}, stored {}",
                    computed, info.content_hash
                ));
            }
            match verify_signature(&content, &info.signature, &info.agent_pubkey) {
                Ok(true) => {}
                Ok(false) => errors.push("Invalid signature".to_string()),
                Err(e) => errors.push(format!("Signature verification error: {}", e)),
            }
        }
        Err(e) => errors.push(format!("Could not serialize decision: {}", e)),
    }

    AuditReport {
        decision_id: decision.id.clone(),
        sealed: true,
        valid: errors.is_empty(),
        errors,
    }
}

/// Verify a sequence of decisions, oldest first: each must be intact and
/// link to the hash of the one before it
pub fn verify_chain(decisions: &[StrategicDecision]) -> ChainVerification {
    let mut errors = Vec::new();
    let mut prev_hash: Option<&str> = None;

    for (i, decision) in decisions.iter().enumerate() {
        let report = audit(decision);
        for e in report.errors {
            errors.push(format!("Position {} ({}): {}", i, decision.id, e));
        }

        let info = decision.provenance.as_ref();
        if let Some(expected_prev) = prev_hash {
            let actual_prev = info.and_then(|p| p.previous_hash.as_deref());
            if actual_prev != Some(expected_prev) {
                errors.push(format!(
                    "Chain break at position {}: expected prev_hash {:?}, got {:?}",
                    i, expected_prev, actual_prev
                ));
            }
        }

        prev_hash = info.map(|p| p.content_hash.as_str());
    }

    ChainVerification {
        valid: errors.is_empty(),
        errors,
        chain_length: decisions.len(),
    }
}

/// The sealed subset of a decision, serialized
fn canonical_content(decision: &StrategicDecision) -> Result<Vec<u8>> {
    let content = serde_json::json!({
        "id": decision.id,
        "mission_id": decision.mission_id,
        "objective_id": decision.objective_id,
        "decision_type": decision.decision_type,
        "context": decision.context,
        "options": decision.options,
        "recommended_option_id": decision.recommended_option.id,
        "reasoning": decision.reasoning,
        "decision_chain": decision.decision_chain,
        "created_at": decision.created_at,
    });
    Ok(serde_json::to_vec(&content)?)
}

/// Result of auditing a single decision
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditReport {
    pub decision_id: String,
    pub sealed: bool,
    pub valid: bool,
    pub errors: Vec<String>,
}

/// Result of chain verification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChainVerification {
    pub valid: bool,
    pub errors: Vec<String>,
    pub chain_length: usize,
}
