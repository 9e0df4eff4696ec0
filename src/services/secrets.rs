// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Sealing of integration credentials at rest.
//!
//! Credential bags are serialized to JSON and encrypted with AES-256-GCM.
//! The key is derived with HKDF-SHA256 from `CREDENTIAL_ENCRYPTION_KEY`, and
//! the integration id is bound as associated data so a sealed bag only opens
//! for the row it was written to. Stored form: `base64(nonce || ciphertext)`.

use crate::error::AppError;
use crate::models::CredentialBag;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use hkdf::Hkdf;
use ring::aead::{Aad, LessSafeKey, Nonce, UnboundKey, AES_256_GCM, NONCE_LEN};
use ring::rand::{SecureRandom, SystemRandom};
use sha2::Sha256;
use uuid::Uuid;

const HKDF_SALT: &[u8] = b"threadspace/credentials";
const HKDF_INFO: &[u8] = b"integration-secrets aes-256-gcm v1";

/// Credential encryption service.
#[derive(Clone)]
pub struct SecretBox {
    key: [u8; 32],
    rng: SystemRandom,
}

impl SecretBox {
    /// Derive the sealing key from the configured master secret.
    pub fn new(master_secret: &[u8]) -> Result<Self, AppError> {
        if master_secret.is_empty() {
            return Err(AppError::Internal(anyhow::anyhow!(
                "Credential encryption key is empty"
            )));
        }

        let hk = Hkdf::<Sha256>::new(Some(HKDF_SALT), master_secret);
        let mut key = [0u8; 32];
        hk.expand(HKDF_INFO, &mut key)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("HKDF expand failed: {}", e)))?;

        Ok(Self {
            key,
            rng: SystemRandom::new(),
        })
    }

    fn aead_key(&self) -> Result<LessSafeKey, AppError> {
        let unbound = UnboundKey::new(&AES_256_GCM, &self.key)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to create AEAD key: {}", e)))?;
        Ok(LessSafeKey::new(unbound))
    }

    /// Encrypt a credential bag for `integration_id`.
    pub fn seal(&self, integration_id: Uuid, bag: &CredentialBag) -> Result<String, AppError> {
        let mut in_out = serde_json::to_vec(bag)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Credential encode failed: {}", e)))?;

        let mut nonce_bytes = [0u8; NONCE_LEN];
        self.rng
            .fill(&mut nonce_bytes)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Nonce generation failed: {}", e)))?;

        self.aead_key()?
            .seal_in_place_append_tag(
                Nonce::assume_unique_for_key(nonce_bytes),
                Aad::from(integration_id.as_bytes()),
                &mut in_out,
            )
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Credential seal failed: {}", e)))?;

        let mut combined = nonce_bytes.to_vec();
        combined.extend(in_out);
        Ok(BASE64.encode(combined))
    }

    /// Decrypt a sealed bag. Fails if it was sealed for another integration.
    pub fn open(&self, integration_id: Uuid, sealed: &str) -> Result<CredentialBag, AppError> {
        let combined = BASE64
            .decode(sealed)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Sealed credential decode failed: {}", e)))?;
        if combined.len() < NONCE_LEN {
            return Err(AppError::Internal(anyhow::anyhow!(
                "Sealed credential is too short"
            )));
        }

        let (nonce_bytes, ciphertext) = combined.split_at(NONCE_LEN);
        let nonce = Nonce::try_assume_unique_for_key(nonce_bytes)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Invalid nonce: {}", e)))?;

        let mut in_out = ciphertext.to_vec();
        let plaintext = self
            .aead_key()?
            .open_in_place(nonce, Aad::from(integration_id.as_bytes()), &mut in_out)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Credential open failed: {}", e)))?;

        serde_json::from_slice(plaintext)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Credential decode failed: {}", e)))
    }
}
