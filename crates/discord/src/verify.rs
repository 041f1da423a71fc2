use ed25519_dalek::{Signature, Verifier, VerifyingKey};
use thiserror::Error;

pub const SIGNATURE_HEADER: &str = "x-signature-ed25519";
pub const TIMESTAMP_HEADER: &str = "x-signature-timestamp";

#[derive(Debug, Error)]
pub enum VerifyKeyError {
    #[error("public key is not valid hex: {0}")]
    Hex(#[from] hex::FromHexError),
    #[error("public key must be 32 bytes, got {0}")]
    Length(usize),
    #[error("public key is not a valid ed25519 point")]
    Invalid,
}

pub trait SignatureVerifier: Send + Sync {
    /// `signature` is hex-encoded. Malformed input verifies as `false`.
    fn verify(&self, body: &[u8], signature: &str, timestamp: &str) -> bool;
}

#[derive(Debug, Clone)]
pub struct Ed25519Verifier {
    key: VerifyingKey,
}

impl Ed25519Verifier {
    pub fn from_hex(public_key: &str) -> Result<Self, VerifyKeyError> {
        let bytes = hex::decode(public_key.trim())?;
        let bytes: [u8; 32] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| VerifyKeyError::Length(bytes.len()))?;
        let key = VerifyingKey::from_bytes(&bytes).map_err(|_| VerifyKeyError::Invalid)?;
        Ok(Self { key })
    }
}

impl SignatureVerifier for Ed25519Verifier {
    fn verify(&self, body: &[u8], signature: &str, timestamp: &str) -> bool {
        let Ok(raw) = hex::decode(signature) else {
            return false;
        };
        let Ok(raw) = <[u8; 64]>::try_from(raw.as_slice()) else {
            return false;
        };
        let signature = Signature::from_bytes(&raw);

        let mut message = Vec::with_capacity(timestamp.len() + body.len());
        message.extend_from_slice(timestamp.as_bytes());
        message.extend_from_slice(body);

        match self.key.verify(&message, &signature) {
            Ok(()) => true,
            Err(e) => {
                tracing::debug!("Signature rejected: {e}");
                false
            }
        }
    }
}
