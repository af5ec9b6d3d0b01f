//! Verification of identity-provider tokens.
//!
//! The provider hands the browser a compact token
//! `base64url(claims) "." base64url(signature)`, signed with Ed25519 over the
//! encoded claims segment. We only hold the provider's public key, so the
//! sole thing this module can do is check a token and read its claims.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use ed25519_dalek::{Signature, Verifier, VerifyingKey};
use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("malformed token")]
    Malformed,

    #[error("signature does not match provider key")]
    BadSignature,

    #[error("token expired")]
    Expired,

    #[error("invalid provider key: {0}")]
    InvalidKey(String),
}

/// Claims carried by a provider token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderClaims {
    /// Stable user identifier assigned by the provider
    pub sub: String,
    #[serde(default)]
    pub name: Option<String>,
    /// Expiry as unix seconds
    pub exp: i64,
}

impl ProviderClaims {
    pub fn display_name(&self) -> String {
        self.name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .unwrap_or("Anonymous")
            .to_string()
    }
}

pub struct TokenVerifier {
    key: VerifyingKey,
}

impl TokenVerifier {
    pub fn new(key: VerifyingKey) -> Self {
        Self { key }
    }

    pub fn from_hex(hex_key: &str) -> Result<Self, TokenError> {
        let bytes = hex::decode(hex_key.trim()).map_err(|e| TokenError::InvalidKey(e.to_string()))?;
        let bytes: [u8; 32] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| TokenError::InvalidKey("expected 32 bytes".into()))?;
        let key =
            VerifyingKey::from_bytes(&bytes).map_err(|e| TokenError::InvalidKey(e.to_string()))?;
        Ok(Self { key })
    }

    pub fn verify(&self, token: &str) -> Result<ProviderClaims, TokenError> {
        self.verify_at(token, chrono::Utc::now().timestamp())
    }

    pub fn verify_at(&self, token: &str, now: i64) -> Result<ProviderClaims, TokenError> {
        let (payload, signature) = token.trim().split_once('.').ok_or(TokenError::Malformed)?;

        let sig_bytes = URL_SAFE_NO_PAD
            .decode(signature)
            .map_err(|_| TokenError::Malformed)?;
        let signature = Signature::from_slice(&sig_bytes).map_err(|_| TokenError::Malformed)?;

        self.key
            .verify(payload.as_bytes(), &signature)
            .map_err(|_| TokenError::BadSignature)?;

        let json = URL_SAFE_NO_PAD
            .decode(payload)
            .map_err(|_| TokenError::Malformed)?;
        let claims: ProviderClaims =
            serde_json::from_slice(&json).map_err(|_| TokenError::Malformed)?;

        if claims.sub.trim().is_empty() {
            return Err(TokenError::Malformed);
        }
        if claims.exp <= now {
            return Err(TokenError::Expired);
        }

        Ok(claims)
    }
}

/// Mint a token the way the provider does. Used by tests and local tooling.
pub fn encode_token(
    key: &ed25519_dalek::SigningKey,
    claims: &ProviderClaims,
) -> Result<String, serde_json::Error> {
    use ed25519_dalek::Signer;

    let payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(claims)?);
    let signature = key.sign(payload.as_bytes());
    Ok(format!(
        "{}.{}",
        payload,
        URL_SAFE_NO_PAD.encode(signature.to_bytes())
    ))
}
