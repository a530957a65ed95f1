//! Identity provider: issues and verifies opaque bearer credentials.
//!
//! The log service never inspects credentials itself; it only receives the
//! [`AccountId`] a provider vouched for. [`HmacTokenProvider`] is the bundled
//! implementation: `base64url(claims).base64url(HMAC-SHA256(claims))`.

use crate::{AccountId, Error, Result};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

pub trait IdentityProvider: Send + Sync {
    /// Issue a credential for `account`
    fn issue(&self, account: &AccountId) -> Result<String>;

    /// Check a credential and return the account it was issued to
    fn verify(&self, token: &str) -> Result<AccountId>;
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    /// Expiry as unix seconds
    exp: i64,
}

/// Stateless HMAC-SHA256 signed tokens
pub struct HmacTokenProvider {
    secret: Vec<u8>,
    ttl: Duration,
}

impl HmacTokenProvider {
    pub fn new(secret: impl AsRef<[u8]>, ttl: Duration) -> Self {
        Self {
            secret: secret.as_ref().to_vec(),
            ttl,
        }
    }

    /// Provider configured from the `[auth]` section
    pub fn from_config(auth: &crate::config::AuthConfig) -> Self {
        Self::new(&auth.token_secret, Duration::hours(auth.token_ttl_hours))
    }

    fn mac(&self) -> Result<HmacSha256> {
        HmacSha256::new_from_slice(&self.secret)
            .map_err(|e| Error::Internal(format!("token key rejected: {}", e)))
    }

    fn issue_at(&self, account: &AccountId, now: DateTime<Utc>) -> Result<String> {
        let claims = Claims {
            sub: account.as_str().to_string(),
            exp: (now + self.ttl).timestamp(),
        };
        let payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&claims)?);

        let mut mac = self.mac()?;
        mac.update(payload.as_bytes());
        let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

        Ok(format!("{}.{}", payload, signature))
    }

    fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<AccountId> {
        let invalid = |reason: &str| Error::InvalidCredential(reason.to_string());

        let (payload, signature) = token.split_once('.').ok_or_else(|| invalid("malformed token"))?;
        let signature = URL_SAFE_NO_PAD
            .decode(signature)
            .map_err(|_| invalid("malformed signature"))?;

        let mut mac = self.mac()?;
        mac.update(payload.as_bytes());
        mac.verify_slice(&signature)
            .map_err(|_| invalid("signature mismatch"))?;

        let claims: Claims = URL_SAFE_NO_PAD
            .decode(payload)
            .ok()
            .and_then(|bytes| serde_json::from_slice(&bytes).ok())
            .ok_or_else(|| invalid("malformed claims"))?;

        if claims.exp <= now.timestamp() {
            return Err(invalid("token expired"));
        }

        AccountId::new(claims.sub).map_err(|_| invalid("empty subject"))
    }
}

impl IdentityProvider for HmacTokenProvider {
    fn issue(&self, account: &AccountId) -> Result<String> {
        self.issue_at(account, Utc::now())
    }

    fn verify(&self, token: &str) -> Result<AccountId> {
        self.verify_at(token, Utc::now())
    }
}
