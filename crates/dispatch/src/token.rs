//! Signed, expiring, single-use dispatch tokens.
//!
//! A token is a capability to have one specific payload delivered once:
//! HMAC-SHA256 over `id | expiry | payload-hash` with a per-deployment key.
//! Wire form is `"{id}.{expires_at}.{sig}"` with a url-safe base64 MAC.
//! Redemption is single-use, enforced by a redeemed-id set pruned as
//! entries expire.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};

type HmacSha256 = Hmac<Sha256>;

/// Issues and redeems dispatch tokens.
pub struct TokenIssuer {
    key: [u8; 32],
    ttl: Duration,
    /// Redeemed token id → expiry, so the set can be pruned.
    redeemed: Mutex<HashMap<String, DateTime<Utc>>>,
}

impl TokenIssuer {
    pub fn new(key: [u8; 32], ttl_secs: u64) -> Self {
        Self {
            key,
            ttl: Duration::seconds(ttl_secs as i64),
            redeemed: Mutex::new(HashMap::new()),
        }
    }

    /// Load the signing key from `DISPATCH_SIGNING_KEY` (64 hex chars) or
    /// auto-generate one in `{data_dir}/.dispatch_key`.
    pub fn load_or_generate_key(data_dir: &Path) -> anyhow::Result<[u8; 32]> {
        if let Ok(env_key) = std::env::var("DISPATCH_SIGNING_KEY") {
            let key_bytes = hex::decode(env_key.trim())?;
            if key_bytes.len() != 32 {
                anyhow::bail!(
                    "DISPATCH_SIGNING_KEY must be 64 hex characters (32 bytes), got {} bytes",
                    key_bytes.len()
                );
            }
            let mut key = [0u8; 32];
            key.copy_from_slice(&key_bytes);
            tracing::info!("Using dispatch signing key from DISPATCH_SIGNING_KEY env var");
            return Ok(key);
        }

        let key_path = data_dir.join(".dispatch_key");
        if key_path.exists() {
            let hex_key = std::fs::read_to_string(&key_path)?;
            let key_bytes = hex::decode(hex_key.trim())?;
            if key_bytes.len() != 32 {
                anyhow::bail!(
                    "Invalid key file at {}: expected 32 bytes, got {}",
                    key_path.display(),
                    key_bytes.len()
                );
            }
            let mut key = [0u8; 32];
            key.copy_from_slice(&key_bytes);
            tracing::info!("Loaded dispatch signing key from {}", key_path.display());
            return Ok(key);
        }

        use rand::RngCore;
        let mut key = [0u8; 32];
        rand::rngs::OsRng.fill_bytes(&mut key);
        std::fs::create_dir_all(data_dir)?;
        std::fs::write(&key_path, hex::encode(key))?;
        tracing::info!("Generated new dispatch signing key at {}", key_path.display());
        Ok(key)
    }

    /// Issue a fresh token bound to `payload`.
    pub fn issue(&self, payload: &[u8]) -> String {
        self.issue_at(payload, Utc::now())
    }

    pub fn issue_at(&self, payload: &[u8], now: DateTime<Utc>) -> String {
        let id = uuid::Uuid::new_v4().simple().to_string();
        let expires_at = (now + self.ttl).timestamp();
        let sig = URL_SAFE_NO_PAD.encode(self.mac(&id, expires_at, payload));
        format!("{id}.{expires_at}.{sig}")
    }

    /// Redeem a token against the payload it arrived with. Succeeds at
    /// most once per token; anything malformed, expired, tampered with,
    /// or already redeemed is refused.
    pub fn redeem(&self, token: &str, payload: &[u8]) -> bool {
        self.redeem_at(token, payload, Utc::now())
    }

    pub fn redeem_at(&self, token: &str, payload: &[u8], now: DateTime<Utc>) -> bool {
        let mut parts = token.splitn(3, '.');
        let (id, exp_raw, sig_raw) = match (parts.next(), parts.next(), parts.next()) {
            (Some(id), Some(exp), Some(sig)) if !id.is_empty() => (id, exp, sig),
            _ => return false,
        };
        let expires_at: i64 = match exp_raw.parse() {
            Ok(v) => v,
            Err(_) => return false,
        };
        let sig = match URL_SAFE_NO_PAD.decode(sig_raw) {
            Ok(v) => v,
            Err(_) => return false,
        };

        let mut mac = HmacSha256::new_from_slice(&self.key).expect("HMAC accepts any key length");
        mac.update(Self::signed_bytes(id, expires_at, payload).as_slice());
        if mac.verify_slice(&sig).is_err() {
            return false;
        }

        if now.timestamp() > expires_at {
            return false;
        }

        let expiry = DateTime::from_timestamp(expires_at, 0).unwrap_or(now);
        let mut redeemed = self.redeemed.lock().expect("redeemed set poisoned");
        redeemed.retain(|_, exp| *exp > now);
        // Insert returns the previous entry: Some means a replay.
        redeemed.insert(id.to_string(), expiry).is_none()
    }

    fn mac(&self, id: &str, expires_at: i64, payload: &[u8]) -> Vec<u8> {
        let mut mac = HmacSha256::new_from_slice(&self.key).expect("HMAC accepts any key length");
        mac.update(Self::signed_bytes(id, expires_at, payload).as_slice());
        mac.finalize().into_bytes().to_vec()
    }

    fn signed_bytes(id: &str, expires_at: i64, payload: &[u8]) -> Vec<u8> {
        let payload_hash = Sha256::digest(payload);
        let mut bytes = Vec::with_capacity(id.len() + 1 + 20 + 1 + payload_hash.len());
        bytes.extend_from_slice(id.as_bytes());
        bytes.push(b'|');
        bytes.extend_from_slice(expires_at.to_string().as_bytes());
        bytes.push(b'|');
        bytes.extend_from_slice(&payload_hash);
        bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn issuer() -> TokenIssuer {
        TokenIssuer::new([7u8; 32], 300)
    }

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2024-03-01T12:00:00Z").unwrap().to_utc()
    }

    #[test]
    fn token_redeems_exactly_once() {
        let issuer = issuer();
        let token = issuer.issue_at(b"payload", now());
        assert!(issuer.redeem_at(&token, b"payload", now()));
        assert!(!issuer.redeem_at(&token, b"payload", now()));
    }

    #[test]
    fn expired_token_is_refused() {
        let issuer = issuer();
        let token = issuer.issue_at(b"payload", now());
        let later = now() + Duration::seconds(301);
        assert!(!issuer.redeem_at(&token, b"payload", later));
    }

    #[test]
    fn token_at_expiry_boundary_still_redeems() {
        let issuer = issuer();
        let token = issuer.issue_at(b"payload", now());
        let at_expiry = now() + Duration::seconds(300);
        assert!(issuer.redeem_at(&token, b"payload", at_expiry));
    }

    #[test]
    fn token_is_bound_to_its_payload() {
        let issuer = issuer();
        let token = issuer.issue_at(b"payload", now());
        assert!(!issuer.redeem_at(&token, b"different payload", now()));
        // The failed attempt must not have consumed the token.
        assert!(issuer.redeem_at(&token, b"payload", now()));
    }

    #[test]
    fn tampered_expiry_is_refused() {
        let issuer = issuer();
        let token = issuer.issue_at(b"payload", now());
        let mut parts: Vec<&str> = token.split('.').collect();
        let bumped = format!("{}", now().timestamp() + 999_999);
        parts[1] = &bumped;
        let forged = parts.join(".");
        assert!(!issuer.redeem_at(&forged, b"payload", now()));
    }

    #[test]
    fn garbage_tokens_are_refused() {
        let issuer = issuer();
        assert!(!issuer.redeem_at("", b"payload", now()));
        assert!(!issuer.redeem_at("abc", b"payload", now()));
        assert!(!issuer.redeem_at("a.b.c", b"payload", now()));
        assert!(!issuer.redeem_at("..", b"payload", now()));
    }

    #[test]
    fn token_from_another_key_is_refused() {
        let theirs = TokenIssuer::new([9u8; 32], 300);
        let token = theirs.issue_at(b"payload", now());
        assert!(!issuer().redeem_at(&token, b"payload", now()));
    }

    #[test]
    fn redeemed_set_is_pruned_after_expiry() {
        let issuer = issuer();
        let token = issuer.issue_at(b"payload", now());
        assert!(issuer.redeem_at(&token, b"payload", now()));

        // Redeeming anything after expiry drops the stale entry.
        let later = now() + Duration::seconds(400);
        let fresh = issuer.issue_at(b"other", later);
        assert!(issuer.redeem_at(&fresh, b"other", later));
        assert_eq!(issuer.redeemed.lock().unwrap().len(), 1);
    }

    #[test]
    fn key_is_generated_then_reloaded() {
        let dir = tempfile::tempdir().unwrap();
        let first = TokenIssuer::load_or_generate_key(dir.path()).unwrap();
        let second = TokenIssuer::load_or_generate_key(dir.path()).unwrap();
        assert_eq!(first, second);
    }
}
