//! # API Tokens
//!
//! Opaque bearer tokens of the form `cfm_<user_id>_<secret>`.
//!
//! The secret is [`SECRET_LEN`] bytes from the operating system RNG, encoded
//! as unpadded base64url. Only its BLAKE3 digest is stored; verification compares
//! digests in constant time.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::RngCore;
use rand::rngs::OsRng;
use subtle::ConstantTimeEq;

/// Prefix identifying Conforma tokens.
pub const TOKEN_PREFIX: &str = "cfm_";

/// Random bytes per secret.
pub const SECRET_LEN: usize = 32;

/// A freshly generated secret and the digest to persist.
#[derive(Debug, Clone)]
pub struct TokenSecret {
    secret: String,
    digest: String,
}

impl TokenSecret {
    /// Generate a new random secret.
    #[must_use]
    pub fn generate() -> Self {
        let mut bytes = [0u8; SECRET_LEN];
        OsRng.fill_bytes(&mut bytes);
        let secret = URL_SAFE_NO_PAD.encode(bytes);
        let digest = digest(&secret);
        Self { secret, digest }
    }

    /// Hex digest to store alongside the user.
    #[must_use]
    pub fn digest(&self) -> &str {
        &self.digest
    }

    /// The full bearer token for `user_id`. Shown to the user once.
    #[must_use]
    pub fn token_for(&self, user_id: i64) -> String {
        format!("{}{}_{}", TOKEN_PREFIX, user_id, self.secret)
    }
}

/// BLAKE3 hex digest of a secret.
#[must_use]
pub fn digest(secret: &str) -> String {
    blake3::hash(secret.as_bytes()).to_hex().to_string()
}

/// Split a raw token into user id and secret.
#[must_use]
pub fn parse(raw: &str) -> Option<(i64, &str)> {
    let rest = raw.strip_prefix(TOKEN_PREFIX)?;
    let (id, secret) = rest.split_once('_')?;
    if secret.is_empty() {
        return None;
    }
    let id = id.parse().ok()?;
    Some((id, secret))
}

/// Constant-time comparison of a secret against a stored digest.
#[must_use]
pub fn matches(secret: &str, stored_digest: &str) -> bool {
    let computed = digest(secret);
    let a = computed.as_bytes();
    let b = stored_digest.as_bytes();
    // Hex digests have a fixed width, so a length mismatch means a corrupt row.
    if a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_token_verifies() {
        let secret = TokenSecret::generate();
        let token = secret.token_for(42);
        assert!(token.starts_with("cfm_42_"));

        let (id, raw_secret) = parse(&token).expect("parse");
        assert_eq!(id, 42);
        assert!(matches(raw_secret, secret.digest()));
    }

    #[test]
    fn secrets_are_unique() {
        let a = TokenSecret::generate();
        let b = TokenSecret::generate();
        assert_ne!(a.digest(), b.digest());
        assert_ne!(a.token_for(1), b.token_for(1));
    }

    #[test]
    fn secret_carries_full_length() {
        let token = TokenSecret::generate().token_for(3);
        let (_, raw_secret) = parse(&token).expect("parse");
        let bytes = URL_SAFE_NO_PAD.decode(raw_secret).expect("base64url");
        assert_eq!(bytes.len(), SECRET_LEN);
        assert_eq!(raw_secret.len(), 43);
    }

    #[test]
    fn wrong_secret_rejected() {
        let secret = TokenSecret::generate();
        assert!(!matches("not-the-secret", secret.digest()));
        assert!(!matches("anything", "short"));
    }

    #[test]
    fn malformed_tokens_rejected() {
        assert_eq!(parse("Bearer abc"), None);
        assert_eq!(parse("cfm_"), None);
        assert_eq!(parse("cfm_x_secret"), None);
        assert_eq!(parse("cfm_7_"), None);
        assert_eq!(parse("cfm_7_se_cret"), Some((7, "se_cret")));
    }
}
