//! # Credentials
//!
//! Argon2id password hashing and opaque session tokens.
//!
//! Hashes are stored as PHC strings so the parameters travel with the hash;
//! a hash produced with [`HashCost::Low`] still verifies after the server
//! switches back to [`HashCost::Standard`].

use crate::error::{PortalError, Result};
use crate::primitives::SESSION_TOKEN_BYTES;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::RngCore;

/// Argon2id work factor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HashCost {
    /// Library defaults (19 MiB, 2 passes).
    #[default]
    Standard,
    /// 1 MiB, 1 pass. Tests and local demos only.
    Low,
}

impl HashCost {
    fn hasher(self) -> Result<Argon2<'static>> {
        let params = match self {
            HashCost::Standard => Params::default(),
            HashCost::Low => {
                Params::new(1024, 1, 1, None).map_err(|e| PortalError::Password(e.to_string()))?
            }
        };
        Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
    }
}

/// 16 random salt bytes.
pub fn random_salt(rng: &mut impl RngCore) -> [u8; 16] {
    let mut salt = [0u8; 16];
    rng.fill_bytes(&mut salt);
    salt
}

/// Hash a password into a PHC string with a fresh random salt.
pub fn hash_password(password: &str, cost: HashCost, rng: &mut impl RngCore) -> Result<String> {
    hash_with_salt(password, cost, &random_salt(rng))
}

/// Hash a password into a PHC string with the given salt.
pub fn hash_with_salt(password: &str, cost: HashCost, salt: &[u8; 16]) -> Result<String> {
    let salt = SaltString::encode_b64(salt).map_err(|e| PortalError::Password(e.to_string()))?;

    let hash = cost
        .hasher()?
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| PortalError::Password(e.to_string()))?;
    Ok(hash.to_string())
}

/// Check a password against a stored PHC string.
///
/// A malformed stored hash verifies as `false`.
#[must_use]
pub fn verify_password(password: &str, stored: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(stored) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

/// Fresh session token: 32 random bytes, URL-safe base64 without padding.
pub fn generate_token(rng: &mut impl RngCore) -> String {
    let mut bytes = [0u8; SESSION_TOKEN_BYTES];
    rng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn hash_then_verify() {
        let mut rng = StdRng::seed_from_u64(7);
        let hash = hash_password("kunbi-1967", HashCost::Low, &mut rng).expect("hash");
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("kunbi-1967", &hash));
        assert!(!verify_password("kunbi-1968", &hash));
    }

    #[test]
    fn same_password_gets_distinct_salts() {
        let mut rng = StdRng::seed_from_u64(7);
        let a = hash_password("secret-pass", HashCost::Low, &mut rng).expect("hash");
        let b = hash_password("secret-pass", HashCost::Low, &mut rng).expect("hash");
        assert_ne!(a, b);
    }

    #[test]
    fn salted_hash_matches_rng_hash() {
        let salt = random_salt(&mut StdRng::seed_from_u64(7));
        let from_salt = hash_with_salt("kunbi-1967", HashCost::Low, &salt).expect("hash");
        let from_rng =
            hash_password("kunbi-1967", HashCost::Low, &mut StdRng::seed_from_u64(7)).expect("hash");
        assert_eq!(from_salt, from_rng);
        assert!(verify_password("kunbi-1967", &from_salt));
    }

    #[test]
    fn garbage_hash_never_verifies() {
        assert!(!verify_password("x", "token_1_1700000000.0"));
        assert!(!verify_password("x", ""));
    }

    #[test]
    fn tokens_are_url_safe_and_unique() {
        let mut rng = StdRng::seed_from_u64(1);
        let a = generate_token(&mut rng);
        let b = generate_token(&mut rng);
        assert_ne!(a, b);
        // 32 bytes → 43 base64 chars without padding.
        assert_eq!(a.len(), 43);
        assert!(a.bytes().all(|c| c.is_ascii_alphanumeric() || c == b'-' || c == b'_'));
    }
}
