use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::PasswordHash;
use argon2::password_hash::PasswordHasher as Argon2PasswordHasher;
use argon2::password_hash::PasswordVerifier;
use argon2::password_hash::SaltString;
use argon2::Argon2;

use super::errors::PasswordError;

/// One-way salted hashing for secrets at rest.
///
/// Used for user passwords and for refresh tokens before they are stored,
/// so a leaked store exposes neither in usable form.
#[derive(Debug, Clone, Copy, Default)]
pub struct PasswordHasher;

impl PasswordHasher {
    pub fn new() -> Self {
        Self
    }

    /// Hash a secret with Argon2id and a fresh random salt.
    ///
    /// Hashing the same input twice yields two different PHC strings.
    ///
    /// # Errors
    /// * `HashingFailed` - Argon2 rejected the input or parameters
    pub fn hash(&self, secret: &str) -> Result<String, PasswordError> {
        let salt = SaltString::generate(&mut OsRng);

        Argon2::default()
            .hash_password(secret.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| PasswordError::HashingFailed(e.to_string()))
    }

    /// Check a secret against a stored PHC string.
    ///
    /// Returns false for a mismatch and for an empty or unparsable digest.
    /// The comparison itself is constant time inside `argon2`.
    pub fn verify(&self, secret: &str, digest: &str) -> bool {
        if digest.is_empty() {
            return false;
        }

        match PasswordHash::new(digest) {
            Ok(parsed) => Argon2::default()
                .verify_password(secret.as_bytes(), &parsed)
                .is_ok(),
            Err(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hasher = PasswordHasher::new();
        let password = "my_secure_password";

        let hash = hasher.hash(password).expect("Failed to hash password");

        assert!(hash.starts_with("$argon2id$"));
        assert!(hasher.verify(password, &hash));
        assert!(!hasher.verify("wrong_password", &hash));
    }

    #[test]
    fn test_hash_is_salted() {
        let hasher = PasswordHasher::new();

        let first = hasher.hash("secret1").expect("Failed to hash password");
        let second = hasher.hash("secret1").expect("Failed to hash password");

        assert_ne!(first, second);
        assert!(hasher.verify("secret1", &first));
        assert!(hasher.verify("secret1", &second));
    }

    #[test]
    fn test_verify_malformed_digest() {
        let hasher = PasswordHasher::new();
        assert!(!hasher.verify("password", "invalid_hash"));
    }

    #[test]
    fn test_verify_empty_digest() {
        let hasher = PasswordHasher::new();
        assert!(!hasher.verify("password", ""));
        assert!(!hasher.verify("", ""));
    }

    #[test]
    fn test_long_secrets_are_not_truncated() {
        let hasher = PasswordHasher::new();
        let prefix = "x".repeat(100);
        let original = format!("{}original", prefix);
        let other = format!("{}other", prefix);

        let hash = hasher.hash(&original).expect("Failed to hash secret");

        assert!(hasher.verify(&original, &hash));
        assert!(!hasher.verify(&other, &hash));
    }
}
