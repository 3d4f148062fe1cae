//! Argon2 password hashing implementation.

use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

use forge_core::ports::{AuthError, PasswordService};

/// Argon2id password service.
///
/// Hashes are PHC strings, so verification reads its parameters from the
/// stored hash and keeps working after the cost settings change.
pub struct Argon2PasswordService {
    argon2: Argon2<'static>,
}

impl Argon2PasswordService {
    /// Service using the crate's recommended default cost.
    pub fn new() -> Self {
        Self {
            argon2: Argon2::default(),
        }
    }

    /// Service with explicit cost parameters (memory in KiB, iterations, lanes).
    pub fn with_cost(memory_kib: u32, iterations: u32, lanes: u32) -> Result<Self, AuthError> {
        let params = Params::new(memory_kib, iterations, lanes, None)
            .map_err(|e| AuthError::HashingError(e.to_string()))?;

        Ok(Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        })
    }
}

impl Default for Argon2PasswordService {
    fn default() -> Self {
        Self::new()
    }
}

impl PasswordService for Argon2PasswordService {
    fn hash(&self, password: &str) -> Result<String, AuthError> {
        let salt = SaltString::generate(&mut OsRng);

        self.argon2
            .hash_password(password.as_bytes(), &salt)
            .map(|h| h.to_string())
            .map_err(|e| AuthError::HashingError(e.to_string()))
    }

    fn verify(&self, password: &str, hash: &str) -> Result<bool, AuthError> {
        let parsed_hash =
            PasswordHash::new(hash).map_err(|e| AuthError::HashingError(e.to_string()))?;

        Ok(self
            .argon2
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cheap() -> Argon2PasswordService {
        Argon2PasswordService::with_cost(1024, 1, 1).unwrap()
    }

    #[test]
    fn test_hash_and_verify() {
        let service = cheap();
        let password = "secure_password_123";

        let hash = service.hash(password).unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(service.verify(password, &hash).unwrap());
        assert!(!service.verify("wrong_password", &hash).unwrap());
    }

    #[test]
    fn test_hash_from_other_cost_still_verifies() {
        let hash = cheap().hash("secret-pass").unwrap();

        assert!(Argon2PasswordService::new().verify("secret-pass", &hash).unwrap());
    }

    #[test]
    fn test_verify_rejects_malformed_hash() {
        assert!(matches!(
            cheap().verify("secret", "not-a-phc-string"),
            Err(AuthError::HashingError(_))
        ));
    }

    #[test]
    fn test_invalid_cost_is_an_error() {
        assert!(Argon2PasswordService::with_cost(1, 0, 0).is_err());
    }
}
