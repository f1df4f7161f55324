//! Password hashing using Argon2id
//!
//! ```rust
//! use tasktrack::auth::{Argon2Hasher, PasswordHasher};
//! use tasktrack::config::PasswordConfig;
//!
//! let hasher = Argon2Hasher::new(&PasswordConfig {
//!     memory_cost_kib: 1024,
//!     time_cost: 1,
//!     parallelism: 1,
//! })?;
//!
//! let hash = hasher.hash("correct horse")?;
//! assert!(hasher.verify("correct horse", &hash)?);
//! assert!(!hasher.verify("battery staple", &hash)?);
//! # Ok::<(), tasktrack::error::Error>(())
//! ```

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};

use crate::config::PasswordConfig;
use crate::error::Error;

/// Hash and check passwords
///
/// Both operations are CPU-bound; async callers run them on the blocking pool.
pub trait PasswordHasher: Send + Sync {
    /// PHC string for `password` with a fresh salt
    fn hash(&self, password: &str) -> Result<String, Error>;

    /// `Ok(false)` on mismatch, `Err` only when `hash` is unreadable
    fn verify(&self, password: &str, hash: &str) -> Result<bool, Error>;
}

/// Argon2id hasher with configurable costs
#[derive(Debug, Clone)]
pub struct Argon2Hasher {
    params: Params,
}

impl Argon2Hasher {
    /// Build a hasher, rejecting costs Argon2 does not accept
    pub fn new(config: &PasswordConfig) -> Result<Self, Error> {
        let params = Params::new(config.memory_cost_kib, config.time_cost, config.parallelism, None)
            .map_err(|e| Error::PasswordHash(format!("invalid Argon2 parameters: {}", e)))?;

        Ok(Self { params })
    }
}

impl PasswordHasher for Argon2Hasher {
    fn hash(&self, password: &str) -> Result<String, Error> {
        let salt = SaltString::generate(&mut OsRng);
        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone());

        let hash = argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| Error::PasswordHash(format!("failed to hash password: {}", e)))?;

        Ok(hash.to_string())
    }

    fn verify(&self, password: &str, hash: &str) -> Result<bool, Error> {
        let parsed = PasswordHash::new(hash)
            .map_err(|e| Error::PasswordHash(format!("invalid password hash format: {}", e)))?;

        // Costs are read back from the PHC string
        match Argon2::default().verify_password(password.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(Error::PasswordHash(format!("password verification failed: {}", e))),
        }
    }
}
