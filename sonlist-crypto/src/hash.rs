//! Salted one-way hashing of field values.
//!
//! Uses Argon2id and emits PHC strings (`$argon2id$v=19$m=...$salt$hash`),
//! so every hash carries its own salt and cost parameters. Hashes are
//! irreversible: compare with [`verify_value`], never with equality.

use crate::error::{CryptoError, CryptoResult};
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};
use rand::RngCore;
use serde::{Deserialize, Serialize};

/// Size of the random salt in bytes.
pub const SALT_SIZE: usize = 16;

/// Fixed cost parameters applied to every hash.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HashParams {
    /// Memory cost in KiB.
    pub memory_cost: u32,
    /// Time cost (iterations).
    pub time_cost: u32,
    /// Parallelism factor.
    pub parallelism: u32,
}

impl Default for HashParams {
    fn default() -> Self {
        // OWASP recommendations for Argon2id (2023)
        Self {
            memory_cost: 19 * 1024, // 19 MiB
            time_cost: 2,
            parallelism: 1,
        }
    }
}

impl HashParams {
    /// Parameters for tests (fast but insecure).
    pub fn insecure_fast() -> Self {
        Self {
            memory_cost: 1024, // 1 MiB
            time_cost: 1,
            parallelism: 1,
        }
    }

    fn argon2(&self) -> CryptoResult<Argon2<'static>> {
        let params = Params::new(self.memory_cost, self.time_cost, self.parallelism, None)
            .map_err(|e| CryptoError::InvalidParams(e.to_string()))?;
        Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
    }
}

/// Hashes `plain` with a fresh random salt.
///
/// Two calls with the same input return different strings.
pub fn hash_value(plain: &str, params: &HashParams) -> CryptoResult<String> {
    let mut salt_bytes = [0u8; SALT_SIZE];
    rand::rngs::OsRng.fill_bytes(&mut salt_bytes);
    let salt =
        SaltString::encode_b64(&salt_bytes).map_err(|e| CryptoError::Hashing(e.to_string()))?;

    let hash = params
        .argon2()?
        .hash_password(plain.as_bytes(), &salt)
        .map_err(|e| CryptoError::Hashing(e.to_string()))?;
    Ok(hash.to_string())
}

/// Checks `plain` against a hash produced by [`hash_value`].
///
/// Cost parameters are read from the hash itself.
pub fn verify_value(plain: &str, hash: &str) -> CryptoResult<bool> {
    let parsed = PasswordHash::new(hash).map_err(|e| CryptoError::MalformedHash(e.to_string()))?;
    Ok(Argon2::default()
        .verify_password(plain.as_bytes(), &parsed)
        .is_ok())
}

/// Returns true if `value` looks like a hash produced by [`hash_value`].
pub fn is_hashed(value: &str) -> bool {
    value.starts_with("$argon2id$") && PasswordHash::new(value).is_ok()
}
