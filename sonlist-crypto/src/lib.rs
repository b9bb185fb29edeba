//! Hashing layer for sonlist.
//!
//! Fields marked `encrypt` (or typed `encrypted_string`) are replaced by a
//! salted Argon2id hash before they are stored. The original value cannot
//! be recovered; callers check candidates with [`verify_value`].

mod error;
mod hash;

pub use error::{CryptoError, CryptoResult};
pub use hash::{hash_value, is_hashed, verify_value, HashParams, SALT_SIZE};
