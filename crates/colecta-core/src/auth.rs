//! Password hashing and verification.
//!
//! Argon2 PHC strings with OS-sourced salts. Used by seeding (master
//! users), by the CLI when creating users, and by login.

use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString};
use rand_core::OsRng;

use crate::{Error, Result};

/// Hash a plaintext password into an argon2 PHC string,
/// e.g. `$argon2id$v=19$…`.
pub fn hash_password(password: &str) -> Result<String> {
  let salt = SaltString::generate(&mut OsRng);
  let hash = Argon2::default()
    .hash_password(password.as_bytes(), &salt)
    .map_err(|e| Error::PasswordHash(e.to_string()))?;
  Ok(hash.to_string())
}

/// Verify a candidate password against a stored PHC string.
/// A malformed stored hash counts as a failed verification.
pub fn verify_password(password: &str, phc: &str) -> bool {
  let Ok(parsed) = PasswordHash::new(phc) else {
    return false;
  };
  Argon2::default()
    .verify_password(password.as_bytes(), &parsed)
    .is_ok()
}
