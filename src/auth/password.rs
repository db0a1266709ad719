//! Account password hashing.
//!
//! Stored hashes are Argon2id PHC strings using the crate's default cost
//! parameters, which are the work factor for every account in the `users`
//! table. Changing them only affects hashes written afterwards; older hashes
//! keep verifying because the PHC string records its own parameters.

use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand::rngs::OsRng;
use tracing::error;

/// Called on signup and on reset-password; the result goes to `password_hash`.
pub fn hash_password(plain: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(plain.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| {
            error!(error = %e, "password hashing failed");
            anyhow::anyhow!("hash password: {e}")
        })
}

/// Checks a login attempt against a stored hash.
///
/// A mismatch is `Ok(false)` so login can answer "Invalid credentials";
/// `Err` means the stored row is corrupt and surfaces as a server error.
pub fn verify_password(plain: &str, stored: &str) -> anyhow::Result<bool> {
    let parsed = PasswordHash::new(stored).map_err(|e| {
        error!(error = %e, "stored password hash is unreadable");
        anyhow::anyhow!("parse password hash: {e}")
    })?;
    Ok(Argon2::default()
        .verify_password(plain.as_bytes(), &parsed)
        .is_ok())
}
