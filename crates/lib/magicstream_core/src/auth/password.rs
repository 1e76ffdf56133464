//! Password hashing via bcrypt.

use std::sync::LazyLock;

use thiserror::Error;

/// bcrypt cost factor.
const BCRYPT_COST: u32 = 10;

/// bcrypt only reads this many bytes of input; longer passwords are refused
/// instead of silently truncated.
pub const MAX_PASSWORD_BYTES: usize = 72;

/// Hash used to spend verification time on logins for unknown emails.
static DUMMY_HASH: LazyLock<Option<String>> =
    LazyLock::new(|| bcrypt::hash("magicstream-dummy-password", BCRYPT_COST).ok());

/// Password hashing or verification failures.
#[derive(Debug, Error)]
pub enum HashingError {
    /// bcrypt failed internally or the stored hash is unreadable.
    #[error("password hashing failed: {0}")]
    Bcrypt(#[from] bcrypt::BcryptError),

    #[error("password is {0} bytes, longer than the {MAX_PASSWORD_BYTES}-byte limit")]
    TooLong(usize),
}

/// Hash a password with bcrypt (cost 10, random salt).
///
/// Passwords over [`MAX_PASSWORD_BYTES`] are rejected with
/// [`HashingError::TooLong`].
pub fn hash_password(password: &str) -> Result<String, HashingError> {
    if password.len() > MAX_PASSWORD_BYTES {
        return Err(HashingError::TooLong(password.len()));
    }
    Ok(bcrypt::hash(password, BCRYPT_COST)?)
}

/// Verify a password against a bcrypt hash.
///
/// A wrong password is `Ok(false)`; only a malformed hash is an error. A
/// password over [`MAX_PASSWORD_BYTES`] can never have been hashed, so it
/// never matches.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, HashingError> {
    if password.len() > MAX_PASSWORD_BYTES {
        return Ok(false);
    }
    Ok(bcrypt::verify(password, hash)?)
}

/// Run one bcrypt verification against a fixed hash and discard the result.
///
/// Lets the "unknown email" login path cost the same as "wrong password".
pub fn burn_verification(password: &str) {
    if let Some(hash) = DUMMY_HASH.as_deref() {
        let _ = verify_password(password, hash);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_then_verify_succeeds() {
        let hash = hash_password("p1").unwrap();
        assert!(verify_password("p1", &hash).unwrap());
    }

    #[test]
    fn wrong_password_is_false_not_error() {
        let hash = hash_password("correct horse").unwrap();
        assert!(!verify_password("wrong", &hash).unwrap());
    }

    #[test]
    fn hash_never_contains_plaintext_and_is_salted() {
        let a = hash_password("hunter2").unwrap();
        let b = hash_password("hunter2").unwrap();
        assert!(!a.contains("hunter2"));
        assert_ne!(a, b);
    }

    #[test]
    fn malformed_hash_is_an_error() {
        assert!(verify_password("p1", "not-a-bcrypt-hash").is_err());
    }

    #[test]
    fn passwords_sharing_a_72_byte_prefix_do_not_match() {
        let prefix = "x".repeat(MAX_PASSWORD_BYTES);
        let hash = hash_password(&prefix).unwrap();
        assert!(verify_password(&prefix, &hash).unwrap());
        assert!(!verify_password(&format!("{prefix}totally-different"), &hash).unwrap());
    }

    #[test]
    fn overlong_password_is_not_hashed() {
        let long = format!("{}correct", "x".repeat(MAX_PASSWORD_BYTES));
        let err = hash_password(&long).unwrap_err();
        assert!(matches!(err, HashingError::TooLong(79)));
    }

    #[test]
    fn burn_verification_does_not_panic() {
        burn_verification("anything");
    }
}
