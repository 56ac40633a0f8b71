use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

use crate::error::ErrorMessage;

/// Upper bound on password length. Argon2 is intentionally slow, so very
/// long inputs would turn hashing into a DoS vector.
const MAX_PASSWORD_LENGTH: usize = 64;

/// Hash a password with Argon2id.
///
/// The output is a PHC format string carrying the salt and parameters,
/// so the hash string alone is enough for later verification. Every call
/// produces a different hash for the same password (fresh random salt).
pub fn hash(password: impl Into<String>) -> Result<String, ErrorMessage> {
    let password = password.into();

    if password.is_empty() {
        return Err(ErrorMessage::EmptyPassword);
    }

    if password.len() > MAX_PASSWORD_LENGTH {
        return Err(ErrorMessage::ExceededMaxPasswordLength(MAX_PASSWORD_LENGTH));
    }

    let salt = SaltString::generate(&mut OsRng);

    let hashed_password = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|_| ErrorMessage::HashingError)?
        .to_string();

    Ok(hashed_password)
}

/// Verify a password against a stored PHC hash string.
///
/// Returns Ok(false) on mismatch; Err only for malformed input or an
/// unparseable stored hash.
pub fn compare(password: &str, hashed_password: &str) -> Result<bool, ErrorMessage> {
    if password.is_empty() {
        return Err(ErrorMessage::EmptyPassword);
    }

    if password.len() > MAX_PASSWORD_LENGTH {
        return Err(ErrorMessage::ExceededMaxPasswordLength(MAX_PASSWORD_LENGTH));
    }

    let parsed_hash =
        PasswordHash::new(hashed_password).map_err(|_| ErrorMessage::InvalidHashFormat)?;

    let password_matched = Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_or(false, |_| true);

    Ok(password_matched)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_and_verify_round_trip() {
        let hashed = hash("Aa12345!").unwrap();
        assert!(hashed.starts_with("$argon2id$"));
        assert!(compare("Aa12345!", &hashed).unwrap());
        assert!(!compare("Bb12345!", &hashed).unwrap());
    }

    #[test]
    fn rejects_empty_password() {
        assert_eq!(hash(""), Err(ErrorMessage::EmptyPassword));
        assert_eq!(compare("", "$whatever"), Err(ErrorMessage::EmptyPassword));
    }

    #[test]
    fn rejects_too_long_password() {
        let long = "a".repeat(MAX_PASSWORD_LENGTH + 1);
        assert_eq!(
            hash(long.clone()),
            Err(ErrorMessage::ExceededMaxPasswordLength(MAX_PASSWORD_LENGTH))
        );
    }

    #[test]
    fn rejects_malformed_stored_hash() {
        assert_eq!(
            compare("Aa12345!", "not-a-phc-string"),
            Err(ErrorMessage::InvalidHashFormat)
        );
    }
}
