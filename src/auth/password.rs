//! This file defines types that handle password validation and hashing.
//! `ValidatedPassword` wraps a string and ensures it meets the minimum length.
//! `PasswordHash` converts a `ValidatedPassword` into a salted and hashed password.

use std::fmt::Display;

use bcrypt::{BcryptError, non_truncating_hash, non_truncating_verify};
use serde::{Deserialize, Serialize};

use crate::Error;

/// The minimum number of characters a password must have.
pub const PASSWORD_MIN_LENGTH: usize = 6;

/// The most bytes bcrypt will hash. Anything past this would be silently ignored.
pub const PASSWORD_MAX_BYTES: usize = 72;

/// A password that has been validated, but not yet hashed.
///
/// This struct can be used to construct a [PasswordHash].
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedPassword(String);

impl ValidatedPassword {
    /// Create and validate a new password from a string.
    ///
    /// # Errors
    ///
    /// This function will return an [Error::Validation] if the password is shorter than
    /// [PASSWORD_MIN_LENGTH] characters or longer than [PASSWORD_MAX_BYTES] bytes.
    pub fn new(raw_password_string: &str) -> Result<Self, Error> {
        if raw_password_string.chars().count() < PASSWORD_MIN_LENGTH {
            Err(Error::Validation(format!(
                "Password must be at least {PASSWORD_MIN_LENGTH} characters"
            )))
        } else if raw_password_string.len() > PASSWORD_MAX_BYTES {
            Err(Error::Validation(format!(
                "Password cannot be more than {PASSWORD_MAX_BYTES} bytes"
            )))
        } else {
            Ok(Self(raw_password_string.to_owned()))
        }
    }

    /// Create a new `ValidatedPassword` without any validation.
    ///
    /// This function has `_unchecked` in the name but is not `unsafe`, because if an invalid password is provided it may cause incorrect behaviour but will not affect memory safety.
    pub fn new_unchecked(raw_password_string: &str) -> Self {
        Self(raw_password_string.to_owned())
    }
}

impl Display for ValidatedPassword {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", str::repeat("*", 8))
    }
}

/// A salted and hashed password.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PasswordHash(String);

impl PasswordHash {
    /// An alias for the default encryption cost for hashing passwords.
    pub const DEFAULT_COST: u32 = bcrypt::DEFAULT_COST;

    /// Create a hashed password from a validated password with the specified `cost`.
    ///
    /// `cost` increases the rounds of hashing and therefore the time needed to verify a password.
    /// A value of at least 12 is recommended. Pass in [PasswordHash::DEFAULT_COST] to use the recommended cost.
    ///
    /// # Errors
    ///
    /// This function will return an error if the password could not be hashed.
    pub fn new(password: ValidatedPassword, cost: u32) -> Result<Self, Error> {
        match non_truncating_hash(&password.0, cost) {
            Ok(password_hash) => Ok(Self(password_hash)),
            Err(e) => Err(Error::HashingError(e.to_string())),
        }
    }

    /// Create a new `PasswordHash` without any validation.
    ///
    /// The caller should ensure that `raw_password_hash` is a valid password hash, e.g. one
    /// read back from the application's database.
    pub fn new_unchecked(raw_password_hash: &str) -> Self {
        Self(raw_password_hash.to_owned())
    }

    /// Check that `raw_password` matches the stored password.
    ///
    /// A password longer than [PASSWORD_MAX_BYTES] never matches, since no such password
    /// can have been hashed.
    pub fn verify(&self, raw_password: &str) -> Result<bool, BcryptError> {
        match non_truncating_verify(raw_password, &self.0) {
            Err(BcryptError::Truncation(_)) => Ok(false),
            result => result,
        }
    }
}

impl AsRef<str> for PasswordHash {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod validated_password_tests {
    use crate::{Error, auth::ValidatedPassword};

    #[test]
    fn new_fails_on_empty() {
        let result = ValidatedPassword::new("");

        assert!(matches!(result, Err(Error::Validation(_))));
    }

    #[test]
    fn new_fails_on_five_characters() {
        let result = ValidatedPassword::new("hunte");

        assert_eq!(
            result,
            Err(Error::Validation(
                "Password must be at least 6 characters".to_owned()
            ))
        );
    }

    #[test]
    fn new_succeeds_on_six_characters() {
        assert!(ValidatedPassword::new("hunter").is_ok());
    }

    #[test]
    fn new_fails_past_bcrypt_limit() {
        assert!(ValidatedPassword::new(&"a".repeat(72)).is_ok());
        assert_eq!(
            ValidatedPassword::new(&"a".repeat(73)),
            Err(Error::Validation(
                "Password cannot be more than 72 bytes".to_owned()
            ))
        );
        // 37 two-byte characters.
        assert!(ValidatedPassword::new(&"é".repeat(37)).is_err());
    }

    #[test]
    fn length_counts_characters_not_bytes() {
        assert!(ValidatedPassword::new("ééééé").is_err());
        assert!(ValidatedPassword::new("éééééé").is_ok());
    }

    #[test]
    fn display_hides_password() {
        let password = ValidatedPassword::new_unchecked("hunter2");

        assert_eq!(password.to_string(), "********");
    }
}
