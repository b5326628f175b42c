use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::{MAX_PASSWORD_LEN, MAX_USERNAME_LEN, MIN_PASSWORD_LEN, RESERVED_USERNAMES};

lazy_static! {
    static ref EMAIL_PATTERN: Regex = Regex::new(
        r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?)+$"
    )
    .expect("email pattern compiles");
}

/// Symbols accepted by the login password policy
pub const PASSWORD_SYMBOLS: &str = "@$!%*?&";

/// Form fields, in the order they are validated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Username,
    Email,
    Otp,
    Password,
    NewPassword,
    ConfirmPassword,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Field::Username => "username",
            Field::Email => "email",
            Field::Otp => "otp",
            Field::Password => "password",
            Field::NewPassword => "new_password",
            Field::ConfirmPassword => "confirm_password",
        };
        f.write_str(name)
    }
}

/// A field that failed its policy, with the message shown next to it
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct FieldError {
    pub field: Field,
    pub message: &'static str,
}

impl FieldError {
    fn new(field: Field, message: &'static str) -> Self {
        Self { field, message }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OtpFormat {
    Any,
    #[default]
    Numeric,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PasswordPolicy {
    /// Lowercase, uppercase and digit
    #[default]
    Standard,
    /// Standard plus one of `PASSWORD_SYMBOLS`
    WithSymbol,
}

impl PasswordPolicy {
    /// Characters a password may be built from
    pub fn allows(self, c: char) -> bool {
        match self {
            PasswordPolicy::Standard => c.is_ascii_alphanumeric(),
            PasswordPolicy::WithSymbol => c.is_ascii_alphanumeric() || PASSWORD_SYMBOLS.contains(c),
        }
    }

    fn charset_message(self) -> &'static str {
        match self {
            PasswordPolicy::Standard => "Password may only contain letters and digits",
            PasswordPolicy::WithSymbol => {
                "Password may only contain letters, digits and the symbols @$!%*?&"
            }
        }
    }

    fn complexity_message(self) -> &'static str {
        match self {
            PasswordPolicy::Standard => {
                "Password must contain at least 1 uppercase letter, 1 lowercase letter, and 1 digit"
            }
            PasswordPolicy::WithSymbol => {
                "Password must include at least 1 uppercase letter, 1 lowercase letter, 1 special character, and 1 digit"
            }
        }
    }
}

pub fn validate_username(username: &str) -> Result<(), FieldError> {
    if username.is_empty() {
        return Err(FieldError::new(Field::Username, "User Name is required"));
    }
    if username.chars().count() > MAX_USERNAME_LEN {
        return Err(FieldError::new(
            Field::Username,
            "Username must be at most 20 characters",
        ));
    }
    // Case-sensitive on purpose: "Admin" is a valid username
    if RESERVED_USERNAMES.contains(&username) {
        return Err(FieldError::new(Field::Username, "Username not allowed"));
    }
    Ok(())
}

pub fn validate_email(email: &str) -> Result<(), FieldError> {
    if email.is_empty() {
        return Err(FieldError::new(Field::Email, "Email is required"));
    }
    if !is_valid_email(email) {
        return Err(FieldError::new(Field::Email, "Invalid email format"));
    }
    Ok(())
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_PATTERN.is_match(email)
}

pub fn validate_otp(otp: &str, format: OtpFormat) -> Result<(), FieldError> {
    if otp.is_empty() {
        return Err(FieldError::new(Field::Otp, "OTP is required"));
    }
    if format == OtpFormat::Numeric && !otp.chars().all(|c| c.is_ascii_digit()) {
        return Err(FieldError::new(Field::Otp, "OTP must contain only numbers"));
    }
    Ok(())
}

/// Check a password against `policy`, reporting it as `field`
pub fn validate_password(
    password: &str,
    policy: PasswordPolicy,
    field: Field,
) -> Result<(), FieldError> {
    if password.is_empty() {
        return Err(FieldError::new(field, "Password is required"));
    }
    let length = password.chars().count();
    if length < MIN_PASSWORD_LEN {
        return Err(FieldError::new(
            field,
            "Password must be at least 8 characters",
        ));
    }
    if length > MAX_PASSWORD_LEN {
        return Err(FieldError::new(
            field,
            "Password must be at most 99 characters",
        ));
    }

    if !password.chars().all(|c| policy.allows(c)) {
        return Err(FieldError::new(field, policy.charset_message()));
    }

    let has_lower = password.chars().any(|c| c.is_ascii_lowercase());
    let has_upper = password.chars().any(|c| c.is_ascii_uppercase());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    let has_symbol = password.chars().any(|c| PASSWORD_SYMBOLS.contains(c));

    let compliant = match policy {
        PasswordPolicy::Standard => has_lower && has_upper && has_digit,
        PasswordPolicy::WithSymbol => has_lower && has_upper && has_digit && has_symbol,
    };
    if !compliant {
        return Err(FieldError::new(field, policy.complexity_message()));
    }
    Ok(())
}

pub fn validate_confirmation(new_password: &str, confirm_password: &str) -> Result<(), FieldError> {
    if confirm_password.is_empty() {
        return Err(FieldError::new(
            Field::ConfirmPassword,
            "Confirm Password is required",
        ));
    }
    if new_password != confirm_password {
        return Err(FieldError::new(Field::ConfirmPassword, "Passwords must match"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_username_validation() {
        assert!(validate_username("member01").is_ok());
        assert!(validate_username("Admin").is_ok());

        let err = validate_username("admin").unwrap_err();
        assert_eq!(err.message, "Username not allowed");
        assert_eq!(err.field, Field::Username);

        for reserved in RESERVED_USERNAMES {
            assert!(validate_username(reserved).is_err());
        }

        assert_eq!(
            validate_username("").unwrap_err().message,
            "User Name is required"
        );
        assert!(validate_username(&"a".repeat(20)).is_ok());
        assert!(validate_username(&"a".repeat(21)).is_err());
    }

    #[test]
    fn test_email_validation() {
        assert!(validate_email("user@example.com").is_ok());
        assert!(validate_email("user.name@example.co.uk").is_ok());
        assert!(validate_email("user+tag@example.com").is_ok());

        assert_eq!(
            validate_email("not-an-email").unwrap_err().message,
            "Invalid email format"
        );
        assert!(validate_email("user@example").is_err());
        assert!(validate_email("user example.com").is_err());
        assert!(validate_email("user@@example.com").is_err());
        assert_eq!(validate_email("").unwrap_err().message, "Email is required");
    }

    #[test]
    fn test_otp_validation() {
        assert!(validate_otp("123456", OtpFormat::Numeric).is_ok());
        assert!(validate_otp("12a456", OtpFormat::Any).is_ok());
        assert_eq!(
            validate_otp("12a456", OtpFormat::Numeric).unwrap_err().message,
            "OTP must contain only numbers"
        );
        assert_eq!(
            validate_otp("", OtpFormat::Any).unwrap_err().message,
            "OTP is required"
        );
    }

    #[test]
    fn test_password_validation() {
        let standard = PasswordPolicy::Standard;
        assert!(validate_password("Abcdefg1", standard, Field::NewPassword).is_ok());

        let err = validate_password("abcdefgh", standard, Field::NewPassword).unwrap_err();
        assert_eq!(err.field, Field::NewPassword);
        assert!(err.message.contains("1 uppercase letter"));

        assert_eq!(
            validate_password("Abc1", standard, Field::NewPassword)
                .unwrap_err()
                .message,
            "Password must be at least 8 characters"
        );
        assert!(validate_password("ABCDEFG1", standard, Field::NewPassword).is_err());
        assert!(validate_password("Abcdefgh", standard, Field::NewPassword).is_err());
        assert!(validate_password(&format!("Ab1{}", "x".repeat(97)), standard, Field::NewPassword).is_err());
    }

    #[test]
    fn test_password_with_symbol_policy() {
        let policy = PasswordPolicy::WithSymbol;
        assert!(validate_password("Abcdefg1!", policy, Field::Password).is_ok());

        let err = validate_password("Abcdefg1", policy, Field::Password).unwrap_err();
        assert!(err.message.contains("special character"));
        assert_eq!(err.field, Field::Password);
    }

    #[test]
    fn test_password_charset() {
        let err = validate_password("Abcdefg1!", PasswordPolicy::Standard, Field::NewPassword)
            .unwrap_err();
        assert_eq!(err.message, "Password may only contain letters and digits");

        for policy in [PasswordPolicy::Standard, PasswordPolicy::WithSymbol] {
            let space = validate_password("Abcdef1@ x", policy, Field::Password).unwrap_err();
            assert_eq!(space.field, Field::Password);
            assert!(space.message.starts_with("Password may only contain"));

            let accented = validate_password("Abcdef1@é", policy, Field::Password).unwrap_err();
            assert!(accented.message.starts_with("Password may only contain"));

            assert!(validate_password("Abcdefgé1", policy, Field::Password).is_err());
        }

        assert!(validate_password("Ab1@$!%*?&", PasswordPolicy::WithSymbol, Field::Password).is_ok());
        assert!(validate_password("Abcdef1#", PasswordPolicy::WithSymbol, Field::Password).is_err());
    }

    #[test]
    fn test_confirmation() {
        assert!(validate_confirmation("Abcdefg1", "Abcdefg1").is_ok());
        assert_eq!(
            validate_confirmation("Abcdefg1", "Abcdefg2").unwrap_err().message,
            "Passwords must match"
        );
        assert_eq!(
            validate_confirmation("Abcdefg1", "").unwrap_err().field,
            Field::ConfirmPassword
        );
    }
}
