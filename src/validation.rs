//! Field-format and password-policy validation for user records.
//!
//! Every rejection carries a stable code consumed by the presentation layer
//! for localized messages. Rules are checked in a fixed order and the first
//! failure wins.

use std::sync::LazyLock;

use regex::Regex;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[\w\-.]+@([\w-]+\.)+[\w-]{2,}$").expect("email regex is valid")
});

/// Passwords that must not appear anywhere inside a new password,
/// compared case-insensitively.
const COMMON_PASSWORDS: &[&str] = &[
    "123456",
    "password",
    "123456789",
    "12345678",
    "12345",
    "qwerty",
    "abc123",
    "football",
    "monkey",
    "letmein",
    "111111",
    "1234",
    "1234567",
    "dragon",
    "baseball",
    "sunshine",
    "iloveyou",
    "trustno1",
    "princess",
    "admin",
];

const NAME_MAX_LEN: usize = 20;
const PASSWORD_MIN_LEN: usize = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationCode {
    FirstNameRequired,
    FirstNameLength,
    FirstNameFormat,
    LastNameRequired,
    LastNameLength,
    LastNameFormat,
    EmailRequired,
    EmailFormat,
    EmailTaken,
    PasswordRequired,
    PasswordWeak,
    PasswordCommon,
    PasswordFieldsIncomplete,
    PasswordConfirmMismatch,
    PasswordUserMissing,
    PasswordOldInvalid,
    PasswordDirectSet,
}

impl ValidationCode {
    pub fn code(&self) -> &'static str {
        match self {
            ValidationCode::FirstNameRequired => "FN001",
            ValidationCode::FirstNameLength => "FN002",
            ValidationCode::FirstNameFormat => "FN003",
            ValidationCode::LastNameRequired => "LN001",
            ValidationCode::LastNameLength => "LN002",
            ValidationCode::LastNameFormat => "LN003",
            ValidationCode::EmailRequired => "EM001",
            ValidationCode::EmailFormat => "EM002",
            ValidationCode::EmailTaken => "EM003",
            ValidationCode::PasswordRequired => "PW001",
            ValidationCode::PasswordWeak => "PW002",
            ValidationCode::PasswordCommon => "PW003",
            ValidationCode::PasswordFieldsIncomplete => "PW004",
            ValidationCode::PasswordConfirmMismatch => "PW005",
            ValidationCode::PasswordUserMissing => "PW006",
            ValidationCode::PasswordOldInvalid => "PW007",
            ValidationCode::PasswordDirectSet => "PW008",
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            ValidationCode::FirstNameRequired => "First name is required",
            ValidationCode::FirstNameLength => "First name must be 1 to 20 characters",
            ValidationCode::FirstNameFormat => "First name must contain letters only",
            ValidationCode::LastNameRequired => "Last name is required",
            ValidationCode::LastNameLength => "Last name must be 1 to 20 characters",
            ValidationCode::LastNameFormat => "Last name must contain letters only",
            ValidationCode::EmailRequired => "Email is required",
            ValidationCode::EmailFormat => "Invalid email format",
            ValidationCode::EmailTaken => "Email is already registered",
            ValidationCode::PasswordRequired => "Password is required",
            ValidationCode::PasswordWeak => {
                "Password must be at least 12 characters and include uppercase, lowercase, number, and special character"
            }
            ValidationCode::PasswordCommon => {
                "Password is too common. Choose a more secure password"
            }
            ValidationCode::PasswordFieldsIncomplete => {
                "Old password, new password and confirmation are all required to change the password"
            }
            ValidationCode::PasswordConfirmMismatch => {
                "New password and confirmation do not match"
            }
            ValidationCode::PasswordUserMissing => "User not found",
            ValidationCode::PasswordOldInvalid => "Old password is incorrect",
            ValidationCode::PasswordDirectSet => {
                "Password cannot be set directly. Use the password change fields"
            }
        }
    }
}

pub fn validate_first_name(name: &str) -> Result<(), ValidationCode> {
    validate_name(
        name,
        ValidationCode::FirstNameRequired,
        ValidationCode::FirstNameLength,
        ValidationCode::FirstNameFormat,
    )
}

pub fn validate_last_name(name: &str) -> Result<(), ValidationCode> {
    validate_name(
        name,
        ValidationCode::LastNameRequired,
        ValidationCode::LastNameLength,
        ValidationCode::LastNameFormat,
    )
}

fn validate_name(
    name: &str,
    required: ValidationCode,
    length: ValidationCode,
    format: ValidationCode,
) -> Result<(), ValidationCode> {
    if name.is_empty() {
        return Err(required);
    }
    if name.chars().count() > NAME_MAX_LEN {
        return Err(length);
    }
    if !name.chars().all(char::is_alphabetic) {
        return Err(format);
    }
    Ok(())
}

pub fn validate_email_format(email: &str) -> Result<(), ValidationCode> {
    if email.is_empty() {
        return Err(ValidationCode::EmailRequired);
    }
    if !EMAIL_RE.is_match(email) {
        return Err(ValidationCode::EmailFormat);
    }
    Ok(())
}

/// Emails compare and store case-normalized.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub fn validate_password(password: &str) -> Result<(), ValidationCode> {
    if password.is_empty() {
        return Err(ValidationCode::PasswordRequired);
    }

    let long_enough = password.chars().count() >= PASSWORD_MIN_LEN;
    let has_upper = password.chars().any(|c| c.is_uppercase());
    let has_lower = password.chars().any(|c| c.is_lowercase());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    let has_symbol = password.chars().any(|c| !c.is_alphanumeric());

    if !(long_enough && has_upper && has_lower && has_digit && has_symbol) {
        return Err(ValidationCode::PasswordWeak);
    }

    let lowered = password.to_lowercase();
    if COMMON_PASSWORDS.iter().any(|weak| lowered.contains(weak)) {
        return Err(ValidationCode::PasswordCommon);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_rules_in_order() {
        assert_eq!(validate_first_name(""), Err(ValidationCode::FirstNameRequired));
        assert_eq!(
            validate_first_name(&"a".repeat(21)),
            Err(ValidationCode::FirstNameLength)
        );
        assert_eq!(
            validate_first_name("Jane3"),
            Err(ValidationCode::FirstNameFormat)
        );
        assert_eq!(
            validate_last_name("O Brien"),
            Err(ValidationCode::LastNameFormat)
        );
        assert_eq!(validate_first_name("Jane"), Ok(()));
        assert_eq!(validate_last_name("Ærø"), Ok(()));
    }

    #[test]
    fn email_rules() {
        assert_eq!(validate_email_format(""), Err(ValidationCode::EmailRequired));
        assert_eq!(
            validate_email_format("not-an-email"),
            Err(ValidationCode::EmailFormat)
        );
        assert_eq!(
            validate_email_format("jane@x"),
            Err(ValidationCode::EmailFormat)
        );
        assert_eq!(validate_email_format("jane@x.com"), Ok(()));
        assert_eq!(normalize_email("  Jane@X.COM "), "jane@x.com");
    }

    #[test]
    fn password_policy_each_rule() {
        assert_eq!(validate_password(""), Err(ValidationCode::PasswordRequired));
        // too short
        assert_eq!(
            validate_password("Sh0rt$pw"),
            Err(ValidationCode::PasswordWeak)
        );
        // missing uppercase
        assert_eq!(
            validate_password("sup3r$ecure!!pw"),
            Err(ValidationCode::PasswordWeak)
        );
        // missing digit
        assert_eq!(
            validate_password("Super$ecure!!pw"),
            Err(ValidationCode::PasswordWeak)
        );
        // missing symbol
        assert_eq!(
            validate_password("Sup3rSecurePw1"),
            Err(ValidationCode::PasswordWeak)
        );
        // contains a deny-listed word
        assert_eq!(
            validate_password("MyPassword12345!"),
            Err(ValidationCode::PasswordCommon)
        );
        assert_eq!(
            validate_password("Qwerty$ecure99x!"),
            Err(ValidationCode::PasswordCommon)
        );
        assert_eq!(validate_password("Sup3r$ecure!!"), Ok(()));
    }
}
