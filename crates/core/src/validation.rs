//! Pure validation and normalization for form input.
//!
//! Consumed by UI form layers; every function is side-effect free and
//! returns either the normalized value or a [`ValidationError`] whose
//! `Display` text is the inline message to show against the field.

use chrono::NaiveDate;
use regex::Regex;
use std::sync::OnceLock;
use thiserror::Error;

const PASSWORD_MIN_LEN: usize = 8;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Este campo es obligatorio")]
    Required,
    #[error("Ingresa un correo válido")]
    InvalidEmail,
    #[error("La contraseña debe tener al menos {0} caracteres")]
    PasswordTooShort(usize),
    #[error("La contraseña debe incluir letras y números")]
    PasswordTooWeak,
    #[error("Ingresa un teléfono válido")]
    InvalidPhone,
    #[error("El código debe tener {0} dígitos")]
    InvalidCode(usize),
    #[error("Ingresa una fecha válida (dd/mm/aaaa)")]
    InvalidDate,
    #[error("Ingresa una placa válida")]
    InvalidPlate,
}

fn email_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$").expect("static pattern")
    })
}

fn phone_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^\+?[0-9]{8,15}$").expect("static pattern"))
}

fn plate_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^([A-Z]{2,3})([0-9]{3,4}[A-Z]?)$").expect("static pattern"))
}

/// Trim and lowercase an email address, rejecting malformed input.
pub fn normalize_email(raw: &str) -> Result<String, ValidationError> {
    let email = raw.trim().to_lowercase();
    if email.is_empty() {
        return Err(ValidationError::Required);
    }
    if !email_pattern().is_match(&email) {
        return Err(ValidationError::InvalidEmail);
    }
    Ok(email)
}

/// Password policy: minimum length, at least one letter and one digit.
pub fn validate_password(raw: &str) -> Result<(), ValidationError> {
    if raw.chars().count() < PASSWORD_MIN_LEN {
        return Err(ValidationError::PasswordTooShort(PASSWORD_MIN_LEN));
    }
    let has_letter = raw.chars().any(|c| c.is_alphabetic());
    let has_digit = raw.chars().any(|c| c.is_ascii_digit());
    if !has_letter || !has_digit {
        return Err(ValidationError::PasswordTooWeak);
    }
    Ok(())
}

/// Strip separators from a phone number and keep an optional leading `+`.
pub fn normalize_phone(raw: &str) -> Result<String, ValidationError> {
    let phone: String = raw
        .chars()
        .filter(|c| !matches!(c, ' ' | '-' | '(' | ')' | '.'))
        .collect();
    if phone.is_empty() {
        return Err(ValidationError::Required);
    }
    if !phone_pattern().is_match(&phone) {
        return Err(ValidationError::InvalidPhone);
    }
    Ok(phone)
}

/// One-time verification codes are exactly `length` ASCII digits.
pub fn validate_code(raw: &str, length: usize) -> Result<(), ValidationError> {
    let code = raw.trim();
    if code.len() != length || !code.chars().all(|c| c.is_ascii_digit()) {
        return Err(ValidationError::InvalidCode(length));
    }
    Ok(())
}

/// Parse a `dd/mm/yyyy` date as entered in forms.
pub fn parse_date(raw: &str) -> Result<NaiveDate, ValidationError> {
    NaiveDate::parse_from_str(raw.trim(), "%d/%m/%Y").map_err(|_| ValidationError::InvalidDate)
}

/// Normalize a vehicle plate to the canonical `ABC-123` form.
pub fn normalize_plate(raw: &str) -> Result<String, ValidationError> {
    let compact: String = raw
        .trim()
        .to_uppercase()
        .chars()
        .filter(|c| !matches!(c, ' ' | '-'))
        .collect();
    if compact.is_empty() {
        return Err(ValidationError::Required);
    }
    match plate_pattern().captures(&compact) {
        Some(parts) => Ok(format!("{}-{}", &parts[1], &parts[2])),
        None => Err(ValidationError::InvalidPlate),
    }
}
