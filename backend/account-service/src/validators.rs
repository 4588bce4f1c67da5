//! Input validation utilities for account service

use once_cell::sync::Lazy;
use regex::Regex;
use validator::ValidationError;

// These patterns are hardcoded and always valid
static EMAIL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$")
        .expect("hardcoded email regex is invalid - fix source code")
});

static E164_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\+[1-9][0-9]{7,14}$").expect("hardcoded E.164 regex is invalid - fix source code")
});

/// Validate email format (RFC 5322 simplified)
pub fn validate_email(email: &str) -> bool {
    !email.is_empty() && email.len() <= 128 && EMAIL_REGEX.is_match(email)
}

/// Validate an E.164 phone number (`+` followed by 8 to 15 digits)
pub fn validate_e164(phone: &str) -> bool {
    E164_REGEX.is_match(phone)
}

/// validator crate compatible custom validator for contact phones
pub fn validate_contact_phone(phone: &str) -> Result<(), ValidationError> {
    if validate_e164(phone) {
        Ok(())
    } else {
        Err(ValidationError::new("e164"))
    }
}

/// Mask email for logging
pub fn mask_email(email: &str) -> String {
    match email.split_once('@') {
        Some((local, domain)) => {
            let mut chars = local.chars();
            match (chars.next(), chars.nth(1)) {
                (Some(first), Some(_)) => format!("{}***@{}", first, domain),
                _ => format!("**@{}", domain),
            }
        }
        None => "***@***".to_string(),
    }
}
