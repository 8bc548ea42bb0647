use anyhow::{anyhow, Result};
use regex::Regex;
use std::sync::OnceLock;

/// Minimum accepted password length for the reset tool.
pub const MIN_PASSWORD_LEN: usize = 6;

fn username_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9._-]+$").unwrap_or_else(|e| panic!("invalid username pattern: {e}"))
    })
}

fn phone_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^\+?[0-9]{7,15}$").unwrap_or_else(|e| panic!("invalid phone pattern: {e}"))
    })
}

/// Validation utilities for input sanitization and edge case handling
#[derive(Debug, Copy, Clone)]
pub struct InputValidator;

impl InputValidator {
    /// Validate phone number format
    pub fn validate_phone(phone: &str) -> Result<()> {
        if phone.trim().is_empty() {
            return Err(anyhow!("Phone number cannot be empty"));
        }

        // Remove common formatting characters before matching
        let cleaned = phone
            .chars()
            .filter(|c| !matches!(c, ' ' | '-' | '(' | ')'))
            .collect::<String>();

        if !phone_pattern().is_match(&cleaned) {
            return Err(anyhow!(
                "Phone number must be 7-15 digits, optionally prefixed with +"
            ));
        }

        Ok(())
    }

    /// Validate a login username
    pub fn validate_username(username: &str) -> Result<()> {
        if username.trim().is_empty() {
            return Err(anyhow!("Username cannot be empty"));
        }

        if username.len() > 64 {
            return Err(anyhow!("Username too long (max 64 characters)"));
        }

        if !username_pattern().is_match(username) {
            return Err(anyhow!(
                "Username may only contain letters, digits, dots, dashes, and underscores"
            ));
        }

        Ok(())
    }

    /// Validate a new password against the minimum-length policy
    pub fn validate_password(password: &str) -> Result<()> {
        if password.len() < MIN_PASSWORD_LEN {
            return Err(anyhow!(
                "Password must be at least {MIN_PASSWORD_LEN} characters"
            ));
        }

        if password.len() > 128 {
            return Err(anyhow!("Password too long (max 128 characters)"));
        }

        Ok(())
    }

    /// Validate a raw notification message before formatting
    pub fn validate_message(message: &str) -> Result<()> {
        if message.trim().is_empty() {
            return Err(anyhow!("Message cannot be empty"));
        }

        Ok(())
    }

    /// Sanitize text input
    #[must_use]
    pub fn sanitize_text(text: &str) -> String {
        text.chars()
            .filter(|c| !c.is_control() || *c == '\n' || *c == '\t')
            .collect::<String>()
            .trim()
            .to_string()
    }
}
