//! Password input for CLI commands
//!
//! A password given on the command line or through the environment wins;
//! otherwise the user is prompted with hidden input.

use crate::config::Settings;
use crate::crypto::SecureString;
use crate::error::{PyroError, PyroResult};

/// Use `given` or prompt once
pub fn password_or_prompt(given: Option<&SecureString>, prompt: &str) -> PyroResult<SecureString> {
    match given {
        Some(password) => Ok(password.clone()),
        None => prompt_password(prompt),
    }
}

/// Use `given` if it satisfies the policy, or prompt for a new password twice
pub fn new_password_or_prompt(
    given: Option<&SecureString>,
    settings: &Settings,
) -> PyroResult<SecureString> {
    match given {
        Some(password) => {
            settings.check_password(password)?;
            Ok(password.clone())
        }
        None => prompt_new_password(settings),
    }
}

/// Prompt for a new password with confirmation
fn prompt_new_password(settings: &Settings) -> PyroResult<SecureString> {
    loop {
        let pass1 = prompt_password("Enter new password: ")?;

        if let Err(e) = settings.check_password(&pass1) {
            eprintln!("{} Please try again.", e);
            continue;
        }

        let pass2 = prompt_password("Confirm password: ")?;

        if pass1 != pass2 {
            eprintln!("Passwords do not match. Please try again.");
            continue;
        }

        return Ok(pass1);
    }
}

/// Prompt for a password (hidden input)
fn prompt_password(prompt: &str) -> PyroResult<SecureString> {
    rpassword::prompt_password(prompt)
        .map(SecureString::from)
        .map_err(|e| PyroError::Io(format!("Failed to read password: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_given_password_is_used() {
        let given = SecureString::from("password1");
        let password = password_or_prompt(Some(&given), "unused").unwrap();
        assert_eq!(password.as_str(), "password1");
    }

    #[test]
    fn test_given_new_password_checked_against_policy() {
        let settings = Settings::default();
        let weak = SecureString::from("short");
        assert!(matches!(
            new_password_or_prompt(Some(&weak), &settings),
            Err(PyroError::WeakPassword { .. })
        ));

        let strong = SecureString::from("long enough");
        assert_eq!(
            new_password_or_prompt(Some(&strong), &settings)
                .unwrap()
                .as_str(),
            "long enough"
        );
    }
}
