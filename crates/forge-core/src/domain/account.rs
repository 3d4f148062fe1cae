use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Identifiable;
use crate::error::DomainError;

/// Role assigned to every self-registered account.
pub const DEFAULT_ROLE: &str = "user";

pub const MIN_PASSWORD_LEN: usize = 6;

/// Account entity - a registered user and their credit balance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    /// Never negative; deductions floor at zero.
    pub credits: i64,
    pub role: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Account {
    /// Create a new account holding the starting credit grant.
    ///
    /// The email is normalized; a blank name falls back to the local part of the email.
    pub fn new(
        name: Option<String>,
        email: &str,
        password_hash: String,
        starting_credits: i64,
    ) -> Self {
        let email = Self::normalize_email(email);
        let name = name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| email.split('@').next().unwrap_or_default().to_string());
        let now = Utc::now();

        Self {
            id: Uuid::new_v4(),
            name,
            email,
            password_hash,
            credits: starting_credits.max(0),
            role: DEFAULT_ROLE.to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Emails are unique case-insensitively, so they are stored trimmed and lowercased.
    pub fn normalize_email(email: &str) -> String {
        email.trim().to_lowercase()
    }

    /// Check registration input: `local@domain.tld` without whitespace, and a
    /// password of at least [`MIN_PASSWORD_LEN`] characters.
    pub fn validate_registration(email: &str, password: &str) -> Result<(), DomainError> {
        if !is_valid_email(email.trim()) {
            return Err(DomainError::Validation("Invalid email address".to_string()));
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(DomainError::Validation(format!(
                "Password must be at least {MIN_PASSWORD_LEN} characters"
            )));
        }
        Ok(())
    }

    /// Credit top-ups must be strictly positive.
    pub fn validate_credit_grant(amount: i64) -> Result<(), DomainError> {
        if amount <= 0 {
            return Err(DomainError::Validation(
                "Amount must be a positive integer".to_string(),
            ));
        }
        Ok(())
    }
}

fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    // The domain needs a dot with something on both sides of it.
    domain
        .rsplit_once('.')
        .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty())
}

impl Identifiable<Uuid> for Account {
    fn id(&self) -> Uuid {
        self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registration_validation() {
        assert!(Account::validate_registration("a@b.co", "secret").is_ok());
        assert!(Account::validate_registration(" a@b.co ", "secret").is_ok());

        for email in ["", "plain", "@b.co", "a@b", "a@.co", "a@b.", "a b@c.co", "a@b@c.co"] {
            assert!(
                matches!(
                    Account::validate_registration(email, "secret"),
                    Err(DomainError::Validation(_))
                ),
                "{email:?} should be rejected"
            );
        }

        assert!(Account::validate_registration("a@b.co", "12345").is_err());
    }

    #[test]
    fn test_credit_grant_must_be_positive() {
        assert!(Account::validate_credit_grant(1).is_ok());
        assert!(Account::validate_credit_grant(0).is_err());
        assert!(Account::validate_credit_grant(-5).is_err());
    }

    #[test]
    fn test_new_account_normalizes_email_and_defaults_name() {
        let account = Account::new(None, "  Writer@Example.COM ", "hash".to_string(), 10);

        assert_eq!(account.email, "writer@example.com");
        assert_eq!(account.name, "writer");
        assert_eq!(account.credits, 10);
        assert_eq!(account.role, DEFAULT_ROLE);
    }

    #[test]
    fn test_new_account_keeps_given_name() {
        let account = Account::new(
            Some("Ada".to_string()),
            "ada@example.com",
            "hash".to_string(),
            5,
        );

        assert_eq!(account.name, "Ada");
    }
}
