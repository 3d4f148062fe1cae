//! JWT token service implementation.

use chrono::{TimeDelta, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use forge_core::ports::{AuthError, TokenClaims, TokenService};

/// Secret used when none is configured. Never acceptable in production.
pub const DEV_SECRET: &str = "change-me-in-production";

/// JWT token service configuration.
#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub expiration_hours: i64,
    pub issuer: String,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: DEV_SECRET.to_string(),
            expiration_hours: 24 * 7,
            issuer: "forge-api".to_string(),
        }
    }
}

impl JwtConfig {
    pub fn uses_dev_secret(&self) -> bool {
        self.secret == DEV_SECRET
    }
}

/// Internal JWT claims structure for serialization.
#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String, // account_id
    email: String,
    roles: Vec<String>,
    exp: i64,    // expiration timestamp
    iat: i64,    // issued at
    iss: String, // issuer
}

/// JWT-based token service.
pub struct JwtTokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    config: JwtConfig,
}

impl JwtTokenService {
    pub fn new(config: JwtConfig) -> Self {
        let encoding_key = EncodingKey::from_secret(config.secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());

        Self {
            encoding_key,
            decoding_key,
            config,
        }
    }
}

impl TokenService for JwtTokenService {
    fn generate_token(
        &self,
        account_id: Uuid,
        email: &str,
        roles: Vec<String>,
    ) -> Result<String, AuthError> {
        let now = Utc::now();
        let exp = now + TimeDelta::hours(self.config.expiration_hours);

        let claims = Claims {
            sub: account_id.to_string(),
            email: email.to_string(),
            roles,
            exp: exp.timestamp(),
            iat: now.timestamp(),
            iss: self.config.issuer.clone(),
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AuthError::InvalidToken(e.to_string()))
    }

    fn validate_token(&self, token: &str) -> Result<TokenClaims, AuthError> {
        let mut validation = Validation::default();
        validation.set_issuer(&[&self.config.issuer]);

        let token_data = decode::<Claims>(token, &self.decoding_key, &validation).map_err(|e| {
            match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                _ => AuthError::InvalidToken(e.to_string()),
            }
        })?;

        let account_id = Uuid::parse_str(&token_data.claims.sub)
            .map_err(|e| AuthError::InvalidToken(e.to_string()))?;

        Ok(TokenClaims {
            account_id,
            email: token_data.claims.email,
            roles: token_data.claims.roles,
            exp: token_data.claims.exp,
        })
    }

    fn expiration_seconds(&self) -> i64 {
        self.config.expiration_hours * 3600
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> JwtConfig {
        JwtConfig {
            secret: "test-secret-key".to_string(),
            expiration_hours: 1,
            issuer: "test-issuer".to_string(),
        }
    }

    #[test]
    fn test_validate_token_round_trips_claims() {
        let service = JwtTokenService::new(test_config());
        let account_id = Uuid::new_v4();

        let token = service
            .generate_token(account_id, "writer@example.com", vec!["user".to_string()])
            .unwrap();
        let claims = service.validate_token(&token).unwrap();

        assert_eq!(claims.account_id, account_id);
        assert_eq!(claims.email, "writer@example.com");
        assert_eq!(claims.roles, vec!["user".to_string()]);
    }

    #[test]
    fn test_validate_invalid_token() {
        let service = JwtTokenService::new(test_config());

        let result = service.validate_token("invalid-token");

        assert!(matches!(result.unwrap_err(), AuthError::InvalidToken(_)));
    }

    #[test]
    fn test_token_signed_with_other_secret_is_rejected() {
        let issuer = JwtTokenService::new(JwtConfig {
            secret: "other-secret".to_string(),
            ..test_config()
        });
        let verifier = JwtTokenService::new(test_config());

        let token = issuer
            .generate_token(Uuid::new_v4(), "a@b.co", vec![])
            .unwrap();

        assert!(verifier.validate_token(&token).is_err());
    }

    #[test]
    fn test_expired_token_is_reported_as_expired() {
        let service = JwtTokenService::new(JwtConfig {
            expiration_hours: -2,
            ..test_config()
        });

        let token = service
            .generate_token(Uuid::new_v4(), "a@b.co", vec![])
            .unwrap();

        assert!(matches!(
            service.validate_token(&token),
            Err(AuthError::TokenExpired)
        ));
    }

    #[test]
    fn test_default_lifetime_is_one_week() {
        let service = JwtTokenService::new(JwtConfig::default());
        assert_eq!(service.expiration_seconds(), 7 * 24 * 3600);
    }
}
