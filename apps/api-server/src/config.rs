//! Application configuration loaded from environment variables.

use std::str::FromStr;
use std::time::Duration;

use forge_core::DomainError;
use forge_core::services::CreditPolicy;
use forge_infra::database::DatabaseConfig;
use forge_infra::generation::{DEFAULT_BASE_URL, GatewayConfig};
use forge_infra::{JwtConfig, RateLimitConfig};

use crate::telemetry::TelemetryConfig;

/// Origins of the local development frontends.
const DEFAULT_CORS_ORIGINS: &[&str] = &["http://localhost:3000", "http://localhost:4000"];

/// Application configuration, built once at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub database: Option<DatabaseConfig>,
    pub jwt: JwtConfig,
    pub gateway: GatewayConfig,
    pub credits: CreditPolicy,
    pub rate_limit: RateLimitConfig,
    /// Browser origins allowed to call the API.
    pub cors_allowed_origins: Vec<String>,
    pub telemetry: TelemetryConfig,
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let database = lookup("DATABASE_URL")
            .filter(|url| !url.trim().is_empty())
            .map(|url| DatabaseConfig {
                url,
                max_connections: parse_or(&lookup, "DB_MAX_CONNECTIONS", 100),
                min_connections: parse_or(&lookup, "DB_MIN_CONNECTIONS", 10),
            });

        let defaults = JwtConfig::default();
        let jwt = JwtConfig {
            secret: lookup("JWT_SECRET")
                .filter(|s| !s.is_empty())
                .unwrap_or(defaults.secret),
            expiration_hours: parse_or(
                &lookup,
                "JWT_EXPIRATION_HOURS",
                defaults.expiration_hours,
            ),
            issuer: lookup("JWT_ISSUER").unwrap_or(defaults.issuer),
        };

        let gateway = GatewayConfig::new(lookup("GROQ_API_KEY"))
            .with_base_url(
                lookup("GENERATION_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            )
            .with_timeout(Duration::from_secs(parse_or(
                &lookup,
                "GENERATION_TIMEOUT_SECS",
                60,
            )));

        let policy = CreditPolicy::default();
        let credits = CreditPolicy {
            rate_per_hundred_words: parse_or(
                &lookup,
                "CREDIT_COST_PER_100_WORDS",
                policy.rate_per_hundred_words,
            ),
            starting_credits: parse_or(&lookup, "STARTING_CREDITS", policy.starting_credits),
            min_generated_words: parse_or(
                &lookup,
                "MIN_GENERATED_WORDS",
                policy.min_generated_words,
            ),
            preflight_word_estimate: parse_or(
                &lookup,
                "PREFLIGHT_WORD_ESTIMATE",
                policy.preflight_word_estimate,
            ),
        };

        let rate_limit = RateLimitConfig {
            max_requests: parse_or(&lookup, "RATE_LIMIT_MAX_REQUESTS", 30),
            window: Duration::from_secs(parse_or(&lookup, "RATE_LIMIT_WINDOW_SECS", 60)),
        };

        let cors_allowed_origins = lookup("CORS_ALLOWED_ORIGINS")
            .map(|v| {
                v.split(',')
                    .map(|origin| origin.trim().trim_end_matches('/').to_string())
                    .filter(|origin| !origin.is_empty())
                    .collect()
            })
            .unwrap_or_else(|| {
                DEFAULT_CORS_ORIGINS
                    .iter()
                    .map(|origin| origin.to_string())
                    .collect()
            });

        Self {
            host: lookup("HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            port: parse_or(&lookup, "PORT", 4000),
            database,
            jwt,
            gateway,
            credits,
            rate_limit,
            cors_allowed_origins,
            telemetry: TelemetryConfig::from_lookup(&lookup),
        }
    }

    /// Reject settings the server must not start with.
    pub fn validate(&self) -> Result<(), DomainError> {
        self.credits.validate()
    }

    /// Emit warnings for settings that are unsafe or incomplete.
    pub fn log_warnings(&self) {
        if self.jwt.uses_dev_secret() {
            tracing::warn!("JWT_SECRET not set - using the development secret");
        }
        if !self.gateway.has_api_key() {
            tracing::warn!("GROQ_API_KEY not set - generation requests will fail");
        }
        if self.database.is_none() {
            tracing::warn!("DATABASE_URL not set - data is kept in memory only");
        }
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    lookup(key)
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> AppConfig {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]);

        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 4000);
        assert!(config.database.is_none());
        assert!(config.jwt.uses_dev_secret());
        assert_eq!(config.jwt.expiration_hours, 168);
        assert!(!config.gateway.has_api_key());
        assert_eq!(config.gateway.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.gateway.timeout, Duration::from_secs(60));
        assert_eq!(config.credits, CreditPolicy::default());
        assert_eq!(config.rate_limit, RateLimitConfig::default());
        assert!(!config.telemetry.json_logs);
        assert_eq!(
            config.cors_allowed_origins,
            vec!["http://localhost:3000", "http://localhost:4000"]
        );
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("PORT", "8080"),
            ("DATABASE_URL", "postgres://localhost/forge"),
            ("DB_MAX_CONNECTIONS", "5"),
            ("JWT_SECRET", "s3cret"),
            ("GROQ_API_KEY", "gsk_test"),
            ("GENERATION_BASE_URL", "http://localhost:9000/v1"),
            ("CREDIT_COST_PER_100_WORDS", "2"),
            ("STARTING_CREDITS", "50"),
            ("RATE_LIMIT_MAX_REQUESTS", "5"),
            ("LOG_FORMAT", "JSON"),
        ]);

        assert_eq!(config.port, 8080);
        let database = config.database.unwrap();
        assert_eq!(database.url, "postgres://localhost/forge");
        assert_eq!(database.max_connections, 5);
        assert_eq!(database.min_connections, 10);
        assert!(!config.jwt.uses_dev_secret());
        assert!(config.gateway.has_api_key());
        assert_eq!(config.gateway.base_url, "http://localhost:9000/v1");
        assert_eq!(config.credits.rate_per_hundred_words, 2);
        assert_eq!(config.credits.starting_credits, 50);
        assert_eq!(config.credits.min_generated_words, 10);
        assert_eq!(config.rate_limit.max_requests, 5);
        assert!(config.telemetry.json_logs);
    }

    #[test]
    fn test_unparseable_values_fall_back() {
        let config = config_from(&[("PORT", "eighty"), ("STARTING_CREDITS", "lots")]);

        assert_eq!(config.port, 4000);
        assert_eq!(config.credits.starting_credits, 10);
    }

    #[test]
    fn test_negative_credit_settings_are_rejected() {
        let config = config_from(&[("CREDIT_COST_PER_100_WORDS", "-1")]);
        assert_eq!(config.credits.rate_per_hundred_words, -1);
        assert!(config.validate().is_err());

        for (key, value) in [
            ("STARTING_CREDITS", "-10"),
            ("MIN_GENERATED_WORDS", "0"),
            ("PREFLIGHT_WORD_ESTIMATE", "-1"),
        ] {
            assert!(config_from(&[(key, value)]).validate().is_err(), "{key}={value}");
        }

        assert!(config_from(&[]).validate().is_ok());
    }

    #[test]
    fn test_cors_origins_are_split_and_trimmed() {
        let config = config_from(&[(
            "CORS_ALLOWED_ORIGINS",
            " https://app.example.com/ ,, http://localhost:5173",
        )]);

        assert_eq!(
            config.cors_allowed_origins,
            vec!["https://app.example.com", "http://localhost:5173"]
        );
    }

    #[test]
    fn test_blank_database_url_means_in_memory() {
        let config = config_from(&[("DATABASE_URL", "  ")]);
        assert!(config.database.is_none());
    }
}
