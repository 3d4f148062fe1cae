//! Telemetry initialization - tracing and alerting setup.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::observability::AlertLayer;

const DEFAULT_FILTER: &str = "info,api_server=debug,forge_infra=debug,forge_core=debug";

/// Telemetry configuration.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Enable JSON logging (for production).
    pub json_logs: bool,
    pub service_name: String,
    /// Forward ERROR events to the alert sender.
    pub alerts_enabled: bool,
    /// Webhook URL for alerts (Slack, Discord, etc.).
    pub alert_webhook_url: Option<String>,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            json_logs: false,
            service_name: "forge-api".to_string(),
            alerts_enabled: true,
            alert_webhook_url: None,
        }
    }
}

impl TelemetryConfig {
    pub fn from_lookup<F>(lookup: &F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Self {
            json_logs: lookup("LOG_FORMAT")
                .map(|v| v.eq_ignore_ascii_case("json"))
                .unwrap_or(defaults.json_logs),
            service_name: lookup("OTEL_SERVICE_NAME").unwrap_or(defaults.service_name),
            alerts_enabled: lookup("ALERTS_ENABLED")
                .map(|v| v != "false" && v != "0")
                .unwrap_or(defaults.alerts_enabled),
            alert_webhook_url: lookup("ALERT_WEBHOOK_URL").filter(|u| !u.trim().is_empty()),
        }
    }
}

/// Initialize tracing and alerting. Must run inside the Tokio runtime.
pub fn init_telemetry(config: &TelemetryConfig) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let alert_layer = config.alerts_enabled.then(|| match &config.alert_webhook_url {
        Some(url) => AlertLayer::webhook(url.clone()),
        None => AlertLayer::console(),
    });

    if config.json_logs {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .with(alert_layer)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().pretty())
            .with(alert_layer)
            .init();
    }

    tracing::info!(
        service = %config.service_name,
        json_logs = config.json_logs,
        alerts_enabled = config.alerts_enabled,
        alert_webhook = config.alert_webhook_url.is_some(),
        "Telemetry initialized"
    );
}
