//! Operator alerting layer for tracing.
//!
//! Intercepts events at or above the configured level (ERROR by default),
//! such as a failed generation commit, and hands them to an [`AlertSender`]
//! on a background task so logging never blocks on delivery.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::{Layer, layer::Context};

/// Alert message containing event details.
#[derive(Debug, Clone)]
pub struct AlertMessage {
    pub level: String,
    pub message: String,
    pub target: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub fields: Vec<(String, String)>,
}

impl AlertMessage {
    /// One-line rendering of the structured fields, e.g. `account_id=.. cost=3`.
    pub fn fields_summary(&self) -> String {
        self.fields
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Configuration for the alert layer.
#[derive(Debug, Clone)]
pub struct AlertConfig {
    /// Least severe level that triggers an alert.
    pub min_level: Level,
    /// Alerts buffered before new ones are dropped.
    pub buffer_size: usize,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            min_level: Level::ERROR,
            buffer_size: 100,
        }
    }
}

/// Alert delivery backend.
#[async_trait::async_trait]
pub trait AlertSender: Send + Sync {
    async fn send(&self, alert: AlertMessage) -> Result<(), AlertError>;
}

#[derive(Debug, thiserror::Error)]
pub enum AlertError {
    #[error("Failed to send alert: {0}")]
    SendError(String),
}

/// Writes alerts to stderr (development).
pub struct ConsoleAlertSender;

#[async_trait::async_trait]
impl AlertSender for ConsoleAlertSender {
    async fn send(&self, alert: AlertMessage) -> Result<(), AlertError> {
        eprintln!(
            "\n[ALERT] {} {}\n  message: {}\n  fields: {}\n  time: {}\n",
            alert.level,
            alert.target,
            alert.message,
            alert.fields_summary(),
            alert.timestamp
        );
        Ok(())
    }
}

/// Posts alerts to a chat webhook (Slack, Discord, etc.).
pub struct WebhookAlertSender {
    url: String,
    client: reqwest::Client,
}

impl WebhookAlertSender {
    pub fn new(url: String) -> Self {
        Self {
            url,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait::async_trait]
impl AlertSender for WebhookAlertSender {
    async fn send(&self, alert: AlertMessage) -> Result<(), AlertError> {
        let payload = serde_json::json!({
            "text": format!(
                "*{}* in `{}`\n*Message:* {}\n*Fields:* {}\n*Time:* {}",
                alert.level,
                alert.target,
                alert.message,
                alert.fields_summary(),
                alert.timestamp
            )
        });

        self.client
            .post(&self.url)
            .json(&payload)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| AlertError::SendError(e.to_string()))?;

        Ok(())
    }
}

/// Tracing layer that forwards severe events to an [`AlertSender`].
pub struct AlertLayer {
    sender: mpsc::Sender<AlertMessage>,
    min_level: Level,
}

impl AlertLayer {
    /// Spawns the delivery task, so this must be called inside a Tokio runtime.
    pub fn new(alert_sender: Arc<dyn AlertSender>, config: AlertConfig) -> Self {
        let (tx, mut rx) = mpsc::channel::<AlertMessage>(config.buffer_size.max(1));

        tokio::spawn(async move {
            while let Some(alert) = rx.recv().await {
                if let Err(e) = alert_sender.send(alert).await {
                    // Logging here would feed back into this layer.
                    eprintln!("{e}");
                }
            }
        });

        Self::from_channel(tx, config.min_level)
    }

    fn from_channel(sender: mpsc::Sender<AlertMessage>, min_level: Level) -> Self {
        Self { sender, min_level }
    }

    pub fn console() -> Self {
        Self::new(Arc::new(ConsoleAlertSender), AlertConfig::default())
    }

    pub fn webhook(url: String) -> Self {
        Self::new(Arc::new(WebhookAlertSender::new(url)), AlertConfig::default())
    }
}

#[derive(Default)]
struct FieldVisitor {
    message: String,
    fields: Vec<(String, String)>,
}

impl tracing::field::Visit for FieldVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{value:?}");
        } else {
            self.fields
                .push((field.name().to_string(), format!("{value:?}")));
        }
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        } else {
            self.fields
                .push((field.name().to_string(), value.to_string()));
        }
    }
}

impl<S> Layer<S> for AlertLayer
where
    S: Subscriber,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        // Level ordering: ERROR < WARN < ... so "at least as severe" is `<=`.
        if *event.metadata().level() > self.min_level {
            return;
        }

        let mut visitor = FieldVisitor::default();
        event.record(&mut visitor);

        let alert = AlertMessage {
            level: event.metadata().level().to_string(),
            message: visitor.message,
            target: event.metadata().target().to_string(),
            timestamp: chrono::Utc::now(),
            fields: visitor.fields,
        };

        // Drop the alert rather than block when the buffer is full.
        let _ = self.sender.try_send(alert);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_subscriber::layer::SubscriberExt;

    fn capture(min_level: Level, emit: impl FnOnce()) -> Vec<AlertMessage> {
        let (tx, mut rx) = mpsc::channel(16);
        let subscriber =
            tracing_subscriber::registry().with(AlertLayer::from_channel(tx, min_level));

        tracing::subscriber::with_default(subscriber, emit);

        let mut alerts = Vec::new();
        while let Ok(alert) = rx.try_recv() {
            alerts.push(alert);
        }
        alerts
    }

    #[test]
    fn test_error_events_become_alerts_with_fields() {
        let alerts = capture(Level::ERROR, || {
            tracing::info!("routine");
            tracing::error!(account_id = "abc", cost = 3, "Failed to persist generation");
        });

        assert_eq!(alerts.len(), 1);
        let alert = &alerts[0];
        assert_eq!(alert.level, "ERROR");
        assert_eq!(alert.message, "Failed to persist generation");
        assert_eq!(alert.fields_summary(), "account_id=abc cost=3");
    }

    #[test]
    fn test_min_level_includes_more_severe_events() {
        let alerts = capture(Level::WARN, || {
            tracing::debug!("noise");
            tracing::warn!("slow upstream");
            tracing::error!("down");
        });

        let messages: Vec<_> = alerts.iter().map(|a| a.message.as_str()).collect();
        assert_eq!(messages, vec!["slow upstream", "down"]);
    }
}
