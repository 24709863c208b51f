use chrono::{DateTime, Utc};
use reqwest::Client;
use serde_json::json;

use crate::error::{Error, Result};

/// Hands password-reset tokens to whatever sends the email. The service only
/// knows an HTTP endpoint; without one configured, deliveries are skipped.
#[derive(Clone)]
pub struct NotificationService {
    client: Client,
    target_url: Option<String>,
}

impl NotificationService {
    pub fn new(target_url: Option<String>, client: Client) -> Self {
        Self { client, target_url }
    }

    pub async fn deliver_password_reset(
        &self,
        email: &str,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<()> {
        let Some(url) = self.target_url.as_deref() else {
            tracing::warn!("password reset requested but RESET_WEBHOOK_URL is not configured");
            return Ok(());
        };

        let payload = json!({
            "event": "password_reset",
            "email": email,
            "token": token,
            "expires_at": expires_at,
        });

        let res = self.client.post(url).json(&payload).send().await?;
        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            tracing::error!(%status, "password reset delivery failed");
            return Err(Error::Upstream(format!(
                "Reset delivery failed with {}: {}",
                status, body
            )));
        }

        tracing::info!("password reset delivered");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unconfigured_delivery_is_skipped() {
        let service = NotificationService::new(None, Client::new());
        let res = tokio_test::block_on(service.deliver_password_reset(
            "tamim@example.com",
            "token",
            Utc::now(),
        ));
        assert!(res.is_ok());
    }

    #[tokio::test]
    async fn unreachable_target_reports_an_error() {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(2))
            .build()
            .unwrap();
        let service = NotificationService::new(Some("http://127.0.0.1:9/hook".into()), client);
        let res = service
            .deliver_password_reset("tamim@example.com", "token", Utc::now())
            .await;
        assert!(res.is_err());
    }
}
