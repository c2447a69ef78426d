use crate::domain::ports::Notifier;
use crate::error::AppError;
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::error;

/// Delivers offer notifications through an external HTTP gateway (the
/// SMS/email bridge is on the other side). Fire-and-forget from the domain's
/// point of view; only the background worker ever awaits this.
pub struct HttpNotifyService {
    client: Client,
    api_url: String,
    api_key: String,
}

impl HttpNotifyService {
    pub fn new(api_url: String, api_key: String) -> Self {
        Self {
            client: Client::new(),
            api_url,
            api_key,
        }
    }
}

#[derive(Serialize)]
struct NotifyPayload {
    to_addr: String,
    subject: String,
    body: String,
}

#[async_trait]
impl Notifier for HttpNotifyService {
    async fn send(&self, recipient: &str, subject: &str, body: &str) -> Result<(), AppError> {
        let payload = NotifyPayload {
            to_addr: recipient.to_string(),
            subject: subject.to_string(),
            body: body.to_string(),
        };

        let res = self.client.post(&self.api_url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                let msg = format!("Notify service connection error: {}", e);
                error!("{}", msg);
                AppError::InternalWithMsg(msg)
            })?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            let msg = format!("Notify service failed. Status: {}, Body: {}", status, text);
            error!("{}", msg);
            return Err(AppError::InternalWithMsg(msg));
        }

        Ok(())
    }
}
