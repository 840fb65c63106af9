use crate::domain::ports::MailTransport;
use crate::error::AppError;
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::error;

/// Outbound delivery through the company's HTTP mail relay. This adapter only
/// carries `(to, subject, body)`; retry and queueing live in the relay.
pub struct HttpMailTransport {
    client: Client,
    api_url: String,
    api_key: String,
}

impl HttpMailTransport {
    pub fn new(api_url: String, api_key: String) -> Self {
        Self {
            client: Client::new(),
            api_url,
            api_key,
        }
    }
}

#[derive(Serialize)]
struct MailPayload {
    from_alias: String,
    to_addr: String,
    subject: String,
    html_body: String,
}

#[async_trait]
impl MailTransport for HttpMailTransport {
    async fn send(&self, to_address: &str, subject: &str, body: &str) -> Result<(), AppError> {
        let payload = MailPayload {
            from_alias: "default".to_string(),
            to_addr: to_address.to_string(),
            subject: subject.to_string(),
            html_body: body.to_string(),
        };

        let res = self
            .client
            .post(&self.api_url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                error!("Mail relay connection error: {}", e);
                AppError::Internal
            })?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            error!("Mail relay failed. Status: {}, Body: {}", status, text);
            return Err(AppError::Internal);
        }

        Ok(())
    }
}
