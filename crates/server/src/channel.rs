use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use tracing::debug;

use cutquote_agent::{DeliveryError, MessageSender};
use cutquote_core::config::ChannelConfig;
use cutquote_core::domain::session::ContactId;

const SEND_TEXT_PATH: &str = "/whatsapp-session/sendText";

#[derive(Debug, Serialize)]
struct SendText<'a> {
    phone: &'a str,
    message: &'a str,
}

/// Delivers replies through the messaging gateway's HTTP API.
pub struct HttpMessageSender {
    client: Client,
    endpoint: String,
    api_token: Option<SecretString>,
}

impl HttpMessageSender {
    pub fn from_config(config: &ChannelConfig) -> Result<Self, reqwest::Error> {
        let client =
            Client::builder().timeout(Duration::from_secs(config.timeout_secs.max(1))).build()?;
        Ok(Self {
            client,
            endpoint: format!("{}{SEND_TEXT_PATH}", config.base_url.trim_end_matches('/')),
            api_token: config.api_token.clone(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl MessageSender for HttpMessageSender {
    async fn send(&self, contact: &ContactId, text: &str) -> Result<(), DeliveryError> {
        let mut request =
            self.client.post(&self.endpoint).json(&SendText { phone: &contact.0, message: text });
        if let Some(token) = &self.api_token {
            request = request.bearer_auth(token.expose_secret());
        }

        let response =
            request.send().await.map_err(|error| DeliveryError::Unreachable(error.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(DeliveryError::Rejected(status.as_u16()));
        }

        debug!(
            event_name = "delivery.gateway_accepted",
            contact_id = %contact,
            status = status.as_u16(),
            "gateway accepted message"
        );
        Ok(())
    }
}
