//! Messaging gateways
//!
//! [`MessageGateway`] is the narrow capability the notifier depends on.
//! [`TwilioGateway`] talks to the Twilio REST API (no SDK dependency);
//! [`DemoGateway`] logs the message and reports success without sending.

use async_trait::async_trait;
use serde::Deserialize;

use crate::BoxError;
use crate::config::TwilioConfig;

/// Provider acknowledgement
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dispatch {
    pub message_id: String,
    pub status: String,
}

#[async_trait]
pub trait MessageGateway: Send + Sync {
    /// Send `body` to an already-normalized `+<digits>` number
    async fn deliver(&self, to: &str, body: &str, order_id: Option<&str>)
    -> Result<Dispatch, BoxError>;

    /// True when nothing is actually transmitted
    fn is_demo(&self) -> bool {
        false
    }
}

pub struct TwilioGateway {
    client: reqwest::Client,
    config: TwilioConfig,
}

#[derive(Deserialize)]
struct TwilioMessage {
    sid: Option<String>,
    status: Option<String>,
    message: Option<String>,
}

impl TwilioGateway {
    pub fn new(config: TwilioConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    fn messages_url(&self) -> String {
        format!(
            "{}/2010-04-01/Accounts/{}/Messages.json",
            self.config.api_base.trim_end_matches('/'),
            self.config.account_sid
        )
    }
}

#[async_trait]
impl MessageGateway for TwilioGateway {
    async fn deliver(
        &self,
        to: &str,
        body: &str,
        order_id: Option<&str>,
    ) -> Result<Dispatch, BoxError> {
        let from = format!("whatsapp:{}", self.config.whatsapp_number);
        let to_addr = format!("whatsapp:{to}");
        let resp = self
            .client
            .post(self.messages_url())
            .basic_auth(&self.config.account_sid, Some(&self.config.auth_token))
            .form(&[("From", from.as_str()), ("To", to_addr.as_str()), ("Body", body)])
            .send()
            .await?;

        let status = resp.status();
        let payload: TwilioMessage = resp.json().await?;
        if !status.is_success() {
            return Err(payload
                .message
                .unwrap_or_else(|| format!("Twilio responded with {status}"))
                .into());
        }

        let message_id = payload.sid.ok_or("Twilio response missing sid")?;
        tracing::info!(to = %to, order_id = ?order_id, sid = %message_id, "WhatsApp message sent");
        Ok(Dispatch {
            message_id,
            status: payload.status.unwrap_or_else(|| "queued".into()),
        })
    }
}

/// Offline stand-in used when no provider credentials are configured
#[derive(Debug, Clone, Default)]
pub struct DemoGateway;

#[async_trait]
impl MessageGateway for DemoGateway {
    async fn deliver(
        &self,
        to: &str,
        body: &str,
        order_id: Option<&str>,
    ) -> Result<Dispatch, BoxError> {
        tracing::info!(
            to = %to,
            order_id = order_id.unwrap_or("N/A"),
            body = %body,
            "Demo WhatsApp message (not transmitted)"
        );
        Ok(Dispatch {
            message_id: format!("demo_{}", shared::util::now_millis()),
            status: "delivered".into(),
        })
    }

    fn is_demo(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn demo_reports_delivered() {
        let gateway = DemoGateway;
        let dispatch = gateway
            .deliver("+15551234567", "hello", Some("A1"))
            .await
            .unwrap();
        assert!(dispatch.message_id.starts_with("demo_"));
        assert_eq!(dispatch.status, "delivered");
        assert!(gateway.is_demo());
    }

    #[test]
    fn twilio_url() {
        let gateway = TwilioGateway::new(TwilioConfig {
            account_sid: "AC123".into(),
            auth_token: "token".into(),
            whatsapp_number: "+14155238886".into(),
            api_base: "https://api.twilio.com/".into(),
        });
        assert_eq!(
            gateway.messages_url(),
            "https://api.twilio.com/2010-04-01/Accounts/AC123/Messages.json"
        );
        assert!(!gateway.is_demo());
    }
}
