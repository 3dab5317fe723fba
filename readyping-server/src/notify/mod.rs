//! Customer notifications
//!
//! `Notifier` owns phone normalization, message formatting and pacing; the
//! gateway behind it is chosen once at startup. Failures come back as data
//! (`DeliveryResult { success: false, .. }`), never as `Err`.

pub mod format;
pub mod gateway;
pub mod phone;

use serde::Serialize;
use shared::models::{DeliveryStatus, NotificationChannel, NotificationRecord, Order};
use std::sync::Arc;
use std::time::Duration;

pub use gateway::{DemoGateway, Dispatch, MessageGateway, TwilioGateway};

use crate::config::Config;

/// Uniform send outcome, identical in live and demo mode
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// Normalized recipient
    pub to: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub demo: bool,
}

impl DeliveryResult {
    /// History entry for this attempt
    pub fn to_record(&self, message: &str, now: i64) -> NotificationRecord {
        NotificationRecord {
            channel: NotificationChannel::Whatsapp,
            sent_at: now,
            status: if self.success {
                DeliveryStatus::Sent
            } else {
                DeliveryStatus::Failed
            },
            message: Some(message.to_string()),
            error: self.error.clone(),
        }
    }
}

/// Per-order result of a bulk send
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkDelivery {
    pub order_id: String,
    #[serde(flatten)]
    pub result: DeliveryResult,
}

#[derive(Clone)]
pub struct Notifier {
    gateway: Arc<dyn MessageGateway>,
    country_code: String,
    bulk_interval: Duration,
}

impl Notifier {
    pub fn new(
        gateway: Arc<dyn MessageGateway>,
        country_code: impl Into<String>,
        bulk_interval: Duration,
    ) -> Self {
        Self {
            gateway,
            country_code: country_code.into(),
            bulk_interval,
        }
    }

    /// Live gateway when credentials are configured, demo otherwise
    pub fn from_config(config: &Config) -> Self {
        let gateway: Arc<dyn MessageGateway> = match &config.twilio {
            Some(twilio) => Arc::new(TwilioGateway::new(twilio.clone())),
            None => {
                tracing::warn!("Twilio credentials not found, notifications run in demo mode");
                Arc::new(DemoGateway)
            }
        };
        Self::new(
            gateway,
            config.default_country_code.clone(),
            Duration::from_millis(config.bulk_send_interval_ms),
        )
    }

    pub fn normalize(&self, phone_number: &str) -> String {
        phone::normalize(phone_number, &self.country_code)
    }

    /// Send one message
    pub async fn send(&self, phone_number: &str, body: &str, order_id: Option<&str>) -> DeliveryResult {
        let to = self.normalize(phone_number);
        match self.gateway.deliver(&to, body, order_id).await {
            Ok(dispatch) => DeliveryResult {
                success: true,
                message_id: Some(dispatch.message_id),
                status: Some(dispatch.status),
                to,
                error: None,
                demo: self.gateway.is_demo(),
            },
            Err(e) => {
                tracing::error!(to = %to, order_id = ?order_id, error = %e, "WhatsApp send failed");
                DeliveryResult {
                    success: false,
                    message_id: None,
                    status: None,
                    to,
                    error: Some(e.to_string()),
                    demo: self.gateway.is_demo(),
                }
            }
        }
    }

    /// Ready message for an order, filled from the account template
    pub async fn send_order_ready(
        &self,
        order: &Order,
        template: &str,
        restaurant_name: Option<&str>,
    ) -> (String, DeliveryResult) {
        let body = format::ready_message(template, order, restaurant_name);
        let result = self.send(&order.phone_number, &body, Some(&order.order_id)).await;
        (body, result)
    }

    /// Same message to each order's customer, one at a time with a pause in between
    pub async fn send_bulk(&self, orders: &[Order], body: &str) -> Vec<BulkDelivery> {
        self.send_paced(orders, |_| body.to_string())
            .await
            .into_iter()
            .map(|(_, delivery)| delivery)
            .collect()
    }

    /// Per-order message, sent sequentially with the bulk pause; results keep input order
    pub async fn send_paced<F>(&self, orders: &[Order], body_for: F) -> Vec<(String, BulkDelivery)>
    where
        F: Fn(&Order) -> String,
    {
        let mut results = Vec::with_capacity(orders.len());
        for (idx, order) in orders.iter().enumerate() {
            if idx > 0 && !self.bulk_interval.is_zero() {
                tokio::time::sleep(self.bulk_interval).await;
            }
            let body = body_for(order);
            let result = self.send(&order.phone_number, &body, Some(&order.order_id)).await;
            results.push((
                body,
                BulkDelivery {
                    order_id: order.order_id.clone(),
                    result,
                },
            ));
        }
        results
    }
}
