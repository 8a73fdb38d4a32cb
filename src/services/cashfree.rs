use anyhow::{anyhow, Result};
use hmac::{Hmac, Mac};
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use sha2::Sha256;

use crate::config::CashfreeConfig;
use crate::models::order::{CreateOrderRequest, Order};

type HmacSha256 = Hmac<Sha256>;

const API_VERSION: &str = "2023-08-01";

/// A gateway-side order, freshly created. The `payment_session_id` is the
/// opaque value the hosted checkout widget consumes.
#[derive(Debug, Clone)]
pub struct GatewayOrder {
    pub cf_order_id: String,
    pub order_id: String,
    pub order_status: String,
    pub payment_session_id: String,
}

/// Webhook payload delivered by the gateway after a payment attempt.
#[derive(Debug, Deserialize)]
pub struct PaymentWebhookPayload {
    #[serde(rename = "type")]
    pub event_type: String,
    pub event_time: Option<String>,
    pub data: WebhookData,
}

#[derive(Debug, Deserialize)]
pub struct WebhookData {
    pub order: WebhookOrder,
    pub payment: WebhookPayment,
}

#[derive(Debug, Deserialize)]
pub struct WebhookOrder {
    pub order_id: String,
    pub order_amount: Option<f64>,
    pub order_currency: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct WebhookPayment {
    pub payment_status: String,
    pub cf_payment_id: Option<Value>,
    pub payment_message: Option<String>,
}

#[derive(Clone)]
pub struct CashfreePaymentService {
    client: Client,
    config: CashfreeConfig,
}

impl CashfreePaymentService {
    pub fn new(config: CashfreeConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    /// Create a gateway order and obtain the payment session for the hosted
    /// checkout redirect. One call per checkout attempt; failures are not
    /// retried here.
    pub async fn create_order(
        &self,
        order: &Order,
        request: &CreateOrderRequest,
    ) -> Result<GatewayOrder> {
        let payload = json!({
            "order_id": order.order_id,
            "order_amount": order.amount,
            "order_currency": order.currency.to_string(),
            "customer_details": {
                "customer_id": request.user_id,
                "customer_name": request.buyer_name,
                "customer_email": request.email,
                "customer_phone": request.phone,
            },
            "order_meta": {
                "return_url": self.config.return_url,
                "notify_url": self.config.notify_url,
            },
            "order_note": format!("{} at {}", request.selected_plan, request.gym_names),
        });

        log::info!("Creating gateway order {}", order.order_id);

        let response = self
            .client
            .post(&format!("{}/orders", self.config.base_url))
            .header("x-client-id", &self.config.app_id)
            .header("x-client-secret", &self.config.secret_key)
            .header("x-api-version", API_VERSION)
            .header("Content-Type", "application/json")
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            let error_text = response.text().await?;
            return Err(anyhow!("Order creation failed: {}", error_text));
        }

        let body: Value = response.json().await?;
        let gateway_order = parse_gateway_order(&body)?;

        if gateway_order.order_id != order.order_id {
            log::warn!(
                "Gateway echoed order id {} for submitted order {}",
                gateway_order.order_id,
                order.order_id
            );
        }

        log::info!(
            "Created gateway order {} ({}) with session {}",
            gateway_order.cf_order_id,
            gateway_order.order_status,
            gateway_order.payment_session_id
        );

        Ok(gateway_order)
    }

    /// Fetch the gateway's view of an order.
    pub async fn order_status(&self, order_id: &str) -> Result<Value> {
        let url = format!("{}/orders/{}", self.config.base_url, order_id);

        log::info!("Checking gateway order status for: {}", order_id);

        let response = self
            .client
            .get(&url)
            .header("x-client-id", &self.config.app_id)
            .header("x-client-secret", &self.config.secret_key)
            .header("x-api-version", API_VERSION)
            .header("Accept", "application/json")
            .send()
            .await?;

        if !response.status().is_success() {
            let error_text = response.text().await?;
            return Err(anyhow!("Status check failed: {}", error_text));
        }

        let status_response: Value = response.json().await?;
        Ok(status_response)
    }

    /// Validate a webhook signature: HMAC-SHA256 of the raw body under the
    /// shared webhook secret.
    pub fn validate_webhook_signature(&self, payload: &[u8], signature: &str) -> bool {
        let key = self.config.webhook_secret.as_bytes();

        let mut mac = match HmacSha256::new_from_slice(key) {
            Ok(mac) => mac,
            Err(_) => return false,
        };

        mac.update(payload);
        let calculated_signature = hex::encode(mac.finalize().into_bytes());

        log::debug!("Calculated signature: {}", calculated_signature);
        log::debug!("Provided signature: {}", signature);

        calculated_signature == signature
    }

    /// Parse webhook payload
    pub fn parse_webhook(&self, payload: &str) -> Result<PaymentWebhookPayload> {
        let webhook: PaymentWebhookPayload = serde_json::from_str(payload)?;
        Ok(webhook)
    }
}

fn parse_gateway_order(body: &Value) -> Result<GatewayOrder> {
    let payment_session_id = body["payment_session_id"]
        .as_str()
        .ok_or_else(|| anyhow!("No payment_session_id in response"))?
        .to_string();

    let order_id = body["order_id"]
        .as_str()
        .ok_or_else(|| anyhow!("No order_id in response"))?
        .to_string();

    // The gateway has returned this as both a string and a number.
    let cf_order_id = match &body["cf_order_id"] {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        _ => return Err(anyhow!("No cf_order_id in response")),
    };

    let order_status = body["order_status"].as_str().unwrap_or("ACTIVE").to_string();

    Ok(GatewayOrder {
        cf_order_id,
        order_id,
        order_status,
        payment_session_id,
    })
}

/// Extract the order status string from a gateway status response.
pub fn extract_order_status(body: &Value) -> Option<&str> {
    body.get("order_status").and_then(|v| v.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_config() -> CashfreeConfig {
        CashfreeConfig {
            base_url: "https://sandbox.cashfree.com/pg".to_string(),
            app_id: "test_app".to_string(),
            secret_key: "test_secret".to_string(),
            webhook_secret: "test_webhook_secret".to_string(),
            return_url: "https://example.com/payment-result".to_string(),
            notify_url: "https://example.com/api/v1/payments/webhook".to_string(),
        }
    }

    #[test]
    fn webhook_signature_validation() {
        let service = CashfreePaymentService::new(create_test_config());

        let payload = b"test payload";
        let key = b"test_webhook_secret";

        let mut mac = HmacSha256::new_from_slice(key).unwrap();
        mac.update(payload);
        let valid_signature = hex::encode(mac.finalize().into_bytes());

        assert!(service.validate_webhook_signature(payload, &valid_signature));
        assert!(!service.validate_webhook_signature(payload, "invalid_signature"));
    }

    #[test]
    fn gateway_order_parsing() {
        let body = json!({
            "cf_order_id": 2149460581u32,
            "order_id": "ORDER_8f14e45fceea167a5a36dedd4bea2543",
            "order_status": "ACTIVE",
            "payment_session_id": "session_a1b2c3"
        });

        let order = parse_gateway_order(&body).unwrap();
        assert_eq!(order.cf_order_id, "2149460581");
        assert_eq!(order.payment_session_id, "session_a1b2c3");
        assert_eq!(order.order_status, "ACTIVE");

        let missing_session = json!({
            "cf_order_id": "cf_1",
            "order_id": "ORDER_1",
            "order_status": "ACTIVE"
        });
        assert!(parse_gateway_order(&missing_session).is_err());
    }

    #[test]
    fn webhook_payload_parsing() {
        let service = CashfreePaymentService::new(create_test_config());

        let payload = r#"{
            "type": "PAYMENT_SUCCESS_WEBHOOK",
            "event_time": "2024-01-01T10:00:00+05:30",
            "data": {
                "order": {
                    "order_id": "ORDER_8f14e45fceea167a5a36dedd4bea2543",
                    "order_amount": 600.0,
                    "order_currency": "INR"
                },
                "payment": {
                    "payment_status": "SUCCESS",
                    "cf_payment_id": 975672,
                    "payment_message": "Transaction successful"
                }
            }
        }"#;

        let webhook = service.parse_webhook(payload).unwrap();
        assert_eq!(webhook.event_type, "PAYMENT_SUCCESS_WEBHOOK");
        assert_eq!(webhook.data.payment.payment_status, "SUCCESS");
        assert_eq!(
            webhook.data.order.order_id,
            "ORDER_8f14e45fceea167a5a36dedd4bea2543"
        );
    }

    #[test]
    fn order_status_extraction() {
        let body = json!({ "order_id": "ORDER_1", "order_status": "PAID" });
        assert_eq!(extract_order_status(&body), Some("PAID"));
        assert_eq!(extract_order_status(&json!({})), None);
    }
}
