use actix_web::web::{Bytes, Data};
use actix_web::{post, HttpRequest, HttpResponse, Result};

use crate::models::common::ApiResponse;
use crate::models::order::Order;
use crate::services::cashfree::CashfreePaymentService;
use crate::services::checkout::{CheckoutError, CheckoutService};

/// Gateway webhook. Authenticated by signature over the raw body rather
/// than a bearer token.
#[post("/webhook")]
pub async fn payment_webhook(
    req: HttpRequest,
    body: Bytes,
    gateway: Data<CashfreePaymentService>,
    checkout: Data<CheckoutService>,
) -> Result<HttpResponse> {
    let signature = req
        .headers()
        .get("x-webhook-signature")
        .and_then(|value| value.to_str().ok());

    let signature = match signature {
        Some(signature) => signature,
        None => {
            return Ok(HttpResponse::Unauthorized()
                .json(ApiResponse::<Order>::error("Missing webhook signature".to_string())))
        }
    };

    if !gateway.validate_webhook_signature(&body, signature) {
        log::warn!("Rejected webhook with invalid signature");
        return Ok(HttpResponse::Unauthorized()
            .json(ApiResponse::<Order>::error("Invalid webhook signature".to_string())));
    }

    let payload = match std::str::from_utf8(&body) {
        Ok(payload) => payload,
        Err(_) => {
            return Ok(HttpResponse::BadRequest()
                .json(ApiResponse::<Order>::error("Webhook body is not UTF-8".to_string())))
        }
    };

    let webhook = match gateway.parse_webhook(payload) {
        Ok(webhook) => webhook,
        Err(e) => {
            log::warn!("Unparseable webhook payload: {}", e);
            return Ok(HttpResponse::BadRequest()
                .json(ApiResponse::<Order>::error("Unparseable webhook payload".to_string())));
        }
    };

    log::info!(
        "Received {} at {} for order {}",
        webhook.event_type,
        webhook.event_time.as_deref().unwrap_or("-"),
        webhook.data.order.order_id
    );

    match checkout.apply_payment_event(&webhook).await {
        Ok(order) => Ok(HttpResponse::Ok().json(ApiResponse::success_with_message(
            order,
            "Payment event processed".to_string(),
        ))),
        Err(CheckoutError::Validation(message)) => {
            Ok(HttpResponse::NotFound().json(ApiResponse::<Order>::error(message)))
        }
        Err(e) => {
            log::error!("Failed to apply payment event: {}", e);
            Ok(HttpResponse::InternalServerError().json(ApiResponse::<Order>::error(
                "Failed to apply payment event".to_string(),
            )))
        }
    }
}
