use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::models::booking::BookedSlot;
use crate::models::common::{CurrencyCode, Plan};

/// Checkout confirmation payload: everything the order needs, as submitted
/// once per attempt. Field names follow the booking page's wire format.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub user_id: String,
    pub buyer_name: String,
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    #[validate(custom = "validate_phone")]
    pub phone: String,
    pub gym_id: Uuid,
    pub selected_plan: Plan,
    #[validate(custom = "validate_amount")]
    pub amount: Decimal,
    #[validate(custom = "validate_amount")]
    pub base_amount: Decimal,
    pub number_of_slots: u32,
    pub currency: CurrencyCode,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub gym_names: String,
    pub booking_date: NaiveDate,
    #[serde(default)]
    pub booking_time_slots: Vec<BookedSlot>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum OrderStatus {
    Created,
    Paid,
    Failed,
    Cancelled,
    Expired,
}

impl OrderStatus {
    /// Map the gateway's order status vocabulary onto ours.
    pub fn from_gateway_order_status(status: &str) -> Self {
        match status {
            "ACTIVE" => OrderStatus::Created,
            "PAID" => OrderStatus::Paid,
            "EXPIRED" => OrderStatus::Expired,
            "TERMINATED" | "TERMINATION_REQUESTED" => OrderStatus::Cancelled,
            _ => OrderStatus::Failed,
        }
    }

    /// Map a webhook payment status onto an order status.
    pub fn from_payment_status(status: &str) -> Self {
        match status {
            "SUCCESS" => OrderStatus::Paid,
            "PENDING" => OrderStatus::Created,
            "USER_DROPPED" | "CANCELLED" => OrderStatus::Cancelled,
            _ => OrderStatus::Failed,
        }
    }

    pub fn is_final(&self) -> bool {
        matches!(
            self,
            OrderStatus::Paid | OrderStatus::Failed | OrderStatus::Cancelled | OrderStatus::Expired
        )
    }
}

/// A payment order, one per checkout attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub order_id: String,
    pub cf_order_id: Option<String>,
    pub payment_session_id: Option<String>,
    pub booking_id: Uuid,
    pub user_id: String,
    pub gym_id: Uuid,
    pub plan: Plan,
    pub amount: Decimal,
    pub base_amount: Decimal,
    pub number_of_slots: u32,
    pub currency: CurrencyCode,
    pub status: OrderStatus,
    pub failure_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Order {
    pub fn new(request: &CreateOrderRequest, booking_id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            order_id: format!("ORDER_{}", Uuid::new_v4().simple()),
            cf_order_id: None,
            payment_session_id: None,
            booking_id,
            user_id: request.user_id.clone(),
            gym_id: request.gym_id,
            plan: request.selected_plan,
            amount: request.amount,
            base_amount: request.base_amount,
            number_of_slots: request.number_of_slots.max(1),
            currency: request.currency,
            status: OrderStatus::Created,
            failure_reason: None,
            created_at: now,
            updated_at: now,
            completed_at: None,
        }
    }

    pub fn update_status(&mut self, status: OrderStatus, failure_reason: Option<String>) {
        self.status = status;
        self.failure_reason = failure_reason;
        self.updated_at = Utc::now();
        if status.is_final() {
            self.completed_at = Some(self.updated_at);
        }
    }

    pub fn set_gateway_session(&mut self, cf_order_id: String, payment_session_id: String) {
        self.cf_order_id = Some(cf_order_id);
        self.payment_session_id = Some(payment_session_id);
        self.updated_at = Utc::now();
    }
}

/// What the client needs to hand the hosted checkout widget.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutSessionResponse {
    pub order_id: String,
    pub payment_session_id: String,
}

fn validate_phone(phone: &str) -> Result<(), ValidationError> {
    if phone.len() != 10 || !phone.chars().all(|c| c.is_ascii_digit()) {
        return Err(ValidationError::new("phone_must_be_ten_digits"));
    }
    Ok(())
}

fn validate_amount(amount: &Decimal) -> Result<(), ValidationError> {
    if amount.is_sign_negative() || amount.is_zero() {
        return Err(ValidationError::new("amount_must_be_positive"));
    }
    Ok(())
}
