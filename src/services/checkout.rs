use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;

use crate::models::{
    booking::{default_end_date, Booking, BookingSelection},
    common::Plan,
    gym::Gym,
    order::{CheckoutSessionResponse, CreateOrderRequest, Order, OrderStatus},
};
use crate::services::cashfree::{
    extract_order_status, CashfreePaymentService, PaymentWebhookPayload,
};
use crate::services::database::{DatabaseService, ReserveOutcome};

#[derive(Debug, Error)]
pub enum CheckoutError {
    /// Rejected before anything was reserved or any gateway call was made.
    #[error("{0}")]
    Validation(String),
    /// The gateway call failed; the reservation has been released.
    #[error("payment gateway error: {0}")]
    Gateway(anyhow::Error),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

/// A priced plan for a concrete slot selection.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    pub plan: Plan,
    pub base_rate: Decimal,
    pub number_of_slots: u32,
    pub total: Decimal,
    pub currency_symbol: String,
    pub display_total: String,
}

/// Price a plan: base rate × slot count. An empty selection cannot be
/// priced; a non-empty one counts at least one slot.
pub fn quote(gym: &Gym, plan: Plan, selection: &BookingSelection) -> Result<Quote, CheckoutError> {
    if selection.is_empty() {
        return Err(CheckoutError::Validation(
            "Please select at least one time slot first".to_string(),
        ));
    }

    let base_rate = plan.base_rate(&gym.pricing, &gym.personal_trainer_pricing);
    let number_of_slots = selection.slot_count();
    let total = base_rate * Decimal::from(number_of_slots);

    let currency_symbol = if gym.currency.symbol.trim().is_empty() {
        gym.currency.code.symbol().to_string()
    } else {
        gym.currency.symbol.clone()
    };
    let display_total = format!("{}{}", currency_symbol, total);

    Ok(Quote {
        plan,
        base_rate,
        number_of_slots,
        total,
        currency_symbol,
        display_total,
    })
}

/// How a checkout attempt ended. A conflict is a normal outcome carrying the
/// existing booking's range; only the redirect leaves the flow successfully.
#[derive(Debug)]
pub enum CheckoutOutcome {
    RedirectToCheckout(CheckoutSessionResponse),
    Conflict {
        start_date: NaiveDate,
        end_date: NaiveDate,
    },
}

/// Drives a checkout attempt end to end: amount verification, atomic
/// reservation, gateway order creation, and the payment events that settle
/// the attempt later.
#[derive(Clone)]
pub struct CheckoutService {
    db: DatabaseService,
    gateway: CashfreePaymentService,
}

impl CheckoutService {
    pub fn new(db: DatabaseService, gateway: CashfreePaymentService) -> Self {
        Self { db, gateway }
    }

    pub async fn checkout(
        &self,
        gym: &Gym,
        request: CreateOrderRequest,
    ) -> Result<CheckoutOutcome, CheckoutError> {
        let slot_count = request.number_of_slots.max(1);
        let base_rate = request
            .selected_plan
            .base_rate(&gym.pricing, &gym.personal_trainer_pricing);
        let expected_total = base_rate * Decimal::from(slot_count);

        // The client computed these for display; the gym record is
        // authoritative for what gets charged.
        if request.base_amount != base_rate || request.amount != expected_total {
            return Err(CheckoutError::Validation(format!(
                "Amount mismatch for {}: expected {} × {} = {}",
                request.selected_plan, base_rate, slot_count, expected_total
            )));
        }

        let end_date = default_end_date(request.selected_plan, request.start_date);
        if request.end_date != end_date {
            log::warn!(
                "Client end date {} differs from derived {} for {}; using derived",
                request.end_date,
                end_date,
                request.selected_plan
            );
        }

        let booking = Booking::new(
            request.user_id.clone(),
            gym.gym_id,
            gym.gym_name.clone(),
            request.selected_plan,
            request.start_date,
            end_date,
            request.booking_date,
            expected_total,
            request.currency,
            request.booking_time_slots.clone(),
        );

        let mut reserved = match self.db.reserve_booking(booking).await? {
            ReserveOutcome::Conflict(existing) => {
                return Ok(CheckoutOutcome::Conflict {
                    start_date: existing.start_date,
                    end_date: existing.end_date,
                });
            }
            ReserveOutcome::Reserved(booking) => booking,
        };

        let mut order = self
            .db
            .create_order(Order::new(&request, reserved.booking_id))
            .await?;

        match self.gateway.create_order(&order, &request).await {
            Ok(gateway_order) => {
                order.set_gateway_session(
                    gateway_order.cf_order_id,
                    gateway_order.payment_session_id.clone(),
                );
                self.db.update_order(&order).await?;

                reserved.link_order(order.order_id.clone());
                self.db.update_booking(&reserved).await?;

                Ok(CheckoutOutcome::RedirectToCheckout(CheckoutSessionResponse {
                    order_id: order.order_id,
                    payment_session_id: gateway_order.payment_session_id,
                }))
            }
            Err(e) => {
                // Release the reservation so the user can start the flow
                // over; the failed order stays for audit.
                order.update_status(OrderStatus::Failed, Some(e.to_string()));
                let _ = self.db.update_order(&order).await;
                reserved.cancel();
                let _ = self.db.update_booking(&reserved).await;
                Err(CheckoutError::Gateway(e))
            }
        }
    }

    /// Apply a verified webhook event: settle the order and move the
    /// reserved booking along with it.
    pub async fn apply_payment_event(
        &self,
        webhook: &PaymentWebhookPayload,
    ) -> Result<Order, CheckoutError> {
        let order_id = &webhook.data.order.order_id;
        let mut order = self
            .db
            .get_order(order_id)
            .await?
            .ok_or_else(|| CheckoutError::Validation(format!("Unknown order: {}", order_id)))?;

        if let Some(amount) = webhook.data.order.order_amount {
            if Decimal::try_from(amount).ok() != Some(order.amount) {
                log::warn!(
                    "Webhook amount {} differs from order amount {} for {}",
                    amount,
                    order.amount,
                    order_id
                );
            }
        }
        if let Some(currency) = &webhook.data.order.order_currency {
            if *currency != order.currency.to_string() {
                log::warn!(
                    "Webhook currency {} differs from order currency {} for {}",
                    currency,
                    order.currency,
                    order_id
                );
            }
        }

        let status = OrderStatus::from_payment_status(&webhook.data.payment.payment_status);
        let failure_reason = if status == OrderStatus::Paid {
            None
        } else {
            webhook.data.payment.payment_message.clone()
        };

        order.update_status(status, failure_reason);
        self.db.update_order(&order).await?;

        match status {
            OrderStatus::Paid => self.settle_booking(&order, true).await?,
            OrderStatus::Failed | OrderStatus::Cancelled | OrderStatus::Expired => {
                self.settle_booking(&order, false).await?
            }
            OrderStatus::Created => {}
        }

        log::info!(
            "Order {} settled as {:?} (gateway payment {:?})",
            order.order_id,
            order.status,
            webhook.data.payment.cf_payment_id
        );

        Ok(order)
    }

    /// Current order state, refreshed from the gateway when the order is
    /// still open and has a session.
    pub async fn refresh_order_status(
        &self,
        order_id: &str,
    ) -> Result<Option<Order>, CheckoutError> {
        let mut order = match self.db.get_order(order_id).await? {
            Some(order) => order,
            None => return Ok(None),
        };

        if order.status.is_final() || order.payment_session_id.is_none() {
            return Ok(Some(order));
        }

        let body = self
            .gateway
            .order_status(order_id)
            .await
            .map_err(CheckoutError::Gateway)?;

        let status_str = match extract_order_status(&body) {
            Some(status) => status,
            None => return Ok(Some(order)),
        };

        let status = OrderStatus::from_gateway_order_status(status_str);
        if status != order.status {
            order.update_status(status, None);
            self.db.update_order(&order).await?;
            if status == OrderStatus::Paid {
                self.settle_booking(&order, true).await?;
            }
        }

        Ok(Some(order))
    }

    /// Move the booking behind an order to its settled state: active after
    /// payment, cancelled when the attempt died.
    async fn settle_booking(&self, order: &Order, paid: bool) -> Result<(), CheckoutError> {
        match self.db.get_booking(&order.booking_id).await? {
            Some(mut booking) => {
                if paid {
                    booking.activate();
                } else {
                    booking.cancel();
                }
                self.db.update_booking(&booking).await?;
                Ok(())
            }
            None => {
                log::warn!(
                    "Order {} references missing booking {}",
                    order.order_id,
                    order.booking_id
                );
                Ok(())
            }
        }
    }
}
