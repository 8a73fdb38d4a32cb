use chrono::{DateTime, Duration, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::common::{CurrencyCode, Plan};

/// One slot the user picked on the booking calendar.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectedSlot {
    pub time: String,
    pub slot_id: String,
}

/// The user's ephemeral choice of a date and time slots, made before a plan
/// is priced. It lives for one checkout attempt only.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingSelection {
    pub selected_date: NaiveDate,
    #[serde(default)]
    pub selected_time: Vec<SelectedSlot>,
}

impl BookingSelection {
    /// Slot count used in price arithmetic. An empty selection still counts
    /// as one slot.
    pub fn slot_count(&self) -> u32 {
        self.selected_time.len().max(1) as u32
    }

    pub fn is_empty(&self) -> bool {
        self.selected_time.is_empty()
    }
}

/// A slot as recorded on a confirmed booking.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookedSlot {
    pub date: NaiveDate,
    pub time: String,
    pub slot_id: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum BookingStatus {
    Pending,
    Active,
    Cancelled,
    Completed,
}

/// A reserved or paid booking for a user at a gym.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub booking_id: Uuid,
    pub user_id: String,
    pub gym_id: Uuid,
    pub gym_name: String,
    pub plan: Plan,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub booking_date: NaiveDate,
    pub amount: Decimal,
    pub currency: CurrencyCode,
    pub slots: Vec<BookedSlot>,
    pub status: BookingStatus,
    pub order_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Booking {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        user_id: String,
        gym_id: Uuid,
        gym_name: String,
        plan: Plan,
        start_date: NaiveDate,
        end_date: NaiveDate,
        booking_date: NaiveDate,
        amount: Decimal,
        currency: CurrencyCode,
        slots: Vec<BookedSlot>,
    ) -> Self {
        let now = Utc::now();
        Self {
            booking_id: Uuid::new_v4(),
            user_id,
            gym_id,
            gym_name,
            plan,
            start_date,
            end_date,
            booking_date,
            amount,
            currency,
            slots,
            status: BookingStatus::Pending,
            order_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Date-range overlap against another candidate range, inclusive on both
    /// ends.
    pub fn overlaps(&self, start: NaiveDate, end: NaiveDate) -> bool {
        self.start_date <= end && self.end_date >= start
    }

    /// Whether this booking still blocks a new one for the same user and
    /// gym. Only cancellation releases the range.
    pub fn blocks_new_booking(&self) -> bool {
        self.status != BookingStatus::Cancelled
    }

    pub fn link_order(&mut self, order_id: String) {
        self.order_id = Some(order_id);
        self.updated_at = Utc::now();
    }

    pub fn activate(&mut self) {
        self.status = BookingStatus::Active;
        self.updated_at = Utc::now();
    }

    pub fn cancel(&mut self) {
        self.status = BookingStatus::Cancelled;
        self.updated_at = Utc::now();
    }
}

/// Wire shape of the advisory conflict check. A conflict is reported as
/// data in a successful response, never as an error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConflictCheckResponse {
    pub conflict: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub booking: Option<ConflictingBooking>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConflictingBooking {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl ConflictCheckResponse {
    pub fn clear() -> Self {
        Self {
            conflict: false,
            booking: None,
        }
    }

    pub fn conflicting(booking: &Booking) -> Self {
        Self {
            conflict: true,
            booking: Some(ConflictingBooking {
                start_date: booking.start_date,
                end_date: booking.end_date,
            }),
        }
    }
}

/// Price a plan against a gym for a given selection.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteRequest {
    pub gym_id: Uuid,
    pub plan: Plan,
    #[serde(flatten)]
    pub selection: BookingSelection,
}

pub fn default_end_date(plan: Plan, start: NaiveDate) -> NaiveDate {
    start + Duration::days(plan.duration_days())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn selection(slots: usize) -> BookingSelection {
        BookingSelection {
            selected_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            selected_time: (0..slots)
                .map(|i| SelectedSlot {
                    time: format!("0{}:00 - 0{}:00", i + 6, i + 7),
                    slot_id: format!("slot-{}", i),
                })
                .collect(),
        }
    }

    fn booking(start: (i32, u32, u32), end: (i32, u32, u32)) -> Booking {
        Booking::new(
            "user-1".to_string(),
            Uuid::new_v4(),
            "Iron Temple".to_string(),
            Plan::Weekly,
            NaiveDate::from_ymd_opt(start.0, start.1, start.2).unwrap(),
            NaiveDate::from_ymd_opt(end.0, end.1, end.2).unwrap(),
            NaiveDate::from_ymd_opt(start.0, start.1, start.2).unwrap(),
            Decimal::from(1000),
            CurrencyCode::Inr,
            Vec::new(),
        )
    }

    #[test]
    fn slot_count_defaults_to_one() {
        assert_eq!(selection(0).slot_count(), 1);
        assert_eq!(selection(1).slot_count(), 1);
        assert_eq!(selection(3).slot_count(), 3);
        assert!(selection(0).is_empty());
    }

    #[test]
    fn overlap_is_inclusive() {
        let existing = booking((2024, 1, 1), (2024, 1, 7));

        let jan = |d| NaiveDate::from_ymd_opt(2024, 1, d).unwrap();
        assert!(existing.overlaps(jan(7), jan(13)));
        assert!(existing.overlaps(jan(1), jan(1)));
        assert!(existing.overlaps(jan(5), jan(6)));
        assert!(!existing.overlaps(jan(8), jan(14)));
    }

    #[test]
    fn cancelled_bookings_release_the_range() {
        let mut existing = booking((2024, 1, 1), (2024, 1, 7));
        assert!(existing.blocks_new_booking());
        existing.cancel();
        assert!(!existing.blocks_new_booking());
    }

    #[test]
    fn end_date_follows_plan_duration() {
        let start = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        assert_eq!(default_end_date(Plan::Hourly, start), start);
        assert_eq!(
            default_end_date(Plan::Weekly, start),
            NaiveDate::from_ymd_opt(2024, 3, 7).unwrap()
        );
        assert_eq!(
            default_end_date(Plan::Monthly, start),
            NaiveDate::from_ymd_opt(2024, 3, 31).unwrap()
        );
    }

    #[test]
    fn conflict_response_carries_the_existing_range() {
        let existing = booking((2024, 1, 1), (2024, 1, 7));
        let response = ConflictCheckResponse::conflicting(&existing);
        assert!(response.conflict);
        let range = response.booking.unwrap();
        assert_eq!(range.start_date, existing.start_date);
        assert_eq!(range.end_date, existing.end_date);

        let clear = ConflictCheckResponse::clear();
        assert!(!clear.conflict);
        assert!(clear.booking.is_none());
    }
}
