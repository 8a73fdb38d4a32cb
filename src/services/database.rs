use anyhow::{anyhow, Result};
use chrono::NaiveDate;
use serde::Serialize;
use surrealdb::engine::local::{Db, File, Mem};
use surrealdb::Surreal;
use uuid::Uuid;

use crate::models::{booking::Booking, gym::Gym, order::Order};

/// Outcome of an attempt to reserve a booking. A conflict carries the
/// existing booking so callers can surface its date range.
#[derive(Debug)]
pub enum ReserveOutcome {
    Reserved(Booking),
    Conflict(Booking),
}

#[derive(Clone)]
pub struct DatabaseService {
    db: Surreal<Db>,
}

impl DatabaseService {
    pub async fn new(database_url: &str) -> Result<Self> {
        let db = if database_url.starts_with("memory://") {
            Surreal::new::<Mem>(()).await?
        } else if database_url.starts_with("file://") {
            let path = database_url.strip_prefix("file://").unwrap_or("gym-booking.db");
            Surreal::new::<File>(path).await?
        } else {
            return Err(anyhow!("Unsupported database URL: {}", database_url));
        };

        db.use_ns("gym_booking").use_db("main").await?;

        let service = Self { db };
        service.initialize_schema().await?;

        Ok(service)
    }

    /// Documents are stored schemaless; shape and invariants are enforced by
    /// the request validators before anything reaches this layer. The indexes
    /// back the lookups the booking flow leans on.
    async fn initialize_schema(&self) -> Result<()> {
        self.db
            .query(
                "
            DEFINE TABLE gyms SCHEMALESS;
            DEFINE INDEX unique_gym_id ON gyms COLUMNS gymId UNIQUE;
            DEFINE INDEX gym_owner ON gyms COLUMNS gymOwner;
        ",
            )
            .await?;

        self.db
            .query(
                "
            DEFINE TABLE bookings SCHEMALESS;
            DEFINE INDEX unique_booking_id ON bookings COLUMNS bookingId UNIQUE;
            DEFINE INDEX booking_user_gym ON bookings COLUMNS userId, gymId;
        ",
            )
            .await?;

        self.db
            .query(
                "
            DEFINE TABLE orders SCHEMALESS;
            DEFINE INDEX unique_order_id ON orders COLUMNS orderId UNIQUE;
            DEFINE INDEX order_user ON orders COLUMNS userId;
        ",
            )
            .await?;

        log::info!("Database schema initialized successfully");
        Ok(())
    }

    // Gym operations
    pub async fn create_gym(&self, gym: Gym) -> Result<Gym> {
        let created: Vec<Gym> = self.db.create("gyms").content(&gym).await?;
        created
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("Failed to create gym"))
    }

    pub async fn get_gym(&self, gym_id: &Uuid) -> Result<Option<Gym>> {
        let gym: Option<Gym> = self
            .db
            .query("SELECT * FROM gyms WHERE gymId = $gym_id LIMIT 1")
            .bind(("gym_id", gym_id.to_string()))
            .await?
            .take(0)?;
        Ok(gym)
    }

    pub async fn list_gyms(&self) -> Result<Vec<Gym>> {
        let gyms: Vec<Gym> = self
            .db
            .query("SELECT * FROM gyms WHERE isDeleted = false ORDER BY createdAt DESC")
            .await?
            .take(0)?;
        Ok(gyms)
    }

    pub async fn update_gym(&self, gym: &Gym) -> Result<Gym> {
        let updated: Option<Gym> = self
            .db
            .query("UPDATE gyms CONTENT $gym WHERE gymId = $gym_id RETURN AFTER")
            .bind(("gym", gym.clone()))
            .bind(("gym_id", gym.gym_id.to_string()))
            .await?
            .take(0)?;
        updated.ok_or_else(|| anyhow!("Gym not found: {}", gym.gym_id))
    }

    pub async fn soft_delete_gym(&self, gym_id: &Uuid) -> Result<bool> {
        match self.get_gym(gym_id).await? {
            Some(mut gym) if !gym.is_deleted => {
                gym.mark_deleted();
                self.update_gym(&gym).await?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    /// Gyms within `radius_km` of the given point, nearest first.
    pub async fn find_gyms_near(&self, lat: f64, lng: f64, radius_km: f64) -> Result<Vec<Gym>> {
        let gyms: Vec<Gym> = self
            .db
            .query(
                "SELECT *, geo::distance(type::point([coordinates.lng, coordinates.lat]), \
                 type::point([$lng, $lat])) AS distance \
                 FROM gyms WHERE isDeleted = false \
                 AND geo::distance(type::point([coordinates.lng, coordinates.lat]), \
                 type::point([$lng, $lat])) <= $radius \
                 ORDER BY distance ASC",
            )
            .bind(("lat", lat))
            .bind(("lng", lng))
            .bind(("radius", radius_km * 1000.0))
            .await?
            .take(0)?;
        Ok(gyms)
    }

    // Booking operations

    async fn bookings_for_user_gym(&self, user_id: &str, gym_id: &Uuid) -> Result<Vec<Booking>> {
        let bookings: Vec<Booking> = self
            .db
            .query(
                "SELECT * FROM bookings WHERE userId = $user_id AND gymId = $gym_id \
                 ORDER BY createdAt DESC",
            )
            .bind(("user_id", user_id.to_string()))
            .bind(("gym_id", gym_id.to_string()))
            .await?
            .take(0)?;
        Ok(bookings)
    }

    /// The advisory pre-flight check: the latest non-cancelled booking for
    /// this user and gym that has not ended before `on`.
    pub async fn active_booking(
        &self,
        user_id: &str,
        gym_id: &Uuid,
        on: NaiveDate,
    ) -> Result<Option<Booking>> {
        let bookings = self.bookings_for_user_gym(user_id, gym_id).await?;
        Ok(bookings
            .into_iter()
            .find(|booking| booking.blocks_new_booking() && booking.end_date >= on))
    }

    pub async fn find_conflicting_booking(
        &self,
        user_id: &str,
        gym_id: &Uuid,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Option<Booking>> {
        let bookings = self.bookings_for_user_gym(user_id, gym_id).await?;
        Ok(bookings
            .into_iter()
            .find(|booking| booking.blocks_new_booking() && booking.overlaps(start_date, end_date)))
    }

    /// Reserve-or-reject: the conflict check and the booking creation run in
    /// one transaction, so two concurrent checkouts for the same user and
    /// gym cannot both get a reservation.
    pub async fn reserve_booking(&self, booking: Booking) -> Result<ReserveOutcome> {
        let result = self
            .db
            .query(
                "BEGIN TRANSACTION; \
                 LET $existing = (SELECT * FROM bookings WHERE userId = $user_id \
                 AND gymId = $gym_id AND status != 'Cancelled' \
                 AND startDate <= $end_date AND endDate >= $start_date); \
                 IF array::len($existing) > 0 { THROW \"booking_conflict\" }; \
                 CREATE bookings CONTENT $booking; \
                 COMMIT TRANSACTION;",
            )
            .bind(("user_id", booking.user_id.clone()))
            .bind(("gym_id", booking.gym_id.to_string()))
            .bind(("start_date", booking.start_date))
            .bind(("end_date", booking.end_date))
            .bind(("booking", booking.clone()))
            .await?;

        match result.check() {
            Ok(_) => Ok(ReserveOutcome::Reserved(booking)),
            Err(e) if e.to_string().contains("booking_conflict") => {
                let existing = self
                    .find_conflicting_booking(
                        &booking.user_id,
                        &booking.gym_id,
                        booking.start_date,
                        booking.end_date,
                    )
                    .await?
                    .ok_or_else(|| anyhow!("Booking conflict detected but no longer present"))?;
                log::info!(
                    "Rejected booking for user {} at gym {}: conflicts with {} .. {}",
                    booking.user_id,
                    booking.gym_id,
                    existing.start_date,
                    existing.end_date
                );
                Ok(ReserveOutcome::Conflict(existing))
            }
            Err(e) => Err(e.into()),
        }
    }

    pub async fn get_booking(&self, booking_id: &Uuid) -> Result<Option<Booking>> {
        let booking: Option<Booking> = self
            .db
            .query("SELECT * FROM bookings WHERE bookingId = $booking_id LIMIT 1")
            .bind(("booking_id", booking_id.to_string()))
            .await?
            .take(0)?;
        Ok(booking)
    }

    pub async fn bookings_by_user(&self, user_id: &str) -> Result<Vec<Booking>> {
        let bookings: Vec<Booking> = self
            .db
            .query("SELECT * FROM bookings WHERE userId = $user_id ORDER BY createdAt DESC")
            .bind(("user_id", user_id.to_string()))
            .await?
            .take(0)?;
        Ok(bookings)
    }

    pub async fn update_booking(&self, booking: &Booking) -> Result<Booking> {
        let updated: Option<Booking> = self
            .db
            .query("UPDATE bookings CONTENT $booking WHERE bookingId = $booking_id RETURN AFTER")
            .bind(("booking", booking.clone()))
            .bind(("booking_id", booking.booking_id.to_string()))
            .await?
            .take(0)?;
        updated.ok_or_else(|| anyhow!("Booking not found: {}", booking.booking_id))
    }

    // Order operations
    pub async fn create_order(&self, order: Order) -> Result<Order> {
        let created: Vec<Order> = self.db.create("orders").content(&order).await?;
        created
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("Failed to create order"))
    }

    pub async fn get_order(&self, order_id: &str) -> Result<Option<Order>> {
        let order: Option<Order> = self
            .db
            .query("SELECT * FROM orders WHERE orderId = $order_id LIMIT 1")
            .bind(("order_id", order_id.to_string()))
            .await?
            .take(0)?;
        Ok(order)
    }

    pub async fn orders_by_user(&self, user_id: &str) -> Result<Vec<Order>> {
        let orders: Vec<Order> = self
            .db
            .query("SELECT * FROM orders WHERE userId = $user_id ORDER BY createdAt DESC")
            .bind(("user_id", user_id.to_string()))
            .await?
            .take(0)?;
        Ok(orders)
    }

    pub async fn update_order(&self, order: &Order) -> Result<Order> {
        let updated: Option<Order> = self
            .db
            .query("UPDATE orders CONTENT $order WHERE orderId = $order_id RETURN AFTER")
            .bind(("order", order.clone()))
            .bind(("order_id", order.order_id.clone()))
            .await?
            .take(0)?;
        updated.ok_or_else(|| anyhow!("Order not found: {}", order.order_id))
    }

    // Utility methods
    pub async fn health_check(&self) -> Result<()> {
        self.db.health().await?;
        Ok(())
    }

    pub async fn get_statistics(&self) -> Result<DatabaseStats> {
        let gym_count: Vec<serde_json::Value> = self
            .db
            .query("SELECT count() FROM gyms WHERE isDeleted = false GROUP ALL")
            .await?
            .take(0)?;

        let booking_count: Vec<serde_json::Value> = self
            .db
            .query("SELECT count() FROM bookings GROUP ALL")
            .await?
            .take(0)?;

        let order_count: Vec<serde_json::Value> = self
            .db
            .query("SELECT count() FROM orders GROUP ALL")
            .await?
            .take(0)?;

        let active_bookings: Vec<serde_json::Value> = self
            .db
            .query("SELECT count() FROM bookings WHERE status = 'Active' GROUP ALL")
            .await?
            .take(0)?;

        Ok(DatabaseStats {
            total_gyms: extract_count(&gym_count),
            total_bookings: extract_count(&booking_count),
            total_orders: extract_count(&order_count),
            active_bookings: extract_count(&active_bookings),
        })
    }
}

#[derive(Debug, Serialize)]
pub struct DatabaseStats {
    pub total_gyms: u64,
    pub total_bookings: u64,
    pub total_orders: u64,
    pub active_bookings: u64,
}

fn extract_count(result: &[serde_json::Value]) -> u64 {
    result
        .first()
        .and_then(|v| v.get("count"))
        .and_then(|v| v.as_u64())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::booking::BookedSlot;
    use crate::models::common::{CurrencyCode, Plan};
    use crate::models::gym::{
        Address, Amenity, Coordinates, CreateGymRequest, Currency, GymImage, OperatingPeriod,
        RateTable, TimeSlot, Timings,
    };
    use crate::models::order::OrderStatus;
    use chrono::{TimeZone, Utc};
    use rust_decimal::Decimal;

    fn gym_request(name: &str) -> CreateGymRequest {
        let period = |open: u32, close: u32| OperatingPeriod {
            opening_time: Utc.with_ymd_and_hms(2024, 1, 1, open, 0, 0).unwrap(),
            closing_time: Utc.with_ymd_and_hms(2024, 1, 1, close, 0, 0).unwrap(),
            slots: vec![TimeSlot {
                start: "06:00".to_string(),
                end: "07:00".to_string(),
                max_people: 10,
            }],
        };
        CreateGymRequest {
            gym_name: name.to_string(),
            address: Address {
                location: "MG Road, Bengaluru".to_string(),
                place_id: None,
                street: None,
            },
            coordinates: Coordinates {
                lat: 12.9716,
                lng: 77.5946,
            },
            pricing: RateTable {
                hourly_rate: Decimal::from(200),
                weekly_rate: Decimal::from(1000),
                monthly_rate: Decimal::from(3000),
            },
            personal_trainer_pricing: RateTable {
                hourly_rate: Decimal::from(500),
                weekly_rate: Decimal::from(2500),
                monthly_rate: Decimal::from(7500),
            },
            timings: Timings {
                morning: period(6, 11),
                evening: period(16, 22),
            },
            currency: Currency::default(),
            description: "A well equipped gym".to_string(),
            gym_owner: "owner-1".to_string(),
            images: GymImage {
                url: "https://example.com/gym.jpg".to_string(),
                public_id: "gym-1".to_string(),
            },
            amenities: vec![Amenity {
                id: "parking".to_string(),
                label: "Parking".to_string(),
                checked: true,
            }],
        }
    }

    fn booking(user_id: &str, gym_id: Uuid, start: NaiveDate, end: NaiveDate) -> Booking {
        Booking::new(
            user_id.to_string(),
            gym_id,
            "Iron Temple".to_string(),
            Plan::Weekly,
            start,
            end,
            start,
            Decimal::from(1000),
            CurrencyCode::Inr,
            vec![BookedSlot {
                date: start,
                time: "06:00 - 07:00".to_string(),
                slot_id: "slot-0".to_string(),
            }],
        )
    }

    fn jan(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    #[tokio::test]
    async fn gym_crud_and_soft_delete() {
        let db = DatabaseService::new("memory://").await.unwrap();

        let gym = db.create_gym(Gym::new(gym_request("Iron Temple"))).await.unwrap();
        let fetched = db.get_gym(&gym.gym_id).await.unwrap().unwrap();
        assert_eq!(fetched.gym_name, "Iron Temple");

        let mut renamed = fetched.clone();
        renamed.apply(gym_request("Iron Temple Annex"));
        let updated = db.update_gym(&renamed).await.unwrap();
        assert_eq!(updated.gym_name, "Iron Temple Annex");

        assert!(db.soft_delete_gym(&gym.gym_id).await.unwrap());
        assert!(db.list_gyms().await.unwrap().is_empty());
        // A second delete is a no-op.
        assert!(!db.soft_delete_gym(&gym.gym_id).await.unwrap());
    }

    #[tokio::test]
    async fn reserve_rejects_overlapping_booking() {
        let db = DatabaseService::new("memory://").await.unwrap();
        let gym_id = Uuid::new_v4();

        let first = booking("user-1", gym_id, jan(1), jan(7));
        match db.reserve_booking(first.clone()).await.unwrap() {
            ReserveOutcome::Reserved(_) => {}
            ReserveOutcome::Conflict(_) => panic!("first booking must reserve"),
        }

        let overlapping = booking("user-1", gym_id, jan(5), jan(11));
        match db.reserve_booking(overlapping).await.unwrap() {
            ReserveOutcome::Conflict(existing) => {
                assert_eq!(existing.start_date, jan(1));
                assert_eq!(existing.end_date, jan(7));
            }
            ReserveOutcome::Reserved(_) => panic!("overlap must be rejected"),
        }

        // A disjoint range for the same user and gym reserves fine.
        let later = booking("user-1", gym_id, jan(20), jan(26));
        assert!(matches!(
            db.reserve_booking(later).await.unwrap(),
            ReserveOutcome::Reserved(_)
        ));

        // Another user is unaffected by the first user's bookings.
        let other_user = booking("user-2", gym_id, jan(5), jan(11));
        assert!(matches!(
            db.reserve_booking(other_user).await.unwrap(),
            ReserveOutcome::Reserved(_)
        ));
    }

    #[tokio::test]
    async fn cancelled_booking_releases_the_range() {
        let db = DatabaseService::new("memory://").await.unwrap();
        let gym_id = Uuid::new_v4();

        let mut first = booking("user-1", gym_id, jan(1), jan(7));
        db.reserve_booking(first.clone()).await.unwrap();
        first.cancel();
        db.update_booking(&first).await.unwrap();

        let retry = booking("user-1", gym_id, jan(3), jan(9));
        assert!(matches!(
            db.reserve_booking(retry).await.unwrap(),
            ReserveOutcome::Reserved(_)
        ));
    }

    #[tokio::test]
    async fn advisory_check_ignores_expired_bookings() {
        let db = DatabaseService::new("memory://").await.unwrap();
        let gym_id = Uuid::new_v4();

        let past = booking("user-1", gym_id, jan(1), jan(7));
        db.reserve_booking(past).await.unwrap();

        assert!(db
            .active_booking("user-1", &gym_id, jan(5))
            .await
            .unwrap()
            .is_some());
        assert!(db
            .active_booking("user-1", &gym_id, jan(10))
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn order_lifecycle() {
        use crate::models::order::CreateOrderRequest;

        let db = DatabaseService::new("memory://").await.unwrap();

        let request: CreateOrderRequest = serde_json::from_value(serde_json::json!({
            "userId": "user-1",
            "buyerName": "Gym User",
            "email": "user@example.com",
            "phone": "9876543210",
            "gymId": Uuid::new_v4().to_string(),
            "selectedPlan": "Hourly Plan",
            "amount": 600,
            "baseAmount": 200,
            "numberOfSlots": 3,
            "currency": "INR",
            "startDate": "2024-01-01",
            "endDate": "2024-01-01",
            "gymNames": "Iron Temple",
            "bookingDate": "2024-01-01",
            "bookingTimeSlots": []
        }))
        .unwrap();

        let mut order = db
            .create_order(Order::new(&request, Uuid::new_v4()))
            .await
            .unwrap();

        order.set_gateway_session("cf_123".to_string(), "session_abc".to_string());
        order.update_status(OrderStatus::Paid, None);
        db.update_order(&order).await.unwrap();

        let stored = db.get_order(&order.order_id).await.unwrap().unwrap();
        assert_eq!(stored.cf_order_id.as_deref(), Some("cf_123"));
        assert_eq!(stored.payment_session_id.as_deref(), Some("session_abc"));
        assert_eq!(stored.status, OrderStatus::Paid);
        assert!(stored.completed_at.is_some());

        assert_eq!(db.orders_by_user("user-1").await.unwrap().len(), 1);
    }
}
