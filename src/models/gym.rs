use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::models::common::CurrencyCode;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Address {
    pub location: String,
    pub place_id: Option<String>,
    pub street: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

/// Hourly/weekly/monthly rates. The same shape backs both the base pricing
/// and the personal-trainer pricing of a gym.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RateTable {
    #[validate(custom = "validate_rate")]
    pub hourly_rate: Decimal,
    #[validate(custom = "validate_rate")]
    pub weekly_rate: Decimal,
    #[validate(custom = "validate_rate")]
    pub monthly_rate: Decimal,
}

impl Default for RateTable {
    fn default() -> Self {
        Self {
            hourly_rate: Decimal::ZERO,
            weekly_rate: Decimal::ZERO,
            monthly_rate: Decimal::ZERO,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeSlot {
    pub start: String,
    pub end: String,
    pub max_people: u32,
}

/// One operating window (morning or evening) with its bookable slots.
/// The closing instant must lie strictly after the opening instant.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_period_order"))]
pub struct OperatingPeriod {
    pub opening_time: DateTime<Utc>,
    pub closing_time: DateTime<Utc>,
    #[serde(default)]
    pub slots: Vec<TimeSlot>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct Timings {
    #[validate]
    pub morning: OperatingPeriod,
    #[validate]
    pub evening: OperatingPeriod,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Currency {
    #[serde(rename = "name")]
    pub code: CurrencyCode,
    pub symbol: String,
}

impl Default for Currency {
    fn default() -> Self {
        Self {
            code: CurrencyCode::Inr,
            symbol: "₹".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Amenity {
    pub id: String,
    pub label: String,
    pub checked: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GymImage {
    pub url: String,
    pub public_id: String,
}

/// The persisted gym document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Gym {
    pub gym_id: Uuid,
    pub gym_name: String,
    pub address: Address,
    pub coordinates: Coordinates,
    pub pricing: RateTable,
    pub personal_trainer_pricing: RateTable,
    pub timings: Timings,
    pub currency: Currency,
    pub description: String,
    pub gym_owner: String,
    pub is_deleted: bool,
    pub images: GymImage,
    pub amenities: Vec<Amenity>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateGymRequest {
    #[validate(length(min = 1, message = "Gym Name is required"))]
    pub gym_name: String,
    pub address: Address,
    pub coordinates: Coordinates,
    #[validate]
    pub pricing: RateTable,
    #[validate]
    pub personal_trainer_pricing: RateTable,
    #[validate]
    pub timings: Timings,
    #[serde(default)]
    pub currency: Currency,
    #[validate(length(
        max = 500,
        message = "Description cannot be more than 500 characters"
    ))]
    pub description: String,
    pub gym_owner: String,
    pub images: GymImage,
    #[serde(default)]
    pub amenities: Vec<Amenity>,
}

impl Gym {
    pub fn new(request: CreateGymRequest) -> Self {
        let now = Utc::now();
        Self {
            gym_id: Uuid::new_v4(),
            gym_name: request.gym_name.trim().to_string(),
            address: request.address,
            coordinates: request.coordinates,
            pricing: request.pricing,
            personal_trainer_pricing: request.personal_trainer_pricing,
            timings: request.timings,
            currency: request.currency,
            description: request.description,
            gym_owner: request.gym_owner,
            is_deleted: false,
            images: request.images,
            amenities: request.amenities,
            created_at: now,
            updated_at: now,
        }
    }

    /// Replace the mutable parts of the record, keeping identity and
    /// creation time.
    pub fn apply(&mut self, request: CreateGymRequest) {
        self.gym_name = request.gym_name.trim().to_string();
        self.address = request.address;
        self.coordinates = request.coordinates;
        self.pricing = request.pricing;
        self.personal_trainer_pricing = request.personal_trainer_pricing;
        self.timings = request.timings;
        self.currency = request.currency;
        self.description = request.description;
        self.gym_owner = request.gym_owner;
        self.images = request.images;
        self.amenities = request.amenities;
        self.updated_at = Utc::now();
    }

    pub fn mark_deleted(&mut self) {
        self.is_deleted = true;
        self.updated_at = Utc::now();
    }
}

/// What the booking page needs to render plan cards: both rate tables plus
/// display defaults for records missing a name or a currency symbol.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PricingResponse {
    pub gym_name: String,
    pub pricing: RateTable,
    pub personal_trainer_pricing: RateTable,
    pub currency: Currency,
}

impl PricingResponse {
    pub fn from_gym(gym: &Gym) -> Self {
        let gym_name = if gym.gym_name.trim().is_empty() {
            "Unknown Gym".to_string()
        } else {
            gym.gym_name.clone()
        };
        let mut currency = gym.currency.clone();
        if currency.symbol.trim().is_empty() {
            currency.symbol = currency.code.symbol().to_string();
        }
        Self {
            gym_name,
            pricing: gym.pricing.clone(),
            personal_trainer_pricing: gym.personal_trainer_pricing.clone(),
            currency,
        }
    }
}

fn validate_rate(rate: &Decimal) -> Result<(), ValidationError> {
    if rate.is_sign_negative() {
        return Err(ValidationError::new("rate_must_not_be_negative"));
    }
    Ok(())
}

fn validate_period_order(period: &OperatingPeriod) -> Result<(), ValidationError> {
    if period.closing_time <= period.opening_time {
        return Err(ValidationError::new("closing_time_must_be_after_opening_time"));
    }
    Ok(())
}
