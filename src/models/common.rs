use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::gym::RateTable;

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
            error: None,
        }
    }

    pub fn success_with_message(data: T, message: String) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: Some(message),
            error: None,
        }
    }

    pub fn error(error: String) -> Self {
        Self {
            success: false,
            data: None,
            message: None,
            error: Some(error),
        }
    }
}

/// Currency codes a gym may be priced in. Anything outside this set is
/// rejected at deserialization time.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum CurrencyCode {
    Inr,
    Usd,
    Eur,
    Gbp,
    Jpy,
    Rub,
    Krw,
}

impl CurrencyCode {
    pub fn symbol(&self) -> &'static str {
        match self {
            CurrencyCode::Inr => "₹",
            CurrencyCode::Usd => "$",
            CurrencyCode::Eur => "€",
            CurrencyCode::Gbp => "£",
            CurrencyCode::Jpy => "¥",
            CurrencyCode::Rub => "₽",
            CurrencyCode::Krw => "₩",
        }
    }
}

impl Default for CurrencyCode {
    fn default() -> Self {
        CurrencyCode::Inr
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let code = match self {
            CurrencyCode::Inr => "INR",
            CurrencyCode::Usd => "USD",
            CurrencyCode::Eur => "EUR",
            CurrencyCode::Gbp => "GBP",
            CurrencyCode::Jpy => "JPY",
            CurrencyCode::Rub => "RUB",
            CurrencyCode::Krw => "KRW",
        };
        write!(f, "{}", code)
    }
}

/// A bookable plan: billing period crossed with trainer inclusion. Each
/// variant maps to exactly one rate field on the gym record, so resolving a
/// plan to its rate is a direct lookup rather than name matching.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Plan {
    #[serde(rename = "Hourly Plan")]
    Hourly,
    #[serde(rename = "Hourly Plan With Trainer")]
    HourlyWithTrainer,
    #[serde(rename = "Weekly Plan")]
    Weekly,
    #[serde(rename = "Weekly Plan With Trainer")]
    WeeklyWithTrainer,
    #[serde(rename = "Monthly Plan")]
    Monthly,
    #[serde(rename = "Monthly Plan With Trainer")]
    MonthlyWithTrainer,
}

impl Plan {
    pub const ALL: [Plan; 6] = [
        Plan::Hourly,
        Plan::HourlyWithTrainer,
        Plan::Weekly,
        Plan::WeeklyWithTrainer,
        Plan::Monthly,
        Plan::MonthlyWithTrainer,
    ];

    pub fn with_trainer(&self) -> bool {
        matches!(
            self,
            Plan::HourlyWithTrainer | Plan::WeeklyWithTrainer | Plan::MonthlyWithTrainer
        )
    }

    /// The one rate this plan bills at, taken from the trainer table for
    /// trainer variants and the base table otherwise.
    pub fn base_rate(&self, pricing: &RateTable, trainer_pricing: &RateTable) -> Decimal {
        let table = if self.with_trainer() {
            trainer_pricing
        } else {
            pricing
        };
        match self {
            Plan::Hourly | Plan::HourlyWithTrainer => table.hourly_rate,
            Plan::Weekly | Plan::WeeklyWithTrainer => table.weekly_rate,
            Plan::Monthly | Plan::MonthlyWithTrainer => table.monthly_rate,
        }
    }

    /// Days the plan adds to its start date. An hourly booking ends the day
    /// it starts.
    pub fn duration_days(&self) -> i64 {
        match self {
            Plan::Hourly | Plan::HourlyWithTrainer => 0,
            Plan::Weekly | Plan::WeeklyWithTrainer => 6,
            Plan::Monthly | Plan::MonthlyWithTrainer => 30,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Plan::Hourly => "Hourly Plan",
            Plan::HourlyWithTrainer => "Hourly Plan With Trainer",
            Plan::Weekly => "Weekly Plan",
            Plan::WeeklyWithTrainer => "Weekly Plan With Trainer",
            Plan::Monthly => "Monthly Plan",
            Plan::MonthlyWithTrainer => "Monthly Plan With Trainer",
        }
    }
}

impl fmt::Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Plan {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Plan::ALL
            .iter()
            .copied()
            .find(|plan| plan.name() == s)
            .ok_or_else(|| format!("unknown plan name: {}", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rates(hourly: i64, weekly: i64, monthly: i64) -> RateTable {
        RateTable {
            hourly_rate: Decimal::from(hourly),
            weekly_rate: Decimal::from(weekly),
            monthly_rate: Decimal::from(monthly),
        }
    }

    #[test]
    fn trainer_variants_resolve_to_trainer_rates() {
        let base = rates(200, 1000, 3000);
        let trainer = rates(500, 2500, 7500);

        assert_eq!(Plan::Hourly.base_rate(&base, &trainer), Decimal::from(200));
        assert_eq!(
            Plan::HourlyWithTrainer.base_rate(&base, &trainer),
            Decimal::from(500)
        );
        assert_eq!(
            Plan::WeeklyWithTrainer.base_rate(&base, &trainer),
            Decimal::from(2500)
        );
        assert_eq!(
            Plan::MonthlyWithTrainer.base_rate(&base, &trainer),
            Decimal::from(7500)
        );
        assert_eq!(Plan::Monthly.base_rate(&base, &trainer), Decimal::from(3000));
    }

    #[test]
    fn plan_names_round_trip() {
        for plan in Plan::ALL {
            assert_eq!(plan.name().parse::<Plan>().unwrap(), plan);
        }
        // A trainer name can never fall back onto the base variant.
        assert_eq!(
            "Hourly Plan With Trainer".parse::<Plan>().unwrap(),
            Plan::HourlyWithTrainer
        );
        assert!("Yearly Plan".parse::<Plan>().is_err());
    }

    #[test]
    fn plan_durations() {
        assert_eq!(Plan::Hourly.duration_days(), 0);
        assert_eq!(Plan::WeeklyWithTrainer.duration_days(), 6);
        assert_eq!(Plan::Monthly.duration_days(), 30);
    }

    #[test]
    fn currency_symbols() {
        assert_eq!(CurrencyCode::Inr.symbol(), "₹");
        assert_eq!(CurrencyCode::Usd.symbol(), "$");
        assert_eq!(CurrencyCode::default(), CurrencyCode::Inr);
    }

    #[test]
    fn plan_serializes_as_display_name() {
        let json = serde_json::to_string(&Plan::WeeklyWithTrainer).unwrap();
        assert_eq!(json, "\"Weekly Plan With Trainer\"");
        let parsed: Plan = serde_json::from_str("\"Monthly Plan\"").unwrap();
        assert_eq!(parsed, Plan::Monthly);
    }
}
