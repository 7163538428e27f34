use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use uuid::Uuid;

const WEEKS_PER_YEAR: i64 = 52;
const MONTHS_PER_YEAR: i64 = 12;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, AsRefStr, Display,
    EnumString,
)]
#[sqlx(type_name = "plan_interval", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum PlanInterval {
    Weekly,
    Monthly,
    Yearly,
}

impl PlanInterval {
    /// Number of billing periods of this interval in one year.
    pub fn periods_per_year(&self) -> i64 {
        match self {
            PlanInterval::Weekly => WEEKS_PER_YEAR,
            PlanInterval::Monthly => MONTHS_PER_YEAR,
            PlanInterval::Yearly => 1,
        }
    }
}

/// When a plan's recurring fee is billed relative to the period it covers.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, AsRefStr, Display,
    EnumString,
)]
#[sqlx(type_name = "plan_pay_timing", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum PayTiming {
    PayInAdvance,
    PayInArrear,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Plan {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub code: String,
    pub name: String,
    pub interval: PlanInterval,
    pub amount_cents: i64,
    pub pay_timing: PayTiming,
    pub created_at: DateTime<Utc>,
}

impl Plan {
    /// Recurring amount normalized to one year. Only meaningful for comparing plans.
    pub fn yearly_amount_cents(&self) -> i64 {
        self.amount_cents
            .saturating_mul(self.interval.periods_per_year())
    }

    pub fn pay_in_advance(&self) -> bool {
        self.pay_timing == PayTiming::PayInAdvance
    }

    pub fn pay_in_arrear(&self) -> bool {
        self.pay_timing == PayTiming::PayInArrear
    }
}
