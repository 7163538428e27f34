use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use uuid::Uuid;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, AsRefStr, Display,
    EnumString,
)]
#[sqlx(type_name = "subscription_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum SubscriptionStatus {
    /// Queued plan change waiting for the next billing boundary.
    Pending,
    Active,
    /// Superseded by an upgrade. Never reactivated.
    Terminated,
    /// Pending change discarded before it ever became active.
    Canceled,
}

impl SubscriptionStatus {
    /// Whether the status can still change.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SubscriptionStatus::Terminated | SubscriptionStatus::Canceled
        )
    }

    /// Validates a status change against the lifecycle state machine.
    ///
    /// | From       | To                    |
    /// |------------|-----------------------|
    /// | Pending    | Active, Canceled      |
    /// | Active     | Terminated            |
    /// | Terminated | -                     |
    /// | Canceled   | -                     |
    ///
    /// Staying in the same status is always allowed.
    pub fn can_transition_to(&self, next: SubscriptionStatus) -> bool {
        if *self == next {
            return true;
        }

        match self {
            SubscriptionStatus::Pending => matches!(
                next,
                SubscriptionStatus::Active | SubscriptionStatus::Canceled
            ),
            SubscriptionStatus::Active => matches!(next, SubscriptionStatus::Terminated),
            SubscriptionStatus::Terminated | SubscriptionStatus::Canceled => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Subscription {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub plan_id: Uuid,
    pub status: SubscriptionStatus,
    /// Commercial start date. Carried over unchanged through plan changes.
    pub subscription_date: NaiveDate,
    pub previous_subscription_id: Option<Uuid>,
    pub started_at: Option<DateTime<Utc>>,
    pub terminated_at: Option<DateTime<Utc>>,
    pub canceled_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Subscription {
    pub fn is_active(&self) -> bool {
        self.status == SubscriptionStatus::Active
    }

    pub fn is_pending(&self) -> bool {
        self.status == SubscriptionStatus::Pending
    }
}
