//! Test data factories for creating valid test fixtures.
//!
//! Each factory function creates a complete, valid object with sensible defaults.
//! Use the closure parameter to override specific fields as needed.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use uuid::Uuid;

use crate::domain::entities::{
    customer::Customer,
    plan::{PayTiming, Plan, PlanInterval},
    subscription::{Subscription, SubscriptionStatus},
};

/// Create a test customer with sensible defaults.
pub fn create_test_customer(
    organization_id: Uuid,
    overrides: impl FnOnce(&mut Customer),
) -> Customer {
    let mut customer = Customer {
        id: Uuid::new_v4(),
        organization_id,
        external_id: format!("cus_{}", Uuid::new_v4().simple()),
        name: Some("Test Customer".to_string()),
        created_at: test_datetime(),
    };
    overrides(&mut customer);
    customer
}

/// Create a monthly, pay-in-advance test plan.
pub fn create_test_plan(organization_id: Uuid, overrides: impl FnOnce(&mut Plan)) -> Plan {
    let mut plan = Plan {
        id: Uuid::new_v4(),
        organization_id,
        code: "basic".to_string(),
        name: "Basic Plan".to_string(),
        interval: PlanInterval::Monthly,
        amount_cents: 999,
        pay_timing: PayTiming::PayInAdvance,
        created_at: test_datetime(),
    };
    overrides(&mut plan);
    plan
}

/// Create an active test subscription that started on `test_subscription_date()`.
pub fn create_test_subscription(
    customer_id: Uuid,
    plan_id: Uuid,
    overrides: impl FnOnce(&mut Subscription),
) -> Subscription {
    let mut subscription = Subscription {
        id: Uuid::new_v4(),
        customer_id,
        plan_id,
        status: SubscriptionStatus::Active,
        subscription_date: test_subscription_date(),
        previous_subscription_id: None,
        started_at: Some(test_datetime()),
        terminated_at: None,
        canceled_at: None,
        created_at: test_datetime(),
        updated_at: test_datetime(),
    };
    overrides(&mut subscription);
    subscription
}

/// Returns a fixed datetime for deterministic tests.
pub fn test_datetime() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0)
        .single()
        .expect("valid test datetime")
}

pub fn test_subscription_date() -> NaiveDate {
    test_datetime().date_naive()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overrides_apply() {
        let org = Uuid::new_v4();
        let plan = create_test_plan(org, |p| p.code = "gold".to_string());
        assert_eq!(plan.code, "gold");
        assert_eq!(plan.organization_id, org);

        let sub = create_test_subscription(Uuid::new_v4(), plan.id, |s| {
            s.status = SubscriptionStatus::Pending;
        });
        assert!(sub.is_pending());
        assert_eq!(sub.subscription_date, test_subscription_date());
    }

    #[test]
    fn test_customers_get_distinct_external_ids() {
        let org = Uuid::new_v4();
        let a = create_test_customer(org, |_| {});
        let b = create_test_customer(org, |_| {});
        assert_ne!(a.external_id, b.external_id);
    }
}
