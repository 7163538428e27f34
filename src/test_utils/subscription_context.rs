//! Wires `SubscriptionUseCases` against in-memory repositories and recording ports.

use std::sync::Arc;

use crate::{
    application::use_cases::subscription::SubscriptionUseCases,
    domain::entities::{customer::Customer, plan::Plan, subscription::Subscription},
    test_utils::{
        InMemoryCustomerRepo, InMemoryPlanRepo, InMemorySubscriptionRepo,
        RecordingBillingTrigger, RecordingEventNotifier,
    },
};

pub struct SubscriptionTestContext {
    pub customers: Arc<InMemoryCustomerRepo>,
    pub plans: Arc<InMemoryPlanRepo>,
    pub subscriptions: Arc<InMemorySubscriptionRepo>,
    pub billing: Arc<RecordingBillingTrigger>,
    pub notifier: Arc<RecordingEventNotifier>,
    pub use_cases: SubscriptionUseCases,
}

impl SubscriptionTestContext {
    pub fn new(
        customers: Vec<Customer>,
        plans: Vec<Plan>,
        subscriptions: Vec<Subscription>,
    ) -> Self {
        let customers = Arc::new(InMemoryCustomerRepo::with_customers(customers));
        let plans = Arc::new(InMemoryPlanRepo::with_plans(plans));
        let subscriptions = Arc::new(
            InMemorySubscriptionRepo::with_subscriptions(subscriptions).sharing_plans(&plans),
        );
        let billing = Arc::new(RecordingBillingTrigger::new());
        let notifier = Arc::new(RecordingEventNotifier::new());

        let use_cases = SubscriptionUseCases::new(
            customers.clone(),
            plans.clone(),
            subscriptions.clone(),
            billing.clone(),
            notifier.clone(),
        );

        Self {
            customers,
            plans,
            subscriptions,
            billing,
            notifier,
            use_cases,
        }
    }
}
