use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    app_error::{AppError, AppResult},
    application::{
        ports::{
            billing_trigger::BillingTrigger,
            event_notifier::{EventNotifier, SUBSCRIPTION_CREATED_EVENT, TrackingEvent},
        },
        validators::{normalize_external_customer_id, normalize_plan_code},
    },
    domain::entities::{
        customer::Customer,
        plan::Plan,
        subscription::{Subscription, SubscriptionStatus},
        subscription_transition::SubscriptionTransition,
    },
};

// ============================================================================
// Input Types
// ============================================================================

#[derive(Debug, Clone)]
pub struct NewSubscription {
    pub customer_id: Uuid,
    pub plan_id: Uuid,
    pub status: SubscriptionStatus,
    pub subscription_date: NaiveDate,
    pub previous_subscription_id: Option<Uuid>,
    pub started_at: Option<DateTime<Utc>>,
}

/// Subscribe by internal identifiers.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateSubscriptionInput {
    pub organization_id: Uuid,
    pub customer_id: Uuid,
    pub plan_id: Uuid,
}

/// Subscribe by the identifiers an organization uses externally.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiSubscriptionParams {
    /// External customer id. The customer is created on first use.
    pub customer_id: Option<String>,
    pub plan_code: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SubscriptionCreatedProperties {
    pub created_at: DateTime<Utc>,
    pub customer_id: Uuid,
    pub plan_code: String,
    pub plan_name: String,
    pub subscription_type: &'static str,
    pub organization_id: Uuid,
}

// ============================================================================
// Repository Traits
// ============================================================================

#[async_trait]
pub trait CustomerRepo: Send + Sync {
    async fn get_by_id(&self, organization_id: Uuid, id: Uuid) -> AppResult<Option<Customer>>;
    async fn get_by_external_id(
        &self,
        organization_id: Uuid,
        external_id: &str,
    ) -> AppResult<Option<Customer>>;
    async fn find_or_create_by_external_id(
        &self,
        organization_id: Uuid,
        external_id: &str,
    ) -> AppResult<Customer>;
}

#[async_trait]
pub trait PlanRepo: Send + Sync {
    async fn get_by_organization_and_id(
        &self,
        organization_id: Uuid,
        id: Uuid,
    ) -> AppResult<Option<Plan>>;
    async fn get_by_code(&self, organization_id: Uuid, code: &str) -> AppResult<Option<Plan>>;
}

#[async_trait]
pub trait SubscriptionRepo: Send + Sync {
    /// Opens a transaction. Dropping it without `commit` rolls every write back.
    async fn begin(&self) -> AppResult<Box<dyn SubscriptionTx>>;
    /// Latest subscription whose `previous_subscription_id` is `id`, in any status.
    async fn find_next_subscription(&self, id: Uuid) -> AppResult<Option<Subscription>>;
    /// All subscriptions of a customer, newest first.
    async fn list_by_customer(&self, customer_id: Uuid) -> AppResult<Vec<Subscription>>;
}

/// Writes made through a `SubscriptionTx` become visible together on `commit` or not at all.
///
/// Every read and write of a plan change goes through the transaction, so a change
/// never needs more than the one connection it already holds.
#[async_trait]
pub trait SubscriptionTx: Send {
    /// Reads the customer's active subscription and locks it for the rest of the transaction.
    async fn find_active_for_customer(
        &mut self,
        customer_id: Uuid,
    ) -> AppResult<Option<Subscription>>;
    async fn find_pending_successor(
        &mut self,
        subscription_id: Uuid,
    ) -> AppResult<Option<Subscription>>;
    async fn find_plan(&mut self, plan_id: Uuid) -> AppResult<Option<Plan>>;
    async fn insert(&mut self, input: &NewSubscription) -> AppResult<Subscription>;
    /// Fails with `ValidationFailed` unless the subscription is still active.
    async fn terminate(&mut self, id: Uuid, at: DateTime<Utc>) -> AppResult<Subscription>;
    /// Fails with `ValidationFailed` unless the subscription is still pending.
    async fn cancel(&mut self, id: Uuid, at: DateTime<Utc>) -> AppResult<Subscription>;
    async fn commit(self: Box<Self>) -> AppResult<()>;
}

// ============================================================================
// Use Cases
// ============================================================================

#[derive(Clone)]
pub struct SubscriptionUseCases {
    customer_repo: Arc<dyn CustomerRepo>,
    plan_repo: Arc<dyn PlanRepo>,
    subscription_repo: Arc<dyn SubscriptionRepo>,
    billing: Arc<dyn BillingTrigger>,
    notifier: Arc<dyn EventNotifier>,
}

impl SubscriptionUseCases {
    pub fn new(
        customer_repo: Arc<dyn CustomerRepo>,
        plan_repo: Arc<dyn PlanRepo>,
        subscription_repo: Arc<dyn SubscriptionRepo>,
        billing: Arc<dyn BillingTrigger>,
        notifier: Arc<dyn EventNotifier>,
    ) -> Self {
        Self {
            customer_repo,
            plan_repo,
            subscription_repo,
            billing,
            notifier,
        }
    }

    /// Subscribe a customer, both given by internal id, to a plan of the same organization.
    #[instrument(skip(self))]
    pub async fn create(
        &self,
        input: CreateSubscriptionInput,
        actor: Option<Uuid>,
    ) -> AppResult<Subscription> {
        let customer = self
            .customer_repo
            .get_by_id(input.organization_id, input.customer_id)
            .await?;
        let plan = self
            .plan_repo
            .get_by_organization_and_id(input.organization_id, input.plan_id)
            .await?;

        self.create_or_change(customer.as_ref(), plan.as_ref(), actor)
            .await
    }

    /// Subscribe by external customer id and plan code.
    ///
    /// Unknown customers are created, but only once the plan has been resolved.
    #[instrument(skip(self))]
    pub async fn create_from_api(
        &self,
        organization_id: Uuid,
        params: ApiSubscriptionParams,
        actor: Option<Uuid>,
    ) -> AppResult<Subscription> {
        let Some(raw_customer_id) = params.customer_id.as_deref() else {
            return Err(AppError::MissingArgument("customer"));
        };
        let external_id = normalize_external_customer_id(raw_customer_id)?;

        let plan = match normalize_plan_code(params.plan_code.as_deref()) {
            Some(code) => self.plan_repo.get_by_code(organization_id, code).await?,
            None => None,
        };
        let Some(plan) = plan else {
            return Err(AppError::MissingArgument("plan"));
        };

        let customer = self
            .customer_repo
            .find_or_create_by_external_id(organization_id, &external_id)
            .await?;

        self.create_or_change(Some(&customer), Some(&plan), actor)
            .await
    }

    /// Creates a first subscription or moves the active one to `plan`.
    ///
    /// Returns the customer's subscription of record: the active one, except on a
    /// downgrade where the still-active previous subscription is returned.
    #[instrument(
        skip(self, customer, plan),
        fields(
            customer_id = ?customer.map(|c| c.id),
            plan_id = ?plan.map(|p| p.id),
        )
    )]
    pub async fn create_or_change(
        &self,
        customer: Option<&Customer>,
        plan: Option<&Plan>,
        actor: Option<Uuid>,
    ) -> AppResult<Subscription> {
        let customer = customer.ok_or(AppError::MissingArgument("customer"))?;
        let plan = plan.ok_or(AppError::MissingArgument("plan"))?;

        let now = Utc::now();
        let mut tx = self.subscription_repo.begin().await?;

        let current = tx.find_active_for_customer(customer.id).await?;
        let current_plan = match &current {
            Some(subscription) => Some(Self::plan_of(&mut *tx, subscription).await?),
            None => None,
        };

        let transition = SubscriptionTransition::classify(current_plan.as_ref(), plan);

        let (subscription, subscription_plan) = match (transition, current, current_plan) {
            (SubscriptionTransition::Create, _, _) => {
                let created = self.create_subscription(tx, customer, plan, now).await?;
                (created, plan.clone())
            }
            (SubscriptionTransition::Reuse, Some(current), Some(current_plan)) => {
                // Nothing was written; dropping releases the locks
                drop(tx);
                (current, current_plan)
            }
            (SubscriptionTransition::Upgrade, Some(current), Some(current_plan)) => {
                let upgraded = self
                    .upgrade_subscription(tx, &current, &current_plan, plan, now)
                    .await?;
                (upgraded, plan.clone())
            }
            (SubscriptionTransition::Downgrade, Some(current), Some(current_plan)) => {
                self.downgrade_subscription(tx, &current, plan, now).await?;
                (current, current_plan)
            }
            _ => {
                return Err(AppError::Internal(
                    "plan change classified without an active subscription".into(),
                ));
            }
        };

        info!(
            %transition,
            customer_id = %customer.id,
            subscription_id = %subscription.id,
            "Plan request processed"
        );
        self.track_subscription_created(
            customer,
            &subscription,
            &subscription_plan,
            transition,
            actor,
        );

        Ok(subscription)
    }

    /// Subscription history of a customer, newest first.
    #[instrument(skip(self))]
    pub async fn list_customer_subscriptions(
        &self,
        organization_id: Uuid,
        external_customer_id: &str,
    ) -> AppResult<Vec<Subscription>> {
        let customer = self
            .customer_repo
            .get_by_external_id(organization_id, external_customer_id.trim())
            .await?
            .ok_or(AppError::MissingArgument("customer"))?;

        self.subscription_repo.list_by_customer(customer.id).await
    }

    /// The subscription chained after `subscription_id`, if any.
    pub async fn next_subscription(&self, subscription_id: Uuid) -> AppResult<Option<Subscription>> {
        self.subscription_repo
            .find_next_subscription(subscription_id)
            .await
    }

    async fn plan_of(tx: &mut dyn SubscriptionTx, subscription: &Subscription) -> AppResult<Plan> {
        tx.find_plan(subscription.plan_id)
            .await?
            .ok_or_else(|| {
                AppError::Internal(format!(
                    "Plan {} of subscription {} not found",
                    subscription.plan_id, subscription.id
                ))
            })
    }

    async fn create_subscription(
        &self,
        mut tx: Box<dyn SubscriptionTx>,
        customer: &Customer,
        plan: &Plan,
        now: DateTime<Utc>,
    ) -> AppResult<Subscription> {
        let subscription = tx
            .insert(&NewSubscription {
                customer_id: customer.id,
                plan_id: plan.id,
                status: SubscriptionStatus::Active,
                subscription_date: now.date_naive(),
                previous_subscription_id: None,
                started_at: Some(now),
            })
            .await?;
        tx.commit().await?;

        info!(
            customer_id = %customer.id,
            subscription_id = %subscription.id,
            plan_code = %plan.code,
            "Subscription created"
        );

        if plan.pay_in_advance() {
            self.billing.schedule(subscription.id, now.timestamp());
        }

        Ok(subscription)
    }

    async fn upgrade_subscription(
        &self,
        mut tx: Box<dyn SubscriptionTx>,
        current: &Subscription,
        current_plan: &Plan,
        plan: &Plan,
        now: DateTime<Utc>,
    ) -> AppResult<Subscription> {
        Self::cancel_pending_subscription(&mut *tx, current, now).await?;

        // The old subscription goes first so the customer never has two active rows
        tx.terminate(current.id, now).await?;
        let upgraded = tx
            .insert(&NewSubscription {
                customer_id: current.customer_id,
                plan_id: plan.id,
                status: SubscriptionStatus::Active,
                subscription_date: current.subscription_date,
                previous_subscription_id: Some(current.id),
                started_at: Some(now),
            })
            .await?;
        tx.commit().await?;

        info!(
            customer_id = %current.customer_id,
            terminated_subscription_id = %current.id,
            subscription_id = %upgraded.id,
            from_plan = %current_plan.code,
            to_plan = %plan.code,
            "Subscription upgraded"
        );

        let timestamp = now.timestamp();
        if current_plan.pay_in_arrear() {
            self.billing.schedule(current.id, timestamp);
        }
        if plan.pay_in_advance() {
            self.billing.schedule(upgraded.id, timestamp);
        }

        Ok(upgraded)
    }

    async fn downgrade_subscription(
        &self,
        mut tx: Box<dyn SubscriptionTx>,
        current: &Subscription,
        plan: &Plan,
        now: DateTime<Utc>,
    ) -> AppResult<Subscription> {
        Self::cancel_pending_subscription(&mut *tx, current, now).await?;

        // The current subscription stays active until the next billing boundary
        let pending = tx
            .insert(&NewSubscription {
                customer_id: current.customer_id,
                plan_id: plan.id,
                status: SubscriptionStatus::Pending,
                subscription_date: current.subscription_date,
                previous_subscription_id: Some(current.id),
                started_at: None,
            })
            .await?;
        tx.commit().await?;

        info!(
            customer_id = %current.customer_id,
            subscription_id = %current.id,
            pending_subscription_id = %pending.id,
            to_plan = %plan.code,
            "Subscription downgrade scheduled"
        );

        Ok(pending)
    }

    /// Only one queued plan change may hang off an active subscription.
    async fn cancel_pending_subscription(
        tx: &mut dyn SubscriptionTx,
        current: &Subscription,
        now: DateTime<Utc>,
    ) -> AppResult<()> {
        if let Some(pending) = tx.find_pending_successor(current.id).await? {
            tx.cancel(pending.id, now).await?;
            info!(
                subscription_id = %current.id,
                canceled_subscription_id = %pending.id,
                "Pending subscription canceled"
            );
        }
        Ok(())
    }

    fn track_subscription_created(
        &self,
        customer: &Customer,
        subscription: &Subscription,
        plan: &Plan,
        transition: SubscriptionTransition,
        actor: Option<Uuid>,
    ) {
        let properties = SubscriptionCreatedProperties {
            created_at: subscription.created_at,
            customer_id: subscription.customer_id,
            plan_code: plan.code.clone(),
            plan_name: plan.name.clone(),
            subscription_type: transition.tracking_type(),
            organization_id: customer.organization_id,
        };

        let properties = match serde_json::to_value(&properties) {
            Ok(value) => value,
            Err(err) => {
                warn!(error = %err, subscription_id = %subscription.id, "Failed to serialize tracking properties");
                return;
            }
        };

        self.notifier.emit(TrackingEvent {
            membership_id: actor,
            event: SUBSCRIPTION_CREATED_EVENT.to_string(),
            properties,
        });
    }
}
