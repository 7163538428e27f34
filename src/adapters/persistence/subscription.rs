use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Postgres, Row, Transaction};
use uuid::Uuid;

use crate::{
    adapters::persistence::{
        PostgresPersistence,
        plan::{SELECT_COLS as PLAN_COLS, row_to_plan},
    },
    app_error::{AppError, AppResult},
    application::use_cases::subscription::{NewSubscription, SubscriptionRepo, SubscriptionTx},
    domain::entities::{
        plan::Plan,
        subscription::{Subscription, SubscriptionStatus},
    },
};

fn row_to_subscription(row: &sqlx::postgres::PgRow) -> Subscription {
    Subscription {
        id: row.get("id"),
        customer_id: row.get("customer_id"),
        plan_id: row.get("plan_id"),
        status: row.get("status"),
        subscription_date: row.get("subscription_date"),
        previous_subscription_id: row.get("previous_subscription_id"),
        started_at: row.get("started_at"),
        terminated_at: row.get("terminated_at"),
        canceled_at: row.get("canceled_at"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

const SELECT_COLS: &str = r#"
    id, customer_id, plan_id, status, subscription_date, previous_subscription_id,
    started_at, terminated_at, canceled_at, created_at, updated_at
"#;

#[async_trait]
impl SubscriptionRepo for PostgresPersistence {
    async fn begin(&self) -> AppResult<Box<dyn SubscriptionTx>> {
        let tx = self.pool().begin().await.map_err(AppError::from)?;
        Ok(Box::new(PgSubscriptionTx { tx }))
    }

    async fn find_next_subscription(&self, id: Uuid) -> AppResult<Option<Subscription>> {
        let row = sqlx::query(&format!(
            r#"
            SELECT {} FROM subscriptions
            WHERE previous_subscription_id = $1
            ORDER BY created_at DESC
            LIMIT 1
            "#,
            SELECT_COLS
        ))
        .bind(id)
        .fetch_optional(self.pool())
        .await
        .map_err(AppError::from)?;
        Ok(row.as_ref().map(row_to_subscription))
    }

    async fn list_by_customer(&self, customer_id: Uuid) -> AppResult<Vec<Subscription>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM subscriptions WHERE customer_id = $1 ORDER BY created_at DESC",
            SELECT_COLS
        ))
        .bind(customer_id)
        .fetch_all(self.pool())
        .await
        .map_err(AppError::from)?;
        Ok(rows.iter().map(row_to_subscription).collect())
    }
}

/// Dropping without `commit` rolls back, courtesy of `sqlx::Transaction`.
pub struct PgSubscriptionTx {
    tx: Transaction<'static, Postgres>,
}

impl PgSubscriptionTx {
    async fn update_status(
        &mut self,
        id: Uuid,
        from: SubscriptionStatus,
        to: SubscriptionStatus,
        column: &str,
        at: DateTime<Utc>,
    ) -> AppResult<Subscription> {
        if !from.can_transition_to(to) {
            return Err(AppError::Internal(format!(
                "illegal subscription status change {from} -> {to}"
            )));
        }

        let row = sqlx::query(&format!(
            r#"
            UPDATE subscriptions
            SET status = $3, {column} = $4, updated_at = NOW()
            WHERE id = $1 AND status = $2
            RETURNING {}
            "#,
            SELECT_COLS
        ))
        .bind(id)
        .bind(from)
        .bind(to)
        .bind(at)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(AppError::from)?;

        row.as_ref().map(row_to_subscription).ok_or_else(|| {
            AppError::validation(
                "status",
                "invalid_transition",
                "subscription status changed concurrently",
            )
        })
    }
}

#[async_trait]
impl SubscriptionTx for PgSubscriptionTx {
    async fn find_active_for_customer(
        &mut self,
        customer_id: Uuid,
    ) -> AppResult<Option<Subscription>> {
        // Serializes lifecycle changes per customer, including the very first one
        sqlx::query("SELECT id FROM customers WHERE id = $1 FOR UPDATE")
            .bind(customer_id)
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(AppError::from)?;

        let row = sqlx::query(&format!(
            "SELECT {} FROM subscriptions WHERE customer_id = $1 AND status = $2 FOR UPDATE",
            SELECT_COLS
        ))
        .bind(customer_id)
        .bind(SubscriptionStatus::Active)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(AppError::from)?;
        Ok(row.as_ref().map(row_to_subscription))
    }

    async fn find_pending_successor(
        &mut self,
        subscription_id: Uuid,
    ) -> AppResult<Option<Subscription>> {
        let row = sqlx::query(&format!(
            r#"
            SELECT {} FROM subscriptions
            WHERE previous_subscription_id = $1 AND status = $2
            FOR UPDATE
            "#,
            SELECT_COLS
        ))
        .bind(subscription_id)
        .bind(SubscriptionStatus::Pending)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(AppError::from)?;
        Ok(row.as_ref().map(row_to_subscription))
    }

    async fn find_plan(&mut self, plan_id: Uuid) -> AppResult<Option<Plan>> {
        let row = sqlx::query(&format!("SELECT {} FROM plans WHERE id = $1", PLAN_COLS))
            .bind(plan_id)
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(AppError::from)?;
        Ok(row.as_ref().map(row_to_plan))
    }

    async fn insert(&mut self, input: &NewSubscription) -> AppResult<Subscription> {
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO subscriptions (
                id, customer_id, plan_id, status, subscription_date,
                previous_subscription_id, started_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {}
            "#,
            SELECT_COLS
        ))
        .bind(Uuid::new_v4())
        .bind(input.customer_id)
        .bind(input.plan_id)
        .bind(input.status)
        .bind(input.subscription_date)
        .bind(input.previous_subscription_id)
        .bind(input.started_at)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(AppError::from)?;
        Ok(row_to_subscription(&row))
    }

    async fn terminate(&mut self, id: Uuid, at: DateTime<Utc>) -> AppResult<Subscription> {
        self.update_status(
            id,
            SubscriptionStatus::Active,
            SubscriptionStatus::Terminated,
            "terminated_at",
            at,
        )
        .await
    }

    async fn cancel(&mut self, id: Uuid, at: DateTime<Utc>) -> AppResult<Subscription> {
        self.update_status(
            id,
            SubscriptionStatus::Pending,
            SubscriptionStatus::Canceled,
            "canceled_at",
            at,
        )
        .await
    }

    async fn commit(self: Box<Self>) -> AppResult<()> {
        self.tx.commit().await.map_err(AppError::from)
    }
}
