use async_trait::async_trait;
use sqlx::Row;
use uuid::Uuid;

use crate::{
    adapters::persistence::PostgresPersistence,
    app_error::{AppError, AppResult},
    application::use_cases::subscription::PlanRepo,
    domain::entities::plan::Plan,
};

pub(super) fn row_to_plan(row: &sqlx::postgres::PgRow) -> Plan {
    Plan {
        id: row.get("id"),
        organization_id: row.get("organization_id"),
        code: row.get("code"),
        name: row.get("name"),
        interval: row.get("interval"),
        amount_cents: row.get("amount_cents"),
        pay_timing: row.get("pay_timing"),
        created_at: row.get("created_at"),
    }
}

pub(super) const SELECT_COLS: &str =
    "id, organization_id, code, name, interval, amount_cents, pay_timing, created_at";

#[async_trait]
impl PlanRepo for PostgresPersistence {
    async fn get_by_organization_and_id(
        &self,
        organization_id: Uuid,
        id: Uuid,
    ) -> AppResult<Option<Plan>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM plans WHERE id = $1 AND organization_id = $2",
            SELECT_COLS
        ))
        .bind(id)
        .bind(organization_id)
        .fetch_optional(self.pool())
        .await
        .map_err(AppError::from)?;
        Ok(row.as_ref().map(row_to_plan))
    }

    async fn get_by_code(&self, organization_id: Uuid, code: &str) -> AppResult<Option<Plan>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM plans WHERE organization_id = $1 AND code = $2",
            SELECT_COLS
        ))
        .bind(organization_id)
        .bind(code)
        .fetch_optional(self.pool())
        .await
        .map_err(AppError::from)?;
        Ok(row.as_ref().map(row_to_plan))
    }
}
