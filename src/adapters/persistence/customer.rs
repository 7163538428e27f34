use async_trait::async_trait;
use sqlx::Row;
use uuid::Uuid;

use crate::{
    adapters::persistence::PostgresPersistence,
    app_error::{AppError, AppResult},
    application::use_cases::subscription::CustomerRepo,
    domain::entities::customer::Customer,
};

fn row_to_customer(row: &sqlx::postgres::PgRow) -> Customer {
    Customer {
        id: row.get("id"),
        organization_id: row.get("organization_id"),
        external_id: row.get("external_id"),
        name: row.get("name"),
        created_at: row.get("created_at"),
    }
}

const SELECT_COLS: &str = "id, organization_id, external_id, name, created_at";

#[async_trait]
impl CustomerRepo for PostgresPersistence {
    async fn get_by_id(&self, organization_id: Uuid, id: Uuid) -> AppResult<Option<Customer>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM customers WHERE id = $1 AND organization_id = $2",
            SELECT_COLS
        ))
        .bind(id)
        .bind(organization_id)
        .fetch_optional(self.pool())
        .await
        .map_err(AppError::from)?;
        Ok(row.as_ref().map(row_to_customer))
    }

    async fn get_by_external_id(
        &self,
        organization_id: Uuid,
        external_id: &str,
    ) -> AppResult<Option<Customer>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM customers WHERE organization_id = $1 AND external_id = $2",
            SELECT_COLS
        ))
        .bind(organization_id)
        .bind(external_id)
        .fetch_optional(self.pool())
        .await
        .map_err(AppError::from)?;
        Ok(row.as_ref().map(row_to_customer))
    }

    async fn find_or_create_by_external_id(
        &self,
        organization_id: Uuid,
        external_id: &str,
    ) -> AppResult<Customer> {
        // The no-op update makes RETURNING yield the existing row on conflict
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO customers (id, organization_id, external_id)
            VALUES ($1, $2, $3)
            ON CONFLICT (organization_id, external_id)
            DO UPDATE SET external_id = EXCLUDED.external_id
            RETURNING {}
            "#,
            SELECT_COLS
        ))
        .bind(Uuid::new_v4())
        .bind(organization_id)
        .bind(external_id)
        .fetch_one(self.pool())
        .await
        .map_err(AppError::from)?;
        Ok(row_to_customer(&row))
    }
}
