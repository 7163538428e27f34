use sqlx::PgPool;

use crate::app_error::AppError;

pub mod customer;
pub mod plan;
pub mod subscription;

pub const ONE_ACTIVE_PER_CUSTOMER: &str = "subscriptions_one_active_per_customer";
pub const ONE_PENDING_PER_PREVIOUS: &str = "subscriptions_one_pending_per_previous";
pub const CUSTOMER_EXTERNAL_ID_UNIQUE: &str = "customers_organization_external_id_key";

const UNIQUE_VIOLATION: &str = "23505";
const FOREIGN_KEY_VIOLATION: &str = "23503";
const NOT_NULL_VIOLATION: &str = "23502";
const CHECK_VIOLATION: &str = "23514";
const SERIALIZATION_FAILURE: &str = "40001";
const DEADLOCK_DETECTED: &str = "40P01";

#[derive(Clone)]
pub struct PostgresPersistence {
    pool: PgPool,
}

impl PostgresPersistence {
    pub fn new(pool: PgPool) -> Self {
        PostgresPersistence { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Maps a Postgres error code and constraint name to a field-level validation error.
///
/// Returns `None` for errors that are not the caller's fault.
pub fn validation_error_for(code: Option<&str>, constraint: Option<&str>) -> Option<AppError> {
    match (code?, constraint) {
        (UNIQUE_VIOLATION, Some(ONE_ACTIVE_PER_CUSTOMER)) => Some(AppError::validation(
            "customer",
            "active_subscription_exists",
            "customer already has an active subscription",
        )),
        (UNIQUE_VIOLATION, Some(ONE_PENDING_PER_PREVIOUS)) => Some(AppError::validation(
            "previous_subscription",
            "pending_subscription_exists",
            "subscription already has a pending successor",
        )),
        (UNIQUE_VIOLATION, Some(CUSTOMER_EXTERNAL_ID_UNIQUE)) => Some(AppError::validation(
            "customer_id",
            "value_already_exist",
            "customer already exists",
        )),
        (UNIQUE_VIOLATION, _) => Some(AppError::validation(
            "base",
            "value_already_exist",
            "a record with this value already exists",
        )),
        (FOREIGN_KEY_VIOLATION, _) => Some(AppError::validation(
            "base",
            "invalid_reference",
            "referenced record not found",
        )),
        (NOT_NULL_VIOLATION, _) => Some(AppError::validation(
            "base",
            "value_is_mandatory",
            "required field is missing",
        )),
        (CHECK_VIOLATION, _) => Some(AppError::validation(
            "base",
            "invalid_value",
            "value is out of range",
        )),
        (SERIALIZATION_FAILURE | DEADLOCK_DETECTED, _) => Some(AppError::validation(
            "base",
            "serialization_failure",
            "concurrent update detected, retry the request",
        )),
        _ => None,
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => AppError::NotFound,
            sqlx::Error::Database(db_err) => {
                let code = db_err.code();
                if let Some(mapped) = validation_error_for(code.as_deref(), db_err.constraint()) {
                    tracing::warn!(
                        code = code.as_deref().unwrap_or_default(),
                        constraint = db_err.constraint().unwrap_or_default(),
                        "Database rejected write"
                    );
                    return mapped;
                }
                // Log the actual error, don't expose details
                tracing::error!(error = ?err, "Database error");
                AppError::Database("Database operation failed".into())
            }
            _ => {
                tracing::error!(error = ?err, "Database error");
                AppError::Database("Database operation failed".into())
            }
        }
    }
}
