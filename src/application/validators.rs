use crate::app_error::{AppError, AppResult};

const MAX_EXTERNAL_ID_LEN: usize = 255;

/// Trims an organization-supplied customer identifier and checks it can be stored.
pub fn normalize_external_customer_id(raw: &str) -> AppResult<String> {
    let trimmed = raw.trim();

    if trimmed.is_empty() {
        return Err(AppError::validation(
            "customer_id",
            "value_is_mandatory",
            "customer_id must not be blank",
        ));
    }

    if trimmed.len() > MAX_EXTERNAL_ID_LEN {
        return Err(AppError::validation(
            "customer_id",
            "value_too_long",
            "customer_id must be at most 255 characters",
        ));
    }

    if trimmed.chars().any(char::is_control) {
        return Err(AppError::validation(
            "customer_id",
            "invalid_value",
            "customer_id must not contain control characters",
        ));
    }

    Ok(trimmed.to_string())
}

/// Trims a plan code. Blank codes resolve to no plan at all.
pub fn normalize_plan_code(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim).filter(|code| !code.is_empty())
}
