use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Customer {
    pub id: Uuid,
    pub organization_id: Uuid,
    /// Identifier the organization uses for this customer in its own systems.
    pub external_id: String,
    pub name: Option<String>,
    pub created_at: DateTime<Utc>,
}
