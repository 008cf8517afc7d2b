use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::forms::FormVariant;

#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct FormStatus {
    #[sqlx(try_from = "String")]
    pub form_type: FormVariant,
    pub is_active: bool,
    pub title: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
