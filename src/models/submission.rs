use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::forms::FormVariant;

#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct Submission {
    pub id: Uuid,
    #[sqlx(try_from = "String")]
    pub form_type: FormVariant,
    pub email_address: Option<String>,
    pub full_name: Option<String>,
    pub whatsapp_number: Option<String>,
    pub form_data: Value,
    #[serde(skip)]
    pub occupation: Option<String>,
    #[serde(skip)]
    pub recommendation: Option<String>,
    #[serde(skip)]
    pub income: Option<String>,
    #[serde(skip)]
    pub frontend_interest: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Submission {
    /// Returns the row with `form_data` as an object, folding in the flat
    /// columns older rows were written with. Values already present in
    /// `form_data` win over the flat columns.
    pub fn with_folded_form_data(mut self) -> Self {
        let mut data = match std::mem::take(&mut self.form_data) {
            Value::Object(map) => map,
            Value::String(s) => match serde_json::from_str::<Value>(&s) {
                Ok(Value::Object(map)) => map,
                _ => {
                    tracing::warn!("Unparseable form_data on submission {}", self.id);
                    Map::new()
                }
            },
            _ => Map::new(),
        };

        let legacy = [
            ("occupation", self.occupation.take()),
            ("recommendation", self.recommendation.take()),
            ("income", self.income.take()),
            ("frontend_interest", self.frontend_interest.take()),
        ];
        for (key, value) in legacy {
            if let Some(value) = value {
                data.entry(key).or_insert(Value::String(value));
            }
        }

        self.form_data = Value::Object(data);
        self
    }
}
