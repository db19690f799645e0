use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::domain::entities::plans::PlanEntity;

#[derive(Debug, Clone, Deserialize)]
pub struct CreatePlanModel {
    pub name: String,
    pub max_operations: i32,
    pub price_minor: i32,
    pub description: Option<String>,
}

/// An absent `description` leaves the stored value alone; an explicit JSON
/// `null` clears it.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdatePlanModel {
    pub name: Option<String>,
    pub max_operations: Option<i32>,
    pub price_minor: Option<i32>,
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
}

fn double_option<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}

impl UpdatePlanModel {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.max_operations.is_none()
            && self.price_minor.is_none()
            && self.description.is_none()
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PlanModel {
    pub id: i64,
    pub name: String,
    pub max_operations: i32,
    pub price_minor: i32,
    pub description: Option<String>,
    pub is_deleted: bool,
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<PlanEntity> for PlanModel {
    fn from(value: PlanEntity) -> Self {
        Self {
            id: value.id,
            name: value.name,
            max_operations: value.max_operations,
            price_minor: value.price_minor,
            description: value.description,
            is_deleted: value.is_deleted,
            deleted_at: value.deleted_at,
            created_at: value.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_description_means_unchanged() {
        let model: UpdatePlanModel = serde_json::from_str(r#"{"price_minor": 100}"#).unwrap();
        assert_eq!(model.description, None);
    }

    #[test]
    fn null_description_means_clear() {
        let model: UpdatePlanModel = serde_json::from_str(r#"{"description": null}"#).unwrap();
        assert_eq!(model.description, Some(None));
        assert!(!model.is_empty());
    }

    #[test]
    fn string_description_means_replace() {
        let model: UpdatePlanModel =
            serde_json::from_str(r#"{"description": "new copy"}"#).unwrap();
        assert_eq!(model.description, Some(Some("new copy".to_string())));
    }
}
