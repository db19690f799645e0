use chrono::{DateTime, Utc};
use diesel::prelude::*;

use crate::infrastructure::postgres::schema::plans;

#[derive(Debug, Clone, PartialEq, Identifiable, Selectable, Queryable)]
#[diesel(table_name = plans)]
pub struct PlanEntity {
    pub id: i64,
    pub name: String,
    pub max_operations: i32,
    pub price_minor: i32,
    pub description: Option<String>,
    pub is_deleted: bool,
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = plans)]
pub struct InsertPlanEntity {
    pub name: String,
    pub max_operations: i32,
    pub price_minor: i32,
    pub description: Option<String>,
    pub is_deleted: bool,
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Partial update applied to a non-deleted plan. `None` fields are untouched.
/// The double option on `description` distinguishes "leave as is" (`None`)
/// from "clear to NULL" (`Some(None)`).
#[derive(Debug, Clone, Default, AsChangeset)]
#[diesel(table_name = plans)]
pub struct UpdatePlanEntity {
    pub name: Option<String>,
    pub max_operations: Option<i32>,
    pub price_minor: Option<i32>,
    pub description: Option<Option<String>>,
}
