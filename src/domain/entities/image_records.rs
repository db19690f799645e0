use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::infrastructure::postgres::schema::image_records;

#[derive(Debug, Clone, PartialEq, Identifiable, Selectable, Queryable)]
#[diesel(table_name = image_records)]
pub struct ImageRecordEntity {
    pub id: i64,
    pub user_id: Uuid,
    pub filename: String,
    pub operation: String,
    pub original_size: Option<String>,
    pub processed_size: Option<String>,
    pub storage_key: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = image_records)]
pub struct InsertImageRecordEntity {
    pub user_id: Uuid,
    pub filename: String,
    pub operation: String,
    pub original_size: Option<String>,
    pub processed_size: Option<String>,
    pub storage_key: String,
    pub created_at: DateTime<Utc>,
}
