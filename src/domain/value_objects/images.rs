use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::domain::entities::image_records::ImageRecordEntity;

/// Source image handed to the dispatcher by the upload layer.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub filename: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageDimensions {
    pub width: u32,
    pub height: u32,
}

/// Output of the external processing engine: the transformed bytes plus the
/// dimensions of the source and the result.
#[derive(Debug, Clone)]
pub struct ProcessedImage {
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub source_width: u32,
    pub source_height: u32,
}

impl ProcessedImage {
    pub fn original_size(&self) -> String {
        format!("{}x{}", self.source_width, self.source_height)
    }

    pub fn processed_size(&self) -> String {
        format!("{}x{}", self.width, self.height)
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ImageRecordModel {
    pub id: i64,
    pub user_id: Uuid,
    pub filename: String,
    pub operation: String,
    pub original_size: Option<String>,
    pub processed_size: Option<String>,
    pub storage_key: String,
    pub created_at: DateTime<Utc>,
}

impl From<ImageRecordEntity> for ImageRecordModel {
    fn from(value: ImageRecordEntity) -> Self {
        Self {
            id: value.id,
            user_id: value.user_id,
            filename: value.filename,
            operation: value.operation,
            original_size: value.original_size,
            processed_size: value.processed_size,
            storage_key: value.storage_key,
            created_at: value.created_at,
        }
    }
}
