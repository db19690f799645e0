use anyhow::Result;
use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::entities::image_records::{ImageRecordEntity, InsertImageRecordEntity};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ImageRecordRepository: Send + Sync {
    async fn create(
        &self,
        insert_image_record_entity: InsertImageRecordEntity,
    ) -> Result<ImageRecordEntity>;

    async fn list_by_user(
        &self,
        user_id: Uuid,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<ImageRecordEntity>>;

    async fn find_by_id(&self, image_id: i64) -> Result<Option<ImageRecordEntity>>;

    async fn delete(&self, image_id: i64) -> Result<bool>;
}
