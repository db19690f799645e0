use anyhow::Result;
use async_trait::async_trait;
use diesel::{RunQueryDsl, delete, insert_into, prelude::*};
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::{
    entities::image_records::{ImageRecordEntity, InsertImageRecordEntity},
    repositories::image_records::ImageRecordRepository,
};
use crate::infrastructure::postgres::{
    postgres_connection::PgPoolSquad, schema::image_records,
};

pub struct ImageRecordPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl ImageRecordPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl ImageRecordRepository for ImageRecordPostgres {
    async fn create(
        &self,
        insert_image_record_entity: InsertImageRecordEntity,
    ) -> Result<ImageRecordEntity> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = insert_into(image_records::table)
            .values(&insert_image_record_entity)
            .returning(ImageRecordEntity::as_returning())
            .get_result::<ImageRecordEntity>(&mut conn)?;

        Ok(result)
    }

    async fn list_by_user(
        &self,
        user_id: Uuid,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<ImageRecordEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let results = image_records::table
            .filter(image_records::user_id.eq(user_id))
            .order(image_records::created_at.desc())
            .offset(offset)
            .limit(limit)
            .select(ImageRecordEntity::as_select())
            .load::<ImageRecordEntity>(&mut conn)?;

        Ok(results)
    }

    async fn find_by_id(&self, image_id: i64) -> Result<Option<ImageRecordEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = image_records::table
            .find(image_id)
            .select(ImageRecordEntity::as_select())
            .first::<ImageRecordEntity>(&mut conn)
            .optional()?;

        Ok(result)
    }

    async fn delete(&self, image_id: i64) -> Result<bool> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let affected =
            delete(image_records::table.filter(image_records::id.eq(image_id))).execute(&mut conn)?;
        Ok(affected > 0)
    }
}
