use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::{RunQueryDsl, delete, insert_into, prelude::*, sql_types::Text, update};
use std::sync::Arc;

use crate::domain::{
    entities::plans::{InsertPlanEntity, PlanEntity, UpdatePlanEntity},
    repositories::plans::PlanRepository,
};
use crate::infrastructure::postgres::{postgres_connection::PgPoolSquad, schema::plans};

diesel::define_sql_function!(fn lower(x: Text) -> Text);

pub struct PlanPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl PlanPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl PlanRepository for PlanPostgres {
    async fn find_by_id(&self, plan_id: i64, include_deleted: bool) -> Result<Option<PlanEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let mut query = plans::table
            .filter(plans::id.eq(plan_id))
            .select(PlanEntity::as_select())
            .into_boxed();
        if !include_deleted {
            query = query.filter(plans::is_deleted.eq(false));
        }

        let result = query.first::<PlanEntity>(&mut conn).optional()?;
        Ok(result)
    }

    // Case-insensitive, and deliberately blind to the soft-delete flag so a
    // deleted plan still reserves its name.
    async fn find_by_name(&self, name: &str) -> Result<Option<PlanEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = plans::table
            .filter(lower(plans::name).eq(name.to_lowercase()))
            .select(PlanEntity::as_select())
            .first::<PlanEntity>(&mut conn)
            .optional()?;

        Ok(result)
    }

    async fn list(&self, include_deleted: bool) -> Result<Vec<PlanEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let mut query = plans::table.select(PlanEntity::as_select()).into_boxed();
        if !include_deleted {
            query = query.filter(plans::is_deleted.eq(false));
        }

        let results = query
            .order((plans::max_operations.asc(), plans::id.asc()))
            .load::<PlanEntity>(&mut conn)?;

        Ok(results)
    }

    async fn create(&self, insert_plan_entity: InsertPlanEntity) -> Result<PlanEntity> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = insert_into(plans::table)
            .values(&insert_plan_entity)
            .returning(PlanEntity::as_returning())
            .get_result::<PlanEntity>(&mut conn)?;

        Ok(result)
    }

    async fn update(
        &self,
        plan_id: i64,
        update_plan_entity: UpdatePlanEntity,
    ) -> Result<Option<PlanEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = update(plans::table)
            .filter(plans::id.eq(plan_id))
            .filter(plans::is_deleted.eq(false))
            .set(&update_plan_entity)
            .returning(PlanEntity::as_returning())
            .get_result::<PlanEntity>(&mut conn)
            .optional()?;

        Ok(result)
    }

    async fn soft_delete(&self, plan_id: i64) -> Result<Option<PlanEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = update(plans::table)
            .filter(plans::id.eq(plan_id))
            .filter(plans::is_deleted.eq(false))
            .set((
                plans::is_deleted.eq(true),
                plans::deleted_at.eq(Some(Utc::now())),
            ))
            .returning(PlanEntity::as_returning())
            .get_result::<PlanEntity>(&mut conn)
            .optional()?;

        Ok(result)
    }

    async fn restore(&self, plan_id: i64) -> Result<Option<PlanEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = update(plans::table)
            .filter(plans::id.eq(plan_id))
            .filter(plans::is_deleted.eq(true))
            .set((
                plans::is_deleted.eq(false),
                plans::deleted_at.eq(None::<DateTime<Utc>>),
            ))
            .returning(PlanEntity::as_returning())
            .get_result::<PlanEntity>(&mut conn)
            .optional()?;

        Ok(result)
    }

    async fn hard_delete(&self, plan_id: i64) -> Result<bool> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let affected = delete(plans::table.filter(plans::id.eq(plan_id))).execute(&mut conn)?;
        Ok(affected > 0)
    }
}
