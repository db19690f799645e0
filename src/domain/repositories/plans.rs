use anyhow::Result;
use async_trait::async_trait;

use crate::domain::entities::plans::{InsertPlanEntity, PlanEntity, UpdatePlanEntity};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PlanRepository: Send + Sync {
    /// `include_deleted = false` hides soft-deleted rows.
    async fn find_by_id(&self, plan_id: i64, include_deleted: bool) -> Result<Option<PlanEntity>>;

    /// Case-insensitive name lookup. Always sees soft-deleted rows so that a
    /// deleted plan keeps reserving its name.
    async fn find_by_name(&self, name: &str) -> Result<Option<PlanEntity>>;

    async fn list(&self, include_deleted: bool) -> Result<Vec<PlanEntity>>;

    async fn create(&self, insert_plan_entity: InsertPlanEntity) -> Result<PlanEntity>;

    /// Applies the changeset to a non-deleted plan. `None` when the plan is
    /// missing or soft-deleted.
    async fn update(
        &self,
        plan_id: i64,
        update_plan_entity: UpdatePlanEntity,
    ) -> Result<Option<PlanEntity>>;

    /// Marks an active plan deleted. `None` when missing or already deleted.
    async fn soft_delete(&self, plan_id: i64) -> Result<Option<PlanEntity>>;

    /// Clears the deletion flags. `None` when missing or not deleted.
    async fn restore(&self, plan_id: i64) -> Result<Option<PlanEntity>>;

    /// Physically removes the row. Referential checks happen in the usecase.
    async fn hard_delete(&self, plan_id: i64) -> Result<bool>;
}
