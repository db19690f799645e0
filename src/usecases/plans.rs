use std::sync::Arc;

use chrono::Utc;
use tracing::{error, info, warn};

use crate::domain::{
    entities::plans::{InsertPlanEntity, PlanEntity, UpdatePlanEntity},
    errors::{CoreError, CoreResult},
    repositories::{plans::PlanRepository, subscriptions::SubscriptionRepository},
    value_objects::plans::{CreatePlanModel, PlanModel, UpdatePlanModel},
};

/// Plan registry: owns plan lifecycle, soft-delete visibility and the
/// canonical tier ordering. Hard deletion is rejected while any
/// subscription, active or historical, still references the plan.
pub struct PlanUseCase<P, S>
where
    P: PlanRepository + Send + Sync + 'static,
    S: SubscriptionRepository + Send + Sync + 'static,
{
    plan_repo: Arc<P>,
    subscription_repo: Arc<S>,
}

impl<P, S> PlanUseCase<P, S>
where
    P: PlanRepository + Send + Sync + 'static,
    S: SubscriptionRepository + Send + Sync + 'static,
{
    pub fn new(plan_repo: Arc<P>, subscription_repo: Arc<S>) -> Self {
        Self {
            plan_repo,
            subscription_repo,
        }
    }

    pub async fn create(&self, create_plan_model: CreatePlanModel) -> CoreResult<PlanModel> {
        let name = create_plan_model.name.trim().to_string();
        info!(plan_name = %name, "plans: create requested");

        if name.is_empty() {
            return Err(CoreError::Validation("plan name must not be empty".to_string()));
        }
        if create_plan_model.max_operations < 0 {
            return Err(CoreError::Validation(
                "max_operations must be non-negative".to_string(),
            ));
        }
        if create_plan_model.price_minor < 0 {
            return Err(CoreError::Validation(
                "price_minor must be non-negative".to_string(),
            ));
        }

        self.ensure_name_available(&name, None).await?;

        let plan = self
            .plan_repo
            .create(InsertPlanEntity {
                name,
                max_operations: create_plan_model.max_operations,
                price_minor: create_plan_model.price_minor,
                description: create_plan_model.description,
                is_deleted: false,
                deleted_at: None,
                created_at: Utc::now(),
            })
            .await
            .map_err(|err| {
                error!(db_error = ?err, "plans: failed to insert plan");
                CoreError::Internal(err)
            })?;

        info!(plan_id = plan.id, plan_name = %plan.name, "plans: plan created");
        Ok(plan.into())
    }

    pub async fn update(
        &self,
        plan_id: i64,
        update_plan_model: UpdatePlanModel,
    ) -> CoreResult<PlanModel> {
        info!(plan_id, "plans: update requested");
        let no_changes = update_plan_model.is_empty();

        // Edits are blocked on soft-deleted plans; restore first.
        let current = self
            .plan_repo
            .find_by_id(plan_id, false)
            .await
            .map_err(|err| {
                error!(plan_id, db_error = ?err, "plans: failed to load plan for update");
                CoreError::Internal(err)
            })?
            .ok_or(CoreError::NotFound("plan"))?;

        let name = match update_plan_model.name {
            Some(raw) => {
                let trimmed = raw.trim().to_string();
                if trimmed.is_empty() {
                    return Err(CoreError::Validation(
                        "plan name must not be empty".to_string(),
                    ));
                }
                if !trimmed.eq_ignore_ascii_case(&current.name) {
                    self.ensure_name_available(&trimmed, Some(plan_id)).await?;
                }
                Some(trimmed)
            }
            None => None,
        };
        if let Some(max_operations) = update_plan_model.max_operations {
            if max_operations < 0 {
                return Err(CoreError::Validation(
                    "max_operations must be non-negative".to_string(),
                ));
            }
        }
        if let Some(price_minor) = update_plan_model.price_minor {
            if price_minor < 0 {
                return Err(CoreError::Validation(
                    "price_minor must be non-negative".to_string(),
                ));
            }
        }

        if no_changes {
            return Ok(current.into());
        }

        let changeset = UpdatePlanEntity {
            name,
            max_operations: update_plan_model.max_operations,
            price_minor: update_plan_model.price_minor,
            description: update_plan_model.description,
        };

        let updated = self
            .plan_repo
            .update(plan_id, changeset)
            .await
            .map_err(|err| {
                error!(plan_id, db_error = ?err, "plans: failed to update plan");
                CoreError::Internal(err)
            })?
            .ok_or(CoreError::NotFound("plan"))?;

        info!(plan_id, "plans: plan updated");
        Ok(updated.into())
    }

    pub async fn soft_delete(&self, plan_id: i64) -> CoreResult<PlanModel> {
        info!(plan_id, "plans: soft delete requested");
        let plan = self
            .plan_repo
            .soft_delete(plan_id)
            .await
            .map_err(|err| {
                error!(plan_id, db_error = ?err, "plans: failed to soft delete plan");
                CoreError::Internal(err)
            })?
            .ok_or_else(|| {
                warn!(plan_id, "plans: soft delete target missing or already deleted");
                CoreError::NotFound("plan")
            })?;

        info!(plan_id, "plans: plan soft deleted");
        Ok(plan.into())
    }

    pub async fn restore(&self, plan_id: i64) -> CoreResult<PlanModel> {
        info!(plan_id, "plans: restore requested");
        let plan = self
            .plan_repo
            .restore(plan_id)
            .await
            .map_err(|err| {
                error!(plan_id, db_error = ?err, "plans: failed to restore plan");
                CoreError::Internal(err)
            })?
            .ok_or_else(|| {
                warn!(plan_id, "plans: restore target missing or not deleted");
                CoreError::NotFound("plan")
            })?;

        info!(plan_id, "plans: plan restored");
        Ok(plan.into())
    }

    pub async fn hard_delete(&self, plan_id: i64) -> CoreResult<()> {
        warn!(plan_id, "plans: hard delete requested");

        self.plan_repo
            .find_by_id(plan_id, true)
            .await
            .map_err(|err| {
                error!(plan_id, db_error = ?err, "plans: failed to load plan for hard delete");
                CoreError::Internal(err)
            })?
            .ok_or(CoreError::NotFound("plan"))?;

        let references = self
            .subscription_repo
            .count_by_plan(plan_id)
            .await
            .map_err(|err| {
                error!(plan_id, db_error = ?err, "plans: failed to count plan references");
                CoreError::Internal(err)
            })?;
        if references > 0 {
            warn!(plan_id, references, "plans: hard delete rejected, plan is referenced");
            return Err(CoreError::Conflict(
                "plan is referenced by existing subscriptions".to_string(),
            ));
        }

        let removed = self.plan_repo.hard_delete(plan_id).await.map_err(|err| {
            error!(plan_id, db_error = ?err, "plans: failed to hard delete plan");
            CoreError::Internal(err)
        })?;
        if !removed {
            return Err(CoreError::NotFound("plan"));
        }

        info!(plan_id, "plans: plan hard deleted");
        Ok(())
    }

    pub async fn get(&self, plan_id: i64) -> CoreResult<PlanModel> {
        let plan = self
            .plan_repo
            .find_by_id(plan_id, false)
            .await
            .map_err(|err| {
                error!(plan_id, db_error = ?err, "plans: failed to load plan");
                CoreError::Internal(err)
            })?
            .ok_or(CoreError::NotFound("plan"))?;
        Ok(plan.into())
    }

    /// Lists plans in the canonical tier order: ascending quota, ties broken
    /// by id. Deleted plans are only visible to admin callers asking for them.
    pub async fn list(&self, include_deleted: bool, is_admin: bool) -> CoreResult<Vec<PlanModel>> {
        let effective_include_deleted = include_deleted && is_admin;
        let mut plans = self
            .plan_repo
            .list(effective_include_deleted)
            .await
            .map_err(|err| {
                error!(db_error = ?err, "plans: failed to list plans");
                CoreError::Internal(err)
            })?;

        plans.sort_by(|a, b| {
            a.max_operations
                .cmp(&b.max_operations)
                .then(a.id.cmp(&b.id))
        });

        info!(plan_count = plans.len(), effective_include_deleted, "plans: plans listed");
        Ok(plans.into_iter().map(PlanModel::from).collect())
    }

    async fn ensure_name_available(&self, name: &str, exclude_id: Option<i64>) -> CoreResult<()> {
        let existing: Option<PlanEntity> =
            self.plan_repo.find_by_name(name).await.map_err(|err| {
                error!(plan_name = %name, db_error = ?err, "plans: failed to check plan name");
                CoreError::Internal(err)
            })?;

        match existing {
            Some(other) if Some(other.id) != exclude_id => {
                warn!(plan_name = %name, existing_id = other.id, "plans: plan name already in use");
                Err(CoreError::Conflict(
                    "a plan with this name already exists".to_string(),
                ))
            }
            _ => Ok(()),
        }
    }
}
