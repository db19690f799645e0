use anyhow::Result;
use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{
    entities::{plans::PlanEntity, subscriptions::SubscriptionEntity},
    value_objects::subscriptions::ConsumeOutcome,
};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SubscriptionRepository: Send + Sync {
    /// Active subscription joined with its plan row (soft-deleted plans
    /// included) so quota reads are one consistent snapshot.
    async fn find_active_by_user(
        &self,
        user_id: Uuid,
    ) -> Result<Option<(SubscriptionEntity, PlanEntity)>>;

    /// Full history, newest period first.
    async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<(SubscriptionEntity, PlanEntity)>>;

    /// Number of subscription rows, active or historical, referencing a plan.
    async fn count_by_plan(&self, plan_id: i64) -> Result<i64>;

    /// Deactivates the current subscription (if any) and inserts the new one
    /// in a single transaction: no window with zero or two active rows.
    async fn assign(&self, user_id: Uuid, plan_id: i64) -> Result<(SubscriptionEntity, PlanEntity)>;

    /// Atomic check-and-increment on `operations_used`, with the plan quota
    /// read inside the same transaction as the locked subscription row.
    async fn consume(&self, user_id: Uuid, amount: i32) -> Result<ConsumeOutcome>;
}
