use anyhow::Result;
use async_trait::async_trait;
use chrono::{Duration, Utc};
use diesel::{Connection, RunQueryDsl, insert_into, prelude::*, update};
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::{
    entities::{
        plans::PlanEntity,
        subscriptions::{InsertSubscriptionEntity, SubscriptionEntity},
    },
    repositories::subscriptions::SubscriptionRepository,
    value_objects::subscriptions::{ConsumeOutcome, SUBSCRIPTION_PERIOD_DAYS},
};
use crate::infrastructure::postgres::{
    postgres_connection::PgPoolSquad,
    schema::{plans, subscriptions},
};

pub struct SubscriptionPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl SubscriptionPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl SubscriptionRepository for SubscriptionPostgres {
    async fn find_active_by_user(
        &self,
        user_id: Uuid,
    ) -> Result<Option<(SubscriptionEntity, PlanEntity)>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        // The join ignores the plan's soft-delete flag: a deleted plan keeps
        // governing subscriptions it already has.
        let result = subscriptions::table
            .inner_join(plans::table)
            .filter(subscriptions::user_id.eq(user_id))
            .filter(subscriptions::is_active.eq(true))
            .select((SubscriptionEntity::as_select(), PlanEntity::as_select()))
            .first::<(SubscriptionEntity, PlanEntity)>(&mut conn)
            .optional()?;

        Ok(result)
    }

    async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<(SubscriptionEntity, PlanEntity)>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let results = subscriptions::table
            .inner_join(plans::table)
            .filter(subscriptions::user_id.eq(user_id))
            .order(subscriptions::start_date.desc())
            .select((SubscriptionEntity::as_select(), PlanEntity::as_select()))
            .load::<(SubscriptionEntity, PlanEntity)>(&mut conn)?;

        Ok(results)
    }

    async fn count_by_plan(&self, plan_id: i64) -> Result<i64> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let count = subscriptions::table
            .filter(subscriptions::plan_id.eq(plan_id))
            .count()
            .get_result::<i64>(&mut conn)?;

        Ok(count)
    }

    async fn assign(
        &self,
        user_id: Uuid,
        plan_id: i64,
    ) -> Result<(SubscriptionEntity, PlanEntity)> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = conn.transaction::<(SubscriptionEntity, PlanEntity), diesel::result::Error, _>(
            |tx| {
                let now = Utc::now();

                update(subscriptions::table)
                    .filter(subscriptions::user_id.eq(user_id))
                    .filter(subscriptions::is_active.eq(true))
                    .set((
                        subscriptions::is_active.eq(false),
                        subscriptions::end_date.eq(Some(now)),
                    ))
                    .execute(tx)?;

                // Re-checked inside the transaction: a plan soft-deleted
                // after the caller's lookup must not gain new subscribers.
                // The NotFound error rolls the whole assignment back.
                let plan = plans::table
                    .find(plan_id)
                    .filter(plans::is_deleted.eq(false))
                    .select(PlanEntity::as_select())
                    .first::<PlanEntity>(tx)?;

                let subscription = insert_into(subscriptions::table)
                    .values(&InsertSubscriptionEntity {
                        user_id,
                        plan_id,
                        operations_used: 0,
                        start_date: now,
                        end_date: Some(now + Duration::days(SUBSCRIPTION_PERIOD_DAYS)),
                        is_active: true,
                    })
                    .returning(SubscriptionEntity::as_returning())
                    .get_result::<SubscriptionEntity>(tx)?;

                Ok((subscription, plan))
            },
        )?;

        Ok(result)
    }

    async fn consume(&self, user_id: Uuid, amount: i32) -> Result<ConsumeOutcome> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = conn.transaction::<ConsumeOutcome, diesel::result::Error, _>(|tx| {
            // Row lock so concurrent consumers serialize on the same user.
            let subscription = subscriptions::table
                .filter(subscriptions::user_id.eq(user_id))
                .filter(subscriptions::is_active.eq(true))
                .for_update()
                .select(SubscriptionEntity::as_select())
                .first::<SubscriptionEntity>(tx)
                .optional()?;

            let Some(subscription) = subscription else {
                return Ok(ConsumeOutcome::NoActiveSubscription);
            };

            let plan = plans::table
                .find(subscription.plan_id)
                .select(PlanEntity::as_select())
                .first::<PlanEntity>(tx)?;

            if subscription.operations_used + amount > plan.max_operations {
                return Ok(ConsumeOutcome::Exhausted {
                    used: subscription.operations_used,
                    limit: plan.max_operations,
                });
            }

            let updated = update(subscriptions::table)
                .filter(subscriptions::id.eq(subscription.id))
                .set(subscriptions::operations_used.eq(subscriptions::operations_used + amount))
                .returning(SubscriptionEntity::as_returning())
                .get_result::<SubscriptionEntity>(tx)?;

            Ok(ConsumeOutcome::Consumed {
                subscription: updated,
                plan,
            })
        })?;

        Ok(result)
    }
}
