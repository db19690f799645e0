use std::sync::Arc;

use tracing::{error, info, warn};
use uuid::Uuid;

use crate::domain::{
    errors::{CoreError, CoreResult},
    repositories::{plans::PlanRepository, subscriptions::SubscriptionRepository},
    value_objects::{
        enums::plan_change_directions::PlanChangeDirection,
        subscriptions::{ConsumeOutcome, PlanChange, SubscriptionModel},
    },
};

/// Subscription lifecycle and quota accounting. A user holds at most one
/// active subscription; every plan change closes the current period and
/// opens a fresh one with a zeroed counter.
pub struct SubscriptionUseCase<S, P>
where
    S: SubscriptionRepository + Send + Sync + 'static,
    P: PlanRepository + Send + Sync + 'static,
{
    subscription_repo: Arc<S>,
    plan_repo: Arc<P>,
}

impl<S, P> SubscriptionUseCase<S, P>
where
    S: SubscriptionRepository + Send + Sync + 'static,
    P: PlanRepository + Send + Sync + 'static,
{
    pub fn new(subscription_repo: Arc<S>, plan_repo: Arc<P>) -> Self {
        Self {
            subscription_repo,
            plan_repo,
        }
    }

    pub async fn get_active(&self, user_id: Uuid) -> CoreResult<SubscriptionModel> {
        let (subscription, plan) = self
            .subscription_repo
            .find_active_by_user(user_id)
            .await
            .map_err(|err| {
                error!(%user_id, db_error = ?err, "subscriptions: failed to load active subscription");
                CoreError::Internal(err)
            })?
            .ok_or(CoreError::NotFound("active subscription"))?;

        Ok(SubscriptionModel::from_parts(subscription, &plan))
    }

    /// Every period the user has ever held, newest first.
    pub async fn history(&self, user_id: Uuid) -> CoreResult<Vec<SubscriptionModel>> {
        let rows = self
            .subscription_repo
            .list_by_user(user_id)
            .await
            .map_err(|err| {
                error!(%user_id, db_error = ?err, "subscriptions: failed to list subscription history");
                CoreError::Internal(err)
            })?;

        Ok(rows
            .into_iter()
            .map(|(subscription, plan)| SubscriptionModel::from_parts(subscription, &plan))
            .collect())
    }

    /// Switches the user to `plan_id`. The change direction is judged by
    /// quota size, not plan identity, and re-assigning the current plan is
    /// rejected rather than silently resetting the counter.
    pub async fn assign(&self, user_id: Uuid, plan_id: i64) -> CoreResult<PlanChange> {
        info!(%user_id, plan_id, "subscriptions: plan change requested");

        let target = self
            .plan_repo
            .find_by_id(plan_id, false)
            .await
            .map_err(|err| {
                error!(plan_id, db_error = ?err, "subscriptions: failed to load target plan");
                CoreError::Internal(err)
            })?
            .ok_or(CoreError::NotFound("plan"))?;

        let current = self
            .subscription_repo
            .find_active_by_user(user_id)
            .await
            .map_err(|err| {
                error!(%user_id, db_error = ?err, "subscriptions: failed to load active subscription");
                CoreError::Internal(err)
            })?;

        if let Some((subscription, _)) = &current {
            if subscription.plan_id == plan_id {
                warn!(%user_id, plan_id, "subscriptions: user already on requested plan");
                return Err(CoreError::Conflict(
                    "user is already subscribed to this plan".to_string(),
                ));
            }
        }

        let direction = PlanChangeDirection::from_quotas(
            current.as_ref().map(|(_, plan)| plan.max_operations),
            target.max_operations,
        );

        let (subscription, plan) = self
            .subscription_repo
            .assign(user_id, plan_id)
            .await
            .map_err(|err| {
                error!(%user_id, plan_id, db_error = ?err, "subscriptions: failed to assign plan");
                CoreError::Internal(err)
            })?;

        info!(%user_id, plan_id, %direction, "subscriptions: plan change applied");
        Ok(PlanChange {
            direction,
            subscription: SubscriptionModel::from_parts(subscription, &plan),
        })
    }

    /// Puts a user with no active subscription on the default plan. Safe to
    /// call repeatedly; an existing active subscription is returned as-is.
    pub async fn provision_default(
        &self,
        user_id: Uuid,
        default_plan_id: i64,
    ) -> CoreResult<SubscriptionModel> {
        if let Some((subscription, plan)) = self
            .subscription_repo
            .find_active_by_user(user_id)
            .await
            .map_err(|err| {
                error!(%user_id, db_error = ?err, "subscriptions: failed to load active subscription");
                CoreError::Internal(err)
            })?
        {
            return Ok(SubscriptionModel::from_parts(subscription, &plan));
        }

        self.plan_repo
            .find_by_id(default_plan_id, false)
            .await
            .map_err(|err| {
                error!(plan_id = default_plan_id, db_error = ?err, "subscriptions: failed to load default plan");
                CoreError::Internal(err)
            })?
            .ok_or(CoreError::NotFound("default plan"))?;

        let (subscription, plan) = self
            .subscription_repo
            .assign(user_id, default_plan_id)
            .await
            .map_err(|err| {
                error!(%user_id, plan_id = default_plan_id, db_error = ?err, "subscriptions: failed to provision default plan");
                CoreError::Internal(err)
            })?;

        info!(%user_id, plan_id = default_plan_id, "subscriptions: default plan provisioned");
        Ok(SubscriptionModel::from_parts(subscription, &plan))
    }

    /// Atomically charges `amount` operations against the user's active
    /// subscription and returns the updated snapshot.
    pub async fn consume(&self, user_id: Uuid, amount: i32) -> CoreResult<SubscriptionModel> {
        if amount <= 0 {
            return Err(CoreError::Validation(
                "consume amount must be positive".to_string(),
            ));
        }

        let outcome = self
            .subscription_repo
            .consume(user_id, amount)
            .await
            .map_err(|err| {
                error!(%user_id, db_error = ?err, "subscriptions: failed to consume quota");
                CoreError::Internal(err)
            })?;

        match outcome {
            ConsumeOutcome::Consumed { subscription, plan } => {
                Ok(SubscriptionModel::from_parts(subscription, &plan))
            }
            ConsumeOutcome::NoActiveSubscription => {
                warn!(%user_id, "subscriptions: consume without active subscription");
                Err(CoreError::NotFound("active subscription"))
            }
            ConsumeOutcome::Exhausted { used, limit } => {
                warn!(%user_id, used, limit, "subscriptions: quota exhausted");
                Err(CoreError::QuotaExceeded { used, limit })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        entities::{plans::PlanEntity, subscriptions::SubscriptionEntity},
        repositories::{plans::MockPlanRepository, subscriptions::MockSubscriptionRepository},
    };
    use chrono::{Duration, Utc};
    use mockall::predicate::eq;

    fn sample_plan(id: i64, name: &str, max_operations: i32) -> PlanEntity {
        PlanEntity {
            id,
            name: name.to_string(),
            max_operations,
            price_minor: 990,
            description: None,
            is_deleted: false,
            deleted_at: None,
            created_at: Utc::now(),
        }
    }

    fn sample_subscription(user_id: Uuid, plan_id: i64, operations_used: i32) -> SubscriptionEntity {
        let now = Utc::now();
        SubscriptionEntity {
            id: 100 + plan_id,
            user_id,
            plan_id,
            operations_used,
            start_date: now,
            end_date: Some(now + Duration::days(30)),
            is_active: true,
            created_at: now,
        }
    }

    fn usecase(
        subscription_repo: MockSubscriptionRepository,
        plan_repo: MockPlanRepository,
    ) -> SubscriptionUseCase<MockSubscriptionRepository, MockPlanRepository> {
        SubscriptionUseCase::new(Arc::new(subscription_repo), Arc::new(plan_repo))
    }

    #[tokio::test]
    async fn get_active_without_subscription_is_not_found() {
        let user_id = Uuid::new_v4();
        let mut subscription_repo = MockSubscriptionRepository::new();
        subscription_repo
            .expect_find_active_by_user()
            .with(eq(user_id))
            .returning(|_| { Ok(None) });

        let uc = usecase(subscription_repo, MockPlanRepository::new());
        let err = uc.get_active(user_id).await.unwrap_err();
        assert!(matches!(err, CoreError::NotFound("active subscription")));
    }

    #[tokio::test]
    async fn assign_to_unknown_or_deleted_plan_is_not_found() {
        let user_id = Uuid::new_v4();
        let mut plan_repo = MockPlanRepository::new();
        plan_repo
            .expect_find_by_id()
            .with(eq(9), eq(false))
            .returning(|_, _| { Ok(None) });

        let uc = usecase(MockSubscriptionRepository::new(), plan_repo);
        let err = uc.assign(user_id, 9).await.unwrap_err();
        assert!(matches!(err, CoreError::NotFound("plan")));
    }

    #[tokio::test]
    async fn assign_to_current_plan_conflicts() {
        let user_id = Uuid::new_v4();
        let mut plan_repo = MockPlanRepository::new();
        plan_repo
            .expect_find_by_id()
            .with(eq(2), eq(false))
            .returning(|_, _| { Ok(Some(sample_plan(2, "Pro", 100))) });

        let mut subscription_repo = MockSubscriptionRepository::new();
        subscription_repo
            .expect_find_active_by_user()
            .with(eq(user_id))
            .returning(move |_| {
                {
                    Ok(Some((
                        sample_subscription(user_id, 2, 5),
                        sample_plan(2, "Pro", 100),
                    )))
                }
            });

        let uc = usecase(subscription_repo, plan_repo);
        let err = uc.assign(user_id, 2).await.unwrap_err();
        assert!(matches!(err, CoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn assign_judges_direction_by_quota_not_plan_id() {
        let user_id = Uuid::new_v4();

        // Target plan id is lower than the current one but its quota is
        // larger, so the change is still an upgrade.
        let mut plan_repo = MockPlanRepository::new();
        plan_repo
            .expect_find_by_id()
            .with(eq(1), eq(false))
            .returning(|_, _| { Ok(Some(sample_plan(1, "Mega", 1000))) });

        let mut subscription_repo = MockSubscriptionRepository::new();
        subscription_repo
            .expect_find_active_by_user()
            .with(eq(user_id))
            .returning(move |_| {
                {
                    Ok(Some((
                        sample_subscription(user_id, 5, 42),
                        sample_plan(5, "Basic", 10),
                    )))
                }
            });
        subscription_repo
            .expect_assign()
            .with(eq(user_id), eq(1))
            .returning(move |uid, plan_id| {
                {
                    Ok((
                        sample_subscription(uid, plan_id, 0),
                        sample_plan(plan_id, "Mega", 1000),
                    ))
                }
            });

        let uc = usecase(subscription_repo, plan_repo);
        let change = uc.assign(user_id, 1).await.unwrap();
        assert_eq!(change.direction, PlanChangeDirection::Upgrade);
        assert_eq!(change.subscription.operations_used, 0);
        assert_eq!(change.subscription.max_operations, 1000);
    }

    #[tokio::test]
    async fn assign_with_equal_quotas_is_lateral() {
        let user_id = Uuid::new_v4();
        let mut plan_repo = MockPlanRepository::new();
        plan_repo
            .expect_find_by_id()
            .with(eq(3), eq(false))
            .returning(|_, _| { Ok(Some(sample_plan(3, "Basic B", 10))) });

        let mut subscription_repo = MockSubscriptionRepository::new();
        subscription_repo
            .expect_find_active_by_user()
            .returning(move |_| {
                {
                    Ok(Some((
                        sample_subscription(user_id, 2, 3),
                        sample_plan(2, "Basic A", 10),
                    )))
                }
            });
        subscription_repo.expect_assign().returning(move |uid, plan_id| {
            {
                Ok((
                    sample_subscription(uid, plan_id, 0),
                    sample_plan(plan_id, "Basic B", 10),
                ))
            }
        });

        let uc = usecase(subscription_repo, plan_repo);
        let change = uc.assign(user_id, 3).await.unwrap();
        assert_eq!(change.direction, PlanChangeDirection::Lateral);
    }

    #[tokio::test]
    async fn first_assignment_is_initial() {
        let user_id = Uuid::new_v4();
        let mut plan_repo = MockPlanRepository::new();
        plan_repo
            .expect_find_by_id()
            .with(eq(1), eq(false))
            .returning(|_, _| { Ok(Some(sample_plan(1, "Basic", 10))) });

        let mut subscription_repo = MockSubscriptionRepository::new();
        subscription_repo
            .expect_find_active_by_user()
            .returning(|_| { Ok(None) });
        subscription_repo.expect_assign().returning(move |uid, plan_id| {
            {
                Ok((
                    sample_subscription(uid, plan_id, 0),
                    sample_plan(plan_id, "Basic", 10),
                ))
            }
        });

        let uc = usecase(subscription_repo, plan_repo);
        let change = uc.assign(user_id, 1).await.unwrap();
        assert_eq!(change.direction, PlanChangeDirection::Initial);
    }

    #[tokio::test]
    async fn provision_default_is_idempotent() {
        let user_id = Uuid::new_v4();
        let mut subscription_repo = MockSubscriptionRepository::new();
        // assign must not be called when a subscription already exists.
        subscription_repo
            .expect_find_active_by_user()
            .with(eq(user_id))
            .returning(move |_| {
                {
                    Ok(Some((
                        sample_subscription(user_id, 1, 4),
                        sample_plan(1, "Basic", 10),
                    )))
                }
            });

        let uc = usecase(subscription_repo, MockPlanRepository::new());
        let subscription = uc.provision_default(user_id, 1).await.unwrap();
        assert_eq!(subscription.plan_id, 1);
        assert_eq!(subscription.operations_used, 4);
    }

    fn deleted_plan(id: i64, name: &str, max_operations: i32) -> PlanEntity {
        let mut plan = sample_plan(id, name, max_operations);
        plan.is_deleted = true;
        plan.deleted_at = Some(Utc::now());
        plan
    }

    #[tokio::test]
    async fn deleted_plan_still_governs_active_subscription() {
        let user_id = Uuid::new_v4();
        let mut subscription_repo = MockSubscriptionRepository::new();
        subscription_repo
            .expect_find_active_by_user()
            .with(eq(user_id))
            .returning(move |uid| {
                {
                    Ok(Some((
                        sample_subscription(uid, 2, 4),
                        deleted_plan(2, "Retired", 25),
                    )))
                }
            });

        let uc = usecase(subscription_repo, MockPlanRepository::new());
        let subscription = uc.get_active(user_id).await.unwrap();
        assert_eq!(subscription.plan_name, "Retired");
        assert_eq!(subscription.max_operations, 25);
        assert_eq!(subscription.operations_remaining, 21);
    }

    #[tokio::test]
    async fn consume_succeeds_against_a_deleted_plan() {
        let user_id = Uuid::new_v4();
        let mut subscription_repo = MockSubscriptionRepository::new();
        subscription_repo
            .expect_consume()
            .with(eq(user_id), eq(1))
            .returning(move |uid, _| {
                {
                    Ok(ConsumeOutcome::Consumed {
                        subscription: sample_subscription(uid, 2, 5),
                        plan: deleted_plan(2, "Retired", 25),
                    })
                }
            });

        let uc = usecase(subscription_repo, MockPlanRepository::new());
        let subscription = uc.consume(user_id, 1).await.unwrap();
        assert_eq!(subscription.max_operations, 25);
        assert_eq!(subscription.operations_used, 5);
    }

    #[tokio::test]
    async fn consume_rejects_non_positive_amount() {
        let uc = usecase(MockSubscriptionRepository::new(), MockPlanRepository::new());
        let err = uc.consume(Uuid::new_v4(), 0).await.unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
    }

    #[tokio::test]
    async fn consume_surfaces_exhaustion_as_quota_error() {
        let user_id = Uuid::new_v4();
        let mut subscription_repo = MockSubscriptionRepository::new();
        subscription_repo
            .expect_consume()
            .with(eq(user_id), eq(1))
            .returning(|_, _| {
                { Ok(ConsumeOutcome::Exhausted { used: 10, limit: 10 }) }
            });

        let uc = usecase(subscription_repo, MockPlanRepository::new());
        let err = uc.consume(user_id, 1).await.unwrap_err();
        assert!(matches!(err, CoreError::QuotaExceeded { used: 10, limit: 10 }));
    }

    #[tokio::test]
    async fn consume_without_subscription_is_not_found() {
        let user_id = Uuid::new_v4();
        let mut subscription_repo = MockSubscriptionRepository::new();
        subscription_repo
            .expect_consume()
            .returning(|_, _| { Ok(ConsumeOutcome::NoActiveSubscription) });

        let uc = usecase(subscription_repo, MockPlanRepository::new());
        let err = uc.consume(user_id, 1).await.unwrap_err();
        assert!(matches!(err, CoreError::NotFound("active subscription")));
    }

    #[tokio::test]
    async fn consume_returns_updated_snapshot() {
        let user_id = Uuid::new_v4();
        let mut subscription_repo = MockSubscriptionRepository::new();
        subscription_repo
            .expect_consume()
            .with(eq(user_id), eq(1))
            .returning(move |uid, _| {
                {
                    Ok(ConsumeOutcome::Consumed {
                        subscription: sample_subscription(uid, 1, 7),
                        plan: sample_plan(1, "Basic", 10),
                    })
                }
            });

        let uc = usecase(subscription_repo, MockPlanRepository::new());
        let subscription = uc.consume(user_id, 1).await.unwrap();
        assert_eq!(subscription.operations_used, 7);
        assert_eq!(subscription.operations_remaining, 3);
    }
}
