use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{
    entities::{plans::PlanEntity, subscriptions::SubscriptionEntity},
    value_objects::enums::plan_change_directions::PlanChangeDirection,
};

/// Length of the billing period opened by every new subscription row.
pub const SUBSCRIPTION_PERIOD_DAYS: i64 = 30;

#[derive(Debug, Clone, Deserialize)]
pub struct AssignSubscriptionModel {
    pub plan_id: i64,
}

/// Subscription enriched with the quota snapshot of its plan. The plan row
/// may be soft-deleted; its last-known limits still govern the subscription.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SubscriptionModel {
    pub id: i64,
    pub user_id: Uuid,
    pub plan_id: i64,
    pub plan_name: String,
    pub operations_used: i32,
    pub max_operations: i32,
    pub operations_remaining: i32,
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
    pub is_active: bool,
}

impl SubscriptionModel {
    pub fn from_parts(subscription: SubscriptionEntity, plan: &PlanEntity) -> Self {
        let remaining = (plan.max_operations - subscription.operations_used).max(0);
        Self {
            id: subscription.id,
            user_id: subscription.user_id,
            plan_id: subscription.plan_id,
            plan_name: plan.name.clone(),
            operations_used: subscription.operations_used,
            max_operations: plan.max_operations,
            operations_remaining: remaining,
            start_date: subscription.start_date,
            end_date: subscription.end_date,
            is_active: subscription.is_active,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PlanChange {
    pub direction: PlanChangeDirection,
    pub subscription: SubscriptionModel,
}

/// Result of the atomic check-and-increment on `operations_used`.
#[derive(Debug, Clone, PartialEq)]
pub enum ConsumeOutcome {
    Consumed {
        subscription: SubscriptionEntity,
        plan: PlanEntity,
    },
    NoActiveSubscription,
    Exhausted {
        used: i32,
        limit: i32,
    },
}
