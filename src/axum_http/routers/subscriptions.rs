use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use tracing::error;

use crate::{
    auth::AuthUser,
    config::config_loader,
    domain::{
        errors::CoreError,
        repositories::{plans::PlanRepository, subscriptions::SubscriptionRepository},
        value_objects::subscriptions::AssignSubscriptionModel,
    },
    infrastructure::postgres::{
        postgres_connection::PgPoolSquad,
        repositories::{plans::PlanPostgres, subscriptions::SubscriptionPostgres},
    },
    usecases::{plans::PlanUseCase, subscriptions::SubscriptionUseCase},
};

pub fn routes(db_pool: Arc<PgPoolSquad>) -> Router {
    let subscription_usecase = SubscriptionUseCase::new(
        Arc::new(SubscriptionPostgres::new(Arc::clone(&db_pool))),
        Arc::new(PlanPostgres::new(Arc::clone(&db_pool))),
    );
    let plan_usecase = PlanUseCase::new(
        Arc::new(PlanPostgres::new(Arc::clone(&db_pool))),
        Arc::new(SubscriptionPostgres::new(Arc::clone(&db_pool))),
    );

    Router::new()
        .route("/my-subscription", get(my_subscription))
        .route("/history", get(history))
        .route("/assign", post(assign))
        .route("/provision", post(provision))
        .with_state(Arc::new(subscription_usecase))
        .merge(
            Router::new()
                .route("/plans", get(available_plans))
                .with_state(Arc::new(plan_usecase)),
        )
}

/// Plans a subscriber can switch to. Soft-deleted tiers never show up here.
pub async fn available_plans<P, S>(
    State(plan_usecase): State<Arc<PlanUseCase<P, S>>>,
    _auth: AuthUser,
) -> impl IntoResponse
where
    P: PlanRepository + Send + Sync + 'static,
    S: SubscriptionRepository + Send + Sync + 'static,
{
    match plan_usecase.list(false, false).await {
        Ok(plans) => (StatusCode::OK, Json(plans)).into_response(),
        Err(err) => err.into_response(),
    }
}

pub async fn my_subscription<S, P>(
    State(subscription_usecase): State<Arc<SubscriptionUseCase<S, P>>>,
    auth: AuthUser,
) -> impl IntoResponse
where
    S: SubscriptionRepository + Send + Sync + 'static,
    P: PlanRepository + Send + Sync + 'static,
{
    match subscription_usecase.get_active(auth.user_id).await {
        Ok(subscription) => (StatusCode::OK, Json(subscription)).into_response(),
        Err(err) => err.into_response(),
    }
}

pub async fn history<S, P>(
    State(subscription_usecase): State<Arc<SubscriptionUseCase<S, P>>>,
    auth: AuthUser,
) -> impl IntoResponse
where
    S: SubscriptionRepository + Send + Sync + 'static,
    P: PlanRepository + Send + Sync + 'static,
{
    match subscription_usecase.history(auth.user_id).await {
        Ok(subscriptions) => (StatusCode::OK, Json(subscriptions)).into_response(),
        Err(err) => err.into_response(),
    }
}

pub async fn assign<S, P>(
    State(subscription_usecase): State<Arc<SubscriptionUseCase<S, P>>>,
    auth: AuthUser,
    Json(assign_subscription_model): Json<AssignSubscriptionModel>,
) -> impl IntoResponse
where
    S: SubscriptionRepository + Send + Sync + 'static,
    P: PlanRepository + Send + Sync + 'static,
{
    match subscription_usecase
        .assign(auth.user_id, assign_subscription_model.plan_id)
        .await
    {
        Ok(plan_change) => (StatusCode::CREATED, Json(plan_change)).into_response(),
        Err(err) => err.into_response(),
    }
}

pub async fn provision<S, P>(
    State(subscription_usecase): State<Arc<SubscriptionUseCase<S, P>>>,
    auth: AuthUser,
) -> impl IntoResponse
where
    S: SubscriptionRepository + Send + Sync + 'static,
    P: PlanRepository + Send + Sync + 'static,
{
    let config = match config_loader::load() {
        Ok(config) => config,
        Err(err) => {
            error!(config_error = ?err, "subscriptions: failed to load config");
            return CoreError::Internal(err).into_response();
        }
    };

    match subscription_usecase
        .provision_default(auth.user_id, config.defaults.plan_id)
        .await
    {
        Ok(subscription) => (StatusCode::CREATED, Json(subscription)).into_response(),
        Err(err) => err.into_response(),
    }
}
