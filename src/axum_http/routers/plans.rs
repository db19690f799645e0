use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post},
};
use serde::Deserialize;

use crate::{
    auth::{AdminUser, AuthUser},
    domain::{
        repositories::{plans::PlanRepository, subscriptions::SubscriptionRepository},
        value_objects::plans::{CreatePlanModel, UpdatePlanModel},
    },
    infrastructure::postgres::{
        postgres_connection::PgPoolSquad,
        repositories::{plans::PlanPostgres, subscriptions::SubscriptionPostgres},
    },
    usecases::plans::PlanUseCase,
};

pub fn routes(db_pool: Arc<PgPoolSquad>) -> Router {
    let plan_repository = PlanPostgres::new(Arc::clone(&db_pool));
    let subscription_repository = SubscriptionPostgres::new(Arc::clone(&db_pool));
    let plan_usecase = PlanUseCase::new(
        Arc::new(plan_repository),
        Arc::new(subscription_repository),
    );

    Router::new()
        .route("/", get(list).post(create))
        .route("/:plan_id", get(get_by_id).put(update))
        .route("/:plan_id/soft", delete(soft_delete))
        .route("/:plan_id/restore", post(restore))
        .route("/:plan_id/hard", delete(hard_delete))
        .with_state(Arc::new(plan_usecase))
}

#[derive(Debug, Deserialize)]
pub struct ListPlansQuery {
    #[serde(default)]
    pub include_deleted: bool,
}

pub async fn list<P, S>(
    State(plan_usecase): State<Arc<PlanUseCase<P, S>>>,
    auth: AuthUser,
    Query(query): Query<ListPlansQuery>,
) -> impl IntoResponse
where
    P: PlanRepository + Send + Sync + 'static,
    S: SubscriptionRepository + Send + Sync + 'static,
{
    match plan_usecase
        .list(query.include_deleted, auth.is_admin())
        .await
    {
        Ok(plans) => (StatusCode::OK, Json(plans)).into_response(),
        Err(err) => err.into_response(),
    }
}

pub async fn get_by_id<P, S>(
    State(plan_usecase): State<Arc<PlanUseCase<P, S>>>,
    _auth: AuthUser,
    Path(plan_id): Path<i64>,
) -> impl IntoResponse
where
    P: PlanRepository + Send + Sync + 'static,
    S: SubscriptionRepository + Send + Sync + 'static,
{
    match plan_usecase.get(plan_id).await {
        Ok(plan) => (StatusCode::OK, Json(plan)).into_response(),
        Err(err) => err.into_response(),
    }
}

pub async fn create<P, S>(
    State(plan_usecase): State<Arc<PlanUseCase<P, S>>>,
    _admin: AdminUser,
    Json(create_plan_model): Json<CreatePlanModel>,
) -> impl IntoResponse
where
    P: PlanRepository + Send + Sync + 'static,
    S: SubscriptionRepository + Send + Sync + 'static,
{
    match plan_usecase.create(create_plan_model).await {
        Ok(plan) => (StatusCode::CREATED, Json(plan)).into_response(),
        Err(err) => err.into_response(),
    }
}

pub async fn update<P, S>(
    State(plan_usecase): State<Arc<PlanUseCase<P, S>>>,
    _admin: AdminUser,
    Path(plan_id): Path<i64>,
    Json(update_plan_model): Json<UpdatePlanModel>,
) -> impl IntoResponse
where
    P: PlanRepository + Send + Sync + 'static,
    S: SubscriptionRepository + Send + Sync + 'static,
{
    match plan_usecase.update(plan_id, update_plan_model).await {
        Ok(plan) => (StatusCode::OK, Json(plan)).into_response(),
        Err(err) => err.into_response(),
    }
}

pub async fn soft_delete<P, S>(
    State(plan_usecase): State<Arc<PlanUseCase<P, S>>>,
    _admin: AdminUser,
    Path(plan_id): Path<i64>,
) -> impl IntoResponse
where
    P: PlanRepository + Send + Sync + 'static,
    S: SubscriptionRepository + Send + Sync + 'static,
{
    match plan_usecase.soft_delete(plan_id).await {
        Ok(plan) => (StatusCode::OK, Json(plan)).into_response(),
        Err(err) => err.into_response(),
    }
}

pub async fn restore<P, S>(
    State(plan_usecase): State<Arc<PlanUseCase<P, S>>>,
    _admin: AdminUser,
    Path(plan_id): Path<i64>,
) -> impl IntoResponse
where
    P: PlanRepository + Send + Sync + 'static,
    S: SubscriptionRepository + Send + Sync + 'static,
{
    match plan_usecase.restore(plan_id).await {
        Ok(plan) => (StatusCode::OK, Json(plan)).into_response(),
        Err(err) => err.into_response(),
    }
}

pub async fn hard_delete<P, S>(
    State(plan_usecase): State<Arc<PlanUseCase<P, S>>>,
    _admin: AdminUser,
    Path(plan_id): Path<i64>,
) -> impl IntoResponse
where
    P: PlanRepository + Send + Sync + 'static,
    S: SubscriptionRepository + Send + Sync + 'static,
{
    match plan_usecase.hard_delete(plan_id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => err.into_response(),
    }
}
