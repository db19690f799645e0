use std::sync::Arc;

use axum::{
    Json, Router,
    body::Body,
    extract::{Multipart, Path, Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Deserialize;

use crate::{
    auth::AuthUser,
    domain::{
        errors::CoreError,
        repositories::{
            image_records::ImageRecordRepository, subscriptions::SubscriptionRepository,
        },
        value_objects::{
            enums::operation_kinds::OperationKind,
            images::ImageUpload,
            operations::RawParams,
        },
    },
    infrastructure::{
        engine::http_client::ProcessingEngineClient,
        postgres::{
            postgres_connection::PgPoolSquad,
            repositories::{
                image_records::ImageRecordPostgres, subscriptions::SubscriptionPostgres,
            },
        },
    },
    usecases::image_processing::{ImageProcessingUseCase, ProcessingEngine},
};

pub fn routes(db_pool: Arc<PgPoolSquad>, engine_base_url: String) -> Router {
    let engine = ProcessingEngineClient::new(engine_base_url);
    let image_processing_usecase = ImageProcessingUseCase::new(
        Arc::new(engine),
        Arc::new(SubscriptionPostgres::new(Arc::clone(&db_pool))),
        Arc::new(ImageRecordPostgres::new(Arc::clone(&db_pool))),
    );

    Router::new()
        .route("/process", post(process))
        .route("/history", get(history))
        .route("/:image_id", get(get_record).delete(delete_record))
        .with_state(Arc::new(image_processing_usecase))
}

/// Multipart form: a `file` part, an `operation` part, and any number of
/// operation parameters as plain text parts.
pub async fn process<E, S, I>(
    State(image_processing_usecase): State<Arc<ImageProcessingUseCase<E, S, I>>>,
    auth: AuthUser,
    mut multipart: Multipart,
) -> Response
where
    E: ProcessingEngine + Send + Sync + 'static,
    S: SubscriptionRepository + Send + Sync + 'static,
    I: ImageRecordRepository + Send + Sync + 'static,
{
    let mut upload: Option<ImageUpload> = None;
    let mut operation: Option<String> = None;
    let mut raw = RawParams::new();

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(err) => {
                return CoreError::Validation(format!("malformed multipart body: {}", err))
                    .into_response();
            }
        };

        let Some(name) = field.name().map(|name| name.to_string()) else {
            continue;
        };

        match name.as_str() {
            "file" => {
                let filename = field
                    .file_name()
                    .unwrap_or("upload.bin")
                    .to_string();
                let bytes = match field.bytes().await {
                    Ok(bytes) => bytes.to_vec(),
                    Err(err) => {
                        return CoreError::Validation(format!(
                            "failed to read uploaded file: {}",
                            err
                        ))
                        .into_response();
                    }
                };
                upload = Some(ImageUpload { filename, bytes });
            }
            "operation" => match field.text().await {
                Ok(text) => operation = Some(text),
                Err(err) => {
                    return CoreError::Validation(format!(
                        "failed to read `operation` field: {}",
                        err
                    ))
                    .into_response();
                }
            },
            _ => match field.text().await {
                Ok(text) => {
                    raw.insert(name, text);
                }
                Err(err) => {
                    return CoreError::Validation(format!(
                        "failed to read `{}` field: {}",
                        name, err
                    ))
                    .into_response();
                }
            },
        }
    }

    let Some(upload) = upload else {
        return CoreError::Validation("missing `file` part".to_string()).into_response();
    };
    let Some(operation) = operation else {
        return CoreError::Validation("missing `operation` part".to_string()).into_response();
    };
    let Some(kind) = OperationKind::from_str(&operation) else {
        return CoreError::Validation(format!("unknown operation `{}`", operation))
            .into_response();
    };

    match image_processing_usecase
        .dispatch(auth.user_id, upload, kind, raw)
        .await
    {
        Ok((processed, record)) => {
            let builder = Response::builder()
                .status(StatusCode::OK)
                .header(header::CONTENT_TYPE, "application/octet-stream")
                .header("x-image-id", record.id)
                .header("x-operation", record.operation)
                .header("x-original-size", processed.original_size())
                .header("x-processed-size", processed.processed_size());
            match builder.body(Body::from(processed.bytes)) {
                Ok(response) => response,
                Err(_) => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
            }
        }
        Err(err) => err.into_response(),
    }
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub skip: Option<i64>,
    pub limit: Option<i64>,
}

pub async fn history<E, S, I>(
    State(image_processing_usecase): State<Arc<ImageProcessingUseCase<E, S, I>>>,
    auth: AuthUser,
    Query(query): Query<HistoryQuery>,
) -> impl IntoResponse
where
    E: ProcessingEngine + Send + Sync + 'static,
    S: SubscriptionRepository + Send + Sync + 'static,
    I: ImageRecordRepository + Send + Sync + 'static,
{
    match image_processing_usecase
        .history(auth.user_id, query.skip, query.limit)
        .await
    {
        Ok(records) => (StatusCode::OK, Json(records)).into_response(),
        Err(err) => err.into_response(),
    }
}

pub async fn get_record<E, S, I>(
    State(image_processing_usecase): State<Arc<ImageProcessingUseCase<E, S, I>>>,
    auth: AuthUser,
    Path(image_id): Path<i64>,
) -> impl IntoResponse
where
    E: ProcessingEngine + Send + Sync + 'static,
    S: SubscriptionRepository + Send + Sync + 'static,
    I: ImageRecordRepository + Send + Sync + 'static,
{
    match image_processing_usecase
        .get_record(image_id, auth.user_id)
        .await
    {
        Ok(record) => (StatusCode::OK, Json(record)).into_response(),
        Err(err) => err.into_response(),
    }
}

pub async fn delete_record<E, S, I>(
    State(image_processing_usecase): State<Arc<ImageProcessingUseCase<E, S, I>>>,
    auth: AuthUser,
    Path(image_id): Path<i64>,
) -> impl IntoResponse
where
    E: ProcessingEngine + Send + Sync + 'static,
    S: SubscriptionRepository + Send + Sync + 'static,
    I: ImageRecordRepository + Send + Sync + 'static,
{
    match image_processing_usecase
        .delete_record(image_id, auth.user_id)
        .await
    {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => err.into_response(),
    }
}
