use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::domain::{
    entities::image_records::InsertImageRecordEntity,
    errors::{CoreError, CoreResult},
    repositories::{
        image_records::ImageRecordRepository, subscriptions::SubscriptionRepository,
    },
    value_objects::{
        enums::operation_kinds::OperationKind,
        images::{ImageDimensions, ImageRecordModel, ImageUpload, ProcessedImage},
        operations::{self, OperationParams, RawParams},
        subscriptions::ConsumeOutcome,
    },
};

const DEFAULT_HISTORY_LIMIT: i64 = 50;
const MAX_HISTORY_LIMIT: i64 = 200;

/// Gateway to the external pixel engine. The engine owns all image math;
/// this side only ships bytes and typed parameters across.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProcessingEngine: Send + Sync {
    /// Natural dimensions of the submitted image.
    async fn probe(&self, image: Vec<u8>) -> Result<ImageDimensions>;

    async fn process(
        &self,
        image: Vec<u8>,
        kind: OperationKind,
        params: OperationParams,
    ) -> Result<ProcessedImage>;
}

/// Usage-gated dispatcher: checks the caller's quota, runs the engine, then
/// charges one operation and persists the record. The quota check happens
/// before any engine call and the charge only after engine success.
pub struct ImageProcessingUseCase<E, S, I>
where
    E: ProcessingEngine + 'static,
    S: SubscriptionRepository + Send + Sync + 'static,
    I: ImageRecordRepository + Send + Sync + 'static,
{
    engine: Arc<E>,
    subscription_repo: Arc<S>,
    image_record_repo: Arc<I>,
}

impl<E, S, I> ImageProcessingUseCase<E, S, I>
where
    E: ProcessingEngine + 'static,
    S: SubscriptionRepository + Send + Sync + 'static,
    I: ImageRecordRepository + Send + Sync + 'static,
{
    pub fn new(engine: Arc<E>, subscription_repo: Arc<S>, image_record_repo: Arc<I>) -> Self {
        Self {
            engine,
            subscription_repo,
            image_record_repo,
        }
    }

    pub async fn dispatch(
        &self,
        user_id: Uuid,
        upload: ImageUpload,
        kind: OperationKind,
        raw: RawParams,
    ) -> CoreResult<(ProcessedImage, ImageRecordModel)> {
        info!(%user_id, operation = %kind, filename = %upload.filename, "images: dispatch requested");

        if upload.bytes.is_empty() {
            return Err(CoreError::Validation(
                "uploaded file must not be empty".to_string(),
            ));
        }
        if upload.filename.trim().is_empty() {
            return Err(CoreError::Validation(
                "uploaded file must carry a filename".to_string(),
            ));
        }

        // Only an aspect-locked resize with a single dimension needs the
        // source dimensions, so only that shape pays the probe. Everything
        // else type-checks immediately, before any repo or engine call.
        let params = match requires_probe(kind, &raw) {
            true => None,
            false => Some(operations::validate(kind, &raw, None)?),
        };

        let (subscription, plan) = self
            .subscription_repo
            .find_active_by_user(user_id)
            .await
            .map_err(|err| {
                error!(%user_id, db_error = ?err, "images: failed to load active subscription");
                CoreError::Internal(err)
            })?
            .ok_or(CoreError::NotFound("active subscription"))?;

        if subscription.operations_used >= plan.max_operations {
            warn!(
                %user_id,
                used = subscription.operations_used,
                limit = plan.max_operations,
                "images: dispatch rejected, quota exhausted"
            );
            return Err(CoreError::QuotaExceeded {
                used: subscription.operations_used,
                limit: plan.max_operations,
            });
        }

        // The probe is an engine call too, so it sits behind the quota gate.
        let params = match params {
            Some(params) => params,
            None => {
                let source = self.probe_source(&upload).await?;
                operations::validate(kind, &raw, Some(source))?
            }
        };

        let processed = self
            .engine
            .process(upload.bytes.clone(), kind, params)
            .await
            .map_err(|err| {
                error!(%user_id, operation = %kind, engine_error = ?err, "images: engine call failed");
                CoreError::Processing(err.to_string())
            })?;

        // The engine already did the work, so a consume failure here must not
        // take the result away from the caller. The discrepancy is surfaced
        // for reconciliation instead.
        match self.subscription_repo.consume(user_id, 1).await {
            Ok(ConsumeOutcome::Consumed { subscription, plan }) => {
                info!(
                    %user_id,
                    used = subscription.operations_used,
                    limit = plan.max_operations,
                    "images: operation charged"
                );
            }
            Ok(ConsumeOutcome::Exhausted { used, limit }) => {
                warn!(%user_id, used, limit, "images: grace overage, quota raced to exhaustion after engine success");
            }
            Ok(ConsumeOutcome::NoActiveSubscription) => {
                warn!(%user_id, "images: grace overage, subscription vanished after engine success");
            }
            Err(err) => {
                warn!(%user_id, db_error = ?err, "images: grace overage, consume failed after engine success");
            }
        }

        let record = self
            .image_record_repo
            .create(InsertImageRecordEntity {
                user_id,
                filename: upload.filename.clone(),
                operation: kind.to_string(),
                original_size: Some(processed.original_size()),
                processed_size: Some(processed.processed_size()),
                storage_key: storage_key_for(user_id, &upload.filename),
                created_at: Utc::now(),
            })
            .await
            .map_err(|err| {
                error!(%user_id, db_error = ?err, "images: failed to persist image record");
                CoreError::Internal(err)
            })?;

        info!(%user_id, image_id = record.id, operation = %kind, "images: dispatch completed");
        Ok((processed, record.into()))
    }

    pub async fn history(
        &self,
        user_id: Uuid,
        skip: Option<i64>,
        limit: Option<i64>,
    ) -> CoreResult<Vec<ImageRecordModel>> {
        let offset = skip.unwrap_or(0).max(0);
        let limit = limit
            .unwrap_or(DEFAULT_HISTORY_LIMIT)
            .clamp(1, MAX_HISTORY_LIMIT);

        let records = self
            .image_record_repo
            .list_by_user(user_id, offset, limit)
            .await
            .map_err(|err| {
                error!(%user_id, db_error = ?err, "images: failed to list image records");
                CoreError::Internal(err)
            })?;

        Ok(records.into_iter().map(ImageRecordModel::from).collect())
    }

    pub async fn get_record(&self, image_id: i64, user_id: Uuid) -> CoreResult<ImageRecordModel> {
        let record = self.find_owned(image_id, user_id).await?;
        Ok(record.into())
    }

    /// Removes a record from the history. Usage counters are untouched; the
    /// operation was already paid for when it ran.
    pub async fn delete_record(&self, image_id: i64, user_id: Uuid) -> CoreResult<()> {
        self.find_owned(image_id, user_id).await?;

        let removed = self.image_record_repo.delete(image_id).await.map_err(|err| {
            error!(image_id, db_error = ?err, "images: failed to delete image record");
            CoreError::Internal(err)
        })?;
        if !removed {
            return Err(CoreError::NotFound("image record"));
        }

        info!(%user_id, image_id, "images: image record deleted");
        Ok(())
    }

    async fn probe_source(&self, upload: &ImageUpload) -> CoreResult<ImageDimensions> {
        self.engine
            .probe(upload.bytes.clone())
            .await
            .map_err(|err| {
                error!(engine_error = ?err, "images: probe call failed");
                CoreError::Processing(err.to_string())
            })
    }

    /// Records owned by other users are reported as absent, not forbidden.
    async fn find_owned(
        &self,
        image_id: i64,
        user_id: Uuid,
    ) -> CoreResult<crate::domain::entities::image_records::ImageRecordEntity> {
        let record = self
            .image_record_repo
            .find_by_id(image_id)
            .await
            .map_err(|err| {
                error!(image_id, db_error = ?err, "images: failed to load image record");
                CoreError::Internal(err)
            })?
            .ok_or(CoreError::NotFound("image record"))?;

        if record.user_id != user_id {
            warn!(%user_id, image_id, "images: record lookup across owners");
            return Err(CoreError::NotFound("image record"));
        }
        Ok(record)
    }
}

fn storage_key_for(user_id: Uuid, filename: &str) -> String {
    format!("{}/{}/{}", user_id, Uuid::new_v4(), filename)
}

/// True only for an aspect-locked resize missing one dimension; that is the
/// single case where typing the parameters needs the source dimensions.
/// Malformed values are left for the validator to reject.
fn requires_probe(kind: OperationKind, raw: &RawParams) -> bool {
    if kind != OperationKind::Resize {
        return false;
    }
    let aspect_lock = matches!(
        raw.get("aspect_lock").map(|value| value.trim()),
        Some("true") | Some("1")
    );
    aspect_lock && (raw.contains_key("width") != raw.contains_key("height"))
}
