use anyhow::Context;
use diesel::{ExpressionMethods, OptionalExtension, QueryDsl, SelectableHelper};
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    app_error::AppError,
    models::{CreateFinishedProductBatchEntity, FinishedProductBatchEntity},
    schema::finished_product_batches,
    storage::number_or_generate,
    workflow::{QualityStatus, Workflow},
};

#[derive(Deserialize, Validate, ToSchema, Debug)]
#[serde(rename_all = "camelCase")]
pub struct NewFinishedProductBatch {
    /// Generated as `FP-<year>-<suffix>` when omitted.
    pub batch_number: Option<String>,
    pub production_order_id: Uuid,
    #[validate(length(min = 1))]
    pub product_type: String,
    #[validate(range(min = 0))]
    pub quantity: i32,
    pub package_size: Option<String>,
    pub quality_grade: Option<String>,
    pub quality_status: Option<QualityStatus>,
    pub storage_location: Option<String>,
}

pub async fn create(
    conn: &mut AsyncPgConnection,
    input: NewFinishedProductBatch,
) -> Result<FinishedProductBatchEntity, AppError> {
    input.validate()?;

    let batch = diesel::insert_into(finished_product_batches::table)
        .values(CreateFinishedProductBatchEntity {
            id: Uuid::new_v4(),
            batch_number: number_or_generate(input.batch_number, "FP"),
            production_order_id: input.production_order_id,
            product_type: input.product_type,
            quantity: input.quantity,
            package_size: input.package_size,
            quality_grade: input.quality_grade,
            quality_status: input.quality_status.unwrap_or_default(),
            storage_location: input.storage_location,
        })
        .returning(FinishedProductBatchEntity::as_returning())
        .get_result(conn)
        .await
        .context("Failed to create finished product batch")?;

    tracing::info!(
        "Finished batch {} of {} x {} recorded",
        batch.batch_number,
        batch.quantity,
        batch.product_type
    );

    Ok(batch)
}

pub async fn list(
    conn: &mut AsyncPgConnection,
) -> Result<Vec<FinishedProductBatchEntity>, AppError> {
    let batches = finished_product_batches::table
        .order_by(finished_product_batches::created_at.desc())
        .select(FinishedProductBatchEntity::as_select())
        .get_results(conn)
        .await
        .context("Failed to get finished product batches")?;

    Ok(batches)
}

pub async fn get_by_id(
    conn: &mut AsyncPgConnection,
    id: Uuid,
) -> Result<Option<FinishedProductBatchEntity>, AppError> {
    let batch = finished_product_batches::table
        .find(id)
        .select(FinishedProductBatchEntity::as_select())
        .get_result(conn)
        .await
        .optional()
        .context("Failed to get finished product batch")?;

    Ok(batch)
}

pub async fn update_quality_status(
    conn: &mut AsyncPgConnection,
    id: Uuid,
    next: QualityStatus,
) -> Result<FinishedProductBatchEntity, AppError> {
    conn.transaction(move |conn| {
        Box::pin(async move {
            let current: QualityStatus = finished_product_batches::table
                .find(id)
                .select(finished_product_batches::quality_status)
                .for_update()
                .get_result(conn)
                .await?;

            current.transition_to(next)?;

            let updated = diesel::update(finished_product_batches::table.find(id))
                .set(finished_product_batches::quality_status.eq(next))
                .returning(FinishedProductBatchEntity::as_returning())
                .get_result(conn)
                .await?;

            Ok::<FinishedProductBatchEntity, AppError>(updated)
        })
    })
    .await
}
