use anyhow::Context;
use diesel::{ExpressionMethods, OptionalExtension, QueryDsl, SelectableHelper};
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    app_error::AppError,
    models::{CreateRawMaterialBatchEntity, RawMaterialBatchEntity},
    schema::raw_material_batches,
    storage::{f64_from_number_or_string, number_or_generate, opt_f64_from_number_or_string},
    workflow::{QualityStatus, Workflow},
};

#[derive(Deserialize, Validate, ToSchema, Debug)]
#[serde(rename_all = "camelCase")]
pub struct NewRawMaterialBatch {
    /// Generated as `RM-<year>-<suffix>` when omitted.
    pub batch_number: Option<String>,
    pub delivery_id: Uuid,
    #[serde(deserialize_with = "f64_from_number_or_string")]
    #[validate(range(min = 0.0))]
    pub quantity: f64,
    #[serde(default, deserialize_with = "opt_f64_from_number_or_string")]
    #[validate(range(min = 0.0, max = 100.0))]
    pub moisture_level: Option<f64>,
    pub quality_status: Option<QualityStatus>,
    pub storage_location: Option<String>,
}

pub async fn create(
    conn: &mut AsyncPgConnection,
    input: NewRawMaterialBatch,
) -> Result<RawMaterialBatchEntity, AppError> {
    input.validate()?;

    let batch = diesel::insert_into(raw_material_batches::table)
        .values(CreateRawMaterialBatchEntity {
            id: Uuid::new_v4(),
            batch_number: number_or_generate(input.batch_number, "RM"),
            delivery_id: input.delivery_id,
            quantity: input.quantity,
            moisture_level: input.moisture_level,
            quality_status: input.quality_status.unwrap_or_default(),
            storage_location: input.storage_location,
        })
        .returning(RawMaterialBatchEntity::as_returning())
        .get_result(conn)
        .await
        .context("Failed to create raw material batch")?;

    Ok(batch)
}

pub async fn list(conn: &mut AsyncPgConnection) -> Result<Vec<RawMaterialBatchEntity>, AppError> {
    let batches = raw_material_batches::table
        .order_by(raw_material_batches::created_at.desc())
        .select(RawMaterialBatchEntity::as_select())
        .get_results(conn)
        .await
        .context("Failed to get raw material batches")?;

    Ok(batches)
}

pub async fn get_by_id(
    conn: &mut AsyncPgConnection,
    id: Uuid,
) -> Result<Option<RawMaterialBatchEntity>, AppError> {
    let batch = raw_material_batches::table
        .find(id)
        .select(RawMaterialBatchEntity::as_select())
        .get_result(conn)
        .await
        .optional()
        .context("Failed to get raw material batch")?;

    Ok(batch)
}

pub async fn update_quality_status(
    conn: &mut AsyncPgConnection,
    id: Uuid,
    next: QualityStatus,
) -> Result<RawMaterialBatchEntity, AppError> {
    conn.transaction(move |conn| {
        Box::pin(async move {
            let current: QualityStatus = raw_material_batches::table
                .find(id)
                .select(raw_material_batches::quality_status)
                .for_update()
                .get_result(conn)
                .await?;

            current.transition_to(next)?;

            let updated = diesel::update(raw_material_batches::table.find(id))
                .set((
                    raw_material_batches::quality_status.eq(next),
                    raw_material_batches::updated_at.eq(diesel::dsl::now),
                ))
                .returning(RawMaterialBatchEntity::as_returning())
                .get_result(conn)
                .await?;

            tracing::info!(
                "Raw material batch {} quality moved from {} to {}",
                updated.batch_number,
                current,
                next
            );

            Ok::<RawMaterialBatchEntity, AppError>(updated)
        })
    })
    .await
}
