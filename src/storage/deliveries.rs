use anyhow::Context;
use chrono::{DateTime, Utc};
use diesel::{ExpressionMethods, OptionalExtension, QueryDsl, SelectableHelper};
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    app_error::AppError,
    models::{CreateDeliveryEntity, DeliveryEntity},
    schema::truck_deliveries,
    storage::opt_f64_from_number_or_string,
    workflow::{DeliveryStatus, Workflow},
};

#[derive(Deserialize, Validate, ToSchema, Debug)]
#[serde(rename_all = "camelCase")]
pub struct NewDelivery {
    #[validate(length(min = 1))]
    pub truck_registration: String,
    #[validate(length(min = 1))]
    pub driver_name: String,
    pub driver_phone: Option<String>,
    pub supplier_id: Uuid,
    #[serde(default, deserialize_with = "opt_f64_from_number_or_string")]
    #[validate(range(min = 0.0))]
    pub expected_quantity: Option<f64>,
    #[serde(default, deserialize_with = "opt_f64_from_number_or_string")]
    #[validate(range(min = 0.0))]
    pub actual_quantity: Option<f64>,
    /// Defaults to `pending`.
    pub status: Option<DeliveryStatus>,
    pub delivery_date: Option<DateTime<Utc>>,
}

pub async fn create(
    conn: &mut AsyncPgConnection,
    input: NewDelivery,
) -> Result<DeliveryEntity, AppError> {
    input.validate()?;

    let delivery = diesel::insert_into(truck_deliveries::table)
        .values(CreateDeliveryEntity {
            id: Uuid::new_v4(),
            truck_registration: input.truck_registration.trim().to_uppercase(),
            driver_name: input.driver_name,
            driver_phone: input.driver_phone,
            supplier_id: input.supplier_id,
            expected_quantity: input.expected_quantity,
            actual_quantity: input.actual_quantity,
            status: input.status.unwrap_or_default(),
            delivery_date: input.delivery_date.unwrap_or_else(Utc::now),
        })
        .returning(DeliveryEntity::as_returning())
        .get_result(conn)
        .await
        .context("Failed to create delivery")?;

    Ok(delivery)
}

pub async fn list(conn: &mut AsyncPgConnection) -> Result<Vec<DeliveryEntity>, AppError> {
    let deliveries = truck_deliveries::table
        .order_by(truck_deliveries::delivery_date.desc())
        .select(DeliveryEntity::as_select())
        .get_results(conn)
        .await
        .context("Failed to get deliveries")?;

    Ok(deliveries)
}

pub async fn get_by_id(
    conn: &mut AsyncPgConnection,
    id: Uuid,
) -> Result<Option<DeliveryEntity>, AppError> {
    let delivery = truck_deliveries::table
        .find(id)
        .select(DeliveryEntity::as_select())
        .get_result(conn)
        .await
        .optional()
        .context("Failed to get delivery")?;

    Ok(delivery)
}

/// Deliveries still waiting for the weighbridge.
pub async fn pending_weighbridge(
    conn: &mut AsyncPgConnection,
) -> Result<Vec<DeliveryEntity>, AppError> {
    let deliveries = truck_deliveries::table
        .filter(truck_deliveries::status.eq(DeliveryStatus::Pending))
        .order_by(truck_deliveries::delivery_date.desc())
        .select(DeliveryEntity::as_select())
        .get_results(conn)
        .await
        .context("Failed to get pending weighbridge deliveries")?;

    Ok(deliveries)
}

pub async fn update_status(
    conn: &mut AsyncPgConnection,
    id: Uuid,
    next: DeliveryStatus,
) -> Result<DeliveryEntity, AppError> {
    conn.transaction(move |conn| {
        Box::pin(async move {
            let current: DeliveryEntity = truck_deliveries::table
                .find(id)
                .select(DeliveryEntity::as_select())
                .for_update()
                .get_result(conn)
                .await?;

            current.status.transition_to(next)?;

            let updated = diesel::update(truck_deliveries::table.find(id))
                .set((
                    truck_deliveries::status.eq(next),
                    truck_deliveries::updated_at.eq(diesel::dsl::now),
                ))
                .returning(DeliveryEntity::as_returning())
                .get_result(conn)
                .await?;

            tracing::info!(
                "Delivery {} moved from {} to {}",
                id,
                current.status,
                next
            );

            Ok::<DeliveryEntity, AppError>(updated)
        })
    })
    .await
}
