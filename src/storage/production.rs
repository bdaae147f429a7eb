use anyhow::Context;
use chrono::{DateTime, Utc};
use diesel::{ExpressionMethods, OptionalExtension, QueryDsl, SelectableHelper};
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    app_error::AppError,
    auth::AuthUser,
    models::{
        CreateProductionOrderEntity, CreateProductionRunMaterialEntity, ProductionOrderEntity,
        ProductionRunMaterialEntity, ProductionStatusChangeset,
    },
    schema::{production_orders, production_run_materials},
    storage::{f64_from_number_or_string, number_or_generate},
    workflow::{ProductionStatus, Workflow, check_progress, progress_percent},
};

#[derive(Deserialize, Validate, ToSchema, Debug)]
#[serde(rename_all = "camelCase")]
pub struct NewProductionOrder {
    /// Generated as `PO-<year>-<suffix>` when omitted.
    pub order_number: Option<String>,
    #[validate(length(min = 1))]
    pub product_type: String,
    #[validate(range(min = 1))]
    pub target_quantity: i32,
    pub scheduled_date: Option<DateTime<Utc>>,
}

#[derive(Deserialize, Validate, ToSchema, Debug)]
#[serde(rename_all = "camelCase")]
pub struct NewRunMaterial {
    pub batch_id: Uuid,
    #[serde(deserialize_with = "f64_from_number_or_string")]
    #[validate(range(exclusive_min = 0.0))]
    pub quantity_used: f64,
}

/// A production order as the API shows it: the stored row plus its completion.
#[derive(Serialize, ToSchema, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ProductionOrderView {
    #[serde(flatten)]
    pub order: ProductionOrderEntity,
    pub progress_percent: f64,
}

impl From<ProductionOrderEntity> for ProductionOrderView {
    fn from(order: ProductionOrderEntity) -> Self {
        let progress_percent = progress_percent(order.completed_quantity, order.target_quantity);
        Self {
            order,
            progress_percent,
        }
    }
}

/// Timestamps a status change stamps on the order. Existing stamps are kept.
pub(crate) fn status_changeset(
    order: &ProductionOrderEntity,
    next: ProductionStatus,
    now: DateTime<Utc>,
) -> ProductionStatusChangeset {
    let started_at = match next {
        ProductionStatus::InProgress if order.started_at.is_none() => Some(now),
        _ => None,
    };
    let completed_at = match next {
        ProductionStatus::Completed if order.completed_at.is_none() => Some(now),
        _ => None,
    };

    ProductionStatusChangeset {
        status: next,
        started_at,
        completed_at,
        updated_at: now,
    }
}

pub async fn create(
    conn: &mut AsyncPgConnection,
    creator: &AuthUser,
    input: NewProductionOrder,
) -> Result<ProductionOrderView, AppError> {
    input.validate()?;

    let order = diesel::insert_into(production_orders::table)
        .values(CreateProductionOrderEntity {
            id: Uuid::new_v4(),
            order_number: number_or_generate(input.order_number, "PO"),
            product_type: input.product_type,
            target_quantity: input.target_quantity,
            completed_quantity: 0,
            status: ProductionStatus::Scheduled,
            scheduled_date: input.scheduled_date,
            started_at: None,
            completed_at: None,
            created_by: creator.id,
        })
        .returning(ProductionOrderEntity::as_returning())
        .get_result(conn)
        .await
        .context("Failed to create production order")?;

    tracing::info!(
        "Production order {} created by {}",
        order.order_number,
        creator.email
    );

    Ok(order.into())
}

pub async fn list(conn: &mut AsyncPgConnection) -> Result<Vec<ProductionOrderView>, AppError> {
    let orders = production_orders::table
        .order_by(production_orders::created_at.desc())
        .select(ProductionOrderEntity::as_select())
        .get_results(conn)
        .await
        .context("Failed to get production orders")?;

    Ok(orders.into_iter().map(ProductionOrderView::from).collect())
}

pub async fn get_by_id(
    conn: &mut AsyncPgConnection,
    id: Uuid,
) -> Result<Option<ProductionOrderView>, AppError> {
    let order = production_orders::table
        .find(id)
        .select(ProductionOrderEntity::as_select())
        .get_result(conn)
        .await
        .optional()
        .context("Failed to get production order")?;

    Ok(order.map(ProductionOrderView::from))
}

pub async fn update_status(
    conn: &mut AsyncPgConnection,
    id: Uuid,
    next: ProductionStatus,
) -> Result<ProductionOrderView, AppError> {
    conn.transaction(move |conn| {
        Box::pin(async move {
            let current: ProductionOrderEntity = production_orders::table
                .find(id)
                .select(ProductionOrderEntity::as_select())
                .for_update()
                .get_result(conn)
                .await?;

            current.status.transition_to(next)?;

            let updated = diesel::update(production_orders::table.find(id))
                .set(status_changeset(&current, next, Utc::now()))
                .returning(ProductionOrderEntity::as_returning())
                .get_result(conn)
                .await?;

            tracing::info!(
                "Production order {} moved from {} to {}",
                updated.order_number,
                current.status,
                next
            );

            Ok::<ProductionOrderView, AppError>(updated.into())
        })
    })
    .await
}

pub async fn update_progress(
    conn: &mut AsyncPgConnection,
    id: Uuid,
    completed_quantity: i32,
) -> Result<ProductionOrderView, AppError> {
    conn.transaction(move |conn| {
        Box::pin(async move {
            let (current, target): (i32, i32) = production_orders::table
                .find(id)
                .select((
                    production_orders::completed_quantity,
                    production_orders::target_quantity,
                ))
                .for_update()
                .get_result(conn)
                .await?;

            let accepted = check_progress(current, target, completed_quantity)?;

            let updated = diesel::update(production_orders::table.find(id))
                .set((
                    production_orders::completed_quantity.eq(accepted),
                    production_orders::updated_at.eq(diesel::dsl::now),
                ))
                .returning(ProductionOrderEntity::as_returning())
                .get_result(conn)
                .await?;

            Ok::<ProductionOrderView, AppError>(updated.into())
        })
    })
    .await
}

pub async fn record_material(
    conn: &mut AsyncPgConnection,
    order_id: Uuid,
    input: NewRunMaterial,
) -> Result<ProductionRunMaterialEntity, AppError> {
    input.validate()?;

    let material = diesel::insert_into(production_run_materials::table)
        .values(CreateProductionRunMaterialEntity {
            id: Uuid::new_v4(),
            production_order_id: order_id,
            batch_id: input.batch_id,
            quantity_used: input.quantity_used,
        })
        .returning(ProductionRunMaterialEntity::as_returning())
        .get_result(conn)
        .await
        .context("Failed to record production material")?;

    Ok(material)
}

pub async fn list_materials(
    conn: &mut AsyncPgConnection,
    order_id: Uuid,
) -> Result<Vec<ProductionRunMaterialEntity>, AppError> {
    let materials = production_run_materials::table
        .filter(production_run_materials::production_order_id.eq(order_id))
        .order_by(production_run_materials::used_at.desc())
        .select(ProductionRunMaterialEntity::as_select())
        .get_results(conn)
        .await
        .context("Failed to get production materials")?;

    Ok(materials)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn order(status: ProductionStatus, completed: i32, target: i32) -> ProductionOrderEntity {
        let at = Utc.with_ymd_and_hms(2025, 1, 6, 6, 0, 0).unwrap();
        ProductionOrderEntity {
            id: Uuid::new_v4(),
            order_number: "PO-2025-000001".into(),
            product_type: "Super Sifted Maize Flour".into(),
            target_quantity: target,
            completed_quantity: completed,
            status,
            scheduled_date: None,
            started_at: None,
            completed_at: None,
            created_by: Uuid::new_v4(),
            created_at: at,
            updated_at: at,
        }
    }

    #[test]
    fn starting_stamps_started_at_only() {
        let now = Utc::now();
        let changes = status_changeset(
            &order(ProductionStatus::Scheduled, 0, 1000),
            ProductionStatus::InProgress,
            now,
        );
        assert_eq!(changes.started_at, Some(now));
        assert_eq!(changes.completed_at, None);
    }

    #[test]
    fn completing_keeps_existing_start() {
        let now = Utc::now();
        let mut running = order(ProductionStatus::InProgress, 1000, 1000);
        running.started_at = Some(running.created_at);
        let changes = status_changeset(&running, ProductionStatus::Completed, now);
        assert_eq!(changes.started_at, None);
        assert_eq!(changes.completed_at, Some(now));
    }

    #[test]
    fn cancelling_stamps_nothing() {
        let changes = status_changeset(
            &order(ProductionStatus::Scheduled, 0, 10),
            ProductionStatus::Cancelled,
            Utc::now(),
        );
        assert_eq!(changes.started_at, None);
        assert_eq!(changes.completed_at, None);
    }

    #[test]
    fn view_carries_progress_percent() {
        let view = ProductionOrderView::from(order(ProductionStatus::InProgress, 850, 1000));
        assert_eq!(view.progress_percent, 85.0);

        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["progressPercent"], 85.0);
        assert_eq!(json["completedQuantity"], 850);
        assert_eq!(json["status"], "in_progress");
    }

    #[test]
    fn zero_target_fails_validation() {
        let input: NewProductionOrder = serde_json::from_value(serde_json::json!({
            "productType": "Maize Bran",
            "targetQuantity": 0,
        }))
        .unwrap();
        assert!(input.validate().is_err());
    }
}
