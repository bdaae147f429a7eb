use anyhow::Context;
use diesel::{ExpressionMethods, QueryDsl, SelectableHelper, upsert::excluded};
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    app_error::AppError,
    models::{CreateWarehouseStockEntity, WarehouseStockEntity},
    schema::warehouse_stock,
    storage::{f64_from_number_or_string, opt_f64_from_number_or_string},
};

/// Sets the stock held for one `(item type, batch)` pair.
#[derive(Deserialize, Validate, ToSchema, Debug)]
#[serde(rename_all = "camelCase")]
pub struct StockLevel {
    #[validate(length(min = 1))]
    pub item_type: String,
    pub batch_id: Option<Uuid>,
    #[validate(length(min = 1))]
    pub location: String,
    #[serde(deserialize_with = "f64_from_number_or_string")]
    #[validate(range(min = 0.0))]
    pub current_quantity: f64,
    #[serde(default, deserialize_with = "opt_f64_from_number_or_string")]
    #[validate(range(min = 0.0))]
    pub reserved_quantity: Option<f64>,
    #[serde(default, deserialize_with = "opt_f64_from_number_or_string")]
    #[validate(range(exclusive_min = 0.0))]
    pub max_capacity: Option<f64>,
}

pub async fn list(conn: &mut AsyncPgConnection) -> Result<Vec<WarehouseStockEntity>, AppError> {
    let stock = warehouse_stock::table
        .order_by(warehouse_stock::updated_at.desc())
        .select(WarehouseStockEntity::as_select())
        .get_results(conn)
        .await
        .context("Failed to get warehouse stock")?;

    Ok(stock)
}

pub async fn upsert(
    conn: &mut AsyncPgConnection,
    input: StockLevel,
) -> Result<WarehouseStockEntity, AppError> {
    input.validate()?;

    conn.transaction(move |conn| {
        Box::pin(async move {
            let mut row = diesel::insert_into(warehouse_stock::table)
                .values(CreateWarehouseStockEntity {
                    id: Uuid::new_v4(),
                    item_type: input.item_type,
                    batch_id: input.batch_id,
                    location: input.location,
                    current_quantity: input.current_quantity,
                    reserved_quantity: input.reserved_quantity.unwrap_or(0.0),
                    max_capacity: input.max_capacity,
                })
                .on_conflict((warehouse_stock::item_type, warehouse_stock::batch_id))
                .do_update()
                .set((
                    warehouse_stock::current_quantity
                        .eq(excluded(warehouse_stock::current_quantity)),
                    warehouse_stock::location.eq(excluded(warehouse_stock::location)),
                    warehouse_stock::updated_at.eq(diesel::dsl::now),
                ))
                .returning(WarehouseStockEntity::as_returning())
                .get_result(conn)
                .await?;

            if let Some(reserved) = input.reserved_quantity {
                row = diesel::update(warehouse_stock::table.find(row.id))
                    .set(warehouse_stock::reserved_quantity.eq(reserved))
                    .returning(WarehouseStockEntity::as_returning())
                    .get_result(conn)
                    .await?;
            }
            if let Some(capacity) = input.max_capacity {
                row = diesel::update(warehouse_stock::table.find(row.id))
                    .set(warehouse_stock::max_capacity.eq(capacity))
                    .returning(WarehouseStockEntity::as_returning())
                    .get_result(conn)
                    .await?;
            }

            tracing::info!(
                "Stock {} at {} set to {}",
                row.item_type,
                row.location,
                row.current_quantity
            );

            Ok::<WarehouseStockEntity, AppError>(row)
        })
    })
    .await
}
