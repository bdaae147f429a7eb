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
        CreateDispatchItemEntity, CreateDispatchOrderEntity, DispatchItemEntity,
        DispatchOrderEntity, DispatchStatusChangeset,
    },
    schema::{dispatch_items, dispatch_orders},
    storage::number_or_generate,
    workflow::{DispatchStatus, Workflow},
};

#[derive(Deserialize, Validate, ToSchema, Debug)]
#[serde(rename_all = "camelCase")]
pub struct NewDispatchItem {
    pub finished_batch_id: Uuid,
    #[validate(range(min = 1))]
    pub quantity: i32,
}

#[derive(Deserialize, Validate, ToSchema, Debug)]
#[serde(rename_all = "camelCase")]
pub struct NewDispatchOrder {
    /// Generated as `DO-<year>-<suffix>` when omitted.
    pub order_number: Option<String>,
    pub customer_id: Option<String>,
    #[validate(length(min = 1))]
    pub customer_name: String,
    pub delivery_address: Option<String>,
    pub scheduled_date: Option<DateTime<Utc>>,
    #[serde(default)]
    #[validate(nested)]
    pub items: Vec<NewDispatchItem>,
}

#[derive(Serialize, ToSchema, Debug)]
#[serde(rename_all = "camelCase")]
pub struct DispatchOrderWithItems {
    #[serde(flatten)]
    pub order: DispatchOrderEntity,
    pub items: Vec<DispatchItemEntity>,
}

pub(crate) fn status_changeset(
    order: &DispatchOrderEntity,
    next: DispatchStatus,
    now: DateTime<Utc>,
) -> DispatchStatusChangeset {
    let dispatched_at = match next {
        DispatchStatus::Dispatched if order.dispatched_at.is_none() => Some(now),
        _ => None,
    };
    let delivered_at = match next {
        DispatchStatus::Delivered if order.delivered_at.is_none() => Some(now),
        _ => None,
    };

    DispatchStatusChangeset {
        status: next,
        dispatched_at,
        delivered_at,
        updated_at: now,
    }
}

pub async fn create(
    conn: &mut AsyncPgConnection,
    creator: &AuthUser,
    input: NewDispatchOrder,
) -> Result<DispatchOrderWithItems, AppError> {
    input.validate()?;
    let creator_id = creator.id;

    let created = conn
        .transaction(move |conn| {
            Box::pin(async move {
                let order = diesel::insert_into(dispatch_orders::table)
                    .values(CreateDispatchOrderEntity {
                        id: Uuid::new_v4(),
                        order_number: number_or_generate(input.order_number, "DO"),
                        customer_id: input.customer_id,
                        customer_name: input.customer_name,
                        delivery_address: input.delivery_address,
                        scheduled_date: input.scheduled_date,
                        dispatched_at: None,
                        delivered_at: None,
                        status: DispatchStatus::Scheduled,
                        created_by: creator_id,
                    })
                    .returning(DispatchOrderEntity::as_returning())
                    .get_result(conn)
                    .await?;

                let rows: Vec<CreateDispatchItemEntity> = input
                    .items
                    .into_iter()
                    .map(|item| CreateDispatchItemEntity {
                        id: Uuid::new_v4(),
                        dispatch_order_id: order.id,
                        finished_batch_id: item.finished_batch_id,
                        quantity: item.quantity,
                    })
                    .collect();

                let items = if rows.is_empty() {
                    Vec::new()
                } else {
                    diesel::insert_into(dispatch_items::table)
                        .values(&rows)
                        .returning(DispatchItemEntity::as_returning())
                        .get_results(conn)
                        .await?
                };

                Ok::<DispatchOrderWithItems, AppError>(DispatchOrderWithItems { order, items })
            })
        })
        .await?;

    tracing::info!(
        "Dispatch order {} for {} created by {} with {} item(s)",
        created.order.order_number,
        created.order.customer_name,
        creator.email,
        created.items.len()
    );

    Ok(created)
}

pub async fn list(conn: &mut AsyncPgConnection) -> Result<Vec<DispatchOrderEntity>, AppError> {
    let orders = dispatch_orders::table
        .order_by(dispatch_orders::created_at.desc())
        .select(DispatchOrderEntity::as_select())
        .get_results(conn)
        .await
        .context("Failed to get dispatch orders")?;

    Ok(orders)
}

pub async fn get_with_items(
    conn: &mut AsyncPgConnection,
    id: Uuid,
) -> Result<Option<DispatchOrderWithItems>, AppError> {
    let order = dispatch_orders::table
        .find(id)
        .select(DispatchOrderEntity::as_select())
        .get_result(conn)
        .await
        .optional()
        .context("Failed to get dispatch order")?;

    let Some(order) = order else {
        return Ok(None);
    };

    let items = dispatch_items::table
        .filter(dispatch_items::dispatch_order_id.eq(order.id))
        .select(DispatchItemEntity::as_select())
        .get_results(conn)
        .await
        .context("Failed to get dispatch items")?;

    Ok(Some(DispatchOrderWithItems { order, items }))
}

pub async fn update_status(
    conn: &mut AsyncPgConnection,
    id: Uuid,
    next: DispatchStatus,
) -> Result<DispatchOrderEntity, AppError> {
    conn.transaction(move |conn| {
        Box::pin(async move {
            let current: DispatchOrderEntity = dispatch_orders::table
                .find(id)
                .select(DispatchOrderEntity::as_select())
                .for_update()
                .get_result(conn)
                .await?;

            current.status.transition_to(next)?;

            let updated = diesel::update(dispatch_orders::table.find(id))
                .set(status_changeset(&current, next, Utc::now()))
                .returning(DispatchOrderEntity::as_returning())
                .get_result(conn)
                .await?;

            tracing::info!(
                "Dispatch order {} moved from {} to {}",
                updated.order_number,
                current.status,
                next
            );

            Ok::<DispatchOrderEntity, AppError>(updated)
        })
    })
    .await
}
