//! Dashboard metrics, computed on demand from full-table aggregates.

use anyhow::Context;
use chrono::{DateTime, Local, TimeZone, Utc};
use diesel::{ExpressionMethods, QueryDsl, dsl::sum};
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    app_error::AppError,
    schema::{finished_product_batches, production_orders, quality_checks, warehouse_stock},
    workflow::{ProductionStatus, QualityStatus},
};

#[derive(Serialize, ToSchema, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DashboardMetrics {
    /// Finished-batch units created since local midnight.
    pub daily_production: i64,
    /// Passed checks as a percentage of all checks, 0 without checks.
    pub quality_score: f64,
    /// Production orders still scheduled.
    pub pending_orders: i64,
    /// Stock held as a percentage of declared capacity, clamped to 0..=100.
    pub inventory_level: f64,
    /// Summed current quantity across all stock rows.
    pub inventory_quantity: f64,
}

/// Raw aggregates the metrics are derived from.
#[derive(Debug, Default, Clone, Copy)]
pub struct Totals {
    pub produced_today: i64,
    pub checks_total: i64,
    pub checks_passed: i64,
    pub scheduled_orders: i64,
    pub stock_quantity: f64,
    pub stock_in_capacity_rows: f64,
    pub capacity: f64,
}

pub fn quality_score(passed: i64, total: i64) -> f64 {
    if total <= 0 {
        return 0.0;
    }
    (passed.clamp(0, total) as f64 / total as f64) * 100.0
}

pub fn inventory_level(held: f64, capacity: f64) -> f64 {
    if capacity <= 0.0 || !held.is_finite() {
        return 0.0;
    }
    (held / capacity * 100.0).clamp(0.0, 100.0)
}

impl DashboardMetrics {
    pub fn from_totals(totals: Totals) -> Self {
        Self {
            daily_production: totals.produced_today,
            quality_score: quality_score(totals.checks_passed, totals.checks_total),
            pending_orders: totals.scheduled_orders,
            inventory_level: inventory_level(totals.stock_in_capacity_rows, totals.capacity),
            inventory_quantity: totals.stock_quantity,
        }
    }
}

/// Local midnight of the day `now` falls on, in UTC.
pub fn start_of_local_day(now: DateTime<Local>) -> DateTime<Utc> {
    let midnight = now.date_naive().and_hms_opt(0, 0, 0).unwrap_or_default();
    Local
        .from_local_datetime(&midnight)
        .earliest()
        .map(|local| local.with_timezone(&Utc))
        .unwrap_or_else(|| now.with_timezone(&Utc))
}

pub async fn metrics(conn: &mut AsyncPgConnection) -> Result<DashboardMetrics, AppError> {
    let since = start_of_local_day(Local::now());

    let produced_today: Option<i64> = finished_product_batches::table
        .filter(finished_product_batches::created_at.ge(since))
        .select(sum(finished_product_batches::quantity))
        .get_result(conn)
        .await
        .context("Failed to sum daily production")?;

    let checks_total: i64 = quality_checks::table
        .count()
        .get_result(conn)
        .await
        .context("Failed to count quality checks")?;

    let checks_passed: i64 = quality_checks::table
        .filter(quality_checks::status.eq(QualityStatus::Passed))
        .count()
        .get_result(conn)
        .await
        .context("Failed to count passed quality checks")?;

    let scheduled_orders: i64 = production_orders::table
        .filter(production_orders::status.eq(ProductionStatus::Scheduled))
        .count()
        .get_result(conn)
        .await
        .context("Failed to count scheduled production orders")?;

    let stock_quantity: Option<f64> = warehouse_stock::table
        .select(sum(warehouse_stock::current_quantity))
        .get_result(conn)
        .await
        .context("Failed to sum warehouse stock")?;

    let (stock_in_capacity_rows, capacity): (Option<f64>, Option<f64>) = warehouse_stock::table
        .filter(warehouse_stock::max_capacity.is_not_null())
        .select((
            sum(warehouse_stock::current_quantity),
            sum(warehouse_stock::max_capacity),
        ))
        .get_result(conn)
        .await
        .context("Failed to sum warehouse capacity")?;

    Ok(DashboardMetrics::from_totals(Totals {
        produced_today: produced_today.unwrap_or(0),
        checks_total,
        checks_passed,
        scheduled_orders,
        stock_quantity: stock_quantity.unwrap_or(0.0),
        stock_in_capacity_rows: stock_in_capacity_rows.unwrap_or(0.0),
        capacity: capacity.unwrap_or(0.0),
    }))
}
