//! Canned demo data: three suppliers and their maize moving through every stage.

use chrono::{DateTime, NaiveDate, Utc};
use diesel::{ExpressionMethods, QueryDsl, dsl::exists, select};
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    app_error::AppError,
    auth::AuthUser,
    models::{
        CheckType, CreateDeliveryEntity, CreateDispatchItemEntity, CreateDispatchOrderEntity,
        CreateFinishedProductBatchEntity, CreateProductionOrderEntity,
        CreateQualityCheckEntity, CreateRawMaterialBatchEntity, CreateSupplierEntity,
        CreateWarehouseStockEntity, CreateWeighbridgeReadingEntity,
    },
    schema::{
        dispatch_items, dispatch_orders, finished_product_batches, production_orders,
        quality_checks, raw_material_batches, suppliers, truck_deliveries, warehouse_stock,
        weighbridge_readings,
    },
    workflow::{DeliveryStatus, DispatchStatus, ProductionStatus, QualityStatus},
};

/// Seeded production order whose presence means the demo set is loaded.
const MARKER_ORDER: &str = "PO-2025-001";

#[derive(Serialize, ToSchema, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SeedSummary {
    pub suppliers: usize,
    pub deliveries: usize,
    pub weighbridge_readings: usize,
    pub raw_material_batches: usize,
    pub quality_checks: usize,
    pub production_orders: usize,
    pub finished_product_batches: usize,
    pub warehouse_stock: usize,
    pub dispatch_orders: usize,
    pub dispatch_items: usize,
}

fn at(year: i32, month: u32, day: u32, hour: u32, minute: u32) -> DateTime<Utc> {
    NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|date| date.and_hms_opt(hour, minute, 0))
        .map(|naive| naive.and_utc())
        .unwrap_or_default()
}

fn supplier(
    name: &str,
    contact: &str,
    phone: &str,
    email: &str,
    address: &str,
) -> CreateSupplierEntity {
    CreateSupplierEntity {
        id: Uuid::new_v4(),
        name: name.into(),
        contact_person: Some(contact.into()),
        phone: Some(phone.into()),
        email: Some(email.into()),
        address: Some(address.into()),
    }
}

/// Loads the demo data set in one transaction. Fails if it was loaded before.
pub async fn load_demo_data(
    conn: &mut AsyncPgConnection,
    principal: &AuthUser,
) -> Result<SeedSummary, AppError> {
    let user_id = principal.id;

    let summary = conn
        .transaction(move |conn| {
            Box::pin(async move {
                let already: bool = select(exists(
                    production_orders::table
                        .filter(production_orders::order_number.eq(MARKER_ORDER)),
                ))
                .get_result(conn)
                .await?;
                if already {
                    return Err(AppError::Validation("Demo data is already loaded".into()));
                }

                let mut summary = SeedSummary::default();

                let supplier_rows = vec![
                    supplier(
                        "Green Valley Farms",
                        "John Kamau",
                        "+254712345678",
                        "contact@greenvalley.co.ke",
                        "Nakuru County, Kenya",
                    ),
                    supplier(
                        "Highlands Agriculture Co.",
                        "Mary Wanjiku",
                        "+254723456789",
                        "info@highlands-ag.com",
                        "Uasin Gishu County, Kenya",
                    ),
                    supplier(
                        "Maize Masters Ltd",
                        "Peter Kipchoge",
                        "+254734567890",
                        "sales@maizemasters.co.ke",
                        "Trans Nzoia County, Kenya",
                    ),
                ];
                let s: Vec<Uuid> = supplier_rows.iter().map(|row| row.id).collect();
                summary.suppliers = diesel::insert_into(suppliers::table)
                    .values(&supplier_rows)
                    .execute(conn)
                    .await?;

                let delivery = |supplier_id: Uuid,
                                truck: &str,
                                driver: &str,
                                phone: &str,
                                expected: f64,
                                actual: Option<f64>,
                                date: DateTime<Utc>,
                                status: DeliveryStatus| CreateDeliveryEntity {
                    id: Uuid::new_v4(),
                    truck_registration: truck.into(),
                    driver_name: driver.into(),
                    driver_phone: Some(phone.into()),
                    supplier_id,
                    expected_quantity: Some(expected),
                    actual_quantity: actual,
                    status,
                    delivery_date: date,
                };
                #[rustfmt::skip]
                let delivery_rows = vec![
                    delivery(s[0], "KCA 123A", "Samuel Mwangi", "+254745678901", 2500.0, Some(2500.0), at(2025, 1, 7, 8, 30), DeliveryStatus::Approved),
                    delivery(s[1], "KBZ 456B", "Grace Akinyi", "+254756789012", 3200.0, Some(3150.0), at(2025, 1, 7, 10, 15), DeliveryStatus::Approved),
                    delivery(s[2], "KDX 789C", "David Kiprotich", "+254767890123", 1800.0, None, at(2025, 1, 8, 9, 0), DeliveryStatus::QualityCheck),
                    delivery(s[0], "KCA 321D", "Jane Mutindi", "+254778901234", 2800.0, None, at(2025, 1, 8, 11, 30), DeliveryStatus::Pending),
                ];
                let d: Vec<Uuid> = delivery_rows.iter().map(|row| row.id).collect();
                summary.deliveries = diesel::insert_into(truck_deliveries::table)
                    .values(&delivery_rows)
                    .execute(conn)
                    .await?;

                let reading = |delivery_id: Uuid, gross: f64, operator: &str, time: DateTime<Utc>| {
                    CreateWeighbridgeReadingEntity {
                        id: Uuid::new_v4(),
                        delivery_id,
                        gross_weight: gross,
                        tare_weight: 25000.0,
                        net_weight: gross - 25000.0,
                        operator_name: operator.into(),
                        notes: None,
                        weighbridge_charges: None,
                        ticket_number: None,
                        reading_time: time,
                    }
                };
                summary.weighbridge_readings = diesel::insert_into(weighbridge_readings::table)
                    .values(&vec![
                        reading(d[0], 27500.0, "Robert Ochieng", at(2025, 1, 7, 8, 45)),
                        reading(d[1], 28150.0, "Robert Ochieng", at(2025, 1, 7, 10, 30)),
                        reading(d[2], 26800.0, "Sarah Chepkemoi", at(2025, 1, 8, 9, 15)),
                    ])
                    .execute(conn)
                    .await?;

                let raw_batch = |number: &str,
                                 delivery_id: Uuid,
                                 quantity: f64,
                                 moisture: f64,
                                 status: QualityStatus,
                                 location: &str| CreateRawMaterialBatchEntity {
                    id: Uuid::new_v4(),
                    batch_number: number.into(),
                    delivery_id,
                    quantity,
                    moisture_level: Some(moisture),
                    quality_status: status,
                    storage_location: Some(location.into()),
                };
                #[rustfmt::skip]
                let raw_rows = vec![
                    raw_batch("RM-2025-001", d[0], 2500.0, 12.5, QualityStatus::Passed, "Warehouse A - Section 1"),
                    raw_batch("RM-2025-002", d[1], 3150.0, 11.8, QualityStatus::Passed, "Warehouse A - Section 2"),
                    raw_batch("RM-2025-003", d[2], 1800.0, 13.2, QualityStatus::Pending, "Quarantine Area"),
                ];
                let r: Vec<Uuid> = raw_rows.iter().map(|row| row.id).collect();
                summary.raw_material_batches = diesel::insert_into(raw_material_batches::table)
                    .values(&raw_rows)
                    .execute(conn)
                    .await?;

                let check = |batch_id: Uuid,
                             moisture: f64,
                             contamination: bool,
                             status: QualityStatus,
                             notes: &str| CreateQualityCheckEntity {
                    id: Uuid::new_v4(),
                    batch_id,
                    check_type: CheckType::RawMaterial,
                    moisture_level: Some(moisture),
                    contamination,
                    grain_integrity: Some(if contamination { "fair" } else { "good" }.into()),
                    notes: Some(notes.into()),
                    status,
                    checked_by: user_id,
                };
                #[rustfmt::skip]
                let check_rows = vec![
                    check(r[0], 12.5, false, QualityStatus::Passed, "Excellent quality maize, meets all standards"),
                    check(r[1], 11.8, false, QualityStatus::Passed, "High quality batch, ready for processing"),
                    check(r[2], 13.2, true, QualityStatus::InReview, "Slight contamination detected, requires additional testing"),
                ];
                summary.quality_checks = diesel::insert_into(quality_checks::table)
                    .values(&check_rows)
                    .execute(conn)
                    .await?;

                let order_rows = vec![
                    CreateProductionOrderEntity {
                        id: Uuid::new_v4(),
                        order_number: MARKER_ORDER.into(),
                        product_type: "maize_flour_2kg".into(),
                        target_quantity: 1000,
                        completed_quantity: 850,
                        status: ProductionStatus::InProgress,
                        scheduled_date: Some(at(2025, 1, 7, 12, 0)),
                        started_at: Some(at(2025, 1, 7, 12, 30)),
                        completed_at: None,
                        created_by: user_id,
                    },
                    CreateProductionOrderEntity {
                        id: Uuid::new_v4(),
                        order_number: "PO-2025-002".into(),
                        product_type: "maize_flour_4kg".into(),
                        target_quantity: 500,
                        completed_quantity: 500,
                        status: ProductionStatus::Completed,
                        scheduled_date: Some(at(2025, 1, 6, 8, 0)),
                        started_at: Some(at(2025, 1, 6, 8, 30)),
                        completed_at: Some(at(2025, 1, 6, 14, 30)),
                        created_by: user_id,
                    },
                    CreateProductionOrderEntity {
                        id: Uuid::new_v4(),
                        order_number: "PO-2025-003".into(),
                        product_type: "maize_flour_1kg".into(),
                        target_quantity: 800,
                        completed_quantity: 0,
                        status: ProductionStatus::Scheduled,
                        scheduled_date: Some(at(2025, 1, 9, 8, 0)),
                        started_at: None,
                        completed_at: None,
                        created_by: user_id,
                    },
                ];
                let p: Vec<Uuid> = order_rows.iter().map(|row| row.id).collect();
                summary.production_orders = diesel::insert_into(production_orders::table)
                    .values(&order_rows)
                    .execute(conn)
                    .await?;

                let finished = |number: &str,
                                order_id: Uuid,
                                product: &str,
                                quantity: i32,
                                size: &str,
                                location: &str| CreateFinishedProductBatchEntity {
                    id: Uuid::new_v4(),
                    batch_number: number.into(),
                    production_order_id: order_id,
                    product_type: product.into(),
                    quantity,
                    package_size: Some(size.into()),
                    quality_grade: Some("A".into()),
                    quality_status: QualityStatus::Passed,
                    storage_location: Some(location.into()),
                };
                #[rustfmt::skip]
                let finished_rows = vec![
                    finished("FP-2025-001", p[1], "maize_flour_4kg", 500, "4kg", "Warehouse B - Section 1"),
                    finished("FP-2025-002", p[0], "maize_flour_2kg", 420, "2kg", "Warehouse B - Section 2"),
                ];
                let f: Vec<Uuid> = finished_rows.iter().map(|row| row.id).collect();
                summary.finished_product_batches =
                    diesel::insert_into(finished_product_batches::table)
                        .values(&finished_rows)
                        .execute(conn)
                        .await?;

                let stock = |item: &str,
                             batch_id: Option<Uuid>,
                             location: &str,
                             current: f64,
                             reserved: f64,
                             capacity: f64| CreateWarehouseStockEntity {
                    id: Uuid::new_v4(),
                    item_type: item.into(),
                    batch_id,
                    location: location.into(),
                    current_quantity: current,
                    reserved_quantity: reserved,
                    max_capacity: Some(capacity),
                };
                #[rustfmt::skip]
                let stock_rows = vec![
                    stock("maize_flour_4kg", Some(f[0]), "Warehouse B - Section 1", 450.0, 50.0, 1000.0),
                    stock("maize_flour_2kg", Some(f[1]), "Warehouse B - Section 2", 380.0, 40.0, 1500.0),
                    stock("raw_maize", None, "Warehouse A", 3850.0, 2100.0, 10000.0),
                ];
                summary.warehouse_stock = diesel::insert_into(warehouse_stock::table)
                    .values(&stock_rows)
                    .execute(conn)
                    .await?;

                let dispatch = |number: &str,
                                customer: &str,
                                address: &str,
                                scheduled: DateTime<Utc>,
                                status: DispatchStatus,
                                dispatched: Option<DateTime<Utc>>,
                                delivered: Option<DateTime<Utc>>| CreateDispatchOrderEntity {
                    id: Uuid::new_v4(),
                    order_number: number.into(),
                    customer_id: None,
                    customer_name: customer.into(),
                    delivery_address: Some(address.into()),
                    scheduled_date: Some(scheduled),
                    dispatched_at: dispatched,
                    delivered_at: delivered,
                    status,
                    created_by: user_id,
                };
                #[rustfmt::skip]
                let dispatch_rows = vec![
                    dispatch("DO-2025-001", "Tuskys Supermarket", "Westlands, Nairobi", at(2025, 1, 8, 14, 0), DispatchStatus::Delivered, Some(at(2025, 1, 8, 14, 30)), Some(at(2025, 1, 8, 17, 0))),
                    dispatch("DO-2025-002", "Naivas Supermarket", "Karen, Nairobi", at(2025, 1, 8, 16, 0), DispatchStatus::InTransit, Some(at(2025, 1, 8, 16, 15)), None),
                    dispatch("DO-2025-003", "Carrefour Supermarket", "Kilimani, Nairobi", at(2025, 1, 9, 10, 0), DispatchStatus::Scheduled, None, None),
                ];
                let o: Vec<Uuid> = dispatch_rows.iter().map(|row| row.id).collect();
                summary.dispatch_orders = diesel::insert_into(dispatch_orders::table)
                    .values(&dispatch_rows)
                    .execute(conn)
                    .await?;

                let item = |order_id: Uuid, batch_id: Uuid, quantity: i32| {
                    CreateDispatchItemEntity {
                        id: Uuid::new_v4(),
                        dispatch_order_id: order_id,
                        finished_batch_id: batch_id,
                        quantity,
                    }
                };
                summary.dispatch_items = diesel::insert_into(dispatch_items::table)
                    .values(&vec![
                        item(o[0], f[0], 50),
                        item(o[1], f[1], 40),
                        item(o[2], f[0], 75),
                        item(o[2], f[1], 60),
                    ])
                    .execute(conn)
                    .await?;

                Ok::<SeedSummary, AppError>(summary)
            })
        })
        .await?;

    tracing::info!("Demo data loaded by {}: {:?}", principal.email, summary);

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn timestamps_are_utc() {
        let ts = at(2025, 1, 7, 8, 30);
        assert_eq!((ts.year(), ts.month(), ts.day()), (2025, 1, 7));
        assert_eq!((ts.hour(), ts.minute()), (8, 30));
    }

    #[test]
    fn invalid_dates_fall_back_to_epoch() {
        assert_eq!(at(2025, 2, 30, 0, 0), DateTime::<Utc>::default());
    }
}
