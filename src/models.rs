use chrono::{DateTime, Utc};
use diesel::{
    Selectable,
    deserialize::FromSqlRow,
    expression::AsExpression,
    prelude::{AsChangeset, Identifiable, Insertable, Queryable},
    sql_types::Text,
};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    sql_enum::impl_text_sql,
    workflow::{DeliveryStatus, DispatchStatus, ProductionStatus, QualityStatus},
};

// Users & sessions

#[derive(Queryable, Selectable, Identifiable, Serialize, Debug, Clone, ToSchema)]
#[diesel(table_name = crate::schema::users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[serde(rename_all = "camelCase")]
pub struct UserEntity {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub profile_image_url: Option<String>,
    pub role: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = crate::schema::users)]
pub struct CreateUserEntity {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub role: String,
}

#[derive(Queryable, Selectable, Debug)]
#[diesel(table_name = crate::schema::sessions)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct SessionEntity {
    pub token_hash: String,
    pub user_id: Uuid,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = crate::schema::sessions)]
pub struct CreateSessionEntity {
    pub token_hash: String,
    pub user_id: Uuid,
    pub expires_at: DateTime<Utc>,
}

// Suppliers

#[derive(Queryable, Selectable, Identifiable, Serialize, Debug, Clone, ToSchema)]
#[diesel(table_name = crate::schema::suppliers)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[serde(rename_all = "camelCase")]
pub struct SupplierEntity {
    pub id: Uuid,
    pub name: String,
    pub contact_person: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = crate::schema::suppliers)]
pub struct CreateSupplierEntity {
    pub id: Uuid,
    pub name: String,
    pub contact_person: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
}

// Truck deliveries

#[derive(Queryable, Selectable, Identifiable, Serialize, Debug, Clone, ToSchema)]
#[diesel(table_name = crate::schema::truck_deliveries)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[serde(rename_all = "camelCase")]
pub struct DeliveryEntity {
    pub id: Uuid,
    pub truck_registration: String,
    pub driver_name: String,
    pub driver_phone: Option<String>,
    pub supplier_id: Uuid,
    pub expected_quantity: Option<f64>,
    pub actual_quantity: Option<f64>,
    pub status: DeliveryStatus,
    pub delivery_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = crate::schema::truck_deliveries)]
pub struct CreateDeliveryEntity {
    pub id: Uuid,
    pub truck_registration: String,
    pub driver_name: String,
    pub driver_phone: Option<String>,
    pub supplier_id: Uuid,
    pub expected_quantity: Option<f64>,
    pub actual_quantity: Option<f64>,
    pub status: DeliveryStatus,
    pub delivery_date: DateTime<Utc>,
}

// Weighbridge readings

#[derive(Queryable, Selectable, Identifiable, Serialize, Debug, Clone, ToSchema)]
#[diesel(table_name = crate::schema::weighbridge_readings)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[serde(rename_all = "camelCase")]
pub struct WeighbridgeReadingEntity {
    pub id: Uuid,
    pub delivery_id: Uuid,
    pub gross_weight: f64,
    pub tare_weight: f64,
    pub net_weight: f64,
    pub operator_name: String,
    pub notes: Option<String>,
    pub weighbridge_charges: Option<f64>,
    pub ticket_number: Option<String>,
    pub reading_time: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = crate::schema::weighbridge_readings)]
pub struct CreateWeighbridgeReadingEntity {
    pub id: Uuid,
    pub delivery_id: Uuid,
    pub gross_weight: f64,
    pub tare_weight: f64,
    pub net_weight: f64,
    pub operator_name: String,
    pub notes: Option<String>,
    pub weighbridge_charges: Option<f64>,
    pub ticket_number: Option<String>,
    pub reading_time: DateTime<Utc>,
}

// Raw material batches

#[derive(Queryable, Selectable, Identifiable, Serialize, Debug, Clone, ToSchema)]
#[diesel(table_name = crate::schema::raw_material_batches)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[serde(rename_all = "camelCase")]
pub struct RawMaterialBatchEntity {
    pub id: Uuid,
    pub batch_number: String,
    pub delivery_id: Uuid,
    pub quantity: f64,
    pub moisture_level: Option<f64>,
    pub quality_status: QualityStatus,
    pub storage_location: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = crate::schema::raw_material_batches)]
pub struct CreateRawMaterialBatchEntity {
    pub id: Uuid,
    pub batch_number: String,
    pub delivery_id: Uuid,
    pub quantity: f64,
    pub moisture_level: Option<f64>,
    pub quality_status: QualityStatus,
    pub storage_location: Option<String>,
}

// Quality checks

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    ToSchema,
    AsExpression,
    FromSqlRow,
    Display,
    EnumString,
    AsRefStr,
)]
#[diesel(sql_type = Text)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum CheckType {
    RawMaterial,
    Production,
    Packaging,
}

impl_text_sql!(CheckType);

#[derive(Queryable, Selectable, Identifiable, Serialize, Debug, Clone, ToSchema)]
#[diesel(table_name = crate::schema::quality_checks)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[serde(rename_all = "camelCase")]
pub struct QualityCheckEntity {
    pub id: Uuid,
    pub batch_id: Uuid,
    pub check_type: CheckType,
    pub moisture_level: Option<f64>,
    pub contamination: bool,
    pub grain_integrity: Option<String>,
    pub notes: Option<String>,
    pub status: QualityStatus,
    pub checked_by: Uuid,
    pub checked_at: DateTime<Utc>,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = crate::schema::quality_checks)]
pub struct CreateQualityCheckEntity {
    pub id: Uuid,
    pub batch_id: Uuid,
    pub check_type: CheckType,
    pub moisture_level: Option<f64>,
    pub contamination: bool,
    pub grain_integrity: Option<String>,
    pub notes: Option<String>,
    pub status: QualityStatus,
    pub checked_by: Uuid,
}

// Production orders

#[derive(Queryable, Selectable, Identifiable, Serialize, Debug, Clone, ToSchema)]
#[diesel(table_name = crate::schema::production_orders)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[serde(rename_all = "camelCase")]
pub struct ProductionOrderEntity {
    pub id: Uuid,
    pub order_number: String,
    pub product_type: String,
    pub target_quantity: i32,
    pub completed_quantity: i32,
    pub status: ProductionStatus,
    pub scheduled_date: Option<DateTime<Utc>>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = crate::schema::production_orders)]
pub struct CreateProductionOrderEntity {
    pub id: Uuid,
    pub order_number: String,
    pub product_type: String,
    pub target_quantity: i32,
    pub completed_quantity: i32,
    pub status: ProductionStatus,
    pub scheduled_date: Option<DateTime<Utc>>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_by: Uuid,
}

/// Status write for a production order. `None` timestamps are left untouched.
#[derive(AsChangeset, Debug)]
#[diesel(table_name = crate::schema::production_orders)]
pub struct ProductionStatusChangeset {
    pub status: ProductionStatus,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Queryable, Selectable, Identifiable, Serialize, Debug, Clone, ToSchema)]
#[diesel(table_name = crate::schema::production_run_materials)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[serde(rename_all = "camelCase")]
pub struct ProductionRunMaterialEntity {
    pub id: Uuid,
    pub production_order_id: Uuid,
    pub batch_id: Uuid,
    pub quantity_used: f64,
    pub used_at: DateTime<Utc>,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = crate::schema::production_run_materials)]
pub struct CreateProductionRunMaterialEntity {
    pub id: Uuid,
    pub production_order_id: Uuid,
    pub batch_id: Uuid,
    pub quantity_used: f64,
}

// Finished product batches

#[derive(Queryable, Selectable, Identifiable, Serialize, Debug, Clone, ToSchema)]
#[diesel(table_name = crate::schema::finished_product_batches)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[serde(rename_all = "camelCase")]
pub struct FinishedProductBatchEntity {
    pub id: Uuid,
    pub batch_number: String,
    pub production_order_id: Uuid,
    pub product_type: String,
    pub quantity: i32,
    pub package_size: Option<String>,
    pub quality_grade: Option<String>,
    pub quality_status: QualityStatus,
    pub storage_location: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = crate::schema::finished_product_batches)]
pub struct CreateFinishedProductBatchEntity {
    pub id: Uuid,
    pub batch_number: String,
    pub production_order_id: Uuid,
    pub product_type: String,
    pub quantity: i32,
    pub package_size: Option<String>,
    pub quality_grade: Option<String>,
    pub quality_status: QualityStatus,
    pub storage_location: Option<String>,
}

// Warehouse stock

#[derive(Queryable, Selectable, Identifiable, Serialize, Debug, Clone, ToSchema)]
#[diesel(table_name = crate::schema::warehouse_stock)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[serde(rename_all = "camelCase")]
pub struct WarehouseStockEntity {
    pub id: Uuid,
    pub item_type: String,
    pub batch_id: Option<Uuid>,
    pub location: String,
    pub current_quantity: f64,
    pub reserved_quantity: f64,
    pub max_capacity: Option<f64>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = crate::schema::warehouse_stock)]
pub struct CreateWarehouseStockEntity {
    pub id: Uuid,
    pub item_type: String,
    pub batch_id: Option<Uuid>,
    pub location: String,
    pub current_quantity: f64,
    pub reserved_quantity: f64,
    pub max_capacity: Option<f64>,
}

// Dispatch orders

#[derive(Queryable, Selectable, Identifiable, Serialize, Debug, Clone, ToSchema)]
#[diesel(table_name = crate::schema::dispatch_orders)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[serde(rename_all = "camelCase")]
pub struct DispatchOrderEntity {
    pub id: Uuid,
    pub order_number: String,
    pub customer_id: Option<String>,
    pub customer_name: String,
    pub delivery_address: Option<String>,
    pub scheduled_date: Option<DateTime<Utc>>,
    pub dispatched_at: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub status: DispatchStatus,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = crate::schema::dispatch_orders)]
pub struct CreateDispatchOrderEntity {
    pub id: Uuid,
    pub order_number: String,
    pub customer_id: Option<String>,
    pub customer_name: String,
    pub delivery_address: Option<String>,
    pub scheduled_date: Option<DateTime<Utc>>,
    pub dispatched_at: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub status: DispatchStatus,
    pub created_by: Uuid,
}

#[derive(AsChangeset, Debug)]
#[diesel(table_name = crate::schema::dispatch_orders)]
pub struct DispatchStatusChangeset {
    pub status: DispatchStatus,
    pub dispatched_at: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Queryable, Selectable, Identifiable, Serialize, Debug, Clone, ToSchema)]
#[diesel(table_name = crate::schema::dispatch_items)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[serde(rename_all = "camelCase")]
pub struct DispatchItemEntity {
    pub id: Uuid,
    pub dispatch_order_id: Uuid,
    pub finished_batch_id: Uuid,
    pub quantity: i32,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = crate::schema::dispatch_items)]
pub struct CreateDispatchItemEntity {
    pub id: Uuid,
    pub dispatch_order_id: Uuid,
    pub finished_batch_id: Uuid,
    pub quantity: i32,
}
