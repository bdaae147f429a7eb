use anyhow::Context;
use diesel::{ExpressionMethods, OptionalExtension, QueryDsl, SelectableHelper};
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    app_error::AppError,
    models::{CreateSupplierEntity, SupplierEntity},
    schema::suppliers,
};

#[derive(Deserialize, Validate, ToSchema, Debug)]
#[serde(rename_all = "camelCase")]
pub struct NewSupplier {
    #[validate(length(min = 1))]
    pub name: String,
    pub contact_person: Option<String>,
    pub phone: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    pub address: Option<String>,
}

pub async fn create(
    conn: &mut AsyncPgConnection,
    input: NewSupplier,
) -> Result<SupplierEntity, AppError> {
    input.validate()?;

    let supplier = diesel::insert_into(suppliers::table)
        .values(CreateSupplierEntity {
            id: Uuid::new_v4(),
            name: input.name,
            contact_person: input.contact_person,
            phone: input.phone,
            email: input.email,
            address: input.address,
        })
        .returning(SupplierEntity::as_returning())
        .get_result(conn)
        .await
        .context("Failed to create supplier")?;

    Ok(supplier)
}

pub async fn list(conn: &mut AsyncPgConnection) -> Result<Vec<SupplierEntity>, AppError> {
    let suppliers = suppliers::table
        .order_by(suppliers::created_at.desc())
        .select(SupplierEntity::as_select())
        .get_results(conn)
        .await
        .context("Failed to get suppliers")?;

    Ok(suppliers)
}

pub async fn get_by_id(
    conn: &mut AsyncPgConnection,
    id: Uuid,
) -> Result<Option<SupplierEntity>, AppError> {
    let supplier = suppliers::table
        .find(id)
        .select(SupplierEntity::as_select())
        .get_result(conn)
        .await
        .optional()
        .context("Failed to get supplier")?;

    Ok(supplier)
}
