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
    models::{CreateWeighbridgeReadingEntity, DeliveryEntity, WeighbridgeReadingEntity},
    schema::{truck_deliveries, weighbridge_readings},
    storage::{f64_from_number_or_string, opt_f64_from_number_or_string},
    workflow::DeliveryStatus,
};

#[derive(Deserialize, Validate, ToSchema, Debug)]
#[serde(rename_all = "camelCase")]
pub struct NewWeighbridgeReading {
    pub delivery_id: Uuid,
    #[serde(deserialize_with = "f64_from_number_or_string")]
    #[validate(range(min = 0.0))]
    pub gross_weight: f64,
    #[serde(deserialize_with = "f64_from_number_or_string")]
    #[validate(range(min = 0.0))]
    pub tare_weight: f64,
    #[validate(length(min = 1))]
    pub operator_name: String,
    pub notes: Option<String>,
    #[serde(default, deserialize_with = "opt_f64_from_number_or_string")]
    #[validate(range(min = 0.0))]
    pub weighbridge_charges: Option<f64>,
    pub ticket_number: Option<String>,
    pub reading_time: Option<DateTime<Utc>>,
}

#[derive(Serialize, ToSchema, Debug)]
#[serde(rename_all = "camelCase")]
pub struct WeighbridgeReadingWithDelivery {
    #[serde(flatten)]
    pub reading: WeighbridgeReadingEntity,
    pub delivery: DeliveryEntity,
}

/// Net load on the bridge. Fixed at write time and never re-derived.
pub fn net_weight(gross: f64, tare: f64) -> Result<f64, AppError> {
    if tare > gross {
        return Err(AppError::Validation(format!(
            "Tare weight {} exceeds gross weight {}",
            tare, gross
        )));
    }
    Ok(gross - tare)
}

/// Records a reading and approves its delivery in one transaction. The
/// delivery's actual quantity becomes the measured net weight.
pub async fn create(
    conn: &mut AsyncPgConnection,
    input: NewWeighbridgeReading,
) -> Result<WeighbridgeReadingEntity, AppError> {
    input.validate()?;
    let net = net_weight(input.gross_weight, input.tare_weight)?;

    conn.transaction(move |conn| {
        Box::pin(async move {
            let delivery: DeliveryEntity = truck_deliveries::table
                .find(input.delivery_id)
                .select(DeliveryEntity::as_select())
                .for_update()
                .get_result(conn)
                .await
                .optional()?
                .ok_or_else(|| {
                    AppError::Constraint(format!(
                        "Delivery {} does not exist",
                        input.delivery_id
                    ))
                })?;

            let reading = diesel::insert_into(weighbridge_readings::table)
                .values(CreateWeighbridgeReadingEntity {
                    id: Uuid::new_v4(),
                    delivery_id: delivery.id,
                    gross_weight: input.gross_weight,
                    tare_weight: input.tare_weight,
                    net_weight: net,
                    operator_name: input.operator_name,
                    notes: input.notes,
                    weighbridge_charges: input.weighbridge_charges,
                    ticket_number: input.ticket_number,
                    reading_time: input.reading_time.unwrap_or_else(Utc::now),
                })
                .returning(WeighbridgeReadingEntity::as_returning())
                .get_result(conn)
                .await?;

            if delivery.status.approval_by_weighing_is_irregular() {
                tracing::warn!(
                    "Weighbridge reading {} approves delivery {} from status {}",
                    reading.id,
                    delivery.id,
                    delivery.status
                );
            }

            diesel::update(truck_deliveries::table.find(delivery.id))
                .set((
                    truck_deliveries::status.eq(DeliveryStatus::Approved),
                    truck_deliveries::actual_quantity.eq(Some(net)),
                    truck_deliveries::updated_at.eq(diesel::dsl::now),
                ))
                .execute(conn)
                .await?;

            tracing::info!(
                "Weighbridge reading {} recorded for delivery {}: net {} kg",
                reading.id,
                delivery.id,
                net
            );

            Ok::<WeighbridgeReadingEntity, AppError>(reading)
        })
    })
    .await
}

pub async fn list_with_delivery(
    conn: &mut AsyncPgConnection,
) -> Result<Vec<WeighbridgeReadingWithDelivery>, AppError> {
    let rows: Vec<(WeighbridgeReadingEntity, DeliveryEntity)> = weighbridge_readings::table
        .inner_join(truck_deliveries::table)
        .order_by(weighbridge_readings::reading_time.desc())
        .select((
            WeighbridgeReadingEntity::as_select(),
            DeliveryEntity::as_select(),
        ))
        .get_results(conn)
        .await
        .context("Failed to get weighbridge readings")?;

    Ok(rows
        .into_iter()
        .map(|(reading, delivery)| WeighbridgeReadingWithDelivery { reading, delivery })
        .collect())
}

pub async fn get_with_delivery(
    conn: &mut AsyncPgConnection,
    id: Uuid,
) -> Result<Option<WeighbridgeReadingWithDelivery>, AppError> {
    let row: Option<(WeighbridgeReadingEntity, DeliveryEntity)> = weighbridge_readings::table
        .inner_join(truck_deliveries::table)
        .filter(weighbridge_readings::id.eq(id))
        .select((
            WeighbridgeReadingEntity::as_select(),
            DeliveryEntity::as_select(),
        ))
        .get_result(conn)
        .await
        .optional()
        .context("Failed to get weighbridge reading")?;

    Ok(row.map(|(reading, delivery)| WeighbridgeReadingWithDelivery { reading, delivery }))
}

/// Latest reading taken for a delivery.
pub async fn get_by_delivery_id(
    conn: &mut AsyncPgConnection,
    delivery_id: Uuid,
) -> Result<Option<WeighbridgeReadingEntity>, AppError> {
    let reading = weighbridge_readings::table
        .filter(weighbridge_readings::delivery_id.eq(delivery_id))
        .order_by(weighbridge_readings::reading_time.desc())
        .select(WeighbridgeReadingEntity::as_select())
        .first(conn)
        .await
        .optional()
        .context("Failed to get weighbridge reading for delivery")?;

    Ok(reading)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn net_weight_is_gross_minus_tare() {
        assert_eq!(net_weight(27500.0, 25000.0).unwrap(), 2500.0);
        assert_eq!(net_weight(28150.0, 25000.0).unwrap(), 3150.0);
        assert_eq!(net_weight(25000.0, 25000.0).unwrap(), 0.0);
    }

    #[test]
    fn tare_above_gross_is_rejected() {
        assert!(matches!(
            net_weight(24000.0, 25000.0),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn reading_accepts_string_weights() {
        let input: NewWeighbridgeReading = serde_json::from_value(serde_json::json!({
            "deliveryId": "6f1c1f2e-8a53-4c6e-9d3c-0b7f7f4f2a11",
            "grossWeight": "27500",
            "tareWeight": 25000,
            "operatorName": "Robert Ochieng",
        }))
        .unwrap();
        assert!(input.validate().is_ok());
        assert_eq!(
            net_weight(input.gross_weight, input.tare_weight).unwrap(),
            2500.0
        );
    }

    #[test]
    fn reading_requires_operator() {
        let input: NewWeighbridgeReading = serde_json::from_value(serde_json::json!({
            "deliveryId": "6f1c1f2e-8a53-4c6e-9d3c-0b7f7f4f2a11",
            "grossWeight": 27500,
            "tareWeight": 25000,
            "operatorName": "",
        }))
        .unwrap();
        assert!(input.validate().is_err());
    }

    #[test]
    fn joined_view_flattens_reading_fields() {
        let now = Utc::now();
        let delivery_id = Uuid::new_v4();
        let view = WeighbridgeReadingWithDelivery {
            reading: WeighbridgeReadingEntity {
                id: Uuid::new_v4(),
                delivery_id,
                gross_weight: 27500.0,
                tare_weight: 25000.0,
                net_weight: 2500.0,
                operator_name: "Robert Ochieng".into(),
                notes: None,
                weighbridge_charges: None,
                ticket_number: Some("WB-0001".into()),
                reading_time: now,
                created_at: now,
            },
            delivery: DeliveryEntity {
                id: delivery_id,
                truck_registration: "KCA 123A".into(),
                driver_name: "Samuel Mwangi".into(),
                driver_phone: None,
                supplier_id: Uuid::new_v4(),
                expected_quantity: Some(2500.0),
                actual_quantity: Some(2500.0),
                status: DeliveryStatus::Approved,
                delivery_date: now,
                created_at: now,
                updated_at: now,
            },
        };

        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["netWeight"], 2500.0);
        assert_eq!(json["ticketNumber"], "WB-0001");
        assert_eq!(json["delivery"]["status"], "approved");
        assert_eq!(json["delivery"]["truckRegistration"], "KCA 123A");
    }
}
