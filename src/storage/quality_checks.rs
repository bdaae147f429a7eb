use anyhow::Context;
use diesel::{ExpressionMethods, OptionalExtension, QueryDsl, SelectableHelper};
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    app_error::AppError,
    auth::AuthUser,
    models::{CheckType, CreateQualityCheckEntity, QualityCheckEntity},
    schema::quality_checks,
    storage::opt_f64_from_number_or_string,
    workflow::QualityStatus,
};

#[derive(Deserialize, Validate, ToSchema, Debug)]
#[serde(rename_all = "camelCase")]
pub struct NewQualityCheck {
    pub batch_id: Uuid,
    pub check_type: CheckType,
    #[serde(default, deserialize_with = "opt_f64_from_number_or_string")]
    #[validate(range(min = 0.0, max = 100.0))]
    pub moisture_level: Option<f64>,
    #[serde(default)]
    pub contamination: bool,
    pub grain_integrity: Option<String>,
    pub notes: Option<String>,
    pub status: Option<QualityStatus>,
}

/// Appends a check to the audit trail. Checks are never updated afterwards and
/// the outcome is not copied onto the batch.
pub async fn create(
    conn: &mut AsyncPgConnection,
    checker: &AuthUser,
    input: NewQualityCheck,
) -> Result<QualityCheckEntity, AppError> {
    input.validate()?;

    let check = diesel::insert_into(quality_checks::table)
        .values(CreateQualityCheckEntity {
            id: Uuid::new_v4(),
            batch_id: input.batch_id,
            check_type: input.check_type,
            moisture_level: input.moisture_level,
            contamination: input.contamination,
            grain_integrity: input.grain_integrity,
            notes: input.notes,
            status: input.status.unwrap_or_default(),
            checked_by: checker.id,
        })
        .returning(QualityCheckEntity::as_returning())
        .get_result(conn)
        .await
        .context("Failed to create quality check")?;

    tracing::info!(
        "Quality check {} on batch {} recorded by {}: {}",
        check.id,
        check.batch_id,
        checker.email,
        check.status
    );

    Ok(check)
}

pub async fn list(conn: &mut AsyncPgConnection) -> Result<Vec<QualityCheckEntity>, AppError> {
    let checks = quality_checks::table
        .order_by(quality_checks::checked_at.desc())
        .select(QualityCheckEntity::as_select())
        .get_results(conn)
        .await
        .context("Failed to get quality checks")?;

    Ok(checks)
}

pub async fn get_by_id(
    conn: &mut AsyncPgConnection,
    id: Uuid,
) -> Result<Option<QualityCheckEntity>, AppError> {
    let check = quality_checks::table
        .find(id)
        .select(QualityCheckEntity::as_select())
        .get_result(conn)
        .await
        .optional()
        .context("Failed to get quality check")?;

    Ok(check)
}

pub async fn list_for_batch(
    conn: &mut AsyncPgConnection,
    batch_id: Uuid,
) -> Result<Vec<QualityCheckEntity>, AppError> {
    let checks = quality_checks::table
        .filter(quality_checks::batch_id.eq(batch_id))
        .order_by(quality_checks::checked_at.desc())
        .select(QualityCheckEntity::as_select())
        .get_results(conn)
        .await
        .context("Failed to get quality checks for batch")?;

    Ok(checks)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contamination_defaults_to_false() {
        let input: NewQualityCheck = serde_json::from_value(serde_json::json!({
            "batchId": "6f1c1f2e-8a53-4c6e-9d3c-0b7f7f4f2a11",
            "checkType": "raw_material",
            "moistureLevel": "12.5",
            "status": "passed",
        }))
        .unwrap();
        assert!(!input.contamination);
        assert_eq!(input.moisture_level, Some(12.5));
        assert_eq!(input.status, Some(QualityStatus::Passed));
        assert!(input.validate().is_ok());
    }

    #[test]
    fn unknown_check_type_is_rejected() {
        let parsed = serde_json::from_value::<NewQualityCheck>(serde_json::json!({
            "batchId": "6f1c1f2e-8a53-4c6e-9d3c-0b7f7f4f2a11",
            "checkType": "smell_test",
        }));
        assert!(parsed.is_err());
    }

    #[test]
    fn moisture_over_hundred_percent_fails_validation() {
        let input: NewQualityCheck = serde_json::from_value(serde_json::json!({
            "batchId": "6f1c1f2e-8a53-4c6e-9d3c-0b7f7f4f2a11",
            "checkType": "packaging",
            "moistureLevel": 130,
        }))
        .unwrap();
        assert!(input.validate().is_err());
    }
}
