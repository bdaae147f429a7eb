use axum::{
    Json,
    extract::{
        FromRequest, FromRequestParts,
        rejection::{JsonRejection, PathRejection},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use serde::Serialize;
use utoipa::ToSchema;

/// Every failure a handler can surface. The variant decides the HTTP status,
/// the `Display` text becomes the `{message}` body.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Constraint(String),

    #[error("Resource not found")]
    NotFound,

    #[error("{0}")]
    Unauthorized(String),

    #[error("Cannot move {entity} from '{from}' to '{to}'")]
    IllegalTransition {
        entity: &'static str,
        from: String,
        to: String,
    },

    #[error(transparent)]
    Other(anyhow::Error),
}

#[derive(Serialize, Debug, ToSchema)]
pub struct ErrorBody {
    pub message: String,
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::Constraint(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::IllegalTransition { .. } => StatusCode::CONFLICT,
            AppError::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = match &self {
            AppError::Other(err) => {
                tracing::error!("Unhandled error: {:#}", err);
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };

        (status, Json(ErrorBody { message })).into_response()
    }
}

fn is_constraint_violation(kind: &DatabaseErrorKind) -> bool {
    matches!(
        kind,
        DatabaseErrorKind::UniqueViolation
            | DatabaseErrorKind::ForeignKeyViolation
            | DatabaseErrorKind::NotNullViolation
            | DatabaseErrorKind::CheckViolation
    )
}

impl From<DieselError> for AppError {
    fn from(err: DieselError) -> Self {
        match err {
            DieselError::NotFound => AppError::NotFound,
            DieselError::DatabaseError(kind, info) if is_constraint_violation(&kind) => {
                AppError::Constraint(info.message().to_string())
            }
            other => AppError::Other(other.into()),
        }
    }
}

/// Errors routed through `anyhow::Context` keep their classification: a
/// diesel error or an `AppError` anywhere under the context is recovered.
impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        if let Some(diesel_err) = err.downcast_ref::<DieselError>() {
            match diesel_err {
                DieselError::NotFound => return AppError::NotFound,
                DieselError::DatabaseError(kind, info) if is_constraint_violation(kind) => {
                    return AppError::Constraint(info.message().to_string());
                }
                _ => {}
            }
        }

        match err.downcast::<AppError>() {
            Ok(app_error) => app_error,
            Err(err) => AppError::Other(err),
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::Validation(format!("Validation failed: {}", err))
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

/// JSON body extractor whose rejection is a 400 `{message}` instead of axum's plain-text 422.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct AppJson<T>(pub T);

/// Path extractor with the same error shape as [`AppJson`].
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub struct AppPath<T>(pub T);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_follow_taxonomy() {
        assert_eq!(
            AppError::Validation("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::Constraint("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(AppError::NotFound.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            AppError::Unauthorized("x".into()).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AppError::IllegalTransition {
                entity: "delivery",
                from: "rejected".into(),
                to: "approved".into(),
            }
            .status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::Other(anyhow::anyhow!("boom")).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn diesel_not_found_survives_context() {
        use anyhow::Context;

        let result: Result<(), DieselError> = Err(DieselError::NotFound);
        let err = result.context("Failed to get supplier").unwrap_err();
        assert!(matches!(AppError::from(err), AppError::NotFound));
    }

    struct PgInfo(&'static str);

    impl diesel::result::DatabaseErrorInformation for PgInfo {
        fn message(&self) -> &str {
            self.0
        }
        fn details(&self) -> Option<&str> {
            None
        }
        fn hint(&self) -> Option<&str> {
            None
        }
        fn table_name(&self) -> Option<&str> {
            None
        }
        fn column_name(&self) -> Option<&str> {
            None
        }
        fn constraint_name(&self) -> Option<&str> {
            None
        }
        fn statement_position(&self) -> Option<i32> {
            None
        }
    }

    fn db_error(kind: DatabaseErrorKind, message: &'static str) -> DieselError {
        DieselError::DatabaseError(kind, Box::new(PgInfo(message)))
    }

    #[test]
    fn constraint_violations_are_bad_requests() {
        let duplicate = "duplicate key value violates unique constraint";
        let err = AppError::from(db_error(DatabaseErrorKind::UniqueViolation, duplicate));
        assert!(matches!(&err, AppError::Constraint(msg) if msg == duplicate));
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);

        let dangling = "violates foreign key constraint \"truck_deliveries_supplier_id_fkey\"";
        let err = AppError::from(db_error(DatabaseErrorKind::ForeignKeyViolation, dangling));
        assert!(matches!(&err, AppError::Constraint(msg) if msg == dangling));
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn constraint_violation_survives_context() {
        use anyhow::Context;

        let result: Result<(), DieselError> = Err(db_error(
            DatabaseErrorKind::UniqueViolation,
            "duplicate key value violates unique constraint \"users_email_key\"",
        ));
        let err = result.context("Failed to register user").unwrap_err();
        let err = AppError::from(err);
        assert!(matches!(&err, AppError::Constraint(msg) if msg.contains("users_email_key")));
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn other_database_errors_are_internal() {
        let err = AppError::from(db_error(
            DatabaseErrorKind::SerializationFailure,
            "could not serialize access",
        ));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn app_error_survives_context() {
        use anyhow::Context;

        let result: Result<(), AppError> = Err(AppError::Validation("bad".into()));
        let err = result.context("Transaction failed").unwrap_err();
        assert!(matches!(AppError::from(err), AppError::Validation(msg) if msg == "bad"));
    }

    #[test]
    fn illegal_transition_message_names_both_states() {
        let err = AppError::IllegalTransition {
            entity: "delivery",
            from: "rejected".into(),
            to: "approved".into(),
        };
        assert_eq!(
            err.to_string(),
            "Cannot move delivery from 'rejected' to 'approved'"
        );
    }
}
