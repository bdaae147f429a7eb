use anyhow::Context;
use diesel::{ExpressionMethods, OptionalExtension, QueryDsl, SelectableHelper};
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    app_error::AppError,
    auth::{hash_password, verify_password},
    models::{CreateUserEntity, UserEntity},
    schema::users,
};

pub const DEFAULT_ROLE: &str = "Admin";

#[derive(Deserialize, Validate, ToSchema, Debug)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 6))]
    pub password: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub role: Option<String>,
}

#[derive(Deserialize, Validate, ToSchema, Debug)]
#[serde(rename_all = "camelCase")]
pub struct Credentials {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub async fn register(
    conn: &mut AsyncPgConnection,
    input: NewUser,
) -> Result<UserEntity, AppError> {
    input.validate()?;
    let email = normalize_email(&input.email);

    if find_by_email(conn, &email).await?.is_some() {
        return Err(AppError::Constraint(format!(
            "A user with email {} already exists",
            email
        )));
    }

    let user = diesel::insert_into(users::table)
        .values(CreateUserEntity {
            id: Uuid::new_v4(),
            email,
            password_hash: hash_password(&input.password)?,
            first_name: input.first_name,
            last_name: input.last_name,
            role: input
                .role
                .filter(|role| !role.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_ROLE.to_string()),
        })
        .returning(UserEntity::as_returning())
        .get_result(conn)
        .await
        .context("Failed to create user")?;

    tracing::info!("Registered user {} as {}", user.email, user.role);

    Ok(user)
}

pub async fn find_by_email(
    conn: &mut AsyncPgConnection,
    email: &str,
) -> Result<Option<UserEntity>, AppError> {
    let user = users::table
        .filter(users::email.eq(normalize_email(email)))
        .select(UserEntity::as_select())
        .first(conn)
        .await
        .optional()
        .context("Failed to get user by email")?;

    Ok(user)
}

/// Checks a login. Unknown emails and wrong passwords fail the same way.
pub async fn authenticate(
    conn: &mut AsyncPgConnection,
    credentials: Credentials,
) -> Result<UserEntity, AppError> {
    credentials.validate()?;

    let user = find_by_email(conn, &credentials.email).await?;
    match user {
        Some(user) if verify_password(&credentials.password, &user.password_hash) => Ok(user),
        _ => {
            tracing::warn!("Failed login attempt for {}", credentials.email);
            Err(AppError::Unauthorized("Invalid email or password".into()))
        }
    }
}

pub async fn get_by_id(
    conn: &mut AsyncPgConnection,
    id: Uuid,
) -> Result<Option<UserEntity>, AppError> {
    let user = users::table
        .find(id)
        .select(UserEntity::as_select())
        .get_result(conn)
        .await
        .optional()
        .context("Failed to get user")?;

    Ok(user)
}
