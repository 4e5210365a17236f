// User CRUD (/api/users)

use crate::error::{is_constraint_violation, AppError};
use crate::models::auth::{CreateUserRequest, UpdateUserRequest, User};
use crate::AppState;
use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::Json,
    routing::get,
    Router,
};
use bcrypt::{hash, DEFAULT_COST};
use serde_json::json;
use std::sync::Arc;

pub fn user_routes() -> Router {
    Router::new()
        .route("/api/users", get(list_users).post(create_user))
        .route("/api/users/:id", get(get_user).put(update_user).delete(delete_user))
}

struct NewUser {
    name: String,
    email: String,
    password: String,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

impl CreateUserRequest {
    fn validate(self) -> Result<NewUser, AppError> {
        match (non_blank(self.name), non_blank(self.email), self.password.filter(|p| !p.is_empty())) {
            (Some(name), Some(email), Some(password)) => Ok(NewUser { name, email, password }),
            _ => Err(AppError::BadRequest("Name, email and password are required".to_string())),
        }
    }
}

fn write_error(err: sqlx::Error) -> AppError {
    if is_constraint_violation(&err) {
        AppError::BadRequest("A user with this email already exists".to_string())
    } else {
        AppError::from(err)
    }
}

pub async fn list_users(Extension(state): Extension<Arc<AppState>>) -> Result<Json<Vec<User>>, AppError> {
    let users = sqlx::query_as::<_, User>("SELECT * FROM users ORDER BY id")
        .fetch_all(&state.db_pool)
        .await?;
    Ok(Json(users))
}

pub async fn get_user(
    Extension(state): Extension<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<User>, AppError> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
        .bind(id)
        .fetch_optional(&state.db_pool)
        .await?
        .map(Json)
        .ok_or(AppError::NotFound("User not found"))
}

pub async fn create_user(
    Extension(state): Extension<Arc<AppState>>,
    Json(payload): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<User>), AppError> {
    let new_user = payload.validate()?;

    let password_hash = hash(&new_user.password, DEFAULT_COST).map_err(|e| AppError::internal("Failed to hash password", e))?;

    let user = sqlx::query_as::<_, User>(
        "INSERT INTO users (name, email, password_hash) VALUES ($1, $2, $3) RETURNING *",
    )
    .bind(&new_user.name)
    .bind(&new_user.email)
    .bind(&password_hash)
    .fetch_one(&state.db_pool)
    .await
    .map_err(write_error)?;

    tracing::info!("Created user {} ({})", user.id, user.email);
    Ok((StatusCode::CREATED, Json(user)))
}

/// Absent fields keep their stored values
pub async fn update_user(
    Extension(state): Extension<Arc<AppState>>,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateUserRequest>,
) -> Result<Json<User>, AppError> {
    let user = sqlx::query_as::<_, User>(
        "UPDATE users SET name = COALESCE($1, name), email = COALESCE($2, email), updated_at = NOW()
         WHERE id = $3 RETURNING *",
    )
    .bind(non_blank(payload.name))
    .bind(non_blank(payload.email))
    .bind(id)
    .fetch_optional(&state.db_pool)
    .await
    .map_err(write_error)?
    .ok_or(AppError::NotFound("User not found"))?;

    Ok(Json(user))
}

pub async fn delete_user(
    Extension(state): Extension<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<serde_json::Value>, AppError> {
    let result = sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(id)
        .execute(&state.db_pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("User not found"));
    }

    tracing::info!("Deleted user {}", id);
    Ok(Json(json!({ "message": "User deleted" })))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(name: Option<&str>, email: Option<&str>, password: Option<&str>) -> CreateUserRequest {
        CreateUserRequest {
            name: name.map(String::from),
            email: email.map(String::from),
            password: password.map(String::from),
        }
    }

    #[test]
    fn test_create_request_requires_all_fields() {
        let ok = request(Some(" Ada "), Some("ada@example.com"), Some("hunter2")).validate().unwrap();
        assert_eq!(ok.name, "Ada");

        for bad in [
            request(None, Some("ada@example.com"), Some("pw")),
            request(Some("Ada"), Some("   "), Some("pw")),
            request(Some("Ada"), Some("ada@example.com"), Some("")),
        ] {
            assert!(matches!(bad.validate(), Err(AppError::BadRequest(_))));
        }
    }

    #[test]
    fn test_user_json_hides_secrets() {
        let user = User {
            id: 1,
            name: "Ada".into(),
            email: "ada@example.com".into(),
            password_hash: "$2b$12$abc".into(),
            google_id: None,
            youtube_access_token: Some("ya29.token".into()),
            youtube_refresh_token: None,
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        };
        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("passwordHash").is_none());
        assert!(json.get("youtubeAccessToken").is_none());
        assert_eq!(json["email"], "ada@example.com");
    }
}
