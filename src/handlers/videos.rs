// Local video records (/api/videos), each owned by a user

use crate::error::{is_constraint_violation, AppError};
use crate::models::video::{CreateVideoRequest, UpdateVideoRequest, Video, VideoWithOwner, VideoWithOwnerRow};
use crate::AppState;
use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::Json,
    routing::get,
    Router,
};
use serde_json::json;
use std::sync::Arc;

const SELECT_WITH_OWNER: &str = r#"
    SELECT v.*, u.name AS owner_name, u.email AS owner_email
    FROM videos v
    JOIN users u ON u.id = v.user_id
"#;

pub fn video_routes() -> Router {
    Router::new()
        .route("/api/videos", get(list_videos).post(create_video))
        .route("/api/videos/:id", get(get_video).put(update_video).delete(delete_video))
}

fn required(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

struct NewVideo {
    title: String,
    url: String,
    user_id: i32,
}

impl CreateVideoRequest {
    fn validate(self) -> Result<NewVideo, AppError> {
        match (required(self.title), required(self.url), self.user_id) {
            (Some(title), Some(url), Some(user_id)) => Ok(NewVideo { title, url, user_id }),
            _ => Err(AppError::BadRequest("Title, url and userId are required".to_string())),
        }
    }
}

pub async fn list_videos(Extension(state): Extension<Arc<AppState>>) -> Result<Json<Vec<VideoWithOwner>>, AppError> {
    let rows = sqlx::query_as::<_, VideoWithOwnerRow>(&format!("{} ORDER BY v.created_at DESC", SELECT_WITH_OWNER))
        .fetch_all(&state.db_pool)
        .await?;
    Ok(Json(rows.into_iter().map(VideoWithOwner::from).collect()))
}

pub async fn get_video(
    Extension(state): Extension<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<VideoWithOwner>, AppError> {
    sqlx::query_as::<_, VideoWithOwnerRow>(&format!("{} WHERE v.id = $1", SELECT_WITH_OWNER))
        .bind(id)
        .fetch_optional(&state.db_pool)
        .await?
        .map(|row| Json(VideoWithOwner::from(row)))
        .ok_or(AppError::NotFound("Video not found"))
}

pub async fn create_video(
    Extension(state): Extension<Arc<AppState>>,
    Json(payload): Json<CreateVideoRequest>,
) -> Result<(StatusCode, Json<Video>), AppError> {
    let NewVideo { title, url, user_id } = payload.validate()?;

    let video = sqlx::query_as::<_, Video>("INSERT INTO videos (title, url, user_id) VALUES ($1, $2, $3) RETURNING *")
        .bind(&title)
        .bind(&url)
        .bind(user_id)
        .fetch_one(&state.db_pool)
        .await
        .map_err(|e| {
            if is_constraint_violation(&e) {
                AppError::BadRequest("User does not exist".to_string())
            } else {
                AppError::from(e)
            }
        })?;

    Ok((StatusCode::CREATED, Json(video)))
}

pub async fn update_video(
    Extension(state): Extension<Arc<AppState>>,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateVideoRequest>,
) -> Result<Json<Video>, AppError> {
    let video = sqlx::query_as::<_, Video>(
        "UPDATE videos SET title = COALESCE($1, title), url = COALESCE($2, url), updated_at = NOW()
         WHERE id = $3 RETURNING *",
    )
    .bind(required(payload.title))
    .bind(required(payload.url))
    .bind(id)
    .fetch_optional(&state.db_pool)
    .await?
    .ok_or(AppError::NotFound("Video not found"))?;

    Ok(Json(video))
}

pub async fn delete_video(
    Extension(state): Extension<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<serde_json::Value>, AppError> {
    let result = sqlx::query("DELETE FROM videos WHERE id = $1")
        .bind(id)
        .execute(&state.db_pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Video not found"));
    }
    Ok(Json(json!({ "message": "Video deleted" })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::auth::UserSummary;

    fn request(title: Option<&str>, url: Option<&str>, user_id: Option<i32>) -> CreateVideoRequest {
        CreateVideoRequest {
            title: title.map(String::from),
            url: url.map(String::from),
            user_id,
        }
    }

    #[test]
    fn test_create_request_requires_all_fields() {
        let ok = request(Some(" Launch "), Some("https://youtu.be/abc"), Some(4)).validate().unwrap();
        assert_eq!(ok.title, "Launch");
        assert_eq!(ok.url, "https://youtu.be/abc");
        assert_eq!(ok.user_id, 4);

        for bad in [
            request(None, Some("https://youtu.be/abc"), Some(4)),
            request(Some("Launch"), Some("  "), Some(4)),
            request(Some("Launch"), Some("https://youtu.be/abc"), None),
        ] {
            assert!(matches!(bad.validate(), Err(AppError::BadRequest(_))));
        }
    }

    #[test]
    fn test_create_request_reads_camel_case_user_id() {
        let payload: CreateVideoRequest =
            serde_json::from_str(r#"{"title":"Launch","url":"https://youtu.be/abc","userId":9}"#).unwrap();
        assert_eq!(payload.validate().unwrap().user_id, 9);
    }

    #[test]
    fn test_owner_row_becomes_nested_user() {
        let now = chrono::Utc::now();
        let row = VideoWithOwnerRow {
            video: Video {
                id: 3,
                title: "Launch".into(),
                url: "https://youtu.be/abc".into(),
                user_id: 7,
                created_at: now,
                updated_at: now,
            },
            owner_name: "Grace".into(),
            owner_email: "grace@example.com".into(),
        };

        let video = VideoWithOwner::from(row);
        assert_eq!(video.id, 3);
        assert_eq!(
            video.user,
            UserSummary {
                id: 7,
                name: "Grace".into(),
                email: "grace@example.com".into(),
            }
        );

        let json = serde_json::to_value(&video).unwrap();
        assert_eq!(json["user"]["email"], "grace@example.com");
        assert!(json.get("createdAt").is_some());
    }
}
