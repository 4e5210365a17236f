// Google sign-in, YouTube account connection and session endpoints

use crate::error::AppError;
use crate::middleware::auth::{auth_middleware, claims_from_headers, SESSION_COOKIE};
use crate::models::auth::{Claims, User, UserSummary};
use crate::models::youtube::{ChannelSnapshot, ChannelTokens};
use crate::services::ChannelService;
use crate::youtube_client::{self, GoogleTokenResponse};
use crate::AppState;
use axum::{
    extract::{Extension, Query},
    http::HeaderMap,
    response::{IntoResponse, Json, Redirect, Response},
    routing::get,
    Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use base64::Engine;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

const SESSION_HOURS: i64 = 24;
const OAUTH_STATE_MAX_AGE_SECS: i64 = 10 * 60;

const LOGIN_SCOPES: [&str; 3] = ["profile", "email", "openid"];
const YOUTUBE_SCOPES: [&str; 3] = [
    "https://www.googleapis.com/auth/youtube.readonly",
    "https://www.googleapis.com/auth/youtube.upload",
    "https://www.googleapis.com/auth/userinfo.email",
];

pub fn auth_routes() -> Router {
    let public_routes = Router::new()
        .route("/auth/google", get(initiate_google_oauth))
        .route("/auth/google/callback", get(google_oauth_callback))
        .route("/auth/youtube/callback", get(youtube_oauth_callback))
        .route("/auth/logout", get(logout))
        .route("/auth/user", get(current_user));

    // Needs a session to know which account the channels belong to
    let protected_routes = Router::new()
        .route("/auth/youtube", get(initiate_youtube_oauth))
        .layer(axum::middleware::from_fn(auth_middleware));

    public_routes.merge(protected_routes)
}

// ============================================================================
// Session tokens
// ============================================================================

pub fn issue_session_token(
    user_id: i32,
    name: &str,
    email: &str,
    secret: &str,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = Utc::now();
    let claims = Claims {
        sub: user_id.to_string(),
        name: name.to_string(),
        email: email.to_string(),
        exp: (now + Duration::hours(SESSION_HOURS)).timestamp() as usize,
        iat: now.timestamp() as usize,
    };

    encode(&Header::default(), &claims, &EncodingKey::from_secret(secret.as_bytes()))
}

pub fn verify_session_token(token: &str, secret: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )?;

    Ok(token_data.claims)
}

fn session_cookie(token: String, secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .max_age(time::Duration::hours(SESSION_HOURS))
        .build()
}

// ============================================================================
// OAuth state parameter
// ============================================================================

/// Round-tripped through Google as URL-safe base64 JSON
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OAuthState {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i32>,
    pub timestamp: i64,
}

impl OAuthState {
    pub fn new(user_id: Option<i32>) -> Self {
        Self {
            user_id,
            timestamp: Utc::now().timestamp(),
        }
    }

    pub fn encode(&self) -> String {
        let json = serde_json::to_string(self).unwrap_or_default();
        base64::prelude::BASE64_URL_SAFE_NO_PAD.encode(json)
    }

    /// `None` for anything malformed or older than ten minutes
    pub fn decode(raw: &str, now: i64) -> Option<Self> {
        let bytes = base64::prelude::BASE64_URL_SAFE_NO_PAD.decode(raw).ok()?;
        let state: OAuthState = serde_json::from_slice(&bytes).ok()?;

        let age = now - state.timestamp;
        if !(0..=OAUTH_STATE_MAX_AGE_SECS).contains(&age) {
            tracing::warn!("Rejected OAuth state issued {}s ago", age);
            return None;
        }
        Some(state)
    }
}

#[derive(Deserialize)]
pub struct OAuthCallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

impl OAuthCallbackQuery {
    fn into_parts(self) -> Result<(String, OAuthState), String> {
        if let Some(error) = self.error {
            return Err(format!("Google returned an error: {}", error));
        }
        let code = self.code.ok_or("Missing authorization code")?;
        let raw_state = self.state.ok_or("Missing state parameter")?;
        let state = OAuthState::decode(&raw_state, Utc::now().timestamp()).ok_or("Invalid or expired state")?;
        Ok((code, state))
    }
}

fn google_credentials(state: &AppState) -> Result<(&str, &str), AppError> {
    state
        .config
        .google_credentials()
        .ok_or(AppError::ServiceUnavailable("Google OAuth not configured"))
}

// ============================================================================
// Google sign-in
// ============================================================================

/// Redirect to Google's consent screen for login
pub async fn initiate_google_oauth(Extension(state): Extension<Arc<AppState>>) -> Result<Redirect, AppError> {
    let (client_id, _) = google_credentials(&state)?;

    let auth_url = youtube_client::build_google_oauth_url(
        client_id,
        &state.config.google_callback_url(),
        &LOGIN_SCOPES,
        &OAuthState::new(None).encode(),
    );

    tracing::info!("Initiating Google OAuth login");
    Ok(Redirect::to(&auth_url))
}

pub async fn google_oauth_callback(
    Query(params): Query<OAuthCallbackQuery>,
    Extension(state): Extension<Arc<AppState>>,
    jar: CookieJar,
) -> Response {
    let frontend = &state.config.frontend_url;

    match complete_google_login(&state, params).await {
        Ok(user) => match issue_session_token(user.id, &user.name, &user.email, &state.config.session_secret) {
            Ok(token) => {
                tracing::info!("User {} signed in with Google", user.email);
                let jar = jar.add(session_cookie(token, state.config.cookie_secure));
                (jar, Redirect::to(&format!("{}/auth/callback", frontend))).into_response()
            }
            Err(e) => {
                tracing::error!("Failed to issue session token: {}", e);
                Redirect::to(&format!("{}/auth", frontend)).into_response()
            }
        },
        Err(e) => {
            tracing::error!("Google sign-in failed: {}", e);
            Redirect::to(&format!("{}/auth", frontend)).into_response()
        }
    }
}

async fn complete_google_login(state: &AppState, params: OAuthCallbackQuery) -> Result<User, String> {
    let (code, _) = params.into_parts()?;
    let (client_id, client_secret) = state
        .config
        .google_credentials()
        .ok_or("Google OAuth not configured")?;

    let http = state.youtube.http();
    let tokens = youtube_client::exchange_code_for_token(
        http,
        &code,
        client_id,
        client_secret,
        &state.config.google_callback_url(),
    )
    .await
    .map_err(|e| format!("Failed to exchange code: {}", e))?;

    let profile = youtube_client::get_google_user_info(http, &tokens.access_token)
        .await
        .map_err(|e| format!("Failed to get user info: {}", e))?;

    let name = profile.name.clone().unwrap_or_else(|| profile.email.clone());
    find_or_create_google_user(&state.db_pool, &profile.id, &name, &profile.email, &tokens)
        .await
        .map_err(|e| format!("Database error: {}", e))
}

/// Match by email; existing users get their Google id and tokens refreshed
async fn find_or_create_google_user(
    pool: &sqlx::PgPool,
    google_id: &str,
    name: &str,
    email: &str,
    tokens: &GoogleTokenResponse,
) -> Result<User, sqlx::Error> {
    let user = sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (name, email, password_hash, google_id, youtube_access_token, youtube_refresh_token)
        VALUES ($1, $2, '', $3, $4, $5)
        ON CONFLICT (email) DO UPDATE SET
            google_id = EXCLUDED.google_id,
            youtube_access_token = EXCLUDED.youtube_access_token,
            youtube_refresh_token = COALESCE(EXCLUDED.youtube_refresh_token, users.youtube_refresh_token),
            updated_at = NOW()
        RETURNING *
        "#,
    )
    .bind(name)
    .bind(email)
    .bind(google_id)
    .bind(&tokens.access_token)
    .bind(&tokens.refresh_token)
    .fetch_one(pool)
    .await?;

    Ok(user)
}

// ============================================================================
// YouTube account connection
// ============================================================================

/// Redirect to Google with YouTube scopes; the state carries the caller's id
pub async fn initiate_youtube_oauth(
    Extension(state): Extension<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
) -> Result<Redirect, AppError> {
    let (client_id, _) = google_credentials(&state)?;
    let user_id = claims.user_id().ok_or(AppError::Unauthorized("Unauthorized"))?;

    let auth_url = youtube_client::build_google_oauth_url(
        client_id,
        &state.config.youtube_callback_url(),
        &YOUTUBE_SCOPES,
        &OAuthState::new(Some(user_id)).encode(),
    );

    tracing::info!("Initiating YouTube OAuth for user {}", user_id);
    Ok(Redirect::to(&auth_url))
}

pub async fn youtube_oauth_callback(
    Query(params): Query<OAuthCallbackQuery>,
    Extension(state): Extension<Arc<AppState>>,
) -> Redirect {
    let frontend = &state.config.frontend_url;

    match complete_youtube_connection(&state, params).await {
        Ok(count) => {
            tracing::info!("Connected {} YouTube channel(s) via OAuth", count);
            Redirect::to(&format!("{}/youtube/callback", frontend))
        }
        Err(e) => {
            tracing::error!("YouTube OAuth callback failed: {}", e);
            Redirect::to(&format!("{}/dashboard", frontend))
        }
    }
}

async fn complete_youtube_connection(state: &AppState, params: OAuthCallbackQuery) -> Result<usize, String> {
    let (code, oauth_state) = params.into_parts()?;
    let user_id = oauth_state.user_id.ok_or("State is missing the user id")?;
    let (client_id, client_secret) = state
        .config
        .google_credentials()
        .ok_or("Google OAuth not configured")?;

    let tokens = youtube_client::exchange_code_for_token(
        state.youtube.http(),
        &code,
        client_id,
        client_secret,
        &state.config.youtube_callback_url(),
    )
    .await
    .map_err(|e| format!("Failed to exchange code: {}", e))?;

    sqlx::query(
        "UPDATE users SET youtube_access_token = $1,
             youtube_refresh_token = COALESCE($2, youtube_refresh_token), updated_at = NOW()
         WHERE id = $3",
    )
    .bind(&tokens.access_token)
    .bind(&tokens.refresh_token)
    .bind(user_id)
    .execute(&state.db_pool)
    .await
    .map_err(|e| format!("Failed to store YouTube tokens: {}", e))?;

    let channels = state
        .youtube
        .list_my_channels(&tokens.access_token)
        .await
        .map_err(|e| format!("Failed to list channels: {}", e))?;

    let channel_tokens = ChannelTokens {
        access_token: Some(tokens.access_token.clone()),
        refresh_token: tokens.refresh_token.clone(),
    };
    let service = ChannelService::new(&state.db_pool, &state.youtube);

    for item in channels.iter().cloned() {
        let snapshot = ChannelSnapshot::from(item);
        service
            .store_snapshot(user_id, &snapshot, &channel_tokens)
            .await
            .map_err(|e| format!("Failed to save channel {}: {}", snapshot.channel_id, e))?;
    }

    Ok(channels.len())
}

// ============================================================================
// Session endpoints
// ============================================================================

pub async fn logout(Extension(state): Extension<Arc<AppState>>, jar: CookieJar) -> impl IntoResponse {
    let jar = jar.remove(Cookie::build(SESSION_COOKIE).path("/"));
    (jar, Redirect::to(&state.config.frontend_url))
}

pub async fn current_user(
    Extension(state): Extension<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<UserSummary>, AppError> {
    let user_id = claims_from_headers(&headers, &state.config.session_secret)
        .and_then(|c| c.user_id())
        .ok_or(AppError::Unauthorized("Not authenticated"))?;

    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_optional(&state.db_pool)
        .await?
        .ok_or(AppError::Unauthorized("Not authenticated"))?;

    Ok(Json(UserSummary::from(user)))
}
