use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use axum::{
    Extension, Json,
    extract::{Multipart, State},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::warn;
use uuid::Uuid;

use campus_db::models::UserRow;
use campus_types::api::{AvatarResponse, Claims, LoginRequest, LoginResponse, MeResponse, RegisterRequest};
use campus_types::models::User;

use crate::AppState;
use crate::error::ApiError;
use crate::token;

/// 5 MiB upload limit for avatar images
pub const MAX_AVATAR_SIZE: usize = 5 * 1024 * 1024;

/// Body cap for the multipart route; leaves headroom for field framing.
pub const AVATAR_BODY_LIMIT: usize = MAX_AVATAR_SIZE + 64 * 1024;

pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    // Validate input
    if !req.email.contains('@') {
        return Err(ApiError::Validation("invalid email".into()));
    }
    if req.password.len() < 8 {
        return Err(ApiError::Validation(
            "password must be at least 8 characters".into(),
        ));
    }

    let email = req.email.to_lowercase();

    // Hash password with Argon2id
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let password_hash = argon2
        .hash_password(req.password.as_bytes(), &salt)
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("password hashing failed: {}", e)))?
        .to_string();

    let user_id = Uuid::new_v4();

    state
        .db
        .create_user(&user_id.to_string(), &email, &password_hash)
        .map_err(|e| ApiError::from_unique(e, ApiError::UserExists))?;

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({ "message": "User created" })),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state
        .db
        .get_user_by_email(&req.email.to_lowercase())?
        .ok_or(ApiError::InvalidCredentials)?;

    // Verify password
    let parsed_hash = PasswordHash::new(&user.password)
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("corrupt password hash: {}", e)))?;

    Argon2::default()
        .verify_password(req.password.as_bytes(), &parsed_hash)
        .map_err(|_| ApiError::InvalidCredentials)?;

    let user = user_from_row(user);
    let token = token::issue(&state.jwt_secret, user.id)?;

    Ok(Json(LoginResponse { token, user }))
}

pub async fn me(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state
        .db
        .get_user_by_id(&claims.sub.to_string())?
        .ok_or(ApiError::UserNotFound)?;

    Ok(Json(MeResponse {
        user: user_from_row(user),
    }))
}

/// PATCH /me/avatar — multipart field `file`, image/* only, 5 MiB cap.
/// The new file is written and the DB updated before the previous file
/// is removed; a failed removal only leaks the old file.
pub async fn update_avatar(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let user = state
        .db
        .get_user_by_id(&claims.sub.to_string())?
        .ok_or(ApiError::UserNotFound)?;

    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| ApiError::Validation("error in file".into()))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let content_type = field.content_type().unwrap_or_default().to_string();
        if !content_type.starts_with("image/") {
            return Err(ApiError::Validation("invalid file format".into()));
        }

        let ext = avatar_extension(field.file_name());

        let data = field
            .bytes()
            .await
            .map_err(|_| ApiError::Validation("error in file".into()))?;

        upload = Some((ext, data));
        break;
    }

    let (ext, data) = upload.ok_or_else(|| ApiError::Validation("file cannot be empty".into()))?;
    if data.is_empty() {
        return Err(ApiError::Validation("file cannot be empty".into()));
    }
    if data.len() > MAX_AVATAR_SIZE {
        return Err(ApiError::Validation("file too large".into()));
    }

    tokio::fs::create_dir_all(&state.upload_dir)
        .await
        .map_err(|e| ApiError::Internal(e.into()))?;

    let file_name = format!("{}.{}", Uuid::new_v4(), ext);
    let path = state.upload_dir.join(&file_name);
    tokio::fs::write(&path, &data)
        .await
        .map_err(|e| ApiError::Internal(e.into()))?;

    state.db.set_user_image(&user.id, &file_name)?;

    // Delete-after-write replacement of the prior avatar.
    if let Some(old) = user.image_url {
        if let Err(e) = tokio::fs::remove_file(state.upload_dir.join(&old)).await {
            warn!("Failed to remove previous avatar {}: {}", old, e);
        }
    }

    Ok(Json(AvatarResponse {
        image_url: file_name,
    }))
}

/// Extension for a stored avatar: the suffix after the last dot of the
/// submitted file name, kept only when it is a short alphanumeric token.
/// Anything else (no dot, path characters, oversized suffixes) falls
/// back to "img".
fn avatar_extension(file_name: Option<&str>) -> String {
    file_name
        .and_then(|n| n.rsplit_once('.'))
        .map(|(_, ext)| ext)
        .filter(|ext| {
            !ext.is_empty() && ext.len() <= 8 && ext.chars().all(|c| c.is_ascii_alphanumeric())
        })
        .map(|ext| ext.to_ascii_lowercase())
        .unwrap_or_else(|| "img".to_string())
}

pub(crate) fn user_from_row(row: UserRow) -> User {
    User {
        id: row.id.parse().unwrap_or_else(|e| {
            warn!("Corrupt user id '{}': {}", row.id, e);
            Uuid::default()
        }),
        email: row.email,
        image_url: row.image_url,
        created_at: parse_created_at(&row.created_at, &row.id),
    }
}

fn parse_created_at(raw: &str, id: &str) -> chrono::DateTime<chrono::Utc> {
    raw.parse::<chrono::DateTime<chrono::Utc>>()
        .or_else(|_| {
            // SQLite stores timestamps as "YYYY-MM-DD HH:MM:SS" without timezone.
            // Parse as naive UTC and convert.
            chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .unwrap_or_else(|e| {
            warn!("Corrupt created_at '{}' on user '{}': {}", raw, id, e);
            chrono::DateTime::default()
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sqlite_timestamps_parse_without_timezone() {
        let parsed = parse_created_at("2026-08-29 12:30:00", "u1");
        assert_eq!(parsed.to_rfc3339(), "2026-08-29T12:30:00+00:00");
    }

    #[test]
    fn avatar_extension_is_preserved_and_sanitized() {
        assert_eq!(avatar_extension(Some("me.png")), "png");
        assert_eq!(avatar_extension(Some("shot.JPEG")), "jpeg");
        assert_eq!(avatar_extension(Some("archive.tar.gz")), "gz");
        assert_eq!(avatar_extension(Some("photo")), "img");
        assert_eq!(avatar_extension(Some("trailing.")), "img");
        assert_eq!(avatar_extension(Some("weird.p/ng")), "img");
        assert_eq!(avatar_extension(Some("dots.........x")), "x");
        assert_eq!(avatar_extension(None), "img");
    }

    #[test]
    fn rfc3339_timestamps_parse_too() {
        let rfc = parse_created_at("2026-08-29T12:30:00Z", "u1");
        let sqlite = parse_created_at("2026-08-29 12:30:00", "u1");
        assert_eq!(rfc, sqlite);
    }
}
