use std::str::FromStr;

use axum::{
    Json, Router,
    extract::State,
    response::Json as ResponseJson,
    routing::get,
};
use db::{
    models::user::{CreateUser, User},
    types::UserRole,
};
use serde::Deserialize;
use services::services::validate::{self, FieldErrors};
use ts_rs::TS;
use utils::response::ApiResponse;

use crate::{AppState, error::ApiError};

const NAME_MIN: usize = 1;
const NAME_MAX: usize = 100;
const EMAIL_MAX: usize = 255;

#[derive(Debug, Clone, Default, Deserialize, TS)]
pub struct CreateUserRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub role: Option<String>,
}

pub async fn get_users(
    State(state): State<AppState>,
) -> Result<ResponseJson<ApiResponse<Vec<User>>>, ApiError> {
    let users = User::find_all_active(&state.db().pool).await?;
    Ok(ResponseJson(ApiResponse::success(users)))
}

pub async fn create_user(
    State(state): State<AppState>,
    Json(payload): Json<CreateUserRequest>,
) -> Result<ResponseJson<ApiResponse<User>>, ApiError> {
    let mut errors = FieldErrors::new();
    let first_name = validate::required_text(
        &mut errors,
        "first_name",
        payload.first_name.as_deref(),
        NAME_MIN,
        NAME_MAX,
    );
    let last_name = validate::required_text(
        &mut errors,
        "last_name",
        payload.last_name.as_deref(),
        NAME_MIN,
        NAME_MAX,
    );
    let email = validate::required_text(
        &mut errors,
        "email",
        payload.email.as_deref(),
        NAME_MIN,
        EMAIL_MAX,
    )
    .filter(|value| {
        if value.contains('@') {
            true
        } else {
            errors.push("email", "must be a valid email address");
            false
        }
    });
    let role = match payload.role.as_deref() {
        Some(value) => match UserRole::from_str(value.trim()) {
            Ok(role) => Some(role),
            Err(_) => {
                errors.push("role", "must be one of admin, teacher, staff");
                None
            }
        },
        None => None,
    };

    if !errors.is_empty() {
        return Err(ApiError::BadRequest(format!(
            "Validation failed: {}",
            errors.into_vec().join("; ")
        )));
    }
    let (first_name, last_name, email) = match (first_name, last_name, email) {
        (Some(first_name), Some(last_name), Some(email)) => (first_name, last_name, email),
        _ => {
            return Err(ApiError::BadRequest(
                "first_name, last_name and email are required".to_string(),
            ));
        }
    };

    let user = User::create(
        &state.db().pool,
        &CreateUser {
            first_name,
            last_name,
            email,
            role,
        },
    )
    .await?;
    Ok(ResponseJson(ApiResponse::success(user)))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/users", get(get_users).post(create_user))
}
