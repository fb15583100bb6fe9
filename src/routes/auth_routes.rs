use axum::{extract::State, http::StatusCode, Extension, Json};

use crate::dto::auth_dto::{
    LoginRequest, MessageResponse, SignupRequest, SignupResponse, TokenResponse,
};
use crate::error::Result;
use crate::services::auth_service::AuthUser;
use crate::AppState;

pub async fn signup(
    State(state): State<AppState>,
    Json(payload): Json<SignupRequest>,
) -> Result<(StatusCode, Json<SignupResponse>)> {
    let user = state.auth_service.signup(payload).await?;
    Ok((
        StatusCode::CREATED,
        Json(SignupResponse {
            id: user.id,
            email: user.email,
            created_at: user.created_at,
        }),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<TokenResponse>> {
    Ok(Json(state.auth_service.login(payload).await?))
}

pub async fn logout(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Json<MessageResponse> {
    state.auth_service.logout(&user);
    Json(MessageResponse {
        success: true,
        message: "You have been logged out.".to_string(),
    })
}
