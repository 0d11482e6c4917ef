use axum::{
    extract::State,
    response::{IntoResponse, Json},
    Extension,
};

use crate::{
    dto::billing_dto::AccountStatusResponse, error::Result, middleware::auth::Claims, AppState,
};

/// Disables the signed-in user's account. Signing in again re-enables it.
#[utoipa::path(
    post,
    path = "/api/account/disable",
    responses(
        (status = 200, description = "Account disabled", body = AccountStatusResponse),
        (status = 401, description = "Missing or invalid session"),
    ),
    security(("bearer" = []))
)]
pub async fn disable_account(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse> {
    state.account_service.disable(&claims.sub).await?;
    Ok(Json(AccountStatusResponse {
        user_id: claims.sub,
        is_active: false,
    }))
}
