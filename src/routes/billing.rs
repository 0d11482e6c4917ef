use axum::{
    extract::State,
    response::{IntoResponse, Json},
    Extension,
};

use crate::{
    dto::billing_dto::{CreateSessionPayload, SessionUrlResponse},
    error::{Error, Result},
    middleware::auth::{ensure_user, Claims},
    AppState,
};

fn requested_user(claims: &Claims, payload: &CreateSessionPayload) -> Result<String> {
    let user_id = payload
        .user_id()
        .ok_or_else(|| Error::BadRequest("User ID is required".into()))?;
    ensure_user(claims, user_id)?;
    Ok(user_id.to_string())
}

#[utoipa::path(
    post,
    path = "/api/stripe/create-checkout-session",
    request_body = CreateSessionPayload,
    responses(
        (status = 200, description = "Hosted checkout session created", body = SessionUrlResponse),
        (status = 400, description = "User ID is required"),
        (status = 403, description = "Session belongs to another user"),
        (status = 500, description = "Payment provider error"),
    ),
    security(("bearer" = []))
)]
pub async fn create_checkout_session(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateSessionPayload>,
) -> Result<impl IntoResponse> {
    let user_id = requested_user(&claims, &payload)?;
    let url = state
        .billing_service
        .create_checkout_session(&user_id)
        .await?;
    Ok(Json(SessionUrlResponse { url }))
}

#[utoipa::path(
    post,
    path = "/api/stripe/create-portal-session",
    request_body = CreateSessionPayload,
    responses(
        (status = 200, description = "Billing portal session created", body = SessionUrlResponse),
        (status = 400, description = "User ID is required"),
        (status = 404, description = "No subscription found for this user"),
        (status = 500, description = "Payment provider error"),
    ),
    security(("bearer" = []))
)]
pub async fn create_portal_session(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateSessionPayload>,
) -> Result<impl IntoResponse> {
    let user_id = requested_user(&claims, &payload)?;
    let url = state.billing_service.create_portal_session(&user_id).await?;
    Ok(Json(SessionUrlResponse { url }))
}
