use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json},
};
use serde_json::json;
use tracing::{error, warn};

use crate::{
    dto::clerk_dto::ClerkEvent,
    error::{Error, Result},
    utils::{
        signature::{verify_svix, SvixHeaders},
        time::now_unix,
    },
    AppState,
};

/// Identity-provider webhook. The raw body is verified before it is parsed.
pub async fn handle_clerk_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse> {
    let Some(secret) = state.settings.clerk_signing_secret.as_deref() else {
        error!("CLERK_SIGNING_SECRET is not configured");
        return Err(Error::Config("webhook secret is missing".into()));
    };

    let svix = SvixHeaders::from_headers(&headers)?;
    verify_svix(secret, &svix, &body, now_unix()).map_err(|e| {
        warn!(svix_id = svix.id, error = %e, "could not verify identity webhook");
        Error::from(e)
    })?;

    let event = ClerkEvent::parse(&body)
        .map_err(|e| Error::BadRequest(format!("Invalid webhook payload: {}", e)))?;
    let event_type = event.event_type().to_string();

    let outcome = state
        .identity_service
        .handle_event(event)
        .await
        .map_err(|e| {
            error!(event_type = %event_type, error = %e, "identity webhook failed");
            e
        })?;

    Ok((StatusCode::OK, Json(json!({ "message": outcome.message() }))))
}
