use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json},
};
use serde_json::json;
use tracing::{error, warn};

use crate::{
    dto::stripe_dto::StripeEvent,
    error::{Error, Result},
    utils::{
        signature::{verify_stripe, SignatureError, STRIPE_SIGNATURE},
        time::now_unix,
    },
    AppState,
};

pub async fn handle_stripe_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse> {
    let Some(secret) = state.settings.stripe_webhook_secret.as_deref() else {
        error!("STRIPE_WEBHOOK_SECRET is not configured");
        return Err(Error::Config("webhook secret is missing".into()));
    };

    let signature = headers
        .get(STRIPE_SIGNATURE)
        .and_then(|v| v.to_str().ok())
        .ok_or(SignatureError::MissingSignature)?;
    verify_stripe(secret, signature, &body, now_unix()).map_err(|e| {
        warn!(error = %e, "could not verify payment webhook");
        Error::from(e)
    })?;

    let event = StripeEvent::parse(&body)
        .map_err(|e| Error::BadRequest(format!("Invalid webhook payload: {}", e)))?;
    let event_type = event.event_type().to_string();

    state
        .billing_service
        .handle_event(event)
        .await
        .map_err(|e| {
            error!(event_type = %event_type, error = %e, "payment webhook failed");
            e
        })?;

    Ok((StatusCode::OK, Json(json!({ "received": true }))))
}
