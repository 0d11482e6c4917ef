use chrono::{DateTime, TimeZone, Utc};
use serde::Deserialize;
use serde_json::Value as JsonValue;
use std::collections::HashMap;

use crate::models::subscription::BillingPeriod;

/// Stripe references are either bare ids or expanded objects carrying an `id`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum Expandable {
    Id(String),
    Object { id: String },
}

impl Expandable {
    pub fn id(&self) -> &str {
        match self {
            Expandable::Id(id) | Expandable::Object { id } => id,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    Active,
    Trialing,
    PastDue,
    Canceled,
    Unpaid,
    Incomplete,
    IncompleteExpired,
    Paused,
    #[serde(other)]
    Other,
}

impl SubscriptionStatus {
    pub fn is_active(&self) -> bool {
        matches!(self, SubscriptionStatus::Active)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutSession {
    pub id: String,
    pub customer: Option<Expandable>,
    pub subscription: Option<Expandable>,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl CheckoutSession {
    pub fn user_id(&self) -> Option<&str> {
        self.metadata
            .get("userId")
            .map(String::as_str)
            .filter(|id| !id.is_empty())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StripeSubscription {
    pub id: String,
    pub status: SubscriptionStatus,
    pub customer: Option<Expandable>,
    pub current_period_start: Option<i64>,
    pub current_period_end: Option<i64>,
}

impl StripeSubscription {
    pub fn customer_id(&self) -> Option<&str> {
        self.customer.as_ref().map(Expandable::id)
    }

    pub fn period(&self) -> Option<BillingPeriod> {
        Some(BillingPeriod {
            start: from_unix(self.current_period_start?)?,
            end: from_unix(self.current_period_end?)?,
        })
    }
}

fn from_unix(secs: i64) -> Option<DateTime<Utc>> {
    Utc.timestamp_opt(secs, 0).single()
}

#[derive(Debug, Clone, Deserialize)]
pub struct Invoice {
    pub id: String,
    pub subscription: Option<Expandable>,
}

#[derive(Debug, Deserialize)]
pub struct StripeEnvelope {
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: StripeEventData,
}

#[derive(Debug, Deserialize)]
pub struct StripeEventData {
    pub object: JsonValue,
}

#[derive(Debug, Clone)]
pub enum StripeEvent {
    CheckoutSessionCompleted(CheckoutSession),
    SubscriptionUpdated(StripeSubscription),
    SubscriptionDeleted(StripeSubscription),
    InvoicePaymentFailed(Invoice),
    Other(String),
}

impl StripeEvent {
    pub fn parse(body: &[u8]) -> serde_json::Result<Self> {
        let envelope: StripeEnvelope = serde_json::from_slice(body)?;
        tracing::debug!(event_id = %envelope.id, event_type = %envelope.event_type, "stripe event received");
        envelope.try_into()
    }

    pub fn event_type(&self) -> &str {
        match self {
            StripeEvent::CheckoutSessionCompleted(_) => "checkout.session.completed",
            StripeEvent::SubscriptionUpdated(_) => "customer.subscription.updated",
            StripeEvent::SubscriptionDeleted(_) => "customer.subscription.deleted",
            StripeEvent::InvoicePaymentFailed(_) => "invoice.payment_failed",
            StripeEvent::Other(kind) => kind,
        }
    }
}

impl TryFrom<StripeEnvelope> for StripeEvent {
    type Error = serde_json::Error;

    fn try_from(envelope: StripeEnvelope) -> serde_json::Result<Self> {
        let object = envelope.data.object;
        let event = match envelope.event_type.as_str() {
            "checkout.session.completed" => {
                StripeEvent::CheckoutSessionCompleted(serde_json::from_value(object)?)
            }
            "customer.subscription.updated" => {
                StripeEvent::SubscriptionUpdated(serde_json::from_value(object)?)
            }
            "customer.subscription.deleted" => {
                StripeEvent::SubscriptionDeleted(serde_json::from_value(object)?)
            }
            "invoice.payment_failed" => {
                StripeEvent::InvoicePaymentFailed(serde_json::from_value(object)?)
            }
            _ => StripeEvent::Other(envelope.event_type),
        };
        Ok(event)
    }
}
