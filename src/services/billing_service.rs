use std::sync::Arc;

use tracing::{info, warn};

use crate::database::store::Store;
use crate::dto::stripe_dto::{CheckoutSession, StripeEvent, StripeSubscription};
use crate::error::{Error, Result};
use crate::models::subscription::{PlanState, ProSubscription};
use crate::services::stripe_client::{CheckoutRequest, NewCustomer, PaymentProvider};

/// What a processed payment event did to the stored subscription.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BillingOutcome {
    Activated { user_id: String },
    PlanUpdated { applied: bool },
    Canceled { applied: bool },
    PaymentFailed,
    Ignored(String),
}

/// Reconciles payment-provider events and opens hosted billing sessions.
#[derive(Clone)]
pub struct BillingService {
    store: Arc<dyn Store>,
    payments: Arc<dyn PaymentProvider>,
    price_id: String,
    app_url: String,
}

impl BillingService {
    pub fn new(
        store: Arc<dyn Store>,
        payments: Arc<dyn PaymentProvider>,
        price_id: String,
        app_url: String,
    ) -> Self {
        Self {
            store,
            payments,
            price_id,
            app_url,
        }
    }

    pub async fn handle_event(&self, event: StripeEvent) -> Result<BillingOutcome> {
        match event {
            StripeEvent::CheckoutSessionCompleted(session) => self.complete_checkout(&session).await,
            StripeEvent::SubscriptionUpdated(subscription) => {
                let state = PlanState::for_provider_status(subscription.status.is_active());
                let applied = self
                    .store
                    .apply_plan_state(&subscription.id, state, subscription.period())
                    .await?;
                log_unmatched(&subscription, applied);
                info!(
                    subscription_id = %subscription.id,
                    status = ?subscription.status,
                    plan = %state.plan,
                    "subscription updated"
                );
                Ok(BillingOutcome::PlanUpdated { applied })
            }
            StripeEvent::SubscriptionDeleted(subscription) => {
                let applied = self
                    .store
                    .apply_plan_state(&subscription.id, PlanState::lapsed(), None)
                    .await?;
                log_unmatched(&subscription, applied);
                info!(subscription_id = %subscription.id, "subscription canceled");
                Ok(BillingOutcome::Canceled { applied })
            }
            StripeEvent::InvoicePaymentFailed(invoice) => {
                warn!(
                    invoice_id = %invoice.id,
                    subscription_id = invoice.subscription.as_ref().map(|s| s.id()).unwrap_or("-"),
                    "invoice payment failed"
                );
                Ok(BillingOutcome::PaymentFailed)
            }
            StripeEvent::Other(event_type) => {
                info!(event_type = %event_type, "payment event ignored");
                Ok(BillingOutcome::Ignored(event_type))
            }
        }
    }

    async fn complete_checkout(&self, session: &CheckoutSession) -> Result<BillingOutcome> {
        let (Some(user_id), Some(subscription_ref)) = (session.user_id(), &session.subscription)
        else {
            return Err(Error::BadRequest("Missing required data".into()));
        };

        let subscription = self
            .payments
            .retrieve_subscription(subscription_ref.id())
            .await?;
        let period = subscription.period().ok_or_else(|| {
            Error::Payment(format!("subscription {} has no billing period", subscription.id))
        })?;

        let customer_id = session
            .customer
            .as_ref()
            .map(|c| c.id().to_string())
            .or_else(|| subscription.customer_id().map(str::to_string));

        self.store
            .upsert_pro_subscription(&ProSubscription {
                user_id: user_id.to_string(),
                stripe_customer_id: customer_id,
                stripe_subscription_id: subscription.id.clone(),
                period,
            })
            .await?;

        info!(user_id, subscription_id = %subscription.id, "pro subscription activated");
        Ok(BillingOutcome::Activated {
            user_id: user_id.to_string(),
        })
    }

    /// Returns the hosted checkout URL for the pro plan.
    pub async fn create_checkout_session(&self, user_id: &str) -> Result<String> {
        let customer_id = match self.existing_customer(user_id).await? {
            Some(customer) => Some(customer),
            None => self.create_customer(user_id).await?,
        };

        let url = self
            .payments
            .create_checkout_session(&CheckoutRequest {
                user_id: user_id.to_string(),
                customer_id,
                price_id: self.price_id.clone(),
                success_url: format!("{}/account?success=true", self.app_url),
                cancel_url: format!("{}/account?canceled=true", self.app_url),
            })
            .await?;
        info!(user_id, "checkout session created");
        Ok(url)
    }

    /// Returns the billing portal URL for a user with a paid subscription.
    pub async fn create_portal_session(&self, user_id: &str) -> Result<String> {
        let customer_id = self
            .existing_customer(user_id)
            .await?
            .ok_or_else(|| Error::NotFound("No subscription found for this user".into()))?;

        let url = self
            .payments
            .create_portal_session(&customer_id, &format!("{}/account", self.app_url))
            .await?;
        info!(user_id, "portal session created");
        Ok(url)
    }

    /// Customer behind the user's stored provider subscription, if any.
    async fn existing_customer(&self, user_id: &str) -> Result<Option<String>> {
        let Some(subscription_id) = self
            .store
            .find_subscription(user_id)
            .await?
            .and_then(|s| s.stripe_subscription_id)
        else {
            return Ok(None);
        };
        let subscription = self.payments.retrieve_subscription(&subscription_id).await?;
        Ok(subscription.customer_id().map(str::to_string))
    }

    async fn create_customer(&self, user_id: &str) -> Result<Option<String>> {
        let Some(user) = self.store.find_user(user_id).await? else {
            return Ok(None);
        };
        let customer = NewCustomer {
            user_id: user.id.clone(),
            email: user.email.clone(),
            name: user.full_name(),
        };
        self.payments.create_customer(&customer).await.map(Some)
    }
}

fn log_unmatched(subscription: &StripeSubscription, applied: bool) {
    if !applied {
        warn!(subscription_id = %subscription.id, "no stored subscription matches provider id");
    }
}
