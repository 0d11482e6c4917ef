use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{error, info};

use crate::dto::stripe_dto::StripeSubscription;
use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCustomer {
    pub user_id: String,
    pub email: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutRequest {
    pub user_id: String,
    pub customer_id: Option<String>,
    pub price_id: String,
    pub success_url: String,
    pub cancel_url: String,
}

/// Calls made against the payment processor.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PaymentProvider: Send + Sync {
    async fn retrieve_subscription(&self, subscription_id: &str) -> Result<StripeSubscription>;

    /// Returns the new customer id.
    async fn create_customer(&self, customer: &NewCustomer) -> Result<String>;

    /// Returns the hosted checkout URL.
    async fn create_checkout_session(&self, request: &CheckoutRequest) -> Result<String>;

    /// Returns the billing portal URL.
    async fn create_portal_session(&self, customer_id: &str, return_url: &str) -> Result<String>;
}

#[derive(Debug, Deserialize)]
struct IdResponse {
    id: String,
}

#[derive(Debug, Deserialize)]
struct UrlResponse {
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StripeErrorBody {
    error: StripeErrorDetail,
}

#[derive(Debug, Deserialize)]
struct StripeErrorDetail {
    message: Option<String>,
}

#[derive(Clone)]
pub struct StripeClient {
    client: Client,
    api_base: String,
    secret_key: String,
}

impl StripeClient {
    pub fn new(client: Client, api_base: String, secret_key: String) -> Self {
        Self {
            client,
            api_base: api_base.trim_end_matches('/').to_string(),
            secret_key,
        }
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let response = self
            .client
            .get(format!("{}{}", self.api_base, path))
            .bearer_auth(&self.secret_key)
            .send()
            .await?;
        Self::decode(path, response).await
    }

    async fn post_form<T: DeserializeOwned>(&self, path: &str, form: &[(&str, String)]) -> Result<T> {
        let response = self
            .client
            .post(format!("{}{}", self.api_base, path))
            .bearer_auth(&self.secret_key)
            .form(form)
            .send()
            .await?;
        Self::decode(path, response).await
    }

    async fn decode<T: DeserializeOwned>(path: &str, response: reqwest::Response) -> Result<T> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<StripeErrorBody>(&body)
                .ok()
                .and_then(|b| b.error.message)
                .unwrap_or(body);
            error!(%status, path, "stripe request failed: {}", message);
            return Err(Error::Payment(format!("{} returned {}: {}", path, status, message)));
        }
        Ok(response.json::<T>().await?)
    }
}

#[async_trait]
impl PaymentProvider for StripeClient {
    async fn retrieve_subscription(&self, subscription_id: &str) -> Result<StripeSubscription> {
        self.get(&format!("/v1/subscriptions/{}", subscription_id))
            .await
    }

    async fn create_customer(&self, customer: &NewCustomer) -> Result<String> {
        let form = [
            ("email", customer.email.clone()),
            ("name", customer.name.clone()),
            ("metadata[userId]", customer.user_id.clone()),
        ];
        let created: IdResponse = self.post_form("/v1/customers", &form).await?;
        info!(user_id = %customer.user_id, customer_id = %created.id, "stripe customer created");
        Ok(created.id)
    }

    async fn create_checkout_session(&self, request: &CheckoutRequest) -> Result<String> {
        let mut form = vec![
            ("payment_method_types[0]", "card".to_string()),
            ("mode", "subscription".to_string()),
            ("line_items[0][price]", request.price_id.clone()),
            ("line_items[0][quantity]", "1".to_string()),
            ("metadata[userId]", request.user_id.clone()),
            ("success_url", request.success_url.clone()),
            ("cancel_url", request.cancel_url.clone()),
        ];
        if let Some(customer) = &request.customer_id {
            form.push(("customer", customer.clone()));
        }
        let session: UrlResponse = self.post_form("/v1/checkout/sessions", &form).await?;
        session
            .url
            .ok_or_else(|| Error::Payment("checkout session has no url".into()))
    }

    async fn create_portal_session(&self, customer_id: &str, return_url: &str) -> Result<String> {
        let form = [
            ("customer", customer_id.to_string()),
            ("return_url", return_url.to_string()),
        ];
        let session: UrlResponse = self
            .post_form("/v1/billing_portal/sessions", &form)
            .await?;
        session
            .url
            .ok_or_else(|| Error::Payment("portal session has no url".into()))
    }
}
