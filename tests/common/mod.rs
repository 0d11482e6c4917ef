#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{Request, Response},
    Router,
};
use chrono::Duration;
use resumatch_backend::{
    database::memory_store::MemoryStore,
    dto::stripe_dto::StripeSubscription,
    error::{Error, Result},
    middleware::auth::{encode_session, Claims},
    routes,
    services::stripe_client::{CheckoutRequest, NewCustomer, PaymentProvider},
    utils::{signature, time::now_unix},
    AppSettings, AppState,
};
use serde_json::Value;
use tower::ServiceExt;

pub const CLERK_SECRET: &str = "whsec_MfKQ9r8GKYqrTwjUPD8ILPZIo2LaLaSw";
pub const STRIPE_SECRET: &str = "whsec_stripe_integration";
pub const JWT_SECRET: &str = "integration_jwt_secret";
pub const APP_URL: &str = "http://app.test";

/// Payment provider double: returns canned subscriptions and records calls.
#[derive(Default)]
pub struct FakePayments {
    pub subscription: Mutex<Option<Value>>,
    pub checkouts: Mutex<Vec<CheckoutRequest>>,
    pub customers: Mutex<Vec<NewCustomer>>,
    pub portals: Mutex<Vec<String>>,
}

impl FakePayments {
    pub fn with_subscription(subscription: Value) -> Self {
        Self {
            subscription: Mutex::new(Some(subscription)),
            ..Default::default()
        }
    }
}

#[async_trait]
impl PaymentProvider for FakePayments {
    async fn retrieve_subscription(&self, subscription_id: &str) -> Result<StripeSubscription> {
        let value = self
            .subscription
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| Error::Payment(format!("No such subscription: {}", subscription_id)))?;
        Ok(serde_json::from_value(value)?)
    }

    async fn create_customer(&self, customer: &NewCustomer) -> Result<String> {
        self.customers.lock().unwrap().push(customer.clone());
        Ok("cus_new".to_string())
    }

    async fn create_checkout_session(&self, request: &CheckoutRequest) -> Result<String> {
        self.checkouts.lock().unwrap().push(request.clone());
        Ok("https://checkout.stripe.test/cs_1".to_string())
    }

    async fn create_portal_session(&self, customer_id: &str, _return_url: &str) -> Result<String> {
        self.portals.lock().unwrap().push(customer_id.to_string());
        Ok("https://billing.stripe.test/p_1".to_string())
    }
}

pub fn settings() -> AppSettings {
    AppSettings {
        app_url: APP_URL.to_string(),
        stripe_price_id: "price_pro".to_string(),
        stripe_webhook_secret: Some(STRIPE_SECRET.to_string()),
        clerk_signing_secret: Some(CLERK_SECRET.to_string()),
        session_jwt_secret: JWT_SECRET.to_string(),
    }
}

pub struct TestApp {
    pub router: Router,
    pub store: MemoryStore,
    pub payments: Arc<FakePayments>,
}

pub fn app_with(payments: FakePayments, settings: AppSettings) -> TestApp {
    app_with_rps(payments, settings, 1_000)
}

pub fn app_with_rps(payments: FakePayments, settings: AppSettings, rps: u32) -> TestApp {
    let store = MemoryStore::new();
    let payments = Arc::new(payments);
    let state = AppState::new(Arc::new(store.clone()), payments.clone(), settings);
    TestApp {
        router: routes::router(state, rps),
        store,
        payments,
    }
}

pub fn app() -> TestApp {
    app_with(FakePayments::default(), settings())
}

pub fn session_token(user_id: &str) -> String {
    encode_session(JWT_SECRET, &Claims::new(user_id, Duration::minutes(10))).unwrap()
}

pub fn clerk_request(body: &Value) -> Request<Body> {
    let raw = serde_json::to_vec(body).unwrap();
    let ts = now_unix();
    let sig = signature::sign_svix(CLERK_SECRET, "msg_test", ts, &raw).unwrap();
    Request::builder()
        .method("POST")
        .uri("/api/clerk/webhooks")
        .header("content-type", "application/json")
        .header(signature::SVIX_ID, "msg_test")
        .header(signature::SVIX_TIMESTAMP, ts.to_string())
        .header(signature::SVIX_SIGNATURE, format!("v1,{}", sig))
        .body(Body::from(raw))
        .unwrap()
}

pub fn stripe_request(body: &Value) -> Request<Body> {
    let raw = serde_json::to_vec(body).unwrap();
    let header = signature::stripe_signature_header(STRIPE_SECRET, now_unix(), &raw).unwrap();
    Request::builder()
        .method("POST")
        .uri("/api/stripe/webhooks")
        .header("content-type", "application/json")
        .header(signature::STRIPE_SIGNATURE, header)
        .body(Body::from(raw))
        .unwrap()
}

pub fn authed(method: &str, uri: &str, user_id: &str, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("authorization", format!("Bearer {}", session_token(user_id)));
    match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

pub async fn send(router: &Router, request: Request<Body>) -> Response<Body> {
    router.clone().oneshot(request).await.unwrap()
}

pub async fn json_body(response: Response<Body>) -> Value {
    let bytes = to_bytes(response.into_body(), 1024 * 1024).await.unwrap();
    serde_json::from_slice(&bytes).unwrap_or(Value::Null)
}

pub fn user_created(user_id: &str, email: Option<&str>) -> Value {
    let emails: Vec<Value> = email
        .map(|e| vec![serde_json::json!({ "email_address": e })])
        .unwrap_or_default();
    serde_json::json!({
        "type": "user.created",
        "data": {
            "id": user_id,
            "email_addresses": emails,
            "first_name": "Ada",
            "last_name": "Lovelace",
            "image_url": null
        }
    })
}
