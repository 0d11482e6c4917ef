pub mod client;
pub mod config;
pub mod database;
pub mod dto;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod utils;
pub mod wizard;

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use sqlx::PgPool;

use crate::config::Config;
use crate::database::{pg_store::PgStore, store::Store};
use crate::error::{Error, Result};
use crate::services::{
    account_service::AccountService,
    billing_service::BillingService,
    identity_service::IdentityService,
    report_service::ReportQueries,
    stripe_client::{PaymentProvider, StripeClient},
};

/// Values the HTTP layer needs besides the services themselves.
#[derive(Debug, Clone)]
pub struct AppSettings {
    pub app_url: String,
    pub stripe_price_id: String,
    pub stripe_webhook_secret: Option<String>,
    pub clerk_signing_secret: Option<String>,
    pub session_jwt_secret: String,
}

impl AppSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            app_url: config.app_url.clone(),
            stripe_price_id: config.stripe_price_id.clone(),
            stripe_webhook_secret: config.stripe_webhook_secret.clone(),
            clerk_signing_secret: config.clerk_signing_secret.clone(),
            session_jwt_secret: config.session_jwt_secret.clone(),
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub identity_service: IdentityService,
    pub billing_service: BillingService,
    pub account_service: AccountService,
    pub report_queries: ReportQueries,
    pub settings: Arc<AppSettings>,
}

impl AppState {
    pub fn new(
        store: Arc<dyn Store>,
        payments: Arc<dyn PaymentProvider>,
        settings: AppSettings,
    ) -> Self {
        let identity_service = IdentityService::new(store.clone());
        let billing_service = BillingService::new(
            store.clone(),
            payments,
            settings.stripe_price_id.clone(),
            settings.app_url.clone(),
        );
        let account_service = AccountService::new(store.clone());
        let report_queries = ReportQueries::new(store.clone());

        Self {
            store,
            identity_service,
            billing_service,
            account_service,
            report_queries,
            settings: Arc::new(settings),
        }
    }

    /// Production wiring: Postgres store and the live Stripe API.
    pub fn from_config(pool: PgPool, config: &Config) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| Error::Internal(format!("failed to build http client: {}", e)))?;

        let store: Arc<dyn Store> = Arc::new(PgStore::new(pool));
        let payments: Arc<dyn PaymentProvider> = Arc::new(StripeClient::new(
            http_client,
            config.stripe_api_base.clone(),
            config.stripe_secret_key.clone(),
        ));

        Ok(Self::new(store, payments, AppSettings::from_config(config)))
    }
}
