pub mod account_service;
pub mod billing_service;
pub mod identity_service;
pub mod report_service;
pub mod stripe_client;
