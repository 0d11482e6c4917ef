use axum::{response::IntoResponse, Json};
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};

use super::health::HealthResponse;
use crate::{
    dto::{
        billing_dto::{AccountStatusResponse, CreateSessionPayload, SessionUrlResponse},
        report_dto::JobPostCountResponse,
    },
    models::{
        job_post::JobPostInfo,
        job_report::JobReportInfo,
        match_score::MatchScoreInfo,
        subscription::{Plan, SubscriptionInfo},
    },
};

#[derive(OpenApi)]
#[openapi(
    paths(
        super::health::health,
        super::billing::create_checkout_session,
        super::billing::create_portal_session,
        super::account::disable_account,
        super::reports::get_subscription,
        super::reports::list_reports,
        super::reports::list_job_posts,
        super::reports::count_job_posts,
        super::reports::get_match_score,
    ),
    components(schemas(
        HealthResponse,
        CreateSessionPayload,
        SessionUrlResponse,
        AccountStatusResponse,
        JobPostCountResponse,
        JobPostInfo,
        JobReportInfo,
        MatchScoreInfo,
        Plan,
        SubscriptionInfo,
    )),
    modifiers(&SessionAuth),
    tags((name = "resumatch", description = "Billing, account and report endpoints"))
)]
pub struct ApiDoc;

struct SessionAuth;

impl Modify for SessionAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

pub async fn openapi_json() -> impl IntoResponse {
    Json(ApiDoc::openapi())
}
