use axum::{
    extract::{Path, Query, State},
    response::Json,
    Extension,
};
use uuid::Uuid;

use crate::{
    dto::report_dto::{JobPostCountResponse, MatchScoreQuery},
    error::Result,
    middleware::auth::{ensure_user, Claims},
    models::{
        job_post::JobPostInfo, job_report::JobReportInfo, match_score::MatchScoreInfo,
        subscription::SubscriptionInfo,
    },
    AppState,
};

#[utoipa::path(
    get,
    path = "/api/users/{user_id}/subscription",
    params(("user_id" = String, Path, description = "Identity-provider user id")),
    responses(
        (status = 200, description = "Plan and credits, or null", body = SubscriptionInfo),
        (status = 403, description = "Session belongs to another user"),
    ),
    security(("bearer" = []))
)]
pub async fn get_subscription(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(user_id): Path<String>,
) -> Result<Json<Option<SubscriptionInfo>>> {
    ensure_user(&claims, &user_id)?;
    Ok(Json(state.report_queries.subscription(&user_id).await))
}

#[utoipa::path(
    get,
    path = "/api/users/{user_id}/reports",
    params(("user_id" = String, Path, description = "Identity-provider user id")),
    responses(
        (status = 200, description = "Reports, newest first, or null", body = [JobReportInfo]),
        (status = 403, description = "Session belongs to another user"),
    ),
    security(("bearer" = []))
)]
pub async fn list_reports(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(user_id): Path<String>,
) -> Result<Json<Option<Vec<JobReportInfo>>>> {
    ensure_user(&claims, &user_id)?;
    Ok(Json(state.report_queries.reports(&user_id).await))
}

#[utoipa::path(
    get,
    path = "/api/reports/{report_id}/job-posts",
    params(("report_id" = Uuid, Path, description = "Job report id")),
    responses(
        (status = 200, description = "Job posts linked to the report, or null", body = [JobPostInfo]),
        (status = 403, description = "Report belongs to another user"),
    ),
    security(("bearer" = []))
)]
pub async fn list_job_posts(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(report_id): Path<Uuid>,
) -> Result<Json<Option<Vec<JobPostInfo>>>> {
    if !state.report_queries.owns_report(&claims.sub, report_id).await? {
        return Ok(Json(None));
    }
    Ok(Json(state.report_queries.job_posts(report_id).await))
}

#[utoipa::path(
    get,
    path = "/api/reports/{report_id}/job-posts/count",
    params(("report_id" = Uuid, Path, description = "Job report id")),
    responses(
        (status = 200, description = "Number of linked job posts", body = JobPostCountResponse),
        (status = 403, description = "Report belongs to another user"),
    ),
    security(("bearer" = []))
)]
pub async fn count_job_posts(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(report_id): Path<Uuid>,
) -> Result<Json<JobPostCountResponse>> {
    let count = if state.report_queries.owns_report(&claims.sub, report_id).await? {
        state.report_queries.job_post_count(report_id).await
    } else {
        0
    };
    Ok(Json(JobPostCountResponse { count }))
}

#[utoipa::path(
    get,
    path = "/api/match-scores",
    params(MatchScoreQuery),
    responses(
        (status = 200, description = "Latest score, or null", body = MatchScoreInfo),
        (status = 403, description = "Session or report belongs to another user"),
    ),
    security(("bearer" = []))
)]
pub async fn get_match_score(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(query): Query<MatchScoreQuery>,
) -> Result<Json<Option<MatchScoreInfo>>> {
    if let Some(user_id) = query.user_id.as_deref() {
        ensure_user(&claims, user_id)?;
    }
    if let Some(report_id) = query.job_report_id {
        if !state.report_queries.owns_report(&claims.sub, report_id).await? {
            return Ok(Json(None));
        }
    }
    Ok(Json(state.report_queries.match_score(&query).await))
}
