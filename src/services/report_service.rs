//! Read-side fetchers. Store failures are logged and turned into `None` / `0`
//! so callers cannot tell "absent" from "unavailable".

use std::sync::Arc;

use tracing::error;
use uuid::Uuid;

use crate::database::store::Store;
use crate::dto::report_dto::MatchScoreQuery;
use crate::error::{Error, Result};
use crate::models::{
    job_post::JobPostInfo, job_report::JobReportInfo, match_score::MatchScoreInfo,
    subscription::SubscriptionInfo,
};

#[derive(Clone)]
pub struct ReportQueries {
    store: Arc<dyn Store>,
}

impl ReportQueries {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub async fn subscription(&self, user_id: &str) -> Option<SubscriptionInfo> {
        match self.store.subscription_info(user_id).await {
            Ok(info) => info,
            Err(e) => {
                error!(user_id, error = %e, "error fetching subscription");
                None
            }
        }
    }

    pub async fn reports(&self, user_id: &str) -> Option<Vec<JobReportInfo>> {
        self.store
            .list_reports(user_id)
            .await
            .map_err(|e| error!(user_id, error = %e, "error fetching job reports"))
            .ok()
    }

    /// `Ok(true)` when `user_id` owns the report. A missing report or a store
    /// failure reads as `Ok(false)`; a report owned by someone else is `Forbidden`.
    pub async fn owns_report(&self, user_id: &str, report_id: Uuid) -> Result<bool> {
        match self.store.report_owner(report_id).await {
            Ok(Some(owner)) if owner == user_id => Ok(true),
            Ok(Some(_)) => Err(Error::Forbidden("forbidden".into())),
            Ok(None) => Ok(false),
            Err(e) => {
                error!(%report_id, error = %e, "error looking up report owner");
                Ok(false)
            }
        }
    }

    pub async fn job_posts(&self, report_id: Uuid) -> Option<Vec<JobPostInfo>> {
        self.store
            .job_posts_for_report(report_id)
            .await
            .map_err(|e| error!(%report_id, error = %e, "error fetching job posts"))
            .ok()
    }

    pub async fn job_post_count(&self, report_id: Uuid) -> i64 {
        self.store
            .count_job_posts(report_id)
            .await
            .unwrap_or_else(|e| {
                error!(%report_id, error = %e, "error counting job posts");
                0
            })
    }

    pub async fn match_score(&self, query: &MatchScoreQuery) -> Option<MatchScoreInfo> {
        let (Some(job_post_id), Some(job_report_id), Some(user_id)) = (
            query.job_post_id,
            query.job_report_id,
            query.user_id.as_deref().filter(|id| !id.is_empty()),
        ) else {
            error!(?query, "match score lookup is missing parameters");
            return None;
        };

        match self
            .store
            .match_score(job_post_id, job_report_id, user_id)
            .await
        {
            Ok(score) => score,
            Err(e) => {
                error!(%job_post_id, %job_report_id, user_id, error = %e, "error fetching match score");
                None
            }
        }
    }
}
