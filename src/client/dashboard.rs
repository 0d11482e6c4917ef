use reqwest::Client;
use serde::{de::DeserializeOwned, Serialize};
use tracing::error;
use uuid::Uuid;

use crate::client::backend::BackendError;
use crate::client::query_cache::{QueryCache, QueryKey};
use crate::dto::report_dto::JobPostCountResponse;
use crate::models::{
    job_post::JobPostInfo, job_report::JobReportInfo, match_score::MatchScoreInfo,
    subscription::SubscriptionInfo,
};

/// Reads this service's dashboard endpoints through a [`QueryCache`].
/// Every getter returns `None` / `0` on failure.
#[derive(Clone)]
pub struct DashboardClient {
    client: Client,
    base_url: String,
    session_token: String,
    cache: QueryCache,
}

impl DashboardClient {
    pub fn new(
        client: Client,
        base_url: impl Into<String>,
        session_token: impl Into<String>,
        cache: QueryCache,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            session_token: session_token.into(),
            cache,
        }
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, BackendError> {
        let response = self
            .client
            .get(format!("{}{}", self.base_url, path))
            .bearer_auth(&self.session_token)
            .query(query)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(BackendError::Upstream {
                status: status.as_u16(),
                detail: response.text().await.ok().filter(|b| !b.is_empty()),
            });
        }
        Ok(response.json::<T>().await?)
    }

    async fn cached<T>(&self, key: QueryKey, path: String, query: Vec<(&str, String)>) -> Option<T>
    where
        T: Serialize + DeserializeOwned,
    {
        // A null body is the server's failure sentinel and must not be cached.
        let result = self
            .cache
            .get_or_fetch(key.clone(), || async {
                match self.get_json::<Option<T>>(&path, &query).await {
                    Ok(Some(value)) => Ok(value),
                    Ok(None) => Err(None),
                    Err(e) => Err(Some(e)),
                }
            })
            .await;
        match result {
            Ok(value) => Some(value),
            Err(None) => None,
            Err(Some(e)) => {
                error!(?key, error = %e, "dashboard query failed");
                None
            }
        }
    }

    pub async fn subscription(&self, user_id: &str) -> Option<SubscriptionInfo> {
        self.cached(
            QueryKey::Subscription(user_id.to_string()),
            format!("/api/users/{}/subscription", user_id),
            vec![],
        )
        .await
    }

    pub async fn reports(&self, user_id: &str) -> Option<Vec<JobReportInfo>> {
        self.cached(
            QueryKey::Reports(user_id.to_string()),
            format!("/api/users/{}/reports", user_id),
            vec![],
        )
        .await
    }

    pub async fn job_posts(&self, report_id: Uuid) -> Option<Vec<JobPostInfo>> {
        self.cached(
            QueryKey::JobPosts(report_id),
            format!("/api/reports/{}/job-posts", report_id),
            vec![],
        )
        .await
    }

    pub async fn job_post_count(&self, report_id: Uuid) -> i64 {
        self.cached::<JobPostCountResponse>(
            QueryKey::JobPostCount(report_id),
            format!("/api/reports/{}/job-posts/count", report_id),
            vec![],
        )
        .await
        .map(|r| r.count)
        .unwrap_or(0)
    }

    pub async fn match_score(
        &self,
        job_post_id: Uuid,
        job_report_id: Uuid,
        user_id: &str,
    ) -> Option<MatchScoreInfo> {
        self.cached(
            QueryKey::MatchScore {
                job_post_id,
                job_report_id,
                user_id: user_id.to_string(),
            },
            "/api/match-scores".to_string(),
            vec![
                ("job_post_id", job_post_id.to_string()),
                ("job_report_id", job_report_id.to_string()),
                ("user_id", user_id.to_string()),
            ],
        )
        .await
    }
}
