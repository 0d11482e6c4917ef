//! Persistence seams. Handlers and services only see these traits; the
//! Postgres implementation lives in [`super::pg_store`].

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::Result;
use crate::models::{
    job_post::JobPostInfo,
    job_report::JobReportInfo,
    match_score::MatchScoreInfo,
    subscription::{BillingPeriod, PlanState, ProSubscription, Subscription, SubscriptionInfo},
    user::{User, UserProfile},
};

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Also seeds the user's free subscription row.
    async fn insert_user(&self, profile: &UserProfile) -> Result<()>;

    /// Returns `false` when no row matched.
    async fn update_user(&self, profile: &UserProfile) -> Result<bool>;

    async fn delete_user(&self, user_id: &str) -> Result<bool>;

    async fn find_user(&self, user_id: &str) -> Result<Option<User>>;
}

#[async_trait]
pub trait SubscriptionRepository: Send + Sync {
    async fn find_subscription(&self, user_id: &str) -> Result<Option<Subscription>>;

    async fn subscription_info(&self, user_id: &str) -> Result<Option<SubscriptionInfo>>;

    /// Insert or overwrite the user's single subscription row as an active pro plan.
    async fn upsert_pro_subscription(&self, subscription: &ProSubscription) -> Result<()>;

    /// Overwrite plan, credits and active flag of the row linked to a provider
    /// subscription. The billing period is only touched when given.
    async fn apply_plan_state(
        &self,
        stripe_subscription_id: &str,
        state: PlanState,
        period: Option<BillingPeriod>,
    ) -> Result<bool>;
}

/// Which rows an account-level toggle actually changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AccountChange {
    pub user: bool,
    pub subscription: bool,
}

#[async_trait]
pub trait AccountRepository: Send + Sync {
    /// Flip `is_active` back to true on the user and subscription rows that
    /// are currently inactive. Plan and credits are left alone.
    async fn reactivate_account(&self, user_id: &str) -> Result<AccountChange>;

    async fn deactivate_account(&self, user_id: &str) -> Result<AccountChange>;
}

#[async_trait]
pub trait ReportRepository: Send + Sync {
    /// `None` when the report does not exist.
    async fn report_owner(&self, report_id: Uuid) -> Result<Option<String>>;

    /// Newest first.
    async fn list_reports(&self, user_id: &str) -> Result<Vec<JobReportInfo>>;

    async fn count_job_posts(&self, report_id: Uuid) -> Result<i64>;

    async fn job_posts_for_report(&self, report_id: Uuid) -> Result<Vec<JobPostInfo>>;

    async fn match_score(
        &self,
        job_post_id: Uuid,
        job_report_id: Uuid,
        user_id: &str,
    ) -> Result<Option<MatchScoreInfo>>;
}

pub trait Store:
    UserRepository + SubscriptionRepository + AccountRepository + ReportRepository
{
}

impl<T> Store for T where
    T: UserRepository + SubscriptionRepository + AccountRepository + ReportRepository
{
}
