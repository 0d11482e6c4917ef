//! In-process [`Store`](super::store::Store) used by tests and local demos.
//! Mirrors the Postgres semantics closely enough for handler-level tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use uuid::Uuid;

use crate::database::store::{
    AccountChange, AccountRepository, ReportRepository, SubscriptionRepository, UserRepository,
};
use crate::error::{Error, Result};
use crate::models::{
    job_post::JobPostInfo,
    job_report::{JobReport, JobReportInfo},
    match_score::MatchScoreInfo,
    subscription::{
        BillingPeriod, Plan, PlanState, ProSubscription, Subscription, SubscriptionInfo,
        FREE_PLAN_CREDITS,
    },
    user::{User, UserProfile},
};
use crate::utils::time::now;

#[derive(Debug, Default)]
struct Tables {
    users: HashMap<String, User>,
    subscriptions: HashMap<String, Subscription>,
    reports: Vec<JobReport>,
    job_posts: Vec<JobPostInfo>,
    report_posts: Vec<(Uuid, Uuid)>,
    match_scores: Vec<StoredScore>,
    unavailable: bool,
    calls: usize,
}

#[derive(Debug, Clone)]
struct StoredScore {
    user_id: String,
    job_post_id: Uuid,
    job_report_id: Uuid,
    score: i32,
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Counts every repository call and fails it while the store is marked unavailable.
    fn open(&self) -> Result<MutexGuard<'_, Tables>> {
        let mut tables = self.lock();
        tables.calls += 1;
        if tables.unavailable {
            return Err(Error::Internal("store unavailable".into()));
        }
        Ok(tables)
    }

    /// Make every subsequent repository call fail.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.lock().unavailable = unavailable;
    }

    /// Number of repository calls made so far.
    pub fn calls(&self) -> usize {
        self.lock().calls
    }

    pub fn user(&self, user_id: &str) -> Option<User> {
        self.lock().users.get(user_id).cloned()
    }

    pub fn subscription(&self, user_id: &str) -> Option<Subscription> {
        self.lock().subscriptions.get(user_id).cloned()
    }

    pub fn put_user(&self, user: User) {
        self.lock().users.insert(user.id.clone(), user);
    }

    pub fn put_subscription(&self, subscription: Subscription) {
        self.lock()
            .subscriptions
            .insert(subscription.user_id.clone(), subscription);
    }

    pub fn put_report(&self, report: JobReport) {
        self.lock().reports.push(report);
    }

    pub fn put_job_post(&self, report_id: Uuid, post: JobPostInfo) {
        let mut tables = self.lock();
        tables.report_posts.push((report_id, post.id));
        tables.job_posts.push(post);
    }

    pub fn put_match_score(&self, user_id: &str, job_post_id: Uuid, job_report_id: Uuid, score: i32) {
        self.lock().match_scores.push(StoredScore {
            user_id: user_id.to_string(),
            job_post_id,
            job_report_id,
            score,
        });
    }
}

/// Fresh free-plan row for `user_id`.
pub fn free_subscription(user_id: &str) -> Subscription {
    Subscription {
        id: Uuid::new_v4(),
        user_id: user_id.to_string(),
        plan: Plan::Free,
        credits: FREE_PLAN_CREDITS,
        is_active: true,
        start_date: None,
        end_date: None,
        stripe_customer_id: None,
        stripe_subscription_id: None,
        created_at: now(),
        updated_at: None,
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn insert_user(&self, profile: &UserProfile) -> Result<()> {
        let mut tables = self.open()?;
        if tables.users.contains_key(&profile.id) {
            return Err(Error::Internal(format!("duplicate user {}", profile.id)));
        }
        let email = profile
            .email
            .clone()
            .ok_or_else(|| Error::Internal("email cannot be null".into()))?;
        tables.users.insert(
            profile.id.clone(),
            User {
                id: profile.id.clone(),
                email,
                first_name: profile.first_name.clone(),
                last_name: profile.last_name.clone(),
                avatar_url: profile.avatar_url.clone(),
                is_active: true,
                created_at: now(),
                updated_at: None,
            },
        );
        tables
            .subscriptions
            .entry(profile.id.clone())
            .or_insert_with(|| free_subscription(&profile.id));
        Ok(())
    }

    async fn update_user(&self, profile: &UserProfile) -> Result<bool> {
        let mut tables = self.open()?;
        let Some(user) = tables.users.get_mut(&profile.id) else {
            return Ok(false);
        };
        if let Some(email) = &profile.email {
            user.email = email.clone();
        }
        user.first_name = profile.first_name.clone();
        user.last_name = profile.last_name.clone();
        user.avatar_url = profile.avatar_url.clone();
        user.updated_at = Some(now());
        Ok(true)
    }

    async fn delete_user(&self, user_id: &str) -> Result<bool> {
        let mut tables = self.open()?;
        let removed = tables.users.remove(user_id).is_some();
        if removed {
            tables.subscriptions.remove(user_id);
            tables.reports.retain(|r| r.user_id != user_id);
            tables.match_scores.retain(|s| s.user_id != user_id);
        }
        Ok(removed)
    }

    async fn find_user(&self, user_id: &str) -> Result<Option<User>> {
        Ok(self.open()?.users.get(user_id).cloned())
    }
}

#[async_trait]
impl SubscriptionRepository for MemoryStore {
    async fn find_subscription(&self, user_id: &str) -> Result<Option<Subscription>> {
        Ok(self.open()?.subscriptions.get(user_id).cloned())
    }

    async fn subscription_info(&self, user_id: &str) -> Result<Option<SubscriptionInfo>> {
        Ok(self
            .open()?
            .subscriptions
            .get(user_id)
            .map(|s| SubscriptionInfo {
                credits: s.credits,
                plan: s.plan,
            }))
    }

    async fn upsert_pro_subscription(&self, subscription: &ProSubscription) -> Result<()> {
        let mut tables = self.open()?;
        if !tables.users.contains_key(&subscription.user_id) {
            return Err(Error::Internal(format!(
                "subscription references unknown user {}",
                subscription.user_id
            )));
        }
        let state = PlanState::pro();
        let row = tables
            .subscriptions
            .entry(subscription.user_id.clone())
            .or_insert_with(|| free_subscription(&subscription.user_id));
        row.plan = state.plan;
        row.credits = state.credits;
        row.is_active = state.is_active;
        row.stripe_customer_id = subscription.stripe_customer_id.clone();
        row.stripe_subscription_id = Some(subscription.stripe_subscription_id.clone());
        row.start_date = Some(subscription.period.start);
        row.end_date = Some(subscription.period.end);
        row.updated_at = Some(now());
        Ok(())
    }

    async fn apply_plan_state(
        &self,
        stripe_subscription_id: &str,
        state: PlanState,
        period: Option<BillingPeriod>,
    ) -> Result<bool> {
        let mut tables = self.open()?;
        let Some(row) = tables
            .subscriptions
            .values_mut()
            .find(|s| s.stripe_subscription_id.as_deref() == Some(stripe_subscription_id))
        else {
            return Ok(false);
        };
        row.plan = state.plan;
        row.credits = state.credits;
        row.is_active = state.is_active;
        if let Some(period) = period {
            row.start_date = Some(period.start);
            row.end_date = Some(period.end);
        }
        row.updated_at = Some(now());
        Ok(true)
    }
}

#[async_trait]
impl AccountRepository for MemoryStore {
    async fn reactivate_account(&self, user_id: &str) -> Result<AccountChange> {
        Ok(set_active(&mut *self.open()?, user_id, true))
    }

    async fn deactivate_account(&self, user_id: &str) -> Result<AccountChange> {
        Ok(set_active(&mut *self.open()?, user_id, false))
    }
}

fn set_active(tables: &mut Tables, user_id: &str, active: bool) -> AccountChange {
    let mut change = AccountChange::default();
    if let Some(user) = tables.users.get_mut(user_id).filter(|u| u.is_active != active) {
        user.is_active = active;
        change.user = true;
    }
    if let Some(sub) = tables
        .subscriptions
        .get_mut(user_id)
        .filter(|s| s.is_active != active)
    {
        sub.is_active = active;
        change.subscription = true;
    }
    change
}

#[async_trait]
impl ReportRepository for MemoryStore {
    async fn report_owner(&self, report_id: Uuid) -> Result<Option<String>> {
        Ok(self
            .open()?
            .reports
            .iter()
            .find(|r| r.id == report_id)
            .map(|r| r.user_id.clone()))
    }

    async fn list_reports(&self, user_id: &str) -> Result<Vec<JobReportInfo>> {
        let tables = self.open()?;
        let mut reports: Vec<JobReport> = tables
            .reports
            .iter()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect();
        reports.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(reports.into_iter().map(JobReportInfo::from).collect())
    }

    async fn count_job_posts(&self, report_id: Uuid) -> Result<i64> {
        let tables = self.open()?;
        let count = tables
            .report_posts
            .iter()
            .filter(|(report, _)| *report == report_id)
            .count();
        Ok(count as i64)
    }

    async fn job_posts_for_report(&self, report_id: Uuid) -> Result<Vec<JobPostInfo>> {
        let tables = self.open()?;
        Ok(tables
            .job_posts
            .iter()
            .filter(|post| tables.report_posts.contains(&(report_id, post.id)))
            .cloned()
            .collect())
    }

    async fn match_score(
        &self,
        job_post_id: Uuid,
        job_report_id: Uuid,
        user_id: &str,
    ) -> Result<Option<MatchScoreInfo>> {
        Ok(self
            .open()?
            .match_scores
            .iter()
            .rev()
            .find(|s| {
                s.job_post_id == job_post_id
                    && s.job_report_id == job_report_id
                    && s.user_id == user_id
            })
            .map(|s| MatchScoreInfo { score: s.score }))
    }
}
