use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::database::store::{
    AccountChange, AccountRepository, ReportRepository, SubscriptionRepository, UserRepository,
};
use crate::error::Result;
use crate::models::{
    job_post::JobPostInfo,
    job_report::JobReportInfo,
    match_score::MatchScoreInfo,
    subscription::{
        BillingPeriod, Plan, PlanState, ProSubscription, Subscription, SubscriptionInfo,
        FREE_PLAN_CREDITS,
    },
    user::{User, UserProfile},
};

const SUBSCRIPTION_COLUMNS: &str = "id, user_id, plan, credits, is_active, start_date, end_date, \
     stripe_customer_id, stripe_subscription_id, created_at, updated_at";

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgStore {
    async fn insert_user(&self, profile: &UserProfile) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO users (id, email, first_name, last_name, avatar_url, created_at)
            VALUES ($1, $2, $3, $4, $5, NOW())
            "#,
        )
        .bind(&profile.id)
        .bind(&profile.email)
        .bind(&profile.first_name)
        .bind(&profile.last_name)
        .bind(&profile.avatar_url)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO subscriptions (user_id, plan, credits, is_active, created_at)
            VALUES ($1, $2, $3, TRUE, NOW())
            ON CONFLICT (user_id) DO NOTHING
            "#,
        )
        .bind(&profile.id)
        .bind(Plan::Free.as_str())
        .bind(FREE_PLAN_CREDITS)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn update_user(&self, profile: &UserProfile) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET email = COALESCE($2, email),
                first_name = $3,
                last_name = $4,
                avatar_url = $5,
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(&profile.id)
        .bind(&profile.email)
        .bind(&profile.first_name)
        .bind(&profile.last_name)
        .bind(&profile.avatar_url)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_user(&self, user_id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn find_user(&self, user_id: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, first_name, last_name, avatar_url, is_active, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }
}

#[async_trait]
impl SubscriptionRepository for PgStore {
    async fn find_subscription(&self, user_id: &str) -> Result<Option<Subscription>> {
        let sql = format!("SELECT {SUBSCRIPTION_COLUMNS} FROM subscriptions WHERE user_id = $1");
        let row = sqlx::query_as::<_, Subscription>(&sql)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn subscription_info(&self, user_id: &str) -> Result<Option<SubscriptionInfo>> {
        let row = sqlx::query_as::<_, SubscriptionInfo>(
            "SELECT credits, plan FROM subscriptions WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn upsert_pro_subscription(&self, subscription: &ProSubscription) -> Result<()> {
        let state = PlanState::pro();
        sqlx::query(
            r#"
            INSERT INTO subscriptions (
                user_id, stripe_customer_id, stripe_subscription_id,
                plan, credits, is_active, start_date, end_date, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, NOW(), NOW())
            ON CONFLICT (user_id) DO UPDATE SET
                stripe_customer_id = EXCLUDED.stripe_customer_id,
                stripe_subscription_id = EXCLUDED.stripe_subscription_id,
                plan = EXCLUDED.plan,
                credits = EXCLUDED.credits,
                is_active = EXCLUDED.is_active,
                start_date = EXCLUDED.start_date,
                end_date = EXCLUDED.end_date,
                updated_at = NOW()
            "#,
        )
        .bind(&subscription.user_id)
        .bind(&subscription.stripe_customer_id)
        .bind(&subscription.stripe_subscription_id)
        .bind(state.plan.as_str())
        .bind(state.credits)
        .bind(state.is_active)
        .bind(subscription.period.start)
        .bind(subscription.period.end)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn apply_plan_state(
        &self,
        stripe_subscription_id: &str,
        state: PlanState,
        period: Option<BillingPeriod>,
    ) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE subscriptions
            SET plan = $2,
                credits = $3,
                is_active = $4,
                start_date = COALESCE($5, start_date),
                end_date = COALESCE($6, end_date),
                updated_at = NOW()
            WHERE stripe_subscription_id = $1
            "#,
        )
        .bind(stripe_subscription_id)
        .bind(state.plan.as_str())
        .bind(state.credits)
        .bind(state.is_active)
        .bind(period.map(|p| p.start))
        .bind(period.map(|p| p.end))
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl AccountRepository for PgStore {
    async fn reactivate_account(&self, user_id: &str) -> Result<AccountChange> {
        set_account_active(&self.pool, user_id, true).await
    }

    async fn deactivate_account(&self, user_id: &str) -> Result<AccountChange> {
        set_account_active(&self.pool, user_id, false).await
    }
}

/// Both rows flip in one transaction. Rows already in the target state are untouched.
async fn set_account_active(pool: &PgPool, user_id: &str, active: bool) -> Result<AccountChange> {
    let mut tx = pool.begin().await?;

    let user = sqlx::query(
        "UPDATE users SET is_active = $2, updated_at = NOW() WHERE id = $1 AND is_active <> $2",
    )
    .bind(user_id)
    .bind(active)
    .execute(&mut *tx)
    .await?;

    let subscription = sqlx::query(
        "UPDATE subscriptions SET is_active = $2, updated_at = NOW() WHERE user_id = $1 AND is_active <> $2",
    )
    .bind(user_id)
    .bind(active)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    Ok(AccountChange {
        user: user.rows_affected() > 0,
        subscription: subscription.rows_affected() > 0,
    })
}

#[async_trait]
impl ReportRepository for PgStore {
    async fn report_owner(&self, report_id: Uuid) -> Result<Option<String>> {
        let owner: Option<String> =
            sqlx::query_scalar("SELECT user_id FROM job_reports WHERE id = $1")
                .bind(report_id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(owner)
    }

    async fn list_reports(&self, user_id: &str) -> Result<Vec<JobReportInfo>> {
        let rows = sqlx::query_as::<_, JobReportInfo>(
            r#"
            SELECT id, filename, created_at, location, role, skills
            FROM job_reports
            WHERE user_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn count_job_posts(&self, report_id: Uuid) -> Result<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM job_report_posts WHERE job_report_id = $1")
                .bind(report_id)
                .fetch_one(&self.pool)
                .await?;
        Ok(count)
    }

    async fn job_posts_for_report(&self, report_id: Uuid) -> Result<Vec<JobPostInfo>> {
        let rows = sqlx::query_as::<_, JobPostInfo>(
            r#"
            SELECT id, role, company, location, description, salary, requirements, url
            FROM job_posts
            WHERE id IN (SELECT job_post_id FROM job_report_posts WHERE job_report_id = $1)
            "#,
        )
        .bind(report_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn match_score(
        &self,
        job_post_id: Uuid,
        job_report_id: Uuid,
        user_id: &str,
    ) -> Result<Option<MatchScoreInfo>> {
        let row = sqlx::query_as::<_, MatchScoreInfo>(
            r#"
            SELECT score
            FROM match_scores
            WHERE job_post_id = $1 AND job_report_id = $2 AND user_id = $3
            ORDER BY created_at DESC
            LIMIT 1
            "#,
        )
        .bind(job_post_id)
        .bind(job_report_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }
}
