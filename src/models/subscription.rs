use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;
use uuid::Uuid;

/// Credits granted to a free plan, both on sign-up and when a paid plan lapses.
pub const FREE_PLAN_CREDITS: i32 = 3;

/// Stored for pro subscriptions. Pro access is unlimited regardless of this value.
pub const UNLIMITED_CREDITS: i32 = 999_999;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Plan {
    Free,
    Pro,
}

#[derive(Debug, thiserror::Error)]
#[error("unknown plan: {0}")]
pub struct ParsePlanError(String);

impl Plan {
    pub fn as_str(&self) -> &'static str {
        match self {
            Plan::Free => "free",
            Plan::Pro => "pro",
        }
    }
}

impl fmt::Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Plan {
    type Err = ParsePlanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "free" => Ok(Plan::Free),
            "pro" => Ok(Plan::Pro),
            other => Err(ParsePlanError(other.to_string())),
        }
    }
}

impl TryFrom<String> for Plan {
    type Error = ParsePlanError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Subscription {
    pub id: Uuid,
    pub user_id: String,
    #[sqlx(try_from = "String")]
    pub plan: Plan,
    pub credits: i32,
    pub is_active: bool,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub stripe_customer_id: Option<String>,
    pub stripe_subscription_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Plan and remaining credits as shown on the dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct SubscriptionInfo {
    pub credits: i32,
    #[sqlx(try_from = "String")]
    pub plan: Plan,
}

impl SubscriptionInfo {
    pub fn is_unlimited(&self) -> bool {
        self.plan == Plan::Pro
    }

    /// Credits only gate the free plan.
    pub fn has_credits(&self) -> bool {
        self.is_unlimited() || self.credits > 0
    }

    pub fn credits_label(&self) -> String {
        if self.is_unlimited() {
            "Unlimited".to_string()
        } else {
            format!("{} credits left", self.credits.max(0))
        }
    }
}

/// Plan, credits and active flag derived from the payment provider's view
/// of a subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlanState {
    pub plan: Plan,
    pub credits: i32,
    pub is_active: bool,
}

impl PlanState {
    pub fn pro() -> Self {
        Self {
            plan: Plan::Pro,
            credits: UNLIMITED_CREDITS,
            is_active: true,
        }
    }

    /// Plan after cancellation: free credits, flagged inactive.
    pub fn lapsed() -> Self {
        Self {
            plan: Plan::Free,
            credits: FREE_PLAN_CREDITS,
            is_active: false,
        }
    }

    pub fn for_provider_status(active: bool) -> Self {
        if active {
            Self::pro()
        } else {
            Self::lapsed()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BillingPeriod {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// Everything needed to write a freshly purchased subscription.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProSubscription {
    pub user_id: String,
    pub stripe_customer_id: Option<String>,
    pub stripe_subscription_id: String,
    pub period: BillingPeriod,
}
