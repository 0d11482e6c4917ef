use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct JobReport {
    pub id: Uuid,
    pub user_id: String,
    pub filename: String,
    pub role: String,
    pub location: Option<String>,
    pub skills: Vec<String>,
    pub years_experience: Option<i32>,
    pub created_at: DateTime<Utc>,
}

/// Listing shape for the reports page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct JobReportInfo {
    pub id: Uuid,
    pub filename: String,
    pub created_at: DateTime<Utc>,
    pub location: Option<String>,
    pub role: String,
    pub skills: Vec<String>,
}

impl From<JobReport> for JobReportInfo {
    fn from(report: JobReport) -> Self {
        Self {
            id: report.id,
            filename: report.filename,
            created_at: report.created_at,
            location: report.location,
            role: report.role,
            skills: report.skills,
        }
    }
}
