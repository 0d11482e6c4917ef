use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct JobPostInfo {
    pub id: Uuid,
    pub role: String,
    pub company: String,
    pub location: String,
    pub description: Option<String>,
    pub salary: Option<String>,
    pub requirements: Option<Vec<String>>,
    pub url: Option<String>,
}
