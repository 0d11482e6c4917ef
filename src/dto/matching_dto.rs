use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::models::cv_data::CvData;

/// Body of the job-search call made once the user confirms their CV data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobSearchRequest {
    pub user_id: String,
    pub role: String,
    pub location: String,
    pub skills: Vec<String>,
    pub years_experience: i32,
    pub filename: String,
}

impl JobSearchRequest {
    pub fn from_cv(user_id: &str, filename: &str, cv: &CvData) -> Self {
        Self {
            user_id: user_id.to_string(),
            role: cv.role.clone(),
            location: cv.location.clone(),
            skills: cv.skills.clone(),
            years_experience: cv.years_experience.unwrap_or(0),
            filename: filename.to_string(),
        }
    }
}

/// Error payload of the matching backend: `{"detail": ...}`. `detail` is
/// usually a string but validation failures send a list.
#[derive(Debug, Deserialize)]
pub struct UpstreamErrorBody {
    pub detail: Option<JsonValue>,
}

impl UpstreamErrorBody {
    pub fn message(&self) -> Option<String> {
        match self.detail.as_ref()? {
            JsonValue::String(s) => Some(s.clone()),
            JsonValue::Null => None,
            other => Some(other.to_string()),
        }
    }
}
