use serde::{Deserialize, Serialize};
use validator::Validate;

/// Structured CV extracted by the summarization backend and reviewed by the
/// user before a job search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct CvData {
    #[validate(length(min = 1, message = "Role is required"))]
    pub role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 0, message = "Years of experience cannot be negative"))]
    pub years_experience: Option<i32>,
    #[serde(default, deserialize_with = "null_as_empty")]
    #[validate(length(min = 3, message = "Location is required"))]
    pub location: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    #[validate(length(min = 1, message = "At least one skill is required"))]
    pub skills: Vec<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    #[validate(length(min = 1, message = "Summary is required"))]
    pub summary: String,
}

// The summarization backend sends `null` for fields it could not extract.
fn null_as_empty<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl CvData {
    /// First failing field message, in the order the review form shows fields.
    pub fn first_error(errors: &validator::ValidationErrors) -> String {
        let fields = errors.field_errors();
        for name in ["role", "years_experience", "location", "skills", "summary"] {
            if let Some(message) = fields
                .get(name)
                .and_then(|errs| errs.first())
                .and_then(|e| e.message.as_ref())
            {
                return message.to_string();
            }
        }
        errors.to_string()
    }
}
