use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateSessionPayload {
    #[serde(default, rename = "userId", alias = "user_id")]
    pub user_id: Option<String>,
}

impl CreateSessionPayload {
    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref().map(str::trim).filter(|id| !id.is_empty())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SessionUrlResponse {
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AccountStatusResponse {
    pub user_id: String,
    pub is_active: bool,
}
