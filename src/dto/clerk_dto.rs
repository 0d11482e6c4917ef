use serde::Deserialize;
use serde_json::Value as JsonValue;

use crate::models::user::UserProfile;

/// Raw `{type, data}` envelope delivered by the identity provider.
#[derive(Debug, Deserialize)]
pub struct ClerkEnvelope {
    #[serde(rename = "type")]
    pub event_type: String,
    #[serde(default)]
    pub data: JsonValue,
}

#[derive(Debug, Deserialize)]
pub struct ClerkUserData {
    pub id: String,
    #[serde(default)]
    pub email_addresses: Vec<ClerkEmailAddress>,
    pub image_url: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ClerkEmailAddress {
    pub email_address: String,
}

#[derive(Debug, Deserialize)]
pub struct ClerkDeletedData {
    pub id: String,
}

#[derive(Debug, Deserialize)]
pub struct ClerkSessionData {
    pub user_id: String,
}

impl From<ClerkUserData> for UserProfile {
    fn from(data: ClerkUserData) -> Self {
        let email = data
            .email_addresses
            .into_iter()
            .next()
            .map(|e| e.email_address);
        Self {
            id: data.id,
            email,
            first_name: data.first_name,
            last_name: data.last_name,
            avatar_url: data.image_url,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClerkEvent {
    UserCreated(UserProfile),
    UserUpdated(UserProfile),
    UserDeleted { user_id: String },
    SessionCreated { user_id: String },
    Other(String),
}

impl ClerkEvent {
    pub fn parse(body: &[u8]) -> serde_json::Result<Self> {
        let envelope: ClerkEnvelope = serde_json::from_slice(body)?;
        envelope.try_into()
    }

    pub fn event_type(&self) -> &str {
        match self {
            ClerkEvent::UserCreated(_) => "user.created",
            ClerkEvent::UserUpdated(_) => "user.updated",
            ClerkEvent::UserDeleted { .. } => "user.deleted",
            ClerkEvent::SessionCreated { .. } => "session.created",
            ClerkEvent::Other(kind) => kind,
        }
    }
}

impl TryFrom<ClerkEnvelope> for ClerkEvent {
    type Error = serde_json::Error;

    fn try_from(envelope: ClerkEnvelope) -> serde_json::Result<Self> {
        let event = match envelope.event_type.as_str() {
            "user.created" => {
                ClerkEvent::UserCreated(serde_json::from_value::<ClerkUserData>(envelope.data)?.into())
            }
            "user.updated" => {
                ClerkEvent::UserUpdated(serde_json::from_value::<ClerkUserData>(envelope.data)?.into())
            }
            "user.deleted" => {
                let data: ClerkDeletedData = serde_json::from_value(envelope.data)?;
                ClerkEvent::UserDeleted { user_id: data.id }
            }
            "session.created" => {
                let data: ClerkSessionData = serde_json::from_value(envelope.data)?;
                ClerkEvent::SessionCreated {
                    user_id: data.user_id,
                }
            }
            _ => ClerkEvent::Other(envelope.event_type),
        };
        Ok(event)
    }
}
