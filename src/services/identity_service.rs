use std::sync::Arc;

use tracing::{info, warn};

use crate::database::store::Store;
use crate::dto::clerk_dto::ClerkEvent;
use crate::error::{Error, Result};

/// What a processed identity event did, reported back to the provider as text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentityOutcome {
    UserCreated,
    UserUpdated { found: bool },
    UserDeleted { found: bool },
    SessionProcessed { reactivated_user: bool, reactivated_subscription: bool },
    Ignored(String),
}

impl IdentityOutcome {
    pub fn message(&self) -> &'static str {
        match self {
            IdentityOutcome::UserCreated => "User created successfully",
            IdentityOutcome::UserUpdated { .. } => "User updated successfully",
            IdentityOutcome::UserDeleted { .. } => "User deleted successfully",
            IdentityOutcome::SessionProcessed { .. } => "Session processed successfully",
            IdentityOutcome::Ignored(_) => "Webhook received",
        }
    }
}

/// Mirrors identity-provider users into the store.
#[derive(Clone)]
pub struct IdentityService {
    store: Arc<dyn Store>,
}

impl IdentityService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub async fn handle_event(&self, event: ClerkEvent) -> Result<IdentityOutcome> {
        match event {
            ClerkEvent::UserCreated(profile) => {
                if profile.email.is_none() {
                    return Err(Error::BadRequest("Missing email address".into()));
                }
                self.store.insert_user(&profile).await?;
                info!(user_id = %profile.id, "user created");
                Ok(IdentityOutcome::UserCreated)
            }
            ClerkEvent::UserUpdated(profile) => {
                let found = self.store.update_user(&profile).await?;
                if !found {
                    warn!(user_id = %profile.id, "user.updated for unknown user");
                }
                Ok(IdentityOutcome::UserUpdated { found })
            }
            ClerkEvent::UserDeleted { user_id } => {
                let found = self.store.delete_user(&user_id).await?;
                info!(user_id = %user_id, found, "user deleted");
                Ok(IdentityOutcome::UserDeleted { found })
            }
            ClerkEvent::SessionCreated { user_id } => {
                let change = self.store.reactivate_account(&user_id).await?;
                if change.user {
                    info!(user_id = %user_id, "user reactivated");
                }
                if change.subscription {
                    info!(user_id = %user_id, "subscription reactivated");
                }
                Ok(IdentityOutcome::SessionProcessed {
                    reactivated_user: change.user,
                    reactivated_subscription: change.subscription,
                })
            }
            ClerkEvent::Other(event_type) => {
                info!(event_type = %event_type, "identity event ignored");
                Ok(IdentityOutcome::Ignored(event_type))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::memory_store::MemoryStore;
    use crate::database::store::AccountRepository;
    use crate::models::subscription::Plan;
    use crate::models::user::UserProfile;

    fn profile(id: &str, email: Option<&str>) -> UserProfile {
        UserProfile {
            id: id.into(),
            email: email.map(str::to_string),
            first_name: Some("Ada".into()),
            last_name: None,
            avatar_url: None,
        }
    }

    fn service() -> (MemoryStore, IdentityService) {
        let store = MemoryStore::new();
        let service = IdentityService::new(Arc::new(store.clone()));
        (store, service)
    }

    #[tokio::test]
    async fn created_user_gets_a_free_subscription() {
        let (store, service) = service();
        let outcome = service
            .handle_event(ClerkEvent::UserCreated(profile("user_1", Some("a@example.com"))))
            .await
            .unwrap();
        assert_eq!(outcome, IdentityOutcome::UserCreated);
        let sub = store.subscription("user_1").unwrap();
        assert_eq!(sub.plan, Plan::Free);
        assert_eq!(sub.credits, 3);
    }

    #[tokio::test]
    async fn user_without_email_is_rejected_before_the_store() {
        let (store, service) = service();
        let err = service
            .handle_event(ClerkEvent::UserCreated(profile("user_1", None)))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::BadRequest(_)));
        assert_eq!(store.calls(), 0);
    }

    #[tokio::test]
    async fn update_keeps_email_when_event_has_none() {
        let (store, service) = service();
        service
            .handle_event(ClerkEvent::UserCreated(profile("user_1", Some("a@example.com"))))
            .await
            .unwrap();

        let renamed = UserProfile {
            first_name: Some("Grace".into()),
            last_name: Some("Hopper".into()),
            avatar_url: Some("https://img.example.com/g.png".into()),
            ..profile("user_1", None)
        };
        let outcome = service
            .handle_event(ClerkEvent::UserUpdated(renamed))
            .await
            .unwrap();
        assert_eq!(outcome, IdentityOutcome::UserUpdated { found: true });

        let user = store.user("user_1").unwrap();
        assert_eq!(user.email, "a@example.com");
        assert_eq!(user.full_name(), "Grace Hopper");
        assert_eq!(user.avatar_url.as_deref(), Some("https://img.example.com/g.png"));
        assert!(user.updated_at.is_some());

        service
            .handle_event(ClerkEvent::UserUpdated(profile("user_1", Some("b@example.com"))))
            .await
            .unwrap();
        assert_eq!(store.user("user_1").unwrap().email, "b@example.com");
    }

    #[tokio::test]
    async fn update_for_unknown_user_reports_not_found() {
        let (_, service) = service();
        let outcome = service
            .handle_event(ClerkEvent::UserUpdated(profile("ghost", Some("g@example.com"))))
            .await
            .unwrap();
        assert_eq!(outcome, IdentityOutcome::UserUpdated { found: false });
    }

    #[tokio::test]
    async fn session_reactivates_disabled_account_only() {
        let (store, service) = service();
        service
            .handle_event(ClerkEvent::UserCreated(profile("user_1", Some("a@example.com"))))
            .await
            .unwrap();
        tokio_test::assert_ok!(store.deactivate_account("user_1").await);

        let outcome = service
            .handle_event(ClerkEvent::SessionCreated {
                user_id: "user_1".into(),
            })
            .await
            .unwrap();
        assert_eq!(
            outcome,
            IdentityOutcome::SessionProcessed {
                reactivated_user: true,
                reactivated_subscription: true
            }
        );

        let again = service
            .handle_event(ClerkEvent::SessionCreated {
                user_id: "user_1".into(),
            })
            .await
            .unwrap();
        assert_eq!(
            again,
            IdentityOutcome::SessionProcessed {
                reactivated_user: false,
                reactivated_subscription: false
            }
        );
    }

    #[tokio::test]
    async fn session_for_unknown_user_is_not_an_error() {
        let (_, service) = service();
        let outcome = service
            .handle_event(ClerkEvent::SessionCreated {
                user_id: "ghost".into(),
            })
            .await
            .unwrap();
        assert_eq!(outcome.message(), "Session processed successfully");
    }

    #[tokio::test]
    async fn store_failure_propagates() {
        let (store, service) = service();
        store.set_unavailable(true);
        tokio_test::assert_err!(
            service
                .handle_event(ClerkEvent::UserDeleted {
                    user_id: "user_1".into(),
                })
                .await
        );
    }
}
