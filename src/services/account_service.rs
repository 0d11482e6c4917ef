use std::sync::Arc;

use tracing::info;

use crate::database::store::{AccountChange, Store};
use crate::error::Result;

#[derive(Clone)]
pub struct AccountService {
    store: Arc<dyn Store>,
}

impl AccountService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Flags the user and their subscription inactive. The next sign-in
    /// (`session.created`) turns both back on.
    pub async fn disable(&self, user_id: &str) -> Result<AccountChange> {
        let change = self.store.deactivate_account(user_id).await?;
        info!(
            user_id,
            user = change.user,
            subscription = change.subscription,
            "account disabled"
        );
        Ok(change)
    }
}
