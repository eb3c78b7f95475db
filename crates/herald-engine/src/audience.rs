//! Audience resolution: expanding an abstract target into concrete
//! recipients.

use indexmap::IndexSet;
use std::sync::Arc;

use herald_core::{NotificationTarget, UserId};

use crate::directory::{DirectoryError, UserDirectory};

/// Expands a `NotificationTarget` through the user directory.
///
/// The resolver owns deduplication (a recipient reachable through several
/// overlapping criteria appears once, first-seen order preserved) and treats
/// an empty population as a normal result.
pub struct AudienceResolver {
    directory: Arc<dyn UserDirectory>,
}

impl AudienceResolver {
    pub fn new(directory: Arc<dyn UserDirectory>) -> Self {
        Self { directory }
    }

    pub async fn resolve(&self, target: &NotificationTarget) -> Result<Vec<UserId>, DirectoryError> {
        let ids = match target {
            NotificationTarget::AllUsers => self.directory.list_all().await?,
            NotificationTarget::AllAdmins => self.directory.list_admins().await?,
            NotificationTarget::SuperAdmin => self.directory.list_super_admins().await?,
            NotificationTarget::Role { role } => self.directory.list_by_role(*role).await?,
            NotificationTarget::SpecificUsers { user_ids } => user_ids.clone(),
            NotificationTarget::ActiveUsers => self.directory.list_active().await?,
            NotificationTarget::InactiveUsers => self.directory.list_inactive().await?,
            NotificationTarget::NewUsers => self.directory.list_new().await?,
        };

        let unique: IndexSet<UserId> = ids.into_iter().collect();
        Ok(unique.into_iter().collect())
    }
}
