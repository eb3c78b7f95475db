//! User directory collaborator boundary.
//!
//! The directory owns the population queries (who exists, roles, activity
//! cohorts) and the per-recipient preference records. The engine never
//! defines cohort semantics itself.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

use herald_core::{UserId, UserNotificationPreferences, UserRole};

/// Failure to reach or query the user directory.
#[derive(Debug, Clone, Error)]
#[error("User directory error: {0}")]
pub struct DirectoryError(pub String);

impl DirectoryError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Read/write surface the audience resolver and preference filter depend on.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// All active, non-banned users.
    async fn list_all(&self) -> Result<Vec<UserId>, DirectoryError>;

    /// Admins and super-admins.
    async fn list_admins(&self) -> Result<Vec<UserId>, DirectoryError>;

    async fn list_super_admins(&self) -> Result<Vec<UserId>, DirectoryError>;

    /// Users holding exactly the given role. An unknown or unpopulated role
    /// yields an empty list, not an error.
    async fn list_by_role(&self, role: UserRole) -> Result<Vec<UserId>, DirectoryError>;

    /// Recently active cohort (directory-defined window).
    async fn list_active(&self) -> Result<Vec<UserId>, DirectoryError>;

    async fn list_inactive(&self) -> Result<Vec<UserId>, DirectoryError>;

    /// Recently registered cohort (directory-defined window).
    async fn list_new(&self) -> Result<Vec<UserId>, DirectoryError>;

    async fn exists(&self, id: UserId) -> Result<bool, DirectoryError>;

    /// A recipient with no stored preferences receives everything.
    async fn get_preferences(
        &self,
        id: UserId,
    ) -> Result<Option<UserNotificationPreferences>, DirectoryError>;

    async fn set_preferences(
        &self,
        id: UserId,
        preferences: UserNotificationPreferences,
    ) -> Result<(), DirectoryError>;

    /// Per-user template variable values (e.g. display name) used by
    /// personalized template sends. Defaults to none.
    async fn user_variables(
        &self,
        _id: UserId,
    ) -> Result<HashMap<String, serde_json::Value>, DirectoryError> {
        Ok(HashMap::new())
    }
}

pub type DynUserDirectory = Arc<dyn UserDirectory>;
