//! Account directory backed by the `users` document.
//!
//! Sessions are resolved here: a username maps to the [`Identity`] the
//! permission gate evaluates.

use std::sync::Arc;

use serde_json::Value;

use herald_core::sections::UserAccount;
use herald_core::{has_permission, Action, DocumentKey, Identity, SectionKind};
use herald_store::{ContentRepository, StoreError};

use crate::error::WorkflowError;

#[derive(Debug, Clone)]
pub struct UserDirectory {
    repo: Arc<ContentRepository>,
}

impl UserDirectory {
    pub fn new(repo: Arc<ContentRepository>) -> Self {
        Self { repo }
    }

    /// Every account, in stored order.
    pub fn accounts(&self) -> Result<Vec<UserAccount>, WorkflowError> {
        let doc = self.repo.reload(&DocumentKey::Users)?;
        let accounts = doc
            .section(SectionKind::UserAccounts.name())
            .cloned()
            .unwrap_or(Value::Array(vec![]));
        // Repaired on read, so this section always decodes.
        Ok(serde_json::from_value(accounts).unwrap_or_default())
    }

    /// The identity of `username`.
    pub fn resolve(&self, username: &str) -> Result<Identity, WorkflowError> {
        let account = self
            .accounts()?
            .into_iter()
            .find(|a| a.username == username)
            .ok_or_else(|| WorkflowError::UnknownUser(username.to_string()))?;
        let mut identity = Identity::new(account.username, account.role);
        identity.department = account.department;
        Ok(identity)
    }

    /// Add `account`, or replace the account with the same username.
    ///
    /// Returns `true` if an existing account was replaced.
    pub fn upsert(&self, actor: &Identity, account: UserAccount) -> Result<bool, WorkflowError> {
        if !has_permission(actor, Action::ManageUsers, &DocumentKey::Users) {
            tracing::warn!("{} denied ManageUsers", actor.username);
            return Err(WorkflowError::PermissionDenied {
                username: actor.username.clone(),
                action: Action::ManageUsers,
                target: DocumentKey::Users,
            });
        }

        let mut accounts = self.accounts()?;
        let replaced = match accounts.iter_mut().find(|a| a.username == account.username) {
            Some(existing) => {
                *existing = account;
                true
            }
            None => {
                accounts.push(account);
                false
            }
        };

        let mut doc = self.repo.reload(&DocumentKey::Users)?;
        let value = serde_json::to_value(&accounts).map_err(|source| StoreError::Encode {
            key: DocumentKey::Users,
            source,
        })?;
        doc.set_section(SectionKind::UserAccounts.name(), value);
        self.repo.save(&DocumentKey::Users, &doc)?;
        tracing::info!("accounts updated by {} ({} total)", actor.username, accounts.len());
        Ok(replaced)
    }
}

#[cfg(test)]
mod tests {
    use herald_core::{LocalBroadcast, Role, SubsidiaryId};
    use herald_store::FileStore;
    use tempfile::TempDir;

    use super::*;

    fn directory(home: &TempDir) -> UserDirectory {
        let repo = ContentRepository::new(FileStore::at(home.path()), Arc::new(LocalBroadcast::new()));
        UserDirectory::new(Arc::new(repo))
    }

    fn account(username: &str, role: Role, department: Option<&str>) -> UserAccount {
        UserAccount {
            username: username.into(),
            display_name: username.to_uppercase(),
            role,
            department: department.map(|d| SubsidiaryId::new(d).unwrap()),
        }
    }

    #[test]
    fn default_admin_resolves() {
        let home = TempDir::new().expect("home");
        let identity = directory(&home).resolve("admin").unwrap();
        assert_eq!(identity.role, Role::SuperAdmin);
    }

    #[test]
    fn unknown_user_is_an_error() {
        let home = TempDir::new().expect("home");
        let err = directory(&home).resolve("nobody").unwrap_err();
        assert!(matches!(err, WorkflowError::UnknownUser(name) if name == "nobody"));
    }

    #[test]
    fn added_account_carries_department() {
        let home = TempDir::new().expect("home");
        let users = directory(&home);
        let admin = users.resolve("admin").unwrap();

        let replaced = users
            .upsert(&admin, account("kim", Role::SubsidiaryAdmin, Some("tech")))
            .unwrap();
        assert!(!replaced);

        let kim = directory(&home).resolve("kim").unwrap();
        assert_eq!(kim.department.as_ref().map(|d| d.as_str()), Some("tech"));

        let replaced = users
            .upsert(&admin, account("kim", Role::ContentManager, None))
            .unwrap();
        assert!(replaced);
        assert_eq!(users.accounts().unwrap().len(), 2);
    }

    #[test]
    fn content_roles_cannot_manage_users() {
        let home = TempDir::new().expect("home");
        let users = directory(&home);
        let editor = Identity::new("editor", Role::ContentManager);
        let err = users
            .upsert(&editor, account("eve", Role::SuperAdmin, None))
            .unwrap_err();
        assert!(matches!(err, WorkflowError::PermissionDenied { .. }));
        assert_eq!(users.accounts().unwrap().len(), 1);

        let hr = Identity::new("hr", Role::UserManager);
        users.upsert(&hr, account("eve", Role::Viewer, None)).unwrap();
        assert_eq!(users.accounts().unwrap().len(), 2);
    }
}
