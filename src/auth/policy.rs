//! Role × ownership authorization.
//!
//! Every mutating service call asks [`authorize`] before touching the store,
//! so a denial never leaves partial work behind.

use uuid::Uuid;

use super::{CredentialKind, Principal, Role};
use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Read,
    Create,
    /// Activation, visibility, display name.
    UpdateOwnFields,
    /// Owner reassignment, credential rotation, alias re-parenting, user roles.
    UpdatePrivilegedFields,
    Delete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ownership {
    pub owner_id: Option<Uuid>,
    pub is_public: bool,
}

impl Ownership {
    fn owned_by(&self, user_id: Uuid) -> bool {
        self.owner_id == Some(user_id)
    }
}

/// `None` targets the collection (listing or creating).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Account(Option<Ownership>),
    Alias(Option<Ownership>),
    User(Option<Uuid>),
    DefaultSender,
}

impl Resource {
    fn label(&self) -> &'static str {
        match self {
            Resource::Account(_) => "account",
            Resource::Alias(_) => "alias",
            Resource::User(_) => "user",
            Resource::DefaultSender => "default_sender",
        }
    }
}

pub fn authorize(principal: &Principal, action: Action, resource: Resource) -> Result<(), AppError> {
    ensure_password_settled(principal)?;

    let allowed = match principal.role {
        Role::Admin => admin_allows(principal, action, resource),
        Role::Dev => dev_allows(principal, action, resource),
        Role::User => user_allows(principal, action, resource),
    };

    if allowed {
        return Ok(());
    }

    tracing::info!(
        user_id = %principal.user_id,
        role = %principal.role,
        action = ?action,
        resource = resource.label(),
        "authorization denied"
    );
    Err(denial(principal, action, resource))
}

/// Whether a listing should include an entity with this ownership.
pub fn can_view(principal: &Principal, ownership: Ownership) -> bool {
    principal.is_admin() || ownership.is_public || ownership.owned_by(principal.user_id)
}

/// User-facing mail is reserved for `user` and `dev`; admins manage, they don't send.
pub fn authorize_send(principal: &Principal) -> Result<(), AppError> {
    ensure_password_settled(principal)?;
    if principal.is_admin() {
        return Err(AppError::forbidden("Admin accounts cannot send mail"));
    }
    Ok(())
}

/// API tokens are managed from an interactive session only.
pub fn authorize_token_management(principal: &Principal) -> Result<(), AppError> {
    ensure_password_settled(principal)?;
    if principal.credential != CredentialKind::Session {
        return Err(AppError::forbidden("API tokens are managed from a session"));
    }
    Ok(())
}

pub fn ensure_password_settled(principal: &Principal) -> Result<(), AppError> {
    if principal.password_change_pending() {
        return Err(AppError::forbidden("Password change required"));
    }
    Ok(())
}

fn admin_allows(principal: &Principal, action: Action, resource: Resource) -> bool {
    match resource {
        Resource::User(Some(target)) if target == principal.user_id => {
            !matches!(action, Action::Delete | Action::UpdatePrivilegedFields)
        }
        _ => true,
    }
}

fn dev_allows(principal: &Principal, action: Action, resource: Resource) -> bool {
    match resource {
        Resource::Account(target) | Resource::Alias(target) => match action {
            Action::Read => target.is_none_or(|ownership| can_view(principal, ownership)),
            Action::Create => target.is_none(),
            Action::UpdateOwnFields | Action::Delete => {
                target.is_some_and(|ownership| ownership.owned_by(principal.user_id))
            }
            Action::UpdatePrivilegedFields => false,
        },
        Resource::User(_) | Resource::DefaultSender => false,
    }
}

fn user_allows(principal: &Principal, action: Action, resource: Resource) -> bool {
    match (action, resource) {
        (Action::Read, Resource::Account(target) | Resource::Alias(target)) => {
            target.is_none_or(|ownership| can_view(principal, ownership))
        }
        _ => false,
    }
}

fn denial(principal: &Principal, action: Action, resource: Resource) -> AppError {
    match (principal.role, resource) {
        (Role::Admin, Resource::User(_)) if action == Action::Delete => {
            AppError::forbidden("Admins cannot delete their own account")
        }
        (Role::Admin, Resource::User(_)) => {
            AppError::forbidden("Admins cannot change their own role")
        }
        (_, Resource::User(_) | Resource::DefaultSender) => {
            AppError::forbidden("Admin role required")
        }
        (_, _) if action == Action::UpdatePrivilegedFields => {
            AppError::forbidden("Only admins can change owner, credentials or parent account")
        }
        _ => AppError::forbidden(format!(
            "Not permitted to {} this {}",
            verb(action),
            resource.label()
        )),
    }
}

fn verb(action: Action) -> &'static str {
    match action {
        Action::Read => "read",
        Action::Create => "create",
        Action::UpdateOwnFields | Action::UpdatePrivilegedFields => "update",
        Action::Delete => "delete",
    }
}
