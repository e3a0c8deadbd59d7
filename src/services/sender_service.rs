//! Turning an address into a concrete sending identity, and the process-wide
//! default sender used for system mail.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    auth::{
        Principal, normalize_email,
        policy::{Action, Ownership, Resource, authorize},
    },
    db::dao::{AccountDao, AliasDao, DaoBase, DefaultSenderDao},
    db::entities::{account, alias, default_sender},
    error::AppError,
    mailer::SmtpCredentials,
};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SenderKind {
    Account,
    Alias,
}

impl SenderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SenderKind::Account => default_sender::ACCOUNT,
            SenderKind::Alias => default_sender::ALIAS,
        }
    }
}

impl TryFrom<&str> for SenderKind {
    type Error = AppError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            default_sender::ACCOUNT => Ok(SenderKind::Account),
            default_sender::ALIAS => Ok(SenderKind::Alias),
            other => Err(AppError::internal(format!("Unknown sender type: {other}"))),
        }
    }
}

/// An active identity ready to send: the header address plus the mailbox
/// whose credentials carry it.
#[derive(Debug, Clone)]
pub struct ResolvedSender {
    pub kind: SenderKind,
    pub id: Uuid,
    pub from_email: String,
    pub display_name: Option<String>,
    pub credential_account: account::Model,
    pub ownership: Ownership,
}

impl ResolvedSender {
    pub fn is_alias(&self) -> bool {
        self.kind == SenderKind::Alias
    }

    pub fn credentials(&self) -> SmtpCredentials {
        SmtpCredentials {
            username: self.credential_account.email.clone(),
            password: self.credential_account.password.clone(),
        }
    }

    fn from_account(account: account::Model) -> Self {
        Self {
            kind: SenderKind::Account,
            id: account.id,
            from_email: account.email.clone(),
            display_name: account.display_name.clone(),
            ownership: Ownership {
                owner_id: account.owner_id,
                is_public: account.is_public,
            },
            credential_account: account,
        }
    }

    fn from_alias(alias: alias::Model, parent: account::Model) -> Self {
        Self {
            kind: SenderKind::Alias,
            id: alias.id,
            from_email: alias.alias_email,
            display_name: alias.display_name,
            ownership: Ownership {
                owner_id: alias.owner_id,
                is_public: alias.is_public,
            },
            credential_account: parent,
        }
    }
}

/// What the default-sender setting currently points at. `is_active` is
/// computed on every read.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DefaultSenderView {
    pub sender_type: SenderKind,
    pub sender_id: Uuid,
    pub email: String,
    pub display_label: String,
    pub via_display: Option<String>,
    pub is_active: bool,
    pub version: i64,
}

#[derive(Clone)]
pub struct SenderService {
    accounts: AccountDao,
    aliases: AliasDao,
    default_sender: DefaultSenderDao,
}

impl SenderService {
    pub fn new(accounts: AccountDao, aliases: AliasDao, default_sender: DefaultSenderDao) -> Self {
        Self {
            accounts,
            aliases,
            default_sender,
        }
    }

    /// Accounts are matched before aliases. Inactive identities, and aliases
    /// whose parent account is inactive, do not resolve.
    pub async fn resolve(&self, address: &str) -> Result<ResolvedSender, AppError> {
        let address = normalize_email(address);

        if let Some(account) = self.accounts.find_by_email(&address).await? {
            if account.is_active {
                return Ok(ResolvedSender::from_account(account));
            }
        }

        if let Some(alias) = self.aliases.find_by_email(&address).await? {
            if let Some(resolved) = self.active_alias(alias).await? {
                return Ok(resolved);
            }
        }

        tracing::info!(address = %address, "sender not resolvable");
        Err(AppError::sender_not_found(
            "Sender account or alias not found or inactive",
        ))
    }

    async fn active_alias(&self, alias: alias::Model) -> Result<Option<ResolvedSender>, AppError> {
        if !alias.is_active {
            return Ok(None);
        }
        match self.accounts.find_optional(alias.account_id).await? {
            Some(parent) if parent.is_active => Ok(Some(ResolvedSender::from_alias(alias, parent))),
            _ => Ok(None),
        }
    }

    /// Looks up the identity by id and reports whether it could send right now.
    async fn summarize(
        &self,
        kind: SenderKind,
        id: Uuid,
    ) -> Result<Option<(DefaultSenderView, Option<ResolvedSender>)>, AppError> {
        match kind {
            SenderKind::Account => {
                let Some(account) = self.accounts.find_optional(id).await? else {
                    return Ok(None);
                };
                let view = DefaultSenderView {
                    sender_type: kind,
                    sender_id: id,
                    email: account.email.clone(),
                    display_label: account
                        .display_name
                        .clone()
                        .unwrap_or_else(|| account.email.clone()),
                    via_display: None,
                    is_active: account.is_active,
                    version: 0,
                };
                let resolved = account
                    .is_active
                    .then(|| ResolvedSender::from_account(account));
                Ok(Some((view, resolved)))
            }
            SenderKind::Alias => {
                let Some(alias) = self.aliases.find_optional(id).await? else {
                    return Ok(None);
                };
                let parent = self.accounts.find_optional(alias.account_id).await?;
                let is_active = alias.is_active && parent.as_ref().is_some_and(|p| p.is_active);
                let view = DefaultSenderView {
                    sender_type: kind,
                    sender_id: id,
                    email: alias.alias_email.clone(),
                    display_label: alias
                        .display_name
                        .clone()
                        .unwrap_or_else(|| alias.alias_email.clone()),
                    via_display: parent.as_ref().map(|p| {
                        format!(
                            "{} ({})",
                            p.display_name.as_deref().unwrap_or(&p.email),
                            p.email
                        )
                    }),
                    is_active,
                    version: 0,
                };
                let resolved = match parent {
                    Some(parent) if is_active => Some(ResolvedSender::from_alias(alias, parent)),
                    _ => None,
                };
                Ok(Some((view, resolved)))
            }
        }
    }

    async fn current_view(
        &self,
        row: &default_sender::Model,
    ) -> Result<Option<(DefaultSenderView, Option<ResolvedSender>)>, AppError> {
        let Some((sender_type, sender_id)) = row.target() else {
            return Ok(None);
        };
        let kind = SenderKind::try_from(sender_type)?;
        let summary = self.summarize(kind, sender_id).await?;
        if summary.is_none() {
            tracing::warn!(sender_type = kind.as_str(), sender_id = %sender_id, "default sender points at a missing identity");
        }
        Ok(summary.map(|(mut view, resolved)| {
            view.version = row.version;
            (view, resolved)
        }))
    }

    pub async fn get_default(
        &self,
        principal: &Principal,
    ) -> Result<Option<DefaultSenderView>, AppError> {
        authorize(principal, Action::Read, Resource::DefaultSender)?;
        let Some(row) = self.default_sender.get().await? else {
            return Ok(None);
        };
        Ok(self.current_view(&row).await?.map(|(view, _)| view))
    }

    /// Validates the target is active, then swaps the setting with a version
    /// check. `expected_version` of 0 means "nothing configured", which holds
    /// both before the first write and after a clear.
    pub async fn set_default(
        &self,
        principal: &Principal,
        kind: SenderKind,
        id: Uuid,
        expected_version: Option<i64>,
    ) -> Result<DefaultSenderView, AppError> {
        authorize(principal, Action::UpdatePrivilegedFields, Resource::DefaultSender)?;

        match self.summarize(kind, id).await? {
            None => {
                return Err(AppError::validation(format!(
                    "Default sender {} not found",
                    kind.as_str()
                )));
            }
            Some((view, _)) if !view.is_active => {
                return Err(AppError::validation(format!(
                    "Default sender {} is inactive",
                    kind.as_str()
                )));
            }
            Some(_) => {}
        }

        let current = self.default_sender.get().await?;
        let current_version = current.as_ref().map(|row| row.version).unwrap_or(0);
        let configured = current.as_ref().is_some_and(|row| row.target().is_some());
        if expected_version
            .is_some_and(|expected| expected != current_version && (configured || expected != 0))
        {
            return Err(stale_setting());
        }

        match current {
            None => match self.default_sender.insert_initial(kind.as_str(), &id).await {
                Ok(_) => {}
                Err(err) if err.is_unique_violation() => return Err(stale_setting()),
                Err(err) => return Err(err.into()),
            },
            Some(row) => {
                if !self
                    .default_sender
                    .replace_if_version(row.version, kind.as_str(), &id)
                    .await?
                {
                    return Err(stale_setting());
                }
            }
        }

        tracing::info!(
            user_id = %principal.user_id,
            sender_type = kind.as_str(),
            sender_id = %id,
            "default sender changed"
        );

        let row = self
            .default_sender
            .get()
            .await?
            .ok_or_else(stale_setting)?;
        self.current_view(&row)
            .await?
            .map(|(view, _)| view)
            .ok_or_else(stale_setting)
    }

    pub async fn clear_default(&self, principal: &Principal) -> Result<(), AppError> {
        authorize(principal, Action::UpdatePrivilegedFields, Resource::DefaultSender)?;
        if self.default_sender.clear().await? {
            tracing::info!(user_id = %principal.user_id, "default sender cleared");
        }
        Ok(())
    }

    /// Clears the setting when it points at any of `ids`. Used when identities
    /// are deleted.
    pub async fn forget(&self, kind: SenderKind, ids: &[Uuid]) -> Result<(), AppError> {
        if self.default_sender.clear_if_references(kind.as_str(), ids).await? {
            tracing::warn!(sender_type = kind.as_str(), "default sender cleared because its identity was deleted");
        }
        Ok(())
    }

    /// The identity for system mail, re-checked for activeness on every call.
    pub async fn system_sender(&self) -> Result<ResolvedSender, AppError> {
        let row = self
            .default_sender
            .get()
            .await?
            .filter(|row| row.target().is_some())
            .ok_or_else(|| AppError::sender_inactive("No default sender configured"))?;

        match self.current_view(&row).await? {
            Some((_, Some(resolved))) => Ok(resolved),
            _ => {
                tracing::warn!("system mail disabled: default sender is inactive");
                Err(AppError::sender_inactive("Default sender is inactive"))
            }
        }
    }
}

fn stale_setting() -> AppError {
    AppError::conflict("Default sender was changed by another request")
}
