use std::{sync::Arc, time::Duration};

use crate::{
    auth::{
        Principal,
        policy::{authorize_send, can_view},
    },
    error::AppError,
    mailer::{MailTransport, OutgoingMessage, deliver, parse_address_list},
    services::sender_service::SenderService,
};

/// A user-initiated message as submitted; recipient fields are comma-separated.
#[derive(Debug, Clone, Default)]
pub struct SendRequest {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub body: String,
    pub cc: Option<String>,
    pub bcc: Option<String>,
    pub is_html: bool,
}

#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendReceipt {
    pub from: String,
    pub via_alias: bool,
    pub recipients: usize,
}

#[derive(Clone)]
pub struct DispatchService {
    senders: SenderService,
    transport: Arc<dyn MailTransport>,
    timeout: Duration,
}

impl DispatchService {
    pub fn new(senders: SenderService, transport: Arc<dyn MailTransport>, timeout: Duration) -> Self {
        Self {
            senders,
            transport,
            timeout,
        }
    }

    pub async fn send(
        &self,
        principal: &Principal,
        request: SendRequest,
    ) -> Result<SendReceipt, AppError> {
        authorize_send(principal)?;

        let from = request.from.trim();
        if from.is_empty() {
            return Err(AppError::validation("Sender address is required"));
        }
        let to = parse_address_list(Some(request.to.as_str()));
        if to.is_empty() {
            return Err(AppError::validation("At least one recipient is required"));
        }
        let cc = parse_address_list(request.cc.as_deref());
        let bcc = parse_address_list(request.bcc.as_deref());

        let sender = self.senders.resolve(from).await?;
        if !can_view(principal, sender.ownership) {
            tracing::info!(user_id = %principal.user_id, sender_id = %sender.id, "send through private sender denied");
            return Err(AppError::forbidden("Not permitted to send as this address"));
        }

        let recipients = to.len() + cc.len() + bcc.len();
        let message = OutgoingMessage {
            from_email: sender.from_email.clone(),
            from_name: sender.display_name.clone(),
            to,
            cc,
            bcc,
            subject: request.subject,
            body: request.body,
            is_html: request.is_html,
        };

        deliver(
            self.transport.as_ref(),
            &sender.credentials(),
            &message,
            self.timeout,
        )
        .await
        .map_err(|err| {
            tracing::warn!(
                user_id = %principal.user_id,
                sender_id = %sender.id,
                error = %err,
                "delivery failed"
            );
            AppError::from(err)
        })?;

        tracing::info!(
            user_id = %principal.user_id,
            sender_id = %sender.id,
            via_alias = sender.is_alias(),
            recipients,
            "message relayed"
        );
        let via_alias = sender.is_alias();
        Ok(SendReceipt {
            from: sender.from_email,
            via_alias,
            recipients,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase};
    use uuid::Uuid;

    use super::{DispatchService, SendRequest};
    use crate::{
        auth::Role,
        db::entities::{account, alias},
        services::{ServiceContext, ServiceSettings},
        test_helpers::{RecordingTransport, fixed_ts, principal, test_jwt},
    };

    fn service(db: &DatabaseConnection, transport: Arc<RecordingTransport>) -> DispatchService {
        ServiceContext::new(db, test_jwt(), transport, ServiceSettings::default()).dispatch()
    }

    fn mailbox(owner_id: Option<Uuid>, is_public: bool) -> account::Model {
        account::Model {
            id: Uuid::new_v4(),
            created_at: fixed_ts(),
            updated_at: fixed_ts(),
            email: "box@example.com".to_string(),
            display_name: Some("Box".to_string()),
            password: "mailbox-secret".to_string(),
            is_active: true,
            owner_id,
            is_public,
        }
    }

    fn request(from: &str, to: &str) -> SendRequest {
        SendRequest {
            from: from.to_string(),
            to: to.to_string(),
            subject: "Hello".to_string(),
            body: "Body".to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn admin_cannot_send() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();

        let err = service(&db, RecordingTransport::new())
            .send(&principal(Role::Admin), request("box@example.com", "a@x.com"))
            .await
            .expect_err("admin should be refused");
        assert_eq!(err.code(), "forbidden");
    }

    #[tokio::test]
    async fn pending_password_change_blocks_send() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let mut caller = principal(Role::User);
        caller.must_change_password = true;

        let err = service(&db, RecordingTransport::new())
            .send(&caller, request("box@example.com", "a@x.com"))
            .await
            .expect_err("gate should apply");
        assert_eq!(err.code(), "forbidden");
    }

    #[tokio::test]
    async fn empty_recipient_list_is_invalid() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();

        let err = service(&db, RecordingTransport::new())
            .send(&principal(Role::User), request("box@example.com", " , "))
            .await
            .expect_err("no recipients should fail");
        assert_eq!(err.code(), "validation_error");
    }

    #[tokio::test]
    async fn sends_through_alias_with_parent_credentials() {
        let transport = RecordingTransport::new();
        let parent = mailbox(None, true);
        let sales = alias::Model {
            id: Uuid::new_v4(),
            created_at: fixed_ts(),
            updated_at: fixed_ts(),
            alias_email: "sales@example.com".to_string(),
            display_name: Some("Sales".to_string()),
            is_active: true,
            account_id: parent.id,
            owner_id: None,
            is_public: true,
        };
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<account::Model>::new()])
            .append_query_results([[sales]])
            .append_query_results([[parent]])
            .into_connection();

        let mut req = request("sales@example.com", "a@x.com, b@x.com");
        req.bcc = Some("audit@x.com".to_string());
        let receipt = service(&db, transport.clone())
            .send(&principal(Role::User), req)
            .await
            .expect("send should succeed");

        assert!(receipt.via_alias);
        assert_eq!(receipt.recipients, 3);
        let sent = transport.sent();
        assert_eq!(sent[0].username, "box@example.com");
        assert_eq!(sent[0].message.from_email, "sales@example.com");
        assert_eq!(sent[0].message.from_name.as_deref(), Some("Sales"));
    }

    #[tokio::test]
    async fn private_sender_of_someone_else_is_forbidden() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[mailbox(Some(Uuid::new_v4()), false)]])
            .into_connection();

        let err = service(&db, RecordingTransport::new())
            .send(&principal(Role::Dev), request("box@example.com", "a@x.com"))
            .await
            .expect_err("private sender should be refused");
        assert_eq!(err.code(), "forbidden");
    }

    #[tokio::test]
    async fn transport_failure_surfaces_as_delivery_failed() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[mailbox(None, true)]])
            .into_connection();

        let err = service(&db, RecordingTransport::failing())
            .send(&principal(Role::User), request("box@example.com", "a@x.com"))
            .await
            .expect_err("transport failure should surface");
        assert_eq!(err.code(), "delivery_failed");
        assert!(err.message().contains("535"));
    }
}
