//! Single-account provisioning with compensation.

use common::RecordId;
use domain::{NewUser, NewUserRequest, User};
use futures_util::FutureExt;
use rand::Rng;
use rand::distributions::Alphanumeric;
use record_store::{RecordStore, RecordStoreExt, StoreError};

use crate::compensation::CompensationStack;
use crate::error::{ProvisioningError, Result};
use crate::services::{DeleteOutcome, Notification, Notifier, ObjectStorage};
use crate::state::ProvisioningState;

/// Settings for account creation.
#[derive(Debug, Clone)]
pub struct AccountConfig {
    /// Link included in the welcome notification.
    pub login_url: String,
    /// Length of the generated credential.
    pub credential_length: usize,
    /// bcrypt cost factor.
    pub hash_cost: u32,
}

impl Default for AccountConfig {
    fn default() -> Self {
        Self {
            login_url: "http://localhost:3000/login".to_string(),
            credential_length: 12,
            hash_cost: bcrypt::DEFAULT_COST,
        }
    }
}

/// Creates a privileged user account and delivers its credential.
///
/// The account exists only if the notification was accepted. Otherwise the
/// pre-supplied documents and the persisted record are removed, in that
/// order, before the failure is returned.
pub struct AccountProvisioner<S, N, O> {
    store: S,
    notifier: N,
    storage: O,
    config: AccountConfig,
}

impl<S, N, O> AccountProvisioner<S, N, O>
where
    S: RecordStore<User>,
    N: Notifier,
    O: ObjectStorage,
{
    /// Creates a new account provisioner.
    pub fn new(store: S, notifier: N, storage: O, config: AccountConfig) -> Self {
        Self {
            store,
            notifier,
            storage,
            config,
        }
    }

    /// Returns the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Runs the account pipeline.
    ///
    /// # Errors
    ///
    /// - validation errors and a `Conflict` found by the lookup leave
    ///   everything untouched, including the caller's documents
    /// - store errors during the lookup are returned as-is, before any write
    /// - persistence and notification failures are returned after
    ///   compensation, wrapped in `CompensationIncomplete` if an undo step
    ///   failed
    ///
    /// A `Conflict` raised by the store's unique index at write time counts
    /// as a persistence failure, so the documents are deleted before it is
    /// returned. The caller can tell the two cases apart by checking whether
    /// its document URLs still resolve.
    #[tracing::instrument(skip(self, request), fields(role = %request.role))]
    pub async fn provision(&self, request: &NewUserRequest) -> Result<User> {
        metrics::counter!("account_provisioning_total").increment(1);

        let new_user = request.validate()?;
        self.ensure_unique(&new_user).await?;
        let mut state = ProvisioningState::Validated;

        let credential = generate_credential(self.config.credential_length);
        let mut compensation = CompensationStack::new();

        let user = match self.persist(new_user.clone(), &credential).await {
            Ok(user) => user,
            Err(e) => {
                self.push_document_deletes(&mut compensation, &new_user.documents);
                return Err(self.compensate(&mut state, compensation, e).await);
            }
        };
        advance(&mut state, ProvisioningState::Persisted)?;
        tracing::info!(record_id = %user.id, "user persisted");

        let id = user.id;
        let store = &self.store;
        compensation.push(format!("delete user {id}"), move || {
            async move {
                store.delete_if_exists(id).await?;
                Ok(())
            }
            .boxed()
        });
        self.push_document_deletes(&mut compensation, &user.documents);

        let notification = self.welcome_notification(&user, &credential);
        let delivery = match self.notifier.send(&notification).await {
            Ok(true) => Ok(()),
            Ok(false) => Err(ProvisioningError::NotificationRejected {
                recipient: user.email.clone(),
            }),
            Err(e) => Err(e),
        };
        if let Err(e) = delivery {
            advance(&mut state, ProvisioningState::NotifyFailed)?;
            return Err(self.compensate(&mut state, compensation, e).await);
        }

        advance(&mut state, ProvisioningState::Notified)?;
        advance(&mut state, ProvisioningState::Done)?;
        tracing::info!(record_id = %user.id, "account provisioned");
        Ok(user)
    }

    async fn ensure_unique(&self, new_user: &NewUser) -> Result<()> {
        if self.store.exists(&User::email_filter(&new_user.email)).await? {
            return Err(ProvisioningError::Conflict {
                field: "email".to_string(),
                value: new_user.email.clone(),
            });
        }
        if self.store.exists(&User::phone_filter(&new_user.phone)).await? {
            return Err(ProvisioningError::Conflict {
                field: "phone".to_string(),
                value: new_user.phone.clone(),
            });
        }
        Ok(())
    }

    async fn persist(&self, new_user: NewUser, credential: &str) -> Result<User> {
        let hash = hash_credential(credential.to_string(), self.config.hash_cost).await?;
        let user = new_user.into_user(RecordId::new(), hash);

        self.store.create(user).await.map_err(|e| match e {
            StoreError::DuplicateKey { field, value, .. } => {
                ProvisioningError::Conflict { field, value }
            }
            other => other.into(),
        })
    }

    fn push_document_deletes<'a>(&'a self, stack: &mut CompensationStack<'a>, documents: &[String]) {
        let storage = &self.storage;
        for url in documents {
            let url = url.clone();
            stack.push(format!("delete document {url}"), move || {
                async move {
                    if storage.delete(&url).await? == DeleteOutcome::NotFound {
                        tracing::debug!(%url, "document already gone");
                    }
                    Ok(())
                }
                .boxed()
            });
        }
    }

    /// Unwinds the stack and builds the error to return.
    async fn compensate(
        &self,
        state: &mut ProvisioningState,
        compensation: CompensationStack<'_>,
        cause: ProvisioningError,
    ) -> ProvisioningError {
        metrics::counter!("account_compensations_total").increment(1);
        tracing::warn!(error = %cause, from = %state, steps = compensation.len(), "compensating");

        if let Err(e) = advance(state, ProvisioningState::Compensating) {
            return e;
        }
        let report = compensation.unwind().await;
        if let Err(e) = advance(state, ProvisioningState::Compensated) {
            return e;
        }

        if report.is_complete() {
            cause
        } else {
            tracing::error!(failures = ?report.failed, "compensation incomplete");
            ProvisioningError::CompensationIncomplete {
                cause: Box::new(cause),
                failures: report.failed,
            }
        }
    }

    fn welcome_notification(&self, user: &User, credential: &str) -> Notification {
        let login_url = &self.config.login_url;
        let name = &user.full_name;
        let email = &user.email;

        let text = format!(
            "Hello {name},\n\nAn account has been created for you.\n\n\
             Login: {email}\nTemporary password: {credential}\n\n\
             Sign in at {login_url} and change your password.\n"
        );
        let html = format!(
            r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="UTF-8">
    <title>Your account</title>
</head>
<body style="font-family: Arial, sans-serif; line-height: 1.6; color: #333;">
    <div style="max-width: 600px; margin: 0 auto; padding: 20px;">
        <h2 style="color: #2563eb;">Welcome, {name}</h2>
        <p>An account has been created for you.</p>
        <p>Login: <strong>{email}</strong><br>Temporary password: <code>{credential}</code></p>
        <p style="margin: 30px 0;">
            <a href="{login_url}"
               style="display: inline-block; background-color: #2563eb; color: white; padding: 12px 24px; text-decoration: none; border-radius: 4px;">
                Sign In
            </a>
        </p>
        <p style="color: #666; font-size: 14px;">Please change your password after signing in.</p>
    </div>
</body>
</html>"#
        );

        Notification {
            to: user.email.clone(),
            subject: "Your account has been created".to_string(),
            html,
            text,
        }
    }
}

fn advance(state: &mut ProvisioningState, next: ProvisioningState) -> Result<()> {
    if !state.can_transition_to(next) {
        return Err(ProvisioningError::InvalidState {
            from: *state,
            to: next,
        });
    }
    tracing::debug!(from = %state, to = %next, "provisioning state changed");
    *state = next;
    Ok(())
}

fn generate_credential(length: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(length)
        .map(char::from)
        .collect()
}

async fn hash_credential(credential: String, cost: u32) -> Result<String> {
    tokio::task::spawn_blocking(move || bcrypt::hash(credential, cost))
        .await
        .map_err(|e| ProvisioningError::Credential(format!("hashing task failed: {e}")))?
        .map_err(|e| ProvisioningError::Credential(e.to_string()))
}
