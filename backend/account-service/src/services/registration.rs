/// Registration and activation workflow
///
/// `register` bootstraps an inactive user and mails a fresh activation code;
/// `verify_and_activate` redeems the code, flipping the user to active,
/// consuming the code and publishing a `UserActivatedEvent` in a single
/// transaction.
use crate::db::{
    ActivationStore, Database, UserStore, USERS_EMAIL_KEY, USER_ACTIVATIONS_CODE_KEY,
};
use crate::error::{AccountError, Result};
use crate::metrics;
use crate::models::activation::{is_well_formed_code, DEFAULT_ACTIVATION_TTL_SECS};
use crate::models::{
    ActivationRecord, NewActivation, NewUser, UserActivatedEvent, UserStatus, UserUpdate,
};
use crate::security::{CodeGenerator, CredentialVerifier};
use crate::services::email::Notifier;
use crate::services::kafka_events::EventPublisher;
use crate::validators::{mask_email, validate_email};
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tracing::{debug, info, warn};

pub const ACTIVATION_EMAIL_SUBJECT: &str = "Activate your account";

/// Codes drawn per registration before giving up on collisions
const MAX_CODE_DRAWS: u32 = 3;

#[derive(Debug, Clone)]
pub struct RegistrationConfig {
    pub activation_ttl: Duration,
    pub user_activated_topic: String,
}

impl Default for RegistrationConfig {
    fn default() -> Self {
        Self {
            activation_ttl: Duration::seconds(DEFAULT_ACTIVATION_TTL_SECS),
            user_activated_topic: "user-activated".to_string(),
        }
    }
}

/// Result of a successful `register` call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistrationReceipt {
    pub user_id: i64,
    pub expires_at: DateTime<Utc>,
}

pub struct RegistrationService<D: Database> {
    db: Arc<D>,
    users: Arc<dyn UserStore<D::Tx>>,
    activations: Arc<dyn ActivationStore<D::Tx>>,
    credentials: Arc<dyn CredentialVerifier>,
    codes: Arc<dyn CodeGenerator>,
    notifier: Arc<dyn Notifier>,
    publisher: Arc<dyn EventPublisher>,
    config: RegistrationConfig,
}

impl<D: Database> RegistrationService<D> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        db: Arc<D>,
        users: Arc<dyn UserStore<D::Tx>>,
        activations: Arc<dyn ActivationStore<D::Tx>>,
        credentials: Arc<dyn CredentialVerifier>,
        codes: Arc<dyn CodeGenerator>,
        notifier: Arc<dyn Notifier>,
        publisher: Arc<dyn EventPublisher>,
        config: RegistrationConfig,
    ) -> Self {
        Self {
            db,
            users,
            activations,
            credentials,
            codes,
            notifier,
            publisher,
            config,
        }
    }

    /// Register `email`, or re-issue its code while it is still inactive.
    ///
    /// Failures after the user row exists leave an inactive user without a
    /// usable code; calling `register` again repairs that state.
    pub async fn register(&self, email: &str, password: &str) -> Result<RegistrationReceipt> {
        let result = self.register_inner(email, password).await;
        metrics::record_registration(&result);
        result
    }

    async fn register_inner(&self, email: &str, password: &str) -> Result<RegistrationReceipt> {
        if !validate_email(email) {
            return Err(AccountError::Validation("invalid email format".to_string()));
        }
        if password.is_empty() {
            return Err(AccountError::Validation("password must not be empty".to_string()));
        }

        let existing = self
            .users
            .get_by_email(email)
            .await
            .map_err(AccountError::upstream("look up user"))?;

        let user_id = match existing {
            Some(user) if user.status == UserStatus::Active => {
                warn!(user_id = user.id, email = %mask_email(email), "Registration for active user rejected");
                return Err(AccountError::AlreadyExists);
            }
            Some(user) => {
                debug!(user_id = user.id, "Reusing inactive user");
                user.id
            }
            None => self.create_inactive_user(email, password).await?,
        };

        let record = self.issue_code(user_id).await?;

        let body = format!("Your activation code is: {}", record.code);
        self.notifier
            .send(&body, email, ACTIVATION_EMAIL_SUBJECT)
            .await
            .map_err(AccountError::upstream("send activation email"))?;

        info!(user_id, email = %mask_email(email), "Activation code sent");
        Ok(RegistrationReceipt {
            user_id,
            expires_at: record.expires_at,
        })
    }

    async fn create_inactive_user(&self, email: &str, password: &str) -> Result<i64> {
        let password_hash = self
            .credentials
            .hash(password)
            .map_err(AccountError::upstream("hash password"))?;

        match self
            .users
            .create(&NewUser::inactive(email, password_hash, Utc::now()))
            .await
        {
            Ok(user_id) => {
                info!(user_id, email = %mask_email(email), "Inactive user created");
                Ok(user_id)
            }
            // A concurrent registration for the same email won the insert
            Err(e) if e.is_duplicate_of(USERS_EMAIL_KEY) => {
                warn!(email = %mask_email(email), "Concurrent registration lost email race");
                Err(AccountError::AlreadyExists)
            }
            Err(e) => Err(AccountError::upstream("create user")(e)),
        }
    }

    /// Replace the user's outstanding code with a fresh one. Codes are unique
    /// across users, so a collision draws again.
    async fn issue_code(&self, user_id: i64) -> Result<ActivationRecord> {
        let mut draw = 1;
        loop {
            let code = self
                .codes
                .generate()
                .map_err(AccountError::upstream("generate activation code"))?;
            let activation =
                NewActivation::issue(user_id, code, Utc::now(), self.config.activation_ttl);

            match self.activations.replace(&activation).await {
                Ok(record) => return Ok(record),
                Err(e) if e.is_duplicate_of(USER_ACTIVATIONS_CODE_KEY) && draw < MAX_CODE_DRAWS => {
                    warn!(user_id, draw, "Activation code collision, drawing again");
                    draw += 1;
                }
                Err(e) => return Err(AccountError::upstream("replace activation")(e)),
            }
        }
    }

    /// Redeem an activation code. Each code activates its user at most once.
    pub async fn verify_and_activate(&self, code: &str) -> Result<()> {
        let result = self.verify_and_activate_inner(code).await;
        metrics::record_activation(&result);
        result
    }

    async fn verify_and_activate_inner(&self, code: &str) -> Result<()> {
        if !is_well_formed_code(code) {
            return Err(AccountError::InvalidOrExpired);
        }

        let record = self
            .activations
            .get_by_code(code)
            .await
            .map_err(AccountError::upstream("look up activation code"))?
            .ok_or(AccountError::InvalidOrExpired)?;

        let now = Utc::now();
        // Expired records stay until the next register call replaces them
        if record.is_expired_at(now) {
            info!(user_id = record.user_id, "Activation code expired");
            return Err(AccountError::InvalidOrExpired);
        }

        let mut tx = self
            .db
            .begin()
            .await
            .map_err(AccountError::upstream("begin transaction"))?;

        if let Err(e) = self.activate_in_transaction(&record, now, &mut tx).await {
            if let Err(rollback_err) = self.db.rollback(tx).await {
                warn!(user_id = record.user_id, error = %rollback_err, "Rollback failed");
            }
            return Err(e);
        }

        self.db
            .commit(tx)
            .await
            .map_err(AccountError::upstream("commit activation"))?;

        info!(user_id = record.user_id, "User activated");
        Ok(())
    }

    async fn activate_in_transaction(
        &self,
        record: &ActivationRecord,
        now: DateTime<Utc>,
        tx: &mut D::Tx,
    ) -> Result<()> {
        // Zero rows means the code was consumed or replaced since the lookup
        let deleted = self
            .activations
            .delete_by_user_id(record.user_id, &record.code, tx)
            .await
            .map_err(AccountError::upstream("delete activation"))?;
        if deleted == 0 {
            debug!(user_id = record.user_id, "Activation code no longer current");
            return Err(AccountError::InvalidOrExpired);
        }

        let updated = self
            .users
            .update_in_transaction(&UserUpdate::activate(record.user_id, now), tx)
            .await
            .map_err(AccountError::upstream("activate user"))?;
        if updated == 0 {
            debug!(user_id = record.user_id, "User missing or already active");
            return Err(AccountError::InvalidOrExpired);
        }

        let event = UserActivatedEvent::new(record.user_id, now);
        let payload = event
            .to_bytes()
            .map_err(AccountError::upstream("encode user activated event"))?;
        self.publisher
            .produce(
                &self.config.user_activated_topic,
                &event.partition_key(),
                &payload,
            )
            .await
            .map_err(AccountError::upstream("publish user activated event"))?;

        Ok(())
    }
}
