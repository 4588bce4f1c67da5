// Shared fixtures for account-service integration tests
#![allow(dead_code)]

use account_service::db::{ActivationStore, MemoryBackend, MemoryTx, UserStore};
use account_service::error::StoreResult;
use account_service::models::{ActivationRecord, NewActivation, NewUser, User, UserUpdate};
use account_service::security::{Argon2CredentialVerifier, CodeGenerator, OsRngCodeGenerator};
use account_service::services::{
    EventPublisher, MailError, Notifier, PublishError, RegistrationConfig, RegistrationService,
};
use async_trait::async_trait;
use rdkafka::error::{KafkaError, RDKafkaErrorCode};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

const CODE_PREFIX: &str = "Your activation code is: ";

#[derive(Debug, Clone)]
pub struct SentMail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Notifier that keeps every message
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<SentMail>>,
}

impl RecordingNotifier {
    pub fn sent(&self) -> Vec<SentMail> {
        self.sent.lock().unwrap().clone()
    }

    /// Code from the most recent mail to `to`
    pub fn last_code_for(&self, to: &str) -> Option<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|m| m.to == to)
            .and_then(|m| m.body.strip_prefix(CODE_PREFIX))
            .map(str::to_string)
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, body: &str, to: &str, subject: &str) -> Result<(), MailError> {
        self.sent.lock().unwrap().push(SentMail {
            to: to.to_string(),
            subject: subject.to_string(),
            body: body.to_string(),
        });
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct PublishedEvent {
    pub topic: String,
    pub key: String,
    pub payload: serde_json::Value,
}

/// Publisher that keeps every accepted event and can be switched to fail
#[derive(Default)]
pub struct RecordingPublisher {
    events: Mutex<Vec<PublishedEvent>>,
    failing: AtomicBool,
}

impl RecordingPublisher {
    pub fn events(&self) -> Vec<PublishedEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl EventPublisher for RecordingPublisher {
    async fn produce(&self, topic: &str, key: &str, payload: &[u8]) -> Result<(), PublishError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(PublishError::Delivery {
                topic: topic.to_string(),
                source: KafkaError::MessageProduction(RDKafkaErrorCode::MessageTimedOut),
            });
        }
        self.events.lock().unwrap().push(PublishedEvent {
            topic: topic.to_string(),
            key: key.to_string(),
            payload: serde_json::from_slice(payload).unwrap(),
        });
        Ok(())
    }
}

/// Deterministic codes 100000, 100001, ...
#[derive(Default)]
pub struct SequentialCodes {
    next: AtomicU32,
}

impl CodeGenerator for SequentialCodes {
    fn generate(&self) -> Result<String, rand::Error> {
        let n = self.next.fetch_add(1, Ordering::SeqCst);
        Ok(format!("{:06}", 100_000 + n))
    }
}

/// User store that never finds anyone by email, simulating a concurrent
/// registration that inserted between lookup and create
pub struct BlindLookupUsers(pub MemoryBackend);

#[async_trait]
impl UserStore<MemoryTx> for BlindLookupUsers {
    async fn create(&self, user: &NewUser) -> StoreResult<i64> {
        UserStore::create(&self.0, user).await
    }

    async fn get_by_email(&self, _email: &str) -> StoreResult<Option<User>> {
        Ok(None)
    }

    async fn get_by_id(&self, id: i64) -> StoreResult<Option<User>> {
        UserStore::get_by_id(&self.0, id).await
    }

    async fn update(&self, update: &UserUpdate) -> StoreResult<u64> {
        UserStore::update(&self.0, update).await
    }

    async fn update_in_transaction(&self, update: &UserUpdate, tx: &mut MemoryTx) -> StoreResult<u64> {
        self.0.update_in_transaction(update, tx).await
    }
}

/// Activation store that reissues the user's code right after a lookup,
/// simulating a registration retry landing between lookup and activation
pub struct ReissueAfterLookup {
    pub db: MemoryBackend,
    pub next_code: String,
    reissued: AtomicBool,
}

impl ReissueAfterLookup {
    pub fn new(db: MemoryBackend, next_code: &str) -> Self {
        Self {
            db,
            next_code: next_code.to_string(),
            reissued: AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl ActivationStore<MemoryTx> for ReissueAfterLookup {
    async fn replace(&self, activation: &NewActivation) -> StoreResult<ActivationRecord> {
        self.db.replace(activation).await
    }

    async fn get_by_code(&self, code: &str) -> StoreResult<Option<ActivationRecord>> {
        let found = self.db.get_by_code(code).await?;
        if let Some(record) = &found {
            if !self.reissued.swap(true, Ordering::SeqCst) {
                let now = chrono::Utc::now();
                let ttl = record.expires_at - record.created_at;
                self.db
                    .replace(&NewActivation::issue(
                        record.user_id,
                        self.next_code.clone(),
                        now,
                        ttl,
                    ))
                    .await?;
            }
        }
        Ok(found)
    }

    async fn delete_by_user_id(
        &self,
        user_id: i64,
        code: &str,
        tx: &mut MemoryTx,
    ) -> StoreResult<u64> {
        self.db.delete_by_user_id(user_id, code, tx).await
    }
}

pub struct Harness {
    pub db: MemoryBackend,
    pub notifier: Arc<RecordingNotifier>,
    pub publisher: Arc<RecordingPublisher>,
    pub service: Arc<RegistrationService<MemoryBackend>>,
}

impl Harness {
    pub fn new() -> Self {
        Self::build(Arc::new(OsRngCodeGenerator), None)
    }

    pub fn sequential() -> Self {
        Self::build(Arc::new(SequentialCodes::default()), None)
    }

    pub fn with_users(db: MemoryBackend, users: Arc<dyn UserStore<MemoryTx>>) -> Self {
        Self::build_on(db, Arc::new(OsRngCodeGenerator), Some(users), None)
    }

    pub fn with_activations(
        db: MemoryBackend,
        activations: Arc<dyn ActivationStore<MemoryTx>>,
    ) -> Self {
        Self::build_on(db, Arc::new(SequentialCodes::default()), None, Some(activations))
    }

    fn build(codes: Arc<dyn CodeGenerator>, users: Option<Arc<dyn UserStore<MemoryTx>>>) -> Self {
        Self::build_on(MemoryBackend::new(), codes, users, None)
    }

    fn build_on(
        db: MemoryBackend,
        codes: Arc<dyn CodeGenerator>,
        users: Option<Arc<dyn UserStore<MemoryTx>>>,
        activations: Option<Arc<dyn ActivationStore<MemoryTx>>>,
    ) -> Self {
        let notifier = Arc::new(RecordingNotifier::default());
        let publisher = Arc::new(RecordingPublisher::default());
        let backend = Arc::new(db.clone());
        let users: Arc<dyn UserStore<MemoryTx>> = match users {
            Some(users) => users,
            None => backend.clone(),
        };
        let activations: Arc<dyn ActivationStore<MemoryTx>> = match activations {
            Some(activations) => activations,
            None => backend.clone(),
        };

        let service = RegistrationService::<MemoryBackend>::new(
            backend.clone(),
            users,
            activations,
            Arc::new(Argon2CredentialVerifier),
            codes,
            notifier.clone(),
            publisher.clone(),
            RegistrationConfig::default(),
        );

        Self {
            db,
            notifier,
            publisher,
            service: Arc::new(service),
        }
    }

    pub async fn user(&self, email: &str) -> Option<User> {
        UserStore::get_by_email(&self.db, email).await.unwrap()
    }
}
