//! Central application state
//!
//! The only place where dependencies are wired. Transport adapters receive a
//! clone of [`AppState`] and call the services on it.

use crate::config::Settings;
use crate::db::{PgActivationStore, PgAddressStore, PgDatabase, PgTx, PgUserStore, UserStore};
use crate::security::{
    Argon2CredentialVerifier, CredentialVerifier, JwtTokenIssuer, OsRngCodeGenerator,
};
use crate::services::{
    AddressService, EmailService, EventPublisher, KafkaEventProducer, LoginService,
    NoopEventPublisher, ProfileService, RegistrationConfig, RegistrationService,
};
use anyhow::{Context, Result};
use chrono::Duration;
use sqlx::PgPool;
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub settings: Arc<Settings>,
    pub registration: Arc<RegistrationService<PgDatabase>>,
    pub login: Arc<LoginService<PgDatabase>>,
    pub profile: Arc<ProfileService<PgDatabase>>,
    pub addresses: Arc<AddressService>,
}

impl AppState {
    pub fn initialize(pool: PgPool, settings: Settings) -> Result<Self> {
        info!("Initializing application state");

        let users: Arc<dyn UserStore<PgTx>> = Arc::new(PgUserStore::new(pool.clone()));
        let activations = Arc::new(PgActivationStore::new(pool.clone()));
        let addresses = Arc::new(PgAddressStore::new(pool.clone()));
        let credentials: Arc<dyn CredentialVerifier> = Arc::new(Argon2CredentialVerifier);

        let notifier = Arc::new(
            EmailService::new(&settings.email).context("Failed to initialize email service")?,
        );

        let publisher: Arc<dyn EventPublisher> = if settings.kafka.is_enabled() {
            let producer = KafkaEventProducer::new(&settings.kafka)
                .context("Failed to initialize Kafka producer")?;
            info!(brokers = ?settings.kafka.brokers, "Kafka producer initialized");
            Arc::new(producer)
        } else {
            info!("Kafka brokers not configured; running without event publishing");
            Arc::new(NoopEventPublisher)
        };

        let tokens = Arc::new(JwtTokenIssuer::new(
            &settings.jwt.secret,
            Duration::seconds(settings.jwt.expiry_seconds),
        ));

        let registration = RegistrationService::new(
            Arc::new(PgDatabase::new(pool.clone())),
            users.clone(),
            activations,
            credentials.clone(),
            Arc::new(OsRngCodeGenerator),
            notifier,
            publisher,
            RegistrationConfig {
                activation_ttl: Duration::seconds(settings.activation.code_ttl_seconds),
                user_activated_topic: settings.kafka.user_activated_topic.clone(),
            },
        );
        let login = LoginService::<PgDatabase>::new(users.clone(), credentials, tokens);
        let profile = ProfileService::<PgDatabase>::new(users, addresses.clone());
        let address_service = AddressService::new(addresses);

        Ok(Self {
            db: pool,
            settings: Arc::new(settings),
            registration: Arc::new(registration),
            login: Arc::new(login),
            profile: Arc::new(profile),
            addresses: Arc::new(address_service),
        })
    }
}
