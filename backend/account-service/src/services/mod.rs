/// Business logic layer for account-service
///
/// ## Services
///
/// - **registration**: Register / VerifyAndActivate workflow
/// - **login**: credential check and token issuance
/// - **profile**: profile read and update
/// - **address**: shipping address management
/// - **email**: activation code delivery over SMTP
/// - **kafka_events**: user activated events over Kafka
pub mod address;
pub mod email;
pub mod kafka_events;
pub mod login;
pub mod profile;
pub mod registration;

pub use address::AddressService;
pub use email::{EmailService, MailError, Notifier};
pub use kafka_events::{EventPublisher, KafkaEventProducer, NoopEventPublisher, PublishError};
pub use login::LoginService;
pub use profile::ProfileService;
pub use registration::{
    RegistrationConfig, RegistrationReceipt, RegistrationService, ACTIVATION_EMAIL_SUBJECT,
};
