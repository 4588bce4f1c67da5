//! Data models for accounts, activation codes and addresses

pub mod activation;
pub mod address;
pub mod events;
pub mod user;

pub use activation::{ActivationRecord, NewActivation};
pub use address::{AddressInput, AddressUpdate, AddressView, NewAddress, UserAddress};
pub use events::UserActivatedEvent;
pub use user::{NewUser, User, UserProfile, UserStatus, UserUpdate};
