/// Credential check and session token issuance
use crate::db::{Database, UserStore};
use crate::error::{AccountError, Result};
use crate::models::UserStatus;
use crate::security::{AccessToken, CredentialError, CredentialVerifier, TokenIssuer};
use crate::validators::mask_email;
use std::sync::Arc;
use tracing::{info, warn};

pub struct LoginService<D: Database> {
    users: Arc<dyn UserStore<D::Tx>>,
    credentials: Arc<dyn CredentialVerifier>,
    tokens: Arc<dyn TokenIssuer>,
}

impl<D: Database> LoginService<D> {
    pub fn new(
        users: Arc<dyn UserStore<D::Tx>>,
        credentials: Arc<dyn CredentialVerifier>,
        tokens: Arc<dyn TokenIssuer>,
    ) -> Self {
        Self {
            users,
            credentials,
            tokens,
        }
    }

    /// Only active users may authenticate
    pub async fn login(&self, email: &str, password: &str) -> Result<AccessToken> {
        let user = self
            .users
            .get_by_email(email)
            .await
            .map_err(AccountError::upstream("look up user"))?
            .ok_or_else(|| AccountError::NotFound("user".to_string()))?;

        match self.credentials.verify(&user.password_hash, password) {
            Ok(()) => {}
            Err(CredentialError::Mismatch) => {
                warn!(user_id = user.id, "Login failed: invalid password");
                return Err(AccountError::Mismatch);
            }
            Err(e) => return Err(AccountError::upstream("verify password")(e)),
        }

        if user.status != UserStatus::Active {
            warn!(user_id = user.id, email = %mask_email(email), "Login before activation");
            return Err(AccountError::NotActivated);
        }

        let token = self
            .tokens
            .issue(user.id)
            .map_err(AccountError::upstream("issue access token"))?;

        info!(user_id = user.id, "User logged in");
        Ok(token)
    }
}
