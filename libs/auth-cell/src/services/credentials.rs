use std::sync::Arc;

use chrono::{Duration, Utc};
use notification_cell::NotificationGateway;
use shared_config::AppConfig;
use shared_models::auth::{TOKEN_PURPOSE_SESSION, TOKEN_PURPOSE_VERIFY_EMAIL};
use shared_store::records::{PatientRecord, PractitionerRecord};
use shared_store::{AccountStore, StoreError};
use shared_utils::ids::{generate_id, generate_signup_key, generate_token};
use shared_utils::jwt::{issue_token, validate_claims};
use tracing::{info, warn};

use crate::models::{
    AuthError, LoginRequest, LoginResponse, RegisterRequest, RegisterResponse,
    SignupKeyResponse,
};
use crate::services::password;

pub struct CredentialsService {
    config: Arc<AppConfig>,
    store: Arc<dyn AccountStore>,
    notifier: Arc<dyn NotificationGateway>,
}

impl CredentialsService {
    pub fn new(
        config: Arc<AppConfig>,
        store: Arc<dyn AccountStore>,
        notifier: Arc<dyn NotificationGateway>,
    ) -> Self {
        Self {
            config,
            store,
            notifier,
        }
    }

    fn validate_registration(request: &RegisterRequest) -> Result<(), AuthError> {
        if request.name.trim().is_empty() {
            return Err(AuthError::Validation("Name is required".to_string()));
        }
        if !request.email.contains('@') || request.email.trim().is_empty() {
            return Err(AuthError::Validation("Invalid email format".to_string()));
        }
        if request.password.len() < 6 {
            return Err(AuthError::Validation(
                "Password must be at least 6 characters".to_string(),
            ));
        }
        Ok(())
    }

    /// Create an account, email a verification link and hand back a
    /// short-lived verification token. A signup key in the request makes
    /// this a practitioner registration and consumes the key.
    pub async fn register(&self, request: RegisterRequest) -> Result<RegisterResponse, AuthError> {
        Self::validate_registration(&request)?;

        if self
            .store
            .find_account_by_email(&request.email)
            .await?
            .is_some()
        {
            return Err(AuthError::DuplicateAccount);
        }

        let account_id = generate_id();
        let password_hash =
            password::hash_password(&request.password).map_err(|e| AuthError::Hash(e.to_string()))?;
        let verification_token = generate_token();

        if let Some(key) = &request.practitioner_key {
            if !self.store.claim_signup_key(key, &account_id).await? {
                return Err(AuthError::InvalidKey);
            }
            let record = PractitionerRecord::new(
                account_id.clone(),
                request.name.clone(),
                request.email.clone(),
                password_hash,
                verification_token,
            );
            self.store.create_practitioner(record).await.map_err(|e| match e {
                StoreError::DuplicateEmail => AuthError::DuplicateAccount,
                other => AuthError::Store(other),
            })?;
        } else {
            let record = PatientRecord::new(
                account_id.clone(),
                request.name.clone(),
                request.email.clone(),
                password_hash,
                verification_token,
            );
            self.store.create_patient(record).await.map_err(|e| match e {
                StoreError::DuplicateEmail => AuthError::DuplicateAccount,
                other => AuthError::Store(other),
            })?;
        }

        let token = issue_token(
            &account_id,
            Some(&request.email),
            None,
            TOKEN_PURPOSE_VERIFY_EMAIL,
            Duration::hours(1),
            &self.config.jwt_secret,
        )
        .map_err(AuthError::Token)?;

        let verify_url = format!("{}/verify/{}", self.config.web_url, token);
        self.notifier
            .send_verification(&request.email, &verify_url)
            .await;

        info!("Registered account {}", account_id);
        Ok(RegisterResponse { token, account_id })
    }

    pub async fn login(&self, request: LoginRequest) -> Result<LoginResponse, AuthError> {
        if !request.email.contains('@') {
            return Err(AuthError::Validation("Invalid email format".to_string()));
        }
        if request.password.len() < 6 {
            return Err(AuthError::Validation(
                "Password must be at least 6 characters".to_string(),
            ));
        }

        // Same error for unknown email and wrong password.
        let account = self
            .store
            .find_account_by_email(&request.email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        let matches = password::verify_password(&request.password, account.password_hash())
            .map_err(|e| AuthError::Hash(e.to_string()))?;
        if !matches {
            return Err(AuthError::InvalidCredentials);
        }

        let token = issue_token(
            account.account_id(),
            Some(account.email()),
            Some(account.role().as_str()),
            TOKEN_PURPOSE_SESSION,
            Duration::days(1),
            &self.config.jwt_secret,
        )
        .map_err(AuthError::Token)?;

        Ok(LoginResponse {
            name: account.display_name().to_string(),
            token,
        })
    }

    /// Redeem a verification token from the registration email.
    pub async fn verify_email(&self, token: &str) -> Result<(), AuthError> {
        let claims = validate_claims(token, &self.config.jwt_secret)
            .map_err(|_| AuthError::InvalidToken)?;

        if claims.purpose.as_deref() != Some(TOKEN_PURPOSE_VERIFY_EMAIL) {
            return Err(AuthError::InvalidToken);
        }

        self.store.mark_verified(&claims.sub).await.map_err(|e| match e {
            StoreError::NotFound => AuthError::InvalidToken,
            other => AuthError::Store(other),
        })?;

        info!("Verified email for account {}", claims.sub);
        Ok(())
    }

    pub async fn forgot_password(&self, email: &str) -> Result<(), AuthError> {
        let account = self
            .store
            .find_account_by_email(email)
            .await?
            .ok_or(AuthError::AccountNotFound)?;

        let reset_token = generate_token();
        let expires_at = Utc::now() + Duration::hours(1);
        self.store
            .set_reset_token(account.account_id(), &reset_token, expires_at)
            .await?;

        let reset_url = format!("{}/resetPassword/{}", self.config.web_url, reset_token);
        self.notifier.send_password_reset(email, &reset_url).await;

        Ok(())
    }

    pub async fn reset_password(&self, token: &str, new_password: &str) -> Result<(), AuthError> {
        if new_password.len() < 6 {
            return Err(AuthError::Validation(
                "Password must be at least 6 characters".to_string(),
            ));
        }

        let account = self
            .store
            .find_account_by_reset_token(token)
            .await?
            .ok_or(AuthError::InvalidToken)?;

        match account.reset_token_expires_at() {
            Some(expires_at) if expires_at > Utc::now() => {}
            _ => {
                warn!(
                    "Rejected expired reset token for account {}",
                    account.account_id()
                );
                return Err(AuthError::InvalidToken);
            }
        }

        let password_hash =
            password::hash_password(new_password).map_err(|e| AuthError::Hash(e.to_string()))?;
        self.store
            .reset_password(account.account_id(), &password_hash)
            .await?;

        info!("Password reset for account {}", account.account_id());
        Ok(())
    }

    /// Mint a single-use practitioner signup key and the registration link
    /// that carries it.
    pub async fn mint_signup_key(&self) -> Result<SignupKeyResponse, AuthError> {
        let key = generate_signup_key();
        self.store.create_signup_key(&key).await?;
        let url = format!("{}/register#{}", self.config.web_url, key);
        Ok(SignupKeyResponse { key, url })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use shared_store::memory::MemoryStore;
    use tokio::sync::Mutex;

    #[derive(Default)]
    struct RecordingMailer {
        sent: Mutex<Vec<(String, String)>>,
    }

    #[async_trait]
    impl NotificationGateway for RecordingMailer {
        async fn send_verification(&self, to: &str, verify_url: &str) {
            self.sent
                .lock()
                .await
                .push(("verification".to_string(), format!("{to} {verify_url}")));
        }
        async fn send_password_reset(&self, to: &str, reset_url: &str) {
            self.sent
                .lock()
                .await
                .push(("reset".to_string(), format!("{to} {reset_url}")));
        }
        async fn send_booking_confirmation(&self, _: &str, _: &str, _: &str, _: &str) {}
        async fn send_cancellation(&self, _: &str, _: &str) {}
    }

    fn service() -> (CredentialsService, Arc<MemoryStore>, Arc<RecordingMailer>) {
        let config = Arc::new(AppConfig {
            jwt_secret: "test-secret".to_string(),
            web_url: "https://clinic.test".to_string(),
            ..AppConfig::default()
        });
        let store = Arc::new(MemoryStore::new());
        let mailer = Arc::new(RecordingMailer::default());
        (
            CredentialsService::new(config, store.clone(), mailer.clone()),
            store,
            mailer,
        )
    }

    fn patient_request(email: &str) -> RegisterRequest {
        RegisterRequest {
            name: "Jo Patient".to_string(),
            email: email.to_string(),
            password: "secret123".to_string(),
            practitioner_key: None,
        }
    }

    #[tokio::test]
    async fn register_login_round_trip() {
        let (service, _, mailer) = service();

        let registered = service.register(patient_request("jo@x.com")).await.unwrap();
        assert_eq!(registered.account_id.len(), 24);
        assert_eq!(mailer.sent.lock().await.len(), 1);

        let session = service
            .login(LoginRequest {
                email: "jo@x.com".to_string(),
                password: "secret123".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(session.name, "Jo Patient");
        assert!(!session.token.is_empty());
    }

    #[tokio::test]
    async fn duplicate_email_conflicts() {
        let (service, _, _) = service();
        service.register(patient_request("jo@x.com")).await.unwrap();
        let err = service
            .register(patient_request("jo@x.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::DuplicateAccount));
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_email_look_identical() {
        let (service, _, _) = service();
        service.register(patient_request("jo@x.com")).await.unwrap();

        let wrong_password = service
            .login(LoginRequest {
                email: "jo@x.com".to_string(),
                password: "not-the-one".to_string(),
            })
            .await
            .unwrap_err();
        let unknown_email = service
            .login(LoginRequest {
                email: "ghost@x.com".to_string(),
                password: "secret123".to_string(),
            })
            .await
            .unwrap_err();

        assert_eq!(wrong_password.to_string(), unknown_email.to_string());
    }

    #[tokio::test]
    async fn practitioner_registration_requires_valid_key() {
        let (service, store, _) = service();

        let bad = RegisterRequest {
            practitioner_key: Some("00000000".to_string()),
            ..patient_request("dr@x.com")
        };
        assert!(matches!(
            service.register(bad).await.unwrap_err(),
            AuthError::InvalidKey
        ));

        let minted = service.mint_signup_key().await.unwrap();
        let good = RegisterRequest {
            practitioner_key: Some(minted.key.clone()),
            ..patient_request("dr@x.com")
        };
        let registered = service.register(good).await.unwrap();
        assert!(store
            .find_practitioner(&registered.account_id)
            .await
            .unwrap()
            .is_some());

        // Key is single use.
        let again = RegisterRequest {
            practitioner_key: Some(minted.key),
            ..patient_request("dr2@x.com")
        };
        assert!(matches!(
            service.register(again).await.unwrap_err(),
            AuthError::InvalidKey
        ));
    }

    #[tokio::test]
    async fn verification_token_marks_account_verified() {
        let (service, store, _) = service();
        let registered = service.register(patient_request("jo@x.com")).await.unwrap();

        let before = store.find_patient(&registered.account_id).await.unwrap().unwrap();
        assert!(!before.verified);

        service.verify_email(&registered.token).await.unwrap();

        let after = store.find_patient(&registered.account_id).await.unwrap().unwrap();
        assert!(after.verified);
        assert!(after.verification_token.is_none());
    }

    #[tokio::test]
    async fn session_token_is_not_a_verification_token() {
        let (service, _, _) = service();
        service.register(patient_request("jo@x.com")).await.unwrap();
        let session = service
            .login(LoginRequest {
                email: "jo@x.com".to_string(),
                password: "secret123".to_string(),
            })
            .await
            .unwrap();

        assert!(matches!(
            service.verify_email(&session.token).await.unwrap_err(),
            AuthError::InvalidToken
        ));
    }

    #[tokio::test]
    async fn password_reset_flow() {
        let (service, store, mailer) = service();
        let registered = service.register(patient_request("jo@x.com")).await.unwrap();

        service.forgot_password("jo@x.com").await.unwrap();
        assert_eq!(mailer.sent.lock().await.len(), 2);

        let token = store
            .find_patient(&registered.account_id)
            .await
            .unwrap()
            .unwrap()
            .reset_token
            .unwrap();

        service.reset_password(&token, "newsecret").await.unwrap();

        assert!(service
            .login(LoginRequest {
                email: "jo@x.com".to_string(),
                password: "newsecret".to_string(),
            })
            .await
            .is_ok());

        // Token is cleared after use.
        assert!(matches!(
            service.reset_password(&token, "again123").await.unwrap_err(),
            AuthError::InvalidToken
        ));
    }

    #[tokio::test]
    async fn forgot_password_for_unknown_email_is_not_found() {
        let (service, _, _) = service();
        assert!(matches!(
            service.forgot_password("ghost@x.com").await.unwrap_err(),
            AuthError::AccountNotFound
        ));
    }
}
