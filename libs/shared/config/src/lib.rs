use std::env;
use tracing::warn;

#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    pub jwt_secret: String,
    pub stripe_secret_key: String,
    pub stripe_webhook_secret: String,
    pub stripe_api_base_url: String,
    pub meeting_api_key: String,
    pub meeting_api_base_url: String,
    pub mail_api_url: String,
    pub mail_api_key: String,
    pub mail_from: String,
    pub web_url: String,
}

fn env_or_empty(key: &str) -> String {
    env::var(key).unwrap_or_else(|_| {
        warn!("{} not set, using empty value", key);
        String::new()
    })
}

impl AppConfig {
    pub fn from_env() -> Self {
        let config = Self {
            jwt_secret: env_or_empty("JWT_SECRET"),
            stripe_secret_key: env_or_empty("STRIPE_SECRET_KEY"),
            stripe_webhook_secret: env_or_empty("STRIPE_WEBHOOK_SECRET"),
            stripe_api_base_url: env::var("STRIPE_API_BASE_URL")
                .unwrap_or_else(|_| "https://api.stripe.com".to_string()),
            meeting_api_key: env_or_empty("MEETING_API_KEY"),
            meeting_api_base_url: env::var("MEETING_API_BASE_URL")
                .unwrap_or_else(|_| "https://api.whereby.dev/v1".to_string()),
            mail_api_url: env_or_empty("MAIL_API_URL"),
            mail_api_key: env_or_empty("MAIL_API_KEY"),
            mail_from: env_or_empty("MAIL_FROM"),
            web_url: env_or_empty("WEB_URL"),
        };

        if !config.is_configured() {
            warn!("Application not fully configured - missing environment variables");
        }

        config
    }

    pub fn is_configured(&self) -> bool {
        !self.jwt_secret.is_empty() && !self.web_url.is_empty()
    }

    pub fn is_payments_configured(&self) -> bool {
        !self.stripe_secret_key.is_empty() && !self.stripe_webhook_secret.is_empty()
    }

    pub fn is_meetings_configured(&self) -> bool {
        !self.meeting_api_key.is_empty() && !self.meeting_api_base_url.is_empty()
    }

    pub fn is_mail_configured(&self) -> bool {
        !self.mail_api_url.is_empty() && !self.mail_from.is_empty()
    }
}
