use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub database_url: String,
    pub cashfree: CashfreeConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CashfreeConfig {
    pub base_url: String,
    pub app_id: String,
    pub secret_key: String,
    pub webhook_secret: String,
    pub return_url: String,
    pub notify_url: String,
}

impl Config {
    pub fn from_env() -> Result<Self, env::VarError> {
        Ok(Config {
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "file://gym-booking.db".to_string()),

            cashfree: CashfreeConfig {
                base_url: env::var("CASHFREE_BASE_URL")
                    .unwrap_or_else(|_| "https://sandbox.cashfree.com/pg".to_string()),
                app_id: env::var("CASHFREE_APP_ID")?,
                secret_key: env::var("CASHFREE_SECRET_KEY")?,
                webhook_secret: env::var("CASHFREE_WEBHOOK_SECRET")?,
                return_url: env::var("CASHFREE_RETURN_URL")?,
                notify_url: env::var("CASHFREE_NOTIFY_URL")?,
            },
        })
    }
}
