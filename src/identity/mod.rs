//! Token lifecycle: issue, persist, reuse, refresh.

mod manager;
mod retriever;
mod store;
mod token;

use std::fmt;

use crate::error::{Error, Result};

pub use manager::IdentityManager;
pub use retriever::{
    FirebaseRetriever, TokenRetriever, DEFAULT_IDENTITY_ENDPOINT, DEFAULT_TOKEN_ENDPOINT,
};
pub use store::{default_token_path, FileTokenStore, MemoryTokenStore, TokenStore};
pub use token::{Token, EXPIRY_SAFETY_FACTOR};

/// Credentials used to sign in. Held in memory only, never persisted.
#[derive(Clone)]
pub struct IdentityConfig {
    pub username: String,
    pub password: String,
    pub web_api_key: String,
}

impl IdentityConfig {
    pub fn new(
        username: impl Into<String>,
        password: impl Into<String>,
        web_api_key: impl Into<String>,
    ) -> Result<Self> {
        let config = Self {
            username: username.into(),
            password: password.into(),
            web_api_key: web_api_key.into(),
        };

        if config.username.trim().is_empty() {
            return Err(Error::Config(
                "Username is required. Provide via --username or WS_USERNAME.".to_string(),
            ));
        }
        if config.password.is_empty() {
            return Err(Error::Config(
                "Password is required. Provide via --password or WS_PASSWORD.".to_string(),
            ));
        }
        if config.web_api_key.trim().is_empty() {
            return Err(Error::Config(
                "Web API key is required. Provide via --web-api-key or WS_WEB_API_KEY.".to_string(),
            ));
        }

        Ok(config)
    }
}

impl fmt::Debug for IdentityConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IdentityConfig")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("web_api_key", &self.web_api_key)
            .finish()
    }
}
