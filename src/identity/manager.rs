use chrono::Utc;
use log::{debug, info, warn};

use super::{Token, TokenRetriever, TokenStore};
use crate::error::Result;

/// Hands out a usable token, reusing the stored one while it is valid,
/// refreshing it when possible and signing in again otherwise.
pub struct IdentityManager {
    store: Box<dyn TokenStore>,
    retriever: Box<dyn TokenRetriever>,
}

impl IdentityManager {
    pub fn new(store: Box<dyn TokenStore>, retriever: Box<dyn TokenRetriever>) -> Self {
        Self { store, retriever }
    }

    pub async fn get_token(&mut self) -> Result<Token> {
        let cached = self.store.load()?;

        if let Some(token) = &cached {
            if token.is_valid_at(Utc::now()) {
                info!("Using cached token (expires at {})", token.expires_at().to_rfc3339());
                return Ok(token.clone());
            }
            debug!("Cached token expired at {}", token.expires_at().to_rfc3339());
        }

        let token = match cached.as_ref().and_then(Token::refresh_credential) {
            Some(refresh_token) => match self.retriever.refresh_token(refresh_token).await {
                Ok(token) => {
                    debug!("Refresh token accepted");
                    token
                }
                Err(e) => {
                    warn!("Token refresh failed, signing in again: {}", e);
                    self.retriever.get_token().await?
                }
            },
            None => self.retriever.get_token().await?,
        };

        info!("Generated new token (expires at {})", token.expires_at().to_rfc3339());
        self.store.store(&token)?;

        Ok(token)
    }
}
