use async_trait::async_trait;
use log::debug;
use serde::{Deserialize, Serialize};

use super::token::lifetime_seconds;
use super::{IdentityConfig, Token};
use crate::error::{Error, Result};

pub const DEFAULT_IDENTITY_ENDPOINT: &str = "https://identitytoolkit.googleapis.com";
pub const DEFAULT_TOKEN_ENDPOINT: &str = "https://securetoken.googleapis.com";

const SIGN_IN_PATH: &str = "/v1/accounts:signInWithPassword";
const REFRESH_PATH: &str = "/v1/token";
const CLIENT_TYPE: &str = "CLIENT_TYPE_WEB";

/// Exchanges credentials with the identity provider.
#[async_trait]
pub trait TokenRetriever: Send + Sync {
    /// Sign in with the configured username and password.
    async fn get_token(&self) -> Result<Token>;

    async fn refresh_token(&self, refresh_token: &str) -> Result<Token>;
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SignInRequest<'a> {
    email: &'a str,
    password: &'a str,
    client_type: &'a str,
    return_secure_token: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignInResponse {
    id_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    expires_in: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    local_id: Option<String>,
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    kind: Option<String>,
    #[serde(default)]
    registered: bool,
}

#[derive(Serialize)]
struct RefreshRequest<'a> {
    grant_type: &'a str,
    refresh_token: &'a str,
}

#[derive(Deserialize)]
struct RefreshResponse {
    id_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    expires_in: String,
    #[serde(default)]
    user_id: Option<String>,
}

/// Retriever for the Firebase-style identity toolkit used by the Wavin cloud.
pub struct FirebaseRetriever {
    client: reqwest::Client,
    config: IdentityConfig,
    identity_endpoint: String,
    token_endpoint: String,
}

impl FirebaseRetriever {
    pub fn new(client: reqwest::Client, config: IdentityConfig) -> Self {
        Self::new_with_endpoints(
            client,
            config,
            DEFAULT_IDENTITY_ENDPOINT.to_string(),
            DEFAULT_TOKEN_ENDPOINT.to_string(),
        )
    }

    pub fn new_with_endpoints(
        client: reqwest::Client,
        config: IdentityConfig,
        identity_endpoint: String,
        token_endpoint: String,
    ) -> Self {
        Self {
            client,
            config,
            identity_endpoint: identity_endpoint.trim_end_matches('/').to_string(),
            token_endpoint: token_endpoint.trim_end_matches('/').to_string(),
        }
    }

    async fn post<B: Serialize + Sync>(&self, url: &str, body: &B) -> Result<String> {
        let response = self
            .client
            .post(url)
            .query(&[("key", self.config.web_api_key.as_str())])
            .json(body)
            .send()
            .await?;

        let status = response.status();
        let response_text = response.text().await?;

        if status.is_success() {
            Ok(response_text)
        } else {
            debug!("Identity request to {} failed with status: {}", url, status);
            Err(Error::Auth {
                status: status.as_u16(),
                body: response_text,
            })
        }
    }
}

fn parse_lifetime(expires_in: &str) -> Result<u64> {
    lifetime_seconds::parse(expires_in).map_err(Error::InvalidResponse)
}

#[async_trait]
impl TokenRetriever for FirebaseRetriever {
    async fn get_token(&self) -> Result<Token> {
        let request = SignInRequest {
            email: &self.config.username,
            password: &self.config.password,
            client_type: CLIENT_TYPE,
            return_secure_token: true,
        };

        let url = format!("{}{}", self.identity_endpoint, SIGN_IN_PATH);
        let body = self.post(&url, &request).await?;
        let response: SignInResponse = serde_json::from_str(&body)?;
        let lifetime = parse_lifetime(&response.expires_in)?;

        debug!("Authentication successful for user: {}", self.config.username);

        let mut token = Token::issued(response.id_token, lifetime)?;
        token.refresh_token = response.refresh_token;
        token.email = response.email;
        token.local_id = response.local_id;
        token.display_name = response.display_name;
        token.kind = response.kind;
        token.registered = response.registered;
        Ok(token)
    }

    async fn refresh_token(&self, refresh_token: &str) -> Result<Token> {
        let request = RefreshRequest {
            grant_type: "refresh_token",
            refresh_token,
        };

        let url = format!("{}{}", self.token_endpoint, REFRESH_PATH);
        let body = self.post(&url, &request).await?;
        let response: RefreshResponse = serde_json::from_str(&body)?;
        let lifetime = parse_lifetime(&response.expires_in)?;

        debug!("Token refreshed for user: {}", self.config.username);

        // Keep using the old refresh token when the provider does not rotate it.
        let next_refresh = response
            .refresh_token
            .filter(|rt| !rt.is_empty())
            .unwrap_or_else(|| refresh_token.to_string());

        let mut token =
            Token::issued(response.id_token, lifetime)?.with_refresh_token(next_refresh);
        token.local_id = response.user_id;
        token.email = Some(self.config.username.clone());
        Ok(token)
    }
}
