use crate::app_config::DriveConfig;
use crate::errors::AppError;
use chrono::Utc;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use log::{debug, info};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_LIFETIME_SECS: i64 = 3600;

fn default_token_uri() -> String {
    "https://oauth2.googleapis.com/token".to_string()
}

/// The fields of a Google service account JSON key that the token exchange uses.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

#[derive(Debug, Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct AccessToken {
    pub token: String,
    pub expires_in: Option<Duration>,
}

impl ServiceAccountKey {
    pub fn from_json(json: &str) -> Result<Self, AppError> {
        serde_json::from_str(json)
            .map_err(|e| AppError::Auth(format!("service account JSON is invalid: {}", e)))
    }

    /// Reads the key from the configured environment variable, falling back to the key file.
    pub fn load(config: &DriveConfig) -> Result<Self, AppError> {
        match env::var(&config.credentials_env) {
            Ok(json) if !json.trim().is_empty() => {
                debug!("Using service account from environment variable '{}'", config.credentials_env);
                return Self::from_json(&json);
            }
            _ => {}
        }

        let path = config.credentials_path.as_deref().ok_or_else(|| {
            AppError::Auth(format!(
                "environment variable '{}' is not set and no credentials_path is configured",
                config.credentials_env
            ))
        })?;
        debug!("Using service account key file '{}'", path);
        let json = std::fs::read_to_string(path)
            .map_err(|e| AppError::Auth(format!("cannot read credentials file '{}': {}", path, e)))?;
        Self::from_json(&json)
    }

    fn signed_assertion(&self, scope: &str) -> Result<String, AppError> {
        let now = Utc::now().timestamp();
        let claims = AssertionClaims {
            iss: &self.client_email,
            scope,
            aud: &self.token_uri,
            iat: now,
            exp: now + ASSERTION_LIFETIME_SECS,
        };
        let key = EncodingKey::from_rsa_pem(self.private_key.as_bytes())
            .map_err(|e| AppError::Auth(format!("service account private key is unusable: {}", e)))?;
        encode(&Header::new(Algorithm::RS256), &claims, &key)
            .map_err(|e| AppError::Auth(format!("failed to sign token request: {}", e)))
    }

    /// Exchanges a signed JWT for an OAuth2 access token.
    pub async fn fetch_access_token(&self, http_client: &Client, scope: &str) -> Result<AccessToken, AppError> {
        let assertion = self.signed_assertion(scope)?;
        let response = http_client
            .post(&self.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .timeout(Duration::from_secs(30))
            .send()
            .await
            .map_err(|e| AppError::Auth(format!("token request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Auth(format!("token endpoint returned {}: {}", status, body)));
        }
        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| AppError::Auth(format!("token response is invalid: {}", e)))?;

        info!("🔑 Authenticated as {}", self.client_email);
        Ok(AccessToken {
            token: token.access_token,
            expires_in: token.expires_in.map(Duration::from_secs),
        })
    }
}
