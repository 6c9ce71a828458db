// Google service account authentication
// JWT bearer grant exchanged for a cached OAuth2 access token

use anyhow::{anyhow, Result};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::sync::RwLock;
use tracing::error;

/// Firebase service account credentials
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceAccount {
    pub project_id: String,
    pub private_key: String,
    pub client_email: String,
}

impl ServiceAccount {
    /// Load credentials from a service account JSON key file.
    pub fn from_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }
}

/// JWT claims for Google OAuth2
#[derive(Debug, Serialize)]
struct Claims {
    iss: String,
    sub: String,
    aud: String,
    iat: u64,
    exp: u64,
    scope: String,
}

/// Cached access token
struct CachedToken {
    token: String,
    expires_at: u64,
}

/// Token source for one OAuth2 scope. Firestore and FCM each hold their own
/// instance; construction is explicit, never a module-level singleton.
pub struct GoogleAuth {
    client: Client,
    service_account: ServiceAccount,
    scope: &'static str,
    token_cache: Arc<RwLock<Option<CachedToken>>>,
}

impl GoogleAuth {
    pub fn new(client: Client, service_account: ServiceAccount, scope: &'static str) -> Self {
        Self {
            client,
            service_account,
            scope,
            token_cache: Arc::new(RwLock::new(None)),
        }
    }

    pub fn project_id(&self) -> &str {
        &self.service_account.project_id
    }

    /// Get access token (with caching)
    pub async fn get_access_token(&self) -> Result<String> {
        // Check cache first
        {
            let cache = self.token_cache.read().await;
            if let Some(cached) = cache.as_ref() {
                // Return cached token if still valid (with 60s buffer)
                if cached.expires_at > unix_now() + 60 {
                    return Ok(cached.token.clone());
                }
            }
        }

        // Generate new token
        let token = self.generate_access_token().await?;

        // Cache it
        {
            let mut cache = self.token_cache.write().await;
            *cache = Some(CachedToken {
                token: token.clone(),
                expires_at: unix_now() + 3600, // 1 hour
            });
        }

        Ok(token)
    }

    /// Generate a new access token using JWT
    async fn generate_access_token(&self) -> Result<String> {
        let now = unix_now();

        let claims = Claims {
            iss: self.service_account.client_email.clone(),
            sub: self.service_account.client_email.clone(),
            aud: "https://oauth2.googleapis.com/token".to_string(),
            iat: now,
            exp: now + 3600,
            scope: self.scope.to_string(),
        };

        // Encode JWT
        let key = EncodingKey::from_rsa_pem(self.service_account.private_key.as_bytes())?;
        let jwt = encode(&Header::new(Algorithm::RS256), &claims, &key)?;

        // Exchange JWT for access token
        let response = self
            .client
            .post("https://oauth2.googleapis.com/token")
            .form(&[
                ("grant_type", "urn:ietf:params:oauth:grant-type:jwt-bearer"),
                ("assertion", &jwt),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            let body = response.text().await?;
            error!("Failed to get access token: {}", body);
            return Err(anyhow!("Failed to get access token"));
        }

        let data: Value = response.json().await?;
        let token = data["access_token"]
            .as_str()
            .ok_or_else(|| anyhow!("No access_token in response"))?;

        Ok(token.to_string())
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
