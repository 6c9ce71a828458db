// Firebase Cloud Messaging HTTP v1 client
// One request per device token; outcomes keep the caller's token order

use std::collections::HashMap;

use anyhow::Result;
use futures::future::join_all;
use reqwest::Client;
use serde_json::{json, Value};
use thiserror::Error;
use tracing::debug;

use super::auth::{GoogleAuth, ServiceAccount};

const FCM_SCOPE: &str = "https://www.googleapis.com/auth/firebase.messaging";

/// Notification payload sent to every device in a batch.
#[derive(Debug, Clone)]
pub struct PushMessage {
    pub title: String,
    pub body: String,
    pub data: HashMap<String, String>,
}

/// Why a single token's send failed.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SendError {
    #[error("registration token is not registered")]
    Unregistered,
    #[error("invalid registration token")]
    InvalidToken,
    #[error("send failed: {0}")]
    Other(String),
}

impl SendError {
    /// Token-level failures that mean the device record should be pruned.
    pub fn is_invalid_token(&self) -> bool {
        matches!(self, SendError::Unregistered | SendError::InvalidToken)
    }
}

/// Per-token results of one batched send, in input order.
#[derive(Debug, Clone)]
pub struct BatchOutcome {
    pub responses: Vec<Result<(), SendError>>,
}

impl BatchOutcome {
    pub fn success_count(&self) -> usize {
        self.responses.iter().filter(|r| r.is_ok()).count()
    }

    pub fn failure_count(&self) -> usize {
        self.responses.len() - self.success_count()
    }

    /// Indices of tokens whose failure marks them dead. Transient failures
    /// are not included; those devices just miss this send.
    pub fn invalid_token_indices(&self) -> Vec<usize> {
        self.responses
            .iter()
            .enumerate()
            .filter_map(|(i, r)| match r {
                Err(e) if e.is_invalid_token() => Some(i),
                _ => None,
            })
            .collect()
    }
}

/// FCM REST API client. Constructed once at startup and injected into call
/// sites; holds its own OAuth token cache for the messaging scope.
pub struct FcmClient {
    client: Client,
    auth: GoogleAuth,
}

impl FcmClient {
    pub fn new(client: Client, service_account: ServiceAccount) -> Self {
        let auth = GoogleAuth::new(client.clone(), service_account, FCM_SCOPE);
        Self { client, auth }
    }

    fn send_url(&self) -> String {
        format!(
            "https://fcm.googleapis.com/v1/projects/{}/messages:send",
            self.auth.project_id()
        )
    }

    /// Send `message` to every token, concurrently. Mirrors the admin SDK's
    /// multicast helper: the batch itself always completes, individual
    /// failures land in the outcome.
    pub async fn send_each(&self, tokens: &[String], message: &PushMessage) -> Result<BatchOutcome> {
        let access_token = self.auth.get_access_token().await?;

        let sends = tokens
            .iter()
            .map(|token| self.send_one(&access_token, token, message));
        let responses = join_all(sends).await;

        Ok(BatchOutcome { responses })
    }

    async fn send_one(
        &self,
        access_token: &str,
        token: &str,
        message: &PushMessage,
    ) -> Result<(), SendError> {
        let body = json!({
            "message": {
                "token": token,
                "notification": {
                    "title": &message.title,
                    "body": &message.body,
                },
                "data": &message.data,
            }
        });

        let response = self
            .client
            .post(self.send_url())
            .bearer_auth(access_token)
            .json(&body)
            .send()
            .await
            .map_err(|e| SendError::Other(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let error_body = response.text().await.unwrap_or_default();
        debug!("FCM error ({}): {}", status, error_body);
        Err(classify_failure(status.as_u16(), &error_body))
    }
}

/// Map an FCM v1 error response onto a send error. UNREGISTERED and
/// INVALID_ARGUMENT mark the token itself bad; everything else is treated
/// as transient.
fn classify_failure(status: u16, body: &str) -> SendError {
    let error_status = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v["error"]["status"].as_str().map(|s| s.to_string()));

    match (status, error_status.as_deref()) {
        (404, _) | (_, Some("UNREGISTERED")) | (_, Some("NOT_FOUND")) => SendError::Unregistered,
        (400, _) | (_, Some("INVALID_ARGUMENT")) => SendError::InvalidToken,
        _ => SendError::Other(format!("status {}", status)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_unregistered() {
        let body = r#"{"error": {"status": "UNREGISTERED", "code": 404}}"#;
        assert_eq!(classify_failure(404, body), SendError::Unregistered);
    }

    #[test]
    fn test_classify_invalid_argument() {
        let body = r#"{"error": {"status": "INVALID_ARGUMENT", "code": 400}}"#;
        assert_eq!(classify_failure(400, body), SendError::InvalidToken);
    }

    #[test]
    fn test_classify_transient() {
        let err = classify_failure(503, "");
        assert!(!err.is_invalid_token());
    }

    #[test]
    fn test_outcome_counts_and_pruning() {
        let outcome = BatchOutcome {
            responses: vec![
                Ok(()),
                Err(SendError::Other("status 503".to_string())),
                Err(SendError::Unregistered),
                Ok(()),
            ],
        };
        assert_eq!(outcome.success_count(), 2);
        assert_eq!(outcome.failure_count(), 2);
        // Only the dead token is pruned; the transient failure is left alone
        assert_eq!(outcome.invalid_token_indices(), vec![2]);
    }
}
