//! FCM HTTP v1 transport.
//!
//! Exchanges a signed service-account JWT for an OAuth2 access token (cached
//! until near expiry) and posts one `messages:send` request per device.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{Duration, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::PushConfig;

use super::{
    ChunkOutcome, PushMessage, PushTransport, ServiceAccountKey, TransportError, TransportResponse,
};

const OAUTH_SCOPE: &str = "https://www.googleapis.com/auth/firebase.messaging";

/// Refresh the cached access token when it has less than this long to live.
const TOKEN_EXPIRY_MARGIN_SECS: i64 = 60;

/// Firebase Cloud Messaging client.
pub struct FcmTransport {
    project_id: String,
    credentials_path: PathBuf,
    credentials: Mutex<Option<Arc<ServiceAccountKey>>>,
    token_cache: Mutex<Option<TokenCache>>,
    http_client: reqwest::Client,
}

struct TokenCache {
    access_token: String,
    expires_at: i64,
}

/// JWT claims for the Google OAuth2 assertion
#[derive(Debug, Serialize)]
struct OauthClaims {
    iss: String,
    scope: String,
    aud: String,
    exp: i64,
    iat: i64,
}

#[derive(Debug, Deserialize)]
struct OauthTokenResponse {
    access_token: String,
    expires_in: i64,
}

#[derive(Debug, Serialize)]
struct FcmSendRequest {
    message: FcmMessageBody,
}

#[derive(Debug, Serialize)]
struct FcmMessageBody {
    token: String,
    notification: FcmNotificationBody,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<HashMap<String, String>>,
}

#[derive(Debug, Serialize)]
struct FcmNotificationBody {
    title: String,
    body: String,
}

#[derive(Debug, Deserialize)]
struct FcmApiResponse {
    name: Option<String>,
}

impl FcmTransport {
    pub fn new(config: &PushConfig) -> Self {
        Self {
            project_id: config.project_id.clone(),
            credentials_path: PathBuf::from(&config.credentials_path),
            credentials: Mutex::new(None),
            token_cache: Mutex::new(None),
            http_client: reqwest::Client::new(),
        }
    }

    /// Load the service-account key, caching it after the first read.
    fn load_credentials(&self) -> Result<Arc<ServiceAccountKey>, TransportError> {
        let mut cached = self.credentials.lock().expect("credentials lock poisoned");
        if let Some(key) = cached.as_ref() {
            return Ok(key.clone());
        }
        let key = Arc::new(ServiceAccountKey::from_file(&self.credentials_path)?);
        tracing::info!(
            client_email = %key.client_email,
            "Loaded push service credentials"
        );
        *cached = Some(key.clone());
        Ok(key)
    }

    /// Get an access token, reusing the cached one while it is still valid.
    async fn access_token(&self) -> Result<String, TransportError> {
        {
            let cache = self.token_cache.lock().expect("token cache lock poisoned");
            if let Some(cached) = cache.as_ref() {
                if cached.expires_at > Utc::now().timestamp() + TOKEN_EXPIRY_MARGIN_SECS {
                    return Ok(cached.access_token.clone());
                }
            }
        }

        let key = self.load_credentials()?;
        let now = Utc::now();
        let claims = OauthClaims {
            iss: key.client_email.clone(),
            scope: OAUTH_SCOPE.to_string(),
            aud: key.token_uri.clone(),
            exp: (now + Duration::hours(1)).timestamp(),
            iat: now.timestamp(),
        };

        let encoding_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes())
            .map_err(|e| TransportError::Auth(format!("invalid private key: {e}")))?;
        let assertion = encode(&Header::new(Algorithm::RS256), &claims, &encoding_key)
            .map_err(|e| TransportError::Auth(format!("failed to sign token request: {e}")))?;

        let params = [
            ("grant_type", "urn:ietf:params:oauth:grant-type:jwt-bearer"),
            ("assertion", assertion.as_str()),
        ];
        let response = self
            .http_client
            .post(&key.token_uri)
            .form(&params)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(TransportError::Auth(format!(
                "token endpoint returned {}",
                response.status()
            )));
        }

        let token: OauthTokenResponse = response.json().await?;
        let expires_at = Utc::now().timestamp() + token.expires_in;
        {
            let mut cache = self.token_cache.lock().expect("token cache lock poisoned");
            *cache = Some(TokenCache {
                access_token: token.access_token.clone(),
                expires_at,
            });
        }

        Ok(token.access_token)
    }

    fn send_url(&self) -> String {
        format!(
            "https://fcm.googleapis.com/v1/projects/{}/messages:send",
            self.project_id
        )
    }

    async fn post_message(
        &self,
        access_token: &str,
        message: &PushMessage,
    ) -> Result<TransportResponse, TransportError> {
        let request = FcmSendRequest {
            message: FcmMessageBody {
                token: message.token.clone(),
                notification: FcmNotificationBody {
                    title: message.notification.title.clone(),
                    body: message.notification.body.clone(),
                },
                data: if message.data.is_empty() {
                    None
                } else {
                    Some(message.data.clone())
                },
            },
        };

        let response = self
            .http_client
            .post(self.send_url())
            .bearer_auth(access_token)
            .json(&request)
            .send()
            .await?;

        if response.status().is_success() {
            let api: FcmApiResponse = response.json().await?;
            Ok(TransportResponse {
                message_id: api.name.unwrap_or_else(|| Uuid::new_v4().to_string()),
            })
        } else {
            let status = response.status().as_u16();
            let detail = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            Err(TransportError::Service { status, detail })
        }
    }
}

#[async_trait]
impl PushTransport for FcmTransport {
    async fn ensure_ready(&self) -> Result<(), TransportError> {
        self.load_credentials().map(|_| ())
    }

    async fn send_one(&self, message: &PushMessage) -> Result<TransportResponse, TransportError> {
        let access_token = self.access_token().await?;
        self.post_message(&access_token, message).await
    }

    async fn send_chunk(&self, messages: &[PushMessage]) -> Result<ChunkOutcome, TransportError> {
        // Token acquisition failure fails the whole call; per-message
        // rejections only move the counts.
        let access_token = self.access_token().await?;

        let mut outcome = ChunkOutcome::default();
        for message in messages {
            match self.post_message(&access_token, message).await {
                Ok(_) => outcome.successes += 1,
                Err(e) => {
                    outcome.failures += 1;
                    tracing::debug!(error = %e, "Push message rejected");
                }
            }
        }
        Ok(outcome)
    }
}
