// =============================================================================
// SERVICE ACCOUNT AUTHENTICATION
// =============================================================================
//
// Google APIs accept an OAuth2 access token obtained with the JWT bearer flow:
// sign a short-lived JWT with the service account's private key, POST it to the
// account's `token_uri`, get back an access token valid for about an hour.
//
// **Setup:**
// 1. Create a service account in Google Cloud Console and download a JSON key.
// 2. Share the destination Drive folder with the service account email
//    (looks like: name@project.iam.gserviceaccount.com) as "Editor".
// 3. Point `GOOGLE_SERVICE_ACCOUNT_KEY` at the key file, or put the JSON itself
//    in `GOOGLE_SERVICE_ACCOUNT_JSON`.

use crate::core::report::UploadError;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::sync::RwLock;

/// Enough to create files in folders shared with the service account.
pub const DRIVE_FILE_SCOPE: &str = "https://www.googleapis.com/auth/drive.file";

/// Service account credentials from the JSON key file.
#[derive(Debug, Clone, Deserialize)]
struct ServiceAccountCredentials {
    /// The service account email (used as issuer in JWT).
    client_email: String,

    /// The private key in PEM format.
    private_key: String,

    /// Where to exchange the JWT for an access token.
    token_uri: String,
}

/// JWT claims for Google OAuth2.
#[derive(Debug, Serialize)]
struct JwtClaims {
    iss: String,
    scope: String,
    aud: String,
    iat: u64,
    /// Max 1 hour after `iat`.
    exp: u64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: u64,
}

fn default_expires_in() -> u64 {
    3600
}

struct CachedToken {
    token: String,
    expires_at: SystemTime,
}

/// Hands out access tokens for one service account, refreshing them as they
/// near expiry. Cheap to share: clone the `Arc` it lives in.
pub struct ServiceAccountAuth {
    credentials: ServiceAccountCredentials,
    scope: String,
    client: Client,
    cached_token: Arc<RwLock<Option<CachedToken>>>,
}

impl ServiceAccountAuth {
    /// Reads a JSON key file. `timeout` bounds each token exchange.
    pub async fn from_file(path: impl AsRef<Path>, timeout: Duration) -> Result<Self, UploadError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            UploadError::Auth(format!("cannot read key file {}: {}", path.display(), e))
        })?;
        Self::from_json(&content, timeout)
    }

    /// Parses JSON key content.
    pub fn from_json(json: &str, timeout: Duration) -> Result<Self, UploadError> {
        let credentials: ServiceAccountCredentials = serde_json::from_str(json)
            .map_err(|e| UploadError::Auth(format!("invalid service account key: {}", e)))?;
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| UploadError::Auth(e.to_string()))?;

        Ok(Self {
            credentials,
            scope: DRIVE_FILE_SCOPE.to_string(),
            client,
            cached_token: Arc::new(RwLock::new(None)),
        })
    }

    pub fn client_email(&self) -> &str {
        &self.credentials.client_email
    }

    /// Gets a valid access token, refreshing if necessary.
    pub async fn get_access_token(&self) -> Result<String, UploadError> {
        {
            let cached = self.cached_token.read().await;
            if let Some(token) = cached.as_ref() {
                if token.expires_at > SystemTime::now() + Duration::from_secs(5 * 60) {
                    return Ok(token.token.clone());
                }
            }
        }

        let fresh = self.fetch_new_token().await?;
        let token = fresh.access_token.clone();

        {
            let mut cached = self.cached_token.write().await;
            *cached = Some(CachedToken {
                token: fresh.access_token,
                expires_at: SystemTime::now() + Duration::from_secs(fresh.expires_in),
            });
        }

        Ok(token)
    }

    fn signed_assertion(&self) -> Result<String, UploadError> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| UploadError::Auth(e.to_string()))?
            .as_secs();

        let claims = JwtClaims {
            iss: self.credentials.client_email.clone(),
            scope: self.scope.clone(),
            aud: self.credentials.token_uri.clone(),
            iat: now,
            exp: now + 3600,
        };

        let key = EncodingKey::from_rsa_pem(self.credentials.private_key.as_bytes())
            .map_err(|e| UploadError::Auth(format!("invalid private key: {}", e)))?;
        encode(&Header::new(Algorithm::RS256), &claims, &key)
            .map_err(|e| UploadError::Auth(format!("cannot sign JWT: {}", e)))
    }

    async fn fetch_new_token(&self) -> Result<TokenResponse, UploadError> {
        let jwt = self.signed_assertion()?;

        tracing::debug!("Exchanging JWT for access token as {}", self.credentials.client_email);

        let response = self
            .client
            .post(&self.credentials.token_uri)
            .form(&[
                ("grant_type", "urn:ietf:params:oauth:grant-type:jwt-bearer"),
                ("assertion", jwt.as_str()),
            ])
            .send()
            .await
            .map_err(|e| UploadError::Auth(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(UploadError::Auth(format!(
                "token exchange failed ({}): {}",
                status, text
            )));
        }

        response
            .json::<TokenResponse>()
            .await
            .map_err(|e| UploadError::Auth(format!("unexpected token response: {}", e)))
    }
}
