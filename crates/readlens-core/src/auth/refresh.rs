use reqwest::Client;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::CredentialStore;
use crate::api::{endpoints, ApiError};
use crate::models::{RefreshRequest, TokenPair};

/// Runs the refresh protocol against `POST /api/v1/auth/refresh`.
///
/// Refreshes are serialised: a caller that had to wait for another refresh
/// picks up the pair that refresh stored instead of spending the refresh
/// token a second time.
pub struct TokenRefresher {
    client: Client,
    base_url: String,
    credentials: CredentialStore,
    in_flight: Mutex<()>,
}

impl TokenRefresher {
    pub fn new(client: Client, base_url: impl Into<String>, credentials: CredentialStore) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            credentials,
            in_flight: Mutex::new(()),
        }
    }

    /// Exchange the stored refresh token for a new pair.
    ///
    /// Both tokens are replaced only on success. Any failure leaves the
    /// stored refresh token untouched and is reported as `RefreshInvalid`.
    pub async fn refresh(&self) -> Result<TokenPair, ApiError> {
        let _guard = self.in_flight.lock().await;
        self.refresh_locked().await
    }

    /// Refresh on behalf of a request that was rejected while carrying
    /// `stale_access`.
    pub(crate) async fn refresh_stale(
        &self,
        stale_access: Option<&str>,
    ) -> Result<TokenPair, ApiError> {
        let _guard = self.in_flight.lock().await;

        // Another request may have rotated the pair while this one waited
        if let (Some(access_token), Some(refresh_token)) = (
            self.credentials.access_token()?,
            self.credentials.refresh_token()?,
        ) {
            if stale_access != Some(access_token.as_str()) {
                debug!("Token pair already rotated, skipping refresh");
                return Ok(TokenPair {
                    access_token,
                    refresh_token,
                });
            }
        }

        self.refresh_locked().await
    }

    async fn refresh_locked(&self) -> Result<TokenPair, ApiError> {
        let refresh_token = self
            .credentials
            .refresh_token()?
            .ok_or_else(|| ApiError::RefreshInvalid("no refresh token stored".to_string()))?;

        let url = endpoints::join(&self.base_url, endpoints::REFRESH);
        debug!(url = %url, "Refreshing credentials");

        let response = self
            .client
            .post(&url)
            .json(&RefreshRequest {
                refresh_token: &refresh_token,
            })
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "Refresh endpoint unreachable");
                ApiError::RefreshInvalid(format!("refresh endpoint unreachable: {}", e))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            warn!(status = %status, "Refresh token rejected");
            return Err(ApiError::RefreshInvalid(format!(
                "HTTP {}: {}",
                status,
                ApiError::error_detail(&body)
            )));
        }

        let pair: TokenPair = response
            .json()
            .await
            .map_err(|e| ApiError::RefreshInvalid(format!("malformed refresh response: {}", e)))?;

        self.credentials.store_pair(&pair)?;
        info!("Credentials refreshed");
        Ok(pair)
    }
}

impl std::fmt::Debug for TokenRefresher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenRefresher")
            .field("base_url", &self.base_url)
            .field("credentials", &self.credentials)
            .finish()
    }
}
