//! Login, register and logout.

use tracing::{info, warn};

use super::{SessionInput, SessionManager};
use crate::api::{endpoints, ApiError, RequestDescriptor};
use crate::models::{LoginRequest, RegisterRequest, TokenPair, UserProfile};

impl SessionManager {
    /// Exchange username and password for a token pair and load the profile.
    ///
    /// On rejection nothing is stored and the session is left as it was.
    pub async fn login(&self, username: &str, password: &str) -> Result<UserProfile, ApiError> {
        let body = serde_json::to_value(LoginRequest::new(username, password))?;
        self.sign_in(RequestDescriptor::post(endpoints::LOGIN).with_body(body))
            .await
    }

    /// Create an account. A successful registration signs the new user in.
    pub async fn register(&self, request: &RegisterRequest) -> Result<UserProfile, ApiError> {
        let body = serde_json::to_value(request)?;
        self.sign_in(RequestDescriptor::post(endpoints::REGISTER).with_body(body))
            .await
    }

    /// End the session locally, telling the server first when possible.
    ///
    /// The server call is best effort: its failure is logged and the local
    /// session still ends. Only a failure to clear the stored tokens is
    /// returned, and even then the session is `Unauthenticated` afterwards.
    pub async fn logout(&self) -> Result<(), ApiError> {
        let _guard = self.auth_lock.lock().await;
        match self.api().credentials().has_access_token() {
            Ok(true) => {
                // Never refresh just to log out
                let descriptor = RequestDescriptor::post(endpoints::LOGOUT).without_refresh();
                if let Err(e) = self.api().authenticated_request(descriptor).await {
                    warn!(error = %e, "Server logout failed, clearing local session anyway");
                }
            }
            Ok(false) => {}
            Err(e) => warn!(error = %e, "Failed to read credential store during logout"),
        }

        let cleared = self.api().credentials().clear_all();
        self.apply(SessionInput::SignedOut, None);
        info!("Signed out");

        cleared.map_err(ApiError::from)
    }

    async fn sign_in(&self, descriptor: RequestDescriptor) -> Result<UserProfile, ApiError> {
        let _guard = self.auth_lock.lock().await;
        let path = descriptor.path.clone();
        let response = self.api().public_request(descriptor).await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            warn!(path = %path, status = %status, "Credentials rejected");
            return Err(ApiError::from_auth_status(status, &body));
        }

        let pair: TokenPair = response.json().await.map_err(|e| {
            ApiError::InvalidResponse(format!("Failed to parse token response from {}: {}", path, e))
        })?;
        self.api().credentials().store_pair(&pair)?;

        match self.fetch_identity().await {
            Ok(user) => {
                info!(user = %user.display_name(), "Signed in");
                self.apply(SessionInput::SignedIn, Some(user.clone()));
                Ok(user)
            }
            Err(e) => {
                // Tokens without a confirmed identity are not a session
                warn!(error = %e, "Identity check after sign-in failed");
                self.clear_credentials();
                self.apply(SessionInput::SignedOut, None);
                Err(e)
            }
        }
    }
}
