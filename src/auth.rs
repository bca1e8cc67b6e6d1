//! # Authentication Flows
//!
//! Login, logout, and the one-shot identity bootstrap. These are the only
//! writers of session state besides the transport's refresh path.

use std::sync::Arc;

use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::error::{ApiError, ApiResult};
use crate::session::Principal;
use crate::transport::{AuthTransport, RequestSpec};

const LOGIN_PATH: &str = "/auth/login";
const LOGOUT_PATH: &str = "/auth/logout";
const ME_PATH: &str = "/auth/me";

/// Auth endpoints of the backend, bound to the shared session.
pub struct AuthApi {
    transport: Arc<AuthTransport>,
}

impl AuthApi {
    pub fn new(transport: Arc<AuthTransport>) -> Self {
        Self { transport }
    }

    /// Authenticate, store the credential, then resolve the principal.
    ///
    /// Mirrors the backend's two-step contract: the login response carries
    /// only the access credential; the principal comes from the identity
    /// endpoint afterwards.
    pub async fn login(&self, username: &str, password: &str) -> ApiResult<Principal> {
        let body = json!({ "username": username, "password": password });
        let spec = RequestSpec::post(LOGIN_PATH, Some(body)).with_client_tag();

        let response = match self.transport.send_json(spec).await {
            Ok(response) => response,
            Err(e) => {
                self.transport.session().clear();
                return Err(e);
            }
        };

        let token = response
            .get("accessToken")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                ApiError::InvalidResponse("login response missing accessToken".to_string())
            })?;
        self.transport
            .session()
            .set_session(None, Some(token.to_string()));

        match self.me().await {
            Ok(user) => {
                self.transport
                    .session()
                    .set_session(Some(user.clone()), Some(token.to_string()));
                info!(username = %user.username, "Login succeeded");
                Ok(user)
            }
            Err(e) => {
                self.transport.session().clear();
                Err(e)
            }
        }
    }

    /// End the session server-side, then wipe it locally regardless of the
    /// server's answer.
    pub async fn logout(&self) {
        let spec = RequestSpec::post(LOGOUT_PATH, None).with_client_tag();
        if let Err(e) = self.transport.send_json(spec).await {
            debug!(error = %e, "Logout call failed, clearing session anyway");
        }
        self.transport.session().clear();
    }

    /// Resolve the current principal with the active credential.
    pub async fn me(&self) -> ApiResult<Principal> {
        let body = self.transport.get_json(ME_PATH, Vec::new()).await?;
        serde_json::from_value(body)
            .map_err(|e| ApiError::InvalidResponse(format!("identity response: {e}")))
    }

    /// First identity check of the application lifetime.
    ///
    /// Resolves initial session state and latches the bootstrap flag
    /// whether the check succeeds or fails; the latch gates route access
    /// and never resets while the app runs.
    pub async fn bootstrap(&self) -> bool {
        let session = Arc::clone(self.transport.session());
        let authenticated = match self.me().await {
            Ok(user) => {
                let token = session.access_token();
                session.set_session(Some(user), token);
                true
            }
            Err(e) => {
                warn!(error = %e, "Identity bootstrap resolved unauthenticated");
                false
            }
        };
        session.mark_bootstrapped();
        authenticated
    }
}
