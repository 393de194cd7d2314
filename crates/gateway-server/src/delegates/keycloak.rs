//! Keycloak admin API delegate.
//!
//! Calls are authorized with a client credentials token that is cached and
//! refreshed shortly before it expires.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{UpstreamError, check_status, read_json};
use crate::config::KeycloakConfig;
use crate::http::join_url;

/// Tokens closer than this to expiry are refreshed.
const TOKEN_REFRESH_MARGIN: Duration = Duration::from_secs(60);

/// Longest lifetime a cached token is trusted for, whatever the server claims.
const MAX_TOKEN_LIFETIME: Duration = Duration::from_secs(24 * 60 * 60);

/// When a token issued at `now` with `expires_in` seconds of life expires.
fn token_expiry(now: Instant, expires_in: u64) -> Instant {
    let lifetime = Duration::from_secs(expires_in).min(MAX_TOKEN_LIFETIME);
    now.checked_add(lifetime).unwrap_or(now)
}

/// A Keycloak user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRepresentation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    pub username: String,
    #[serde(default)]
    pub enabled: bool,
}

/// A Keycloak realm role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleRepresentation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
}

/// User and role administration in the Keycloak realm.
#[async_trait]
pub trait KeycloakAdminDelegate: Send + Sync {
    /// Users whose username, name or email contains `search`.
    async fn search_users(&self, search: &str) -> Result<Vec<UserRepresentation>, UpstreamError>;

    /// The user with exactly `username`, if any.
    async fn find_user(&self, username: &str) -> Result<Option<UserRepresentation>, UpstreamError>;

    async fn create_user(&self, user: &UserRepresentation) -> Result<(), UpstreamError>;

    async fn delete_user(&self, user_id: Uuid) -> Result<(), UpstreamError>;

    /// Every role defined in the realm.
    async fn get_realm_roles(&self) -> Result<Vec<RoleRepresentation>, UpstreamError>;

    /// Realm roles mapped to a user.
    async fn get_user_roles(&self, user_id: Uuid) -> Result<Vec<RoleRepresentation>, UpstreamError>;

    async fn add_user_roles(
        &self,
        user_id: Uuid,
        roles: &[RoleRepresentation],
    ) -> Result<(), UpstreamError>;

    async fn remove_user_roles(
        &self,
        user_id: Uuid,
        roles: &[RoleRepresentation],
    ) -> Result<(), UpstreamError>;
}

// ============================================================================
// Token Cache
// ============================================================================

struct AccessToken {
    value: String,
    expires_at: Instant,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

// ============================================================================
// REST Implementation
// ============================================================================

/// [`KeycloakAdminDelegate`] over the Keycloak admin REST API.
#[derive(Clone)]
pub struct RestKeycloakAdminDelegate {
    client: Client,
    config: KeycloakConfig,
    token: Arc<RwLock<Option<AccessToken>>>,
}

impl std::fmt::Debug for RestKeycloakAdminDelegate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestKeycloakAdminDelegate")
            .field("admin_base_url", &self.config.admin_base_url)
            .field("client_id", &self.config.client_id)
            .finish_non_exhaustive()
    }
}

impl RestKeycloakAdminDelegate {
    pub fn new(client: Client, config: KeycloakConfig) -> Self {
        Self {
            client,
            config,
            token: Arc::new(RwLock::new(None)),
        }
    }

    /// Current admin token, fetching a new one when missing or about to expire.
    async fn access_token(&self) -> Result<String, UpstreamError> {
        {
            let token = self.token.read().await;
            if let Some(t) = &*token {
                if t.expires_at > Instant::now() + TOKEN_REFRESH_MARGIN {
                    return Ok(t.value.clone());
                }
            }
        }

        tracing::info!("Fetching new Keycloak admin token");
        let params = [
            ("grant_type", "client_credentials"),
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
        ];
        let response = self
            .client
            .post(&self.config.token_url)
            .form(&params)
            .send()
            .await?;
        let token_response: TokenResponse = read_json(response).await?;

        let value = token_response.access_token;
        *self.token.write().await = Some(AccessToken {
            value: value.clone(),
            expires_at: token_expiry(Instant::now(), token_response.expires_in),
        });
        Ok(value)
    }

    fn url(&self, path: &str) -> String {
        join_url(&self.config.admin_base_url, path)
    }

    async fn send(&self, request: RequestBuilder) -> Result<reqwest::Response, UpstreamError> {
        let token = self.access_token().await?;
        let response = request.bearer_auth(token).send().await?;
        check_status(response)
    }

    async fn fetch<T: serde::de::DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<T, UpstreamError> {
        let token = self.access_token().await?;
        let response = request.bearer_auth(token).send().await?;
        read_json(response).await
    }
}

#[async_trait]
impl KeycloakAdminDelegate for RestKeycloakAdminDelegate {
    async fn search_users(&self, search: &str) -> Result<Vec<UserRepresentation>, UpstreamError> {
        let request = self
            .client
            .get(self.url("users"))
            .query(&[("search", search), ("briefRepresentation", "true")]);
        self.fetch(request).await
    }

    async fn find_user(&self, username: &str) -> Result<Option<UserRepresentation>, UpstreamError> {
        let request = self
            .client
            .get(self.url("users"))
            .query(&[("username", username), ("exact", "true")]);
        let users: Vec<UserRepresentation> = self.fetch(request).await?;
        Ok(users.into_iter().next())
    }

    async fn create_user(&self, user: &UserRepresentation) -> Result<(), UpstreamError> {
        tracing::debug!(username = %user.username, "Creating Keycloak user");
        self.send(self.client.post(self.url("users")).json(user))
            .await
            .map(|_| ())
    }

    async fn delete_user(&self, user_id: Uuid) -> Result<(), UpstreamError> {
        tracing::debug!(user_id = %user_id, "Deleting Keycloak user");
        self.send(self.client.delete(self.url(&format!("users/{}", user_id))))
            .await
            .map(|_| ())
    }

    async fn get_realm_roles(&self) -> Result<Vec<RoleRepresentation>, UpstreamError> {
        self.fetch(self.client.get(self.url("roles"))).await
    }

    async fn get_user_roles(&self, user_id: Uuid) -> Result<Vec<RoleRepresentation>, UpstreamError> {
        let url = self.url(&format!("users/{}/role-mappings/realm", user_id));
        self.fetch(self.client.get(url)).await
    }

    async fn add_user_roles(
        &self,
        user_id: Uuid,
        roles: &[RoleRepresentation],
    ) -> Result<(), UpstreamError> {
        if roles.is_empty() {
            return Ok(());
        }
        let url = self.url(&format!("users/{}/role-mappings/realm", user_id));
        self.send(self.client.post(url).json(roles)).await.map(|_| ())
    }

    async fn remove_user_roles(
        &self,
        user_id: Uuid,
        roles: &[RoleRepresentation],
    ) -> Result<(), UpstreamError> {
        if roles.is_empty() {
            return Ok(());
        }
        let url = self.url(&format!("users/{}/role-mappings/realm", user_id));
        self.send(self.client.delete(url).json(roles)).await.map(|_| ())
    }
}
