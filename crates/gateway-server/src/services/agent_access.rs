//! Agent access to the administration site, managed as Keycloak users.
//!
//! An agent is stored as the Keycloak user `<username>@<provider alias>`.
//! Only the realm roles named by [`IdentityAccessRole`] are managed here;
//! other roles a user holds are left alone.

use std::collections::BTreeSet;
use std::sync::Arc;

use gateway_core::{AdminAgent, IdentityAccessRole, KeycloakIdentityProvider};
use uuid::Uuid;

use crate::delegates::keycloak::{RoleRepresentation, UserRepresentation};
use crate::delegates::{KeycloakAdminDelegate, UpstreamError};

/// Errors from agent access management.
#[derive(Debug, thiserror::Error)]
pub enum AgentAccessError {
    /// The agent in the request cannot be provisioned or updated.
    #[error("invalid agent: {0}")]
    InvalidAgent(String),

    /// No such agent.
    #[error("agent not found: {0}")]
    NotFound(String),

    /// The agent already has access.
    #[error("agent already exists: {0}")]
    AlreadyExists(String),

    /// Keycloak could not be reached or rejected the call.
    #[error("keycloak error: {0}")]
    Keycloak(#[from] UpstreamError),
}

#[derive(Clone)]
pub struct AgentAccessService {
    keycloak: Arc<dyn KeycloakAdminDelegate>,
}

impl AgentAccessService {
    pub fn new(keycloak: Arc<dyn KeycloakAdminDelegate>) -> Self {
        Self { keycloak }
    }

    /// Create the Keycloak user for `agent` and grant its roles.
    pub async fn provision_agent_access(
        &self,
        agent: &AdminAgent,
    ) -> Result<AdminAgent, AgentAccessError> {
        let name = agent.username.trim();
        if name.is_empty() || name.contains('@') {
            return Err(AgentAccessError::InvalidAgent(format!(
                "username must be a bare account name, got {:?}",
                agent.username
            )));
        }
        let username = keycloak_username(name, agent.identity_provider);

        let roles = self.realm_roles(&agent.roles).await?;

        let user = UserRepresentation {
            id: None,
            username: username.clone(),
            enabled: true,
        };
        match self.keycloak.create_user(&user).await {
            Ok(()) => {}
            Err(UpstreamError::Status(409)) => {
                return Err(AgentAccessError::AlreadyExists(username));
            }
            Err(e) => return Err(e.into()),
        }

        let user_id = match self.keycloak.find_user(&username).await {
            Ok(Some(UserRepresentation { id: Some(id), .. })) => id,
            Ok(_) => {
                tracing::error!(username = %username, "Created agent is missing from Keycloak");
                return Err(AgentAccessError::NotFound(username));
            }
            Err(e) => {
                tracing::error!(error = %e, username = %username, "Unable to look up created agent, user is left without roles");
                return Err(e.into());
            }
        };

        if let Err(e) = self.keycloak.add_user_roles(user_id, &roles).await {
            tracing::warn!(error = %e, agent_id = %user_id, "Granting agent roles failed, removing the created user");
            if let Err(cleanup) = self.keycloak.delete_user(user_id).await {
                tracing::error!(error = %cleanup, agent_id = %user_id, "Unable to remove partially provisioned agent");
            }
            return Err(e.into());
        }

        tracing::info!(agent_id = %user_id, username = %username, roles = roles.len(), "Provisioned agent access");
        Ok(AdminAgent {
            id: user_id,
            username: name.to_string(),
            identity_provider: agent.identity_provider,
            roles: agent.roles.clone(),
        })
    }

    /// Agents matching `query`. Users that do not belong to a known identity
    /// provider are skipped.
    pub async fn get_agents(&self, query: &str) -> Result<Vec<AdminAgent>, AgentAccessError> {
        let users = self.keycloak.search_users(query).await?;

        let mut agents = Vec::with_capacity(users.len());
        for user in users {
            let Some(identity_provider) = KeycloakIdentityProvider::from_username(&user.username)
            else {
                tracing::debug!(username = %user.username, "Skipping user without a known identity provider");
                continue;
            };
            let Some(id) = user.id else {
                continue;
            };

            let roles = managed_roles(&self.keycloak.get_user_roles(id).await?);
            let username = user
                .username
                .rsplit_once('@')
                .map_or(user.username.as_str(), |(name, _)| name)
                .to_string();

            agents.push(AdminAgent {
                id,
                username,
                identity_provider,
                roles,
            });
        }
        Ok(agents)
    }

    /// Make the agent's managed roles equal `agent.roles`.
    pub async fn update_agent_access(
        &self,
        agent: &AdminAgent,
    ) -> Result<AdminAgent, AgentAccessError> {
        if agent.id.is_nil() {
            return Err(AgentAccessError::InvalidAgent("agent id is required".into()));
        }

        let current = match self.keycloak.get_user_roles(agent.id).await {
            Ok(roles) => managed_roles(&roles),
            Err(UpstreamError::Status(404)) => {
                return Err(AgentAccessError::NotFound(agent.id.to_string()));
            }
            Err(e) => return Err(e.into()),
        };

        let to_add: BTreeSet<IdentityAccessRole> =
            agent.roles.difference(&current).copied().collect();
        let to_remove: BTreeSet<IdentityAccessRole> =
            current.difference(&agent.roles).copied().collect();

        let realm_roles = self.keycloak.get_realm_roles().await?;
        self.keycloak
            .add_user_roles(agent.id, &select_roles(&realm_roles, &to_add))
            .await?;
        self.keycloak
            .remove_user_roles(agent.id, &select_roles(&realm_roles, &to_remove))
            .await?;

        tracing::info!(
            agent_id = %agent.id,
            added = to_add.len(),
            removed = to_remove.len(),
            "Updated agent access"
        );
        Ok(agent.clone())
    }

    /// Delete the agent's Keycloak user.
    pub async fn remove_agent_access(&self, agent_id: Uuid) -> Result<(), AgentAccessError> {
        match self.keycloak.delete_user(agent_id).await {
            Ok(()) => {
                tracing::info!(agent_id = %agent_id, "Removed agent access");
                Ok(())
            }
            Err(UpstreamError::Status(404)) => Err(AgentAccessError::NotFound(agent_id.to_string())),
            Err(e) => Err(e.into()),
        }
    }

    async fn realm_roles(
        &self,
        wanted: &BTreeSet<IdentityAccessRole>,
    ) -> Result<Vec<RoleRepresentation>, AgentAccessError> {
        if wanted.is_empty() {
            return Ok(Vec::new());
        }
        let realm_roles = self.keycloak.get_realm_roles().await?;
        Ok(select_roles(&realm_roles, wanted))
    }
}

fn keycloak_username(name: &str, provider: KeycloakIdentityProvider) -> String {
    format!("{}@{}", name, provider.alias())
}

/// Roles managed by the administration site among `roles`.
fn managed_roles(roles: &[RoleRepresentation]) -> BTreeSet<IdentityAccessRole> {
    roles.iter().filter_map(|r| r.name.parse().ok()).collect()
}

fn select_roles(
    realm_roles: &[RoleRepresentation],
    wanted: &BTreeSet<IdentityAccessRole>,
) -> Vec<RoleRepresentation> {
    realm_roles
        .iter()
        .filter(|r| {
            r.name
                .parse::<IdentityAccessRole>()
                .is_ok_and(|role| wanted.contains(&role))
        })
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::delegates::mock::MockKeycloakAdminDelegate;

    fn agent(name: &str, roles: &[IdentityAccessRole]) -> AdminAgent {
        AdminAgent {
            id: Uuid::nil(),
            username: name.to_string(),
            identity_provider: KeycloakIdentityProvider::Idir,
            roles: roles.iter().copied().collect(),
        }
    }

    #[tokio::test]
    async fn test_provision_creates_user_with_roles() {
        let keycloak = Arc::new(MockKeycloakAdminDelegate::new());
        let service = AgentAccessService::new(keycloak.clone());

        let created = service
            .provision_agent_access(&agent("jdoe", &[IdentityAccessRole::AdminUser]))
            .await
            .unwrap();

        assert!(!created.id.is_nil());
        assert_eq!(created.username, "jdoe");
        let roles = keycloak.user_roles(created.id).await.unwrap();
        assert_eq!(roles, BTreeSet::from(["AdminUser".to_string()]));

        let found = service.get_agents("jdoe").await.unwrap();
        assert_eq!(found, vec![created]);
    }

    #[tokio::test]
    async fn test_provision_rejects_invalid_and_duplicate() {
        let keycloak = Arc::new(MockKeycloakAdminDelegate::new());
        let service = AgentAccessService::new(keycloak);

        let invalid = service.provision_agent_access(&agent("  ", &[])).await;
        assert!(matches!(invalid, Err(AgentAccessError::InvalidAgent(_))));

        service.provision_agent_access(&agent("jdoe", &[])).await.unwrap();
        let duplicate = service.provision_agent_access(&agent("jdoe", &[])).await;
        assert!(matches!(duplicate, Err(AgentAccessError::AlreadyExists(_))));
    }

    #[tokio::test]
    async fn test_provision_removes_user_when_role_grant_fails() {
        let keycloak = Arc::new(MockKeycloakAdminDelegate::new());
        keycloak.set_fail_role_grants(true).await;
        let service = AgentAccessService::new(keycloak.clone());

        let result = service
            .provision_agent_access(&agent("jdoe", &[IdentityAccessRole::AdminUser]))
            .await;
        assert!(matches!(result, Err(AgentAccessError::Keycloak(_))));
        assert!(keycloak.find_user("jdoe@idir").await.unwrap().is_none());

        // A retry is not blocked by a leftover user.
        keycloak.set_fail_role_grants(false).await;
        let created = service
            .provision_agent_access(&agent("jdoe", &[IdentityAccessRole::AdminUser]))
            .await
            .unwrap();
        assert_eq!(
            keycloak.user_roles(created.id).await.unwrap(),
            BTreeSet::from(["AdminUser".to_string()])
        );
    }

    #[tokio::test]
    async fn test_get_agents_skips_unknown_providers_and_roles() {
        let keycloak = Arc::new(MockKeycloakAdminDelegate::new());
        keycloak
            .add_user("alice@phsaazure", &["SupportUser", "offline_access"])
            .await;
        keycloak.add_user("alice@github", &["AdminUser"]).await;
        let service = AgentAccessService::new(keycloak);

        let agents = service.get_agents("alice").await.unwrap();

        assert_eq!(agents.len(), 1);
        assert_eq!(agents[0].username, "alice");
        assert_eq!(agents[0].identity_provider, KeycloakIdentityProvider::PhsaAzure);
        assert_eq!(
            agents[0].roles,
            BTreeSet::from([IdentityAccessRole::SupportUser])
        );
    }

    #[tokio::test]
    async fn test_update_adds_and_removes_managed_roles_only() {
        let keycloak = Arc::new(MockKeycloakAdminDelegate::new());
        let id = keycloak
            .add_user("bob@idir", &["AdminUser", "offline_access"])
            .await;
        let service = AgentAccessService::new(keycloak.clone());

        let mut update = agent("bob", &[IdentityAccessRole::AdminReviewer]);
        update.id = id;
        service.update_agent_access(&update).await.unwrap();

        let roles = keycloak.user_roles(id).await.unwrap();
        assert_eq!(
            roles,
            BTreeSet::from(["AdminReviewer".to_string(), "offline_access".to_string()])
        );
    }

    #[tokio::test]
    async fn test_update_and_remove_unknown_agent() {
        let service = AgentAccessService::new(Arc::new(MockKeycloakAdminDelegate::new()));

        let mut update = agent("ghost", &[]);
        update.id = Uuid::new_v4();
        assert!(matches!(
            service.update_agent_access(&update).await,
            Err(AgentAccessError::NotFound(_))
        ));
        assert!(matches!(
            service.update_agent_access(&agent("ghost", &[])).await,
            Err(AgentAccessError::InvalidAgent(_))
        ));
        assert!(matches!(
            service.remove_agent_access(Uuid::new_v4()).await,
            Err(AgentAccessError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_keycloak_failure() {
        let keycloak = Arc::new(MockKeycloakAdminDelegate::new());
        let id = keycloak.add_user("carol@idir", &[]).await;
        keycloak.set_should_fail(true).await;
        let service = AgentAccessService::new(keycloak.clone());

        assert!(matches!(
            service.get_agents("carol").await,
            Err(AgentAccessError::Keycloak(_))
        ));

        keycloak.set_should_fail(false).await;
        service.remove_agent_access(id).await.unwrap();
        assert!(keycloak.user_roles(id).await.is_none());
    }
}
