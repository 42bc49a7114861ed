//! Admin REST client
//!
//! Authenticates with a password grant against the admin realm and carries
//! the bearer token on every request. The token is cached and refreshed
//! shortly before it expires.

use std::time::{Duration, Instant};

use tokio::sync::Mutex;
use tracing::{debug, trace};

use crate::error::{AdminError, AdminResult};
use crate::types::{CredentialRepresentation, TokenResponse, UserRepresentation};

/// Connection settings for the admin API.
#[derive(Debug, Clone)]
pub struct AdminConfig {
    /// Base URL of the server, e.g. `http://127.0.0.1:8080`
    pub base_url: String,

    /// Realm the admin user authenticates against
    pub admin_realm: String,

    /// Admin credentials
    pub username: String,
    pub password: String,

    /// OAuth client used for the password grant
    pub client_id: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8080".to_string(),
            admin_realm: "master".to_string(),
            username: "admin".to_string(),
            password: "admin".to_string(),
            client_id: "admin-cli".to_string(),
        }
    }
}

impl AdminConfig {
    /// Read settings from `CONSOLE_ADMIN_*` environment variables, falling
    /// back to the defaults for anything unset.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            base_url: env_or("CONSOLE_ADMIN_URL", defaults.base_url),
            admin_realm: env_or("CONSOLE_ADMIN_REALM", defaults.admin_realm),
            username: env_or("CONSOLE_ADMIN_USER", defaults.username),
            password: env_or("CONSOLE_ADMIN_PASSWORD", defaults.password),
            client_id: defaults.client_id,
        }
    }
}

fn env_or(key: &str, default: String) -> String {
    std::env::var(key).unwrap_or(default)
}

struct CachedToken {
    access_token: String,
    expires_at: Instant,
}

/// Client for the console's admin REST API.
pub struct AdminClient {
    config: AdminConfig,
    http: reqwest::Client,
    token: Mutex<Option<CachedToken>>,
}

impl AdminClient {
    pub fn new(config: AdminConfig) -> AdminResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            config,
            http,
            token: Mutex::new(None),
        })
    }

    /// Look up a user by exact username. Returns `None` when no user matches.
    pub async fn get_user_by_username(
        &self,
        username: &str,
        realm: &str,
    ) -> AdminResult<Option<UserRepresentation>> {
        let token = self.access_token().await?;
        let url = users_endpoint(&self.config.base_url, realm);
        let response = self
            .http
            .get(&url)
            .bearer_auth(&token)
            .query(&[("username", username), ("exact", "true")])
            .send()
            .await?;
        let users: Vec<UserRepresentation> = check(response).await?.json().await?;
        Ok(users.into_iter().find(|u| u.username == username))
    }

    /// List the credentials currently bound to a user.
    pub async fn get_credentials(
        &self,
        user_id: &str,
        realm: &str,
    ) -> AdminResult<Vec<CredentialRepresentation>> {
        let token = self.access_token().await?;
        let url = format!(
            "{}/{}/credentials",
            users_endpoint(&self.config.base_url, realm),
            user_id
        );
        let response = self.http.get(&url).bearer_auth(&token).send().await?;
        Ok(check(response).await?.json().await?)
    }

    /// Delete one credential from a user.
    pub async fn delete_credential(
        &self,
        user_id: &str,
        credential_id: &str,
        realm: &str,
    ) -> AdminResult<()> {
        let token = self.access_token().await?;
        let url = format!(
            "{}/{}/credentials/{}",
            users_endpoint(&self.config.base_url, realm),
            user_id,
            credential_id
        );
        debug!("deleting credential {} of user {}", credential_id, user_id);
        let response = self.http.delete(&url).bearer_auth(&token).send().await?;
        check(response).await?;
        Ok(())
    }

    async fn access_token(&self) -> AdminResult<String> {
        let mut guard = self.token.lock().await;
        if let Some(cached) = guard.as_ref() {
            if cached.expires_at > Instant::now() {
                return Ok(cached.access_token.clone());
            }
        }

        let url = token_endpoint(&self.config.base_url, &self.config.admin_realm);
        trace!("requesting admin token from {}", url);
        let response = self
            .http
            .post(&url)
            .form(&[
                ("grant_type", "password"),
                ("client_id", self.config.client_id.as_str()),
                ("username", self.config.username.as_str()),
                ("password", self.config.password.as_str()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(AdminError::Token(format!("{}: {}", status, body)));
        }

        let token: TokenResponse = response.json().await?;
        // Refresh early so requests never go out with a token about to lapse
        let lifetime = Duration::from_secs(token.expires_in.saturating_sub(10).max(1));
        *guard = Some(CachedToken {
            access_token: token.access_token.clone(),
            expires_at: Instant::now() + lifetime,
        });
        Ok(token.access_token)
    }
}

fn token_endpoint(base: &str, realm: &str) -> String {
    format!(
        "{}/realms/{}/protocol/openid-connect/token",
        base.trim_end_matches('/'),
        realm
    )
}

fn users_endpoint(base: &str, realm: &str) -> String {
    format!("{}/admin/realms/{}/users", base.trim_end_matches('/'), realm)
}

async fn check(response: reqwest::Response) -> AdminResult<reqwest::Response> {
    if response.status().is_success() {
        Ok(response)
    } else {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        Err(AdminError::Api { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_endpoint_joins_realm() {
        assert_eq!(
            token_endpoint("http://localhost:8080", "master"),
            "http://localhost:8080/realms/master/protocol/openid-connect/token"
        );
    }

    #[test]
    fn users_endpoint_trims_trailing_slash() {
        assert_eq!(
            users_endpoint("http://localhost:8080/", "groups"),
            "http://localhost:8080/admin/realms/groups/users"
        );
    }
}
