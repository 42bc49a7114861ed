//! Serde representations of admin API resources
//!
//! Only the fields the suites read are modeled; everything else the server
//! sends is ignored on deserialization.

use serde::{Deserialize, Serialize};

/// A user as returned by the admin API.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRepresentation {
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
}

/// A credential bound to a user.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialRepresentation {
    pub id: String,
    #[serde(rename = "type")]
    pub credential_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_date: Option<i64>,
}

/// Token endpoint response for the password grant.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct TokenResponse {
    pub access_token: String,
    #[serde(default = "default_expiry")]
    pub expires_in: u64,
}

fn default_expiry() -> u64 {
    60
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_deserializes_with_extra_fields() {
        let json = r#"{
            "id": "5e4b5c9a",
            "username": "jdoe",
            "enabled": true,
            "emailVerified": false,
            "createdTimestamp": 1700000000000,
            "access": { "manage": true }
        }"#;
        let user: UserRepresentation = serde_json::from_str(json).unwrap();
        assert_eq!(user.id, "5e4b5c9a");
        assert_eq!(user.username, "jdoe");
        assert!(user.enabled);
        assert!(user.email.is_none());
    }

    #[test]
    fn credential_deserializes() {
        let json = r#"{
            "id": "11f3a8",
            "type": "password",
            "userLabel": "My password",
            "createdDate": 1700000000000,
            "credentialData": "{\"hashIterations\":27500}"
        }"#;
        let credential: CredentialRepresentation = serde_json::from_str(json).unwrap();
        assert_eq!(credential.credential_type, "password");
        assert_eq!(credential.user_label.as_deref(), Some("My password"));
    }

    #[test]
    fn token_response_defaults_expiry() {
        let token: TokenResponse = serde_json::from_str(r#"{"access_token":"abc"}"#).unwrap();
        assert_eq!(token.access_token, "abc");
        assert_eq!(token.expires_in, 60);
    }
}
