//! Virtual authenticator control over the `WebAuthn` CDP domain
//!
//! Simulates hardware security keys for WebAuthn flows without physical
//! devices. Commands and payloads are forwarded verbatim; the only
//! behavior the wrapper adds is the mandatory enable step on creation.
//! Authenticator ids returned by the browser are the caller's to keep;
//! nothing is tracked here.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::debug;

use crate::cdp::CdpSession;
use crate::error::{E2eError, E2eResult};
use crate::page::Page;

/// Identifier of a virtual authenticator, as returned by the browser.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthenticatorId(pub String);

impl std::fmt::Display for AuthenticatorId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthenticatorProtocol {
    U2f,
    Ctap2,
}

/// Transport the virtual device claims to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthenticatorTransport {
    Usb,
    Nfc,
    Ble,
    Internal,
}

/// Options for `WebAuthn.addVirtualAuthenticator`, serialized in the
/// protocol's wire shape.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticatorOptions {
    pub protocol: AuthenticatorProtocol,
    pub transport: AuthenticatorTransport,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_resident_key: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_user_verification: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_user_verified: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub automatic_presence_simulation: Option<bool>,
}

/// Named authenticator configurations used across the suites. These are
/// read-only presets, not mutable state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthenticatorPreset {
    /// Plain CTAP2 key over USB
    Default,
    Usb,
    Ble,
    Nfc,
    Internal,
    /// Resident-key capable, user verification supported and passing
    ResidentKey,
}

impl AuthenticatorPreset {
    pub const ALL: [Self; 6] = [
        Self::Default,
        Self::Usb,
        Self::Ble,
        Self::Nfc,
        Self::Internal,
        Self::ResidentKey,
    ];

    /// The options this preset stands for. Every preset is CTAP2.
    pub fn options(self) -> AuthenticatorOptions {
        let transport = match self {
            Self::Ble => AuthenticatorTransport::Ble,
            Self::Nfc => AuthenticatorTransport::Nfc,
            Self::Internal => AuthenticatorTransport::Internal,
            Self::Default | Self::Usb | Self::ResidentKey => AuthenticatorTransport::Usb,
        };
        let mut options = AuthenticatorOptions {
            protocol: AuthenticatorProtocol::Ctap2,
            transport,
            has_resident_key: None,
            has_user_verification: None,
            is_user_verified: None,
            automatic_presence_simulation: None,
        };
        if self == Self::ResidentKey {
            options.has_resident_key = Some(true);
            options.has_user_verification = Some(true);
            options.is_user_verified = Some(true);
        }
        options
    }
}

/// A credential to inject via `WebAuthn.addCredential`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialDescriptor {
    /// Base64-encoded credential id
    pub credential_id: String,
    pub is_resident_credential: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rp_id: Option<String>,
    /// Base64-encoded PKCS#8 private key
    pub private_key: String,
    /// Base64-encoded user handle, required for resident credentials
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_handle: Option<String>,
    pub sign_count: u32,
}

impl CredentialDescriptor {
    /// Build a credential from raw bytes, encoding them the way the
    /// protocol expects.
    pub fn from_raw(
        credential_id: &[u8],
        private_key_der: &[u8],
        rp_id: &str,
        sign_count: u32,
    ) -> Self {
        Self {
            credential_id: BASE64.encode(credential_id),
            is_resident_credential: false,
            rp_id: Some(rp_id.to_string()),
            private_key: BASE64.encode(private_key_der),
            user_handle: None,
            sign_count,
        }
    }
}

/// Pass-through wrapper over the `WebAuthn` CDP domain, owning a dedicated
/// session for one page.
pub struct VirtualAuthenticators {
    session: CdpSession,
}

impl VirtualAuthenticators {
    /// Open a fresh session for the page's target and enable the WebAuthn
    /// domain. Enabling must precede every other WebAuthn command on the
    /// session, so it happens here before the wrapper is handed out.
    pub async fn create(page: &Page) -> E2eResult<Self> {
        Self::attach(page.ws_url()).await
    }

    /// Like [`create`](Self::create), for an explicit DevTools endpoint.
    pub async fn attach(ws_url: &str) -> E2eResult<Self> {
        let mut session = CdpSession::connect(ws_url).await?;
        session.send("WebAuthn.enable", json!({})).await?;
        Ok(Self { session })
    }

    /// Add a virtual device and return the id the browser assigned it.
    pub async fn add_virtual_authenticator(
        &mut self,
        options: &AuthenticatorOptions,
    ) -> E2eResult<AuthenticatorId> {
        let result = self
            .session
            .send(
                "WebAuthn.addVirtualAuthenticator",
                json!({ "options": options }),
            )
            .await?;
        let id = result
            .get("authenticatorId")
            .and_then(Value::as_str)
            .ok_or_else(|| E2eError::Cdp {
                code: 0,
                message: "reply missing authenticatorId".to_string(),
            })?;
        debug!("added virtual authenticator {}", id);
        Ok(AuthenticatorId(id.to_string()))
    }

    /// Inject a credential into a virtual device.
    pub async fn add_credential(
        &mut self,
        authenticator_id: &AuthenticatorId,
        credential: &CredentialDescriptor,
    ) -> E2eResult<()> {
        self.session
            .send(
                "WebAuthn.addCredential",
                json!({
                    "authenticatorId": authenticator_id,
                    "credential": credential,
                }),
            )
            .await?;
        Ok(())
    }

    /// Remove a single credential from a virtual device.
    pub async fn remove_credential(
        &mut self,
        authenticator_id: &AuthenticatorId,
        credential_id: &str,
    ) -> E2eResult<()> {
        self.session
            .send(
                "WebAuthn.removeCredential",
                json!({
                    "authenticatorId": authenticator_id,
                    "credentialId": credential_id,
                }),
            )
            .await?;
        Ok(())
    }

    /// Remove every credential stored on a virtual device.
    pub async fn clear_credentials(
        &mut self,
        authenticator_id: &AuthenticatorId,
    ) -> E2eResult<()> {
        self.session
            .send(
                "WebAuthn.clearCredentials",
                json!({ "authenticatorId": authenticator_id }),
            )
            .await?;
        Ok(())
    }

    /// Remove a virtual device.
    pub async fn remove_virtual_authenticator(
        &mut self,
        authenticator_id: &AuthenticatorId,
    ) -> E2eResult<()> {
        self.session
            .send(
                "WebAuthn.removeVirtualAuthenticator",
                json!({ "authenticatorId": authenticator_id }),
            )
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_preset_serializes_minimal_options() {
        let options = AuthenticatorPreset::Default.options();
        let wire = serde_json::to_value(&options).unwrap();
        assert_eq!(
            wire,
            serde_json::json!({ "protocol": "ctap2", "transport": "usb" })
        );
    }

    #[test]
    fn resident_key_preset_sets_capability_flags() {
        let options = AuthenticatorPreset::ResidentKey.options();
        let wire = serde_json::to_value(&options).unwrap();
        assert_eq!(
            wire,
            serde_json::json!({
                "protocol": "ctap2",
                "transport": "usb",
                "hasResidentKey": true,
                "hasUserVerification": true,
                "isUserVerified": true,
            })
        );
    }

    #[test]
    fn presets_cover_every_transport() {
        assert_eq!(
            AuthenticatorPreset::Usb.options().transport,
            AuthenticatorTransport::Usb
        );
        assert_eq!(
            AuthenticatorPreset::Ble.options().transport,
            AuthenticatorTransport::Ble
        );
        assert_eq!(
            AuthenticatorPreset::Nfc.options().transport,
            AuthenticatorTransport::Nfc
        );
        assert_eq!(
            AuthenticatorPreset::Internal.options().transport,
            AuthenticatorTransport::Internal
        );
        // The default preset is the USB preset under another name
        assert_eq!(
            AuthenticatorPreset::Default.options(),
            AuthenticatorPreset::Usb.options()
        );
    }

    #[test]
    fn every_preset_is_ctap2() {
        for preset in AuthenticatorPreset::ALL {
            assert_eq!(preset.options().protocol, AuthenticatorProtocol::Ctap2);
        }
    }

    #[test]
    fn credential_encodes_base64() {
        let credential = CredentialDescriptor::from_raw(b"cred-id", b"pkcs8-bytes", "localhost", 7);
        assert_eq!(credential.credential_id, "Y3JlZC1pZA==");
        assert_eq!(credential.rp_id.as_deref(), Some("localhost"));
        assert_eq!(credential.sign_count, 7);

        let wire = serde_json::to_value(&credential).unwrap();
        assert_eq!(wire["credentialId"].as_str(), Some("Y3JlZC1pZA=="));
        assert_eq!(wire["isResidentCredential"].as_bool(), Some(false));
        assert!(wire.get("userHandle").is_none());
    }

    #[test]
    fn authenticator_id_serializes_as_string() {
        let id = AuthenticatorId("auth-1".to_string());
        assert_eq!(serde_json::to_value(&id).unwrap(), serde_json::json!("auth-1"));
        assert_eq!(id.to_string(), "auth-1");
    }
}
