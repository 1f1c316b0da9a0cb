//! Handler settings and their validation.
//!
//! Pure functions only: no I/O, no async, no filesystem access.

use std::sync::LazyLock;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use regex::Regex;
use serde::{Deserialize, Deserializer};

use crate::domain::error::HandlerError;

/// Matches a bare GUID anywhere in a string.
pub const GUID_PATTERN: &str =
    r"[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}";

// Compile-time constant pattern; cannot fail.
#[allow(clippy::expect_used)]
static GUID_ONLY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!("^{GUID_PATTERN}$")).expect("valid regex"));

/// Public (unencrypted) settings.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicSettings {
    #[serde(default)]
    pub workspace_id: Option<String>,
    #[serde(default, deserialize_with = "bool_or_unset")]
    pub stop_on_multiple_connections: Option<bool>,
}

/// A JSON boolean, or unset for any other value.
fn bool_or_unset<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<bool>, D::Error> {
    Ok(serde_json::Value::deserialize(deserializer)?.as_bool())
}

/// Protected settings, decrypted from the settings file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProtectedSettings {
    #[serde(default)]
    pub workspace_key: Option<String>,
    #[serde(default)]
    pub proxy: Option<String>,
    #[serde(default)]
    pub vm_resource_id: Option<String>,
}

/// Settings for the current operation. Either half may be absent.
///
/// Protected settings that could not be decrypted keep their failure, which
/// surfaces only when an operation asks for them.
#[derive(Debug, Clone)]
pub struct HandlerSettings {
    pub public: Option<PublicSettings>,
    pub protected: Result<Option<ProtectedSettings>, HandlerError>,
}

impl Default for HandlerSettings {
    fn default() -> Self {
        Self {
            public: None,
            protected: Ok(None),
        }
    }
}

impl HandlerSettings {
    /// Public settings, or a missing-parameter failure.
    ///
    /// # Errors
    ///
    /// Returns `HandlerError::ParameterMissing` when no public settings were provided.
    pub fn require_public(&self) -> Result<&PublicSettings, HandlerError> {
        self.public.as_ref().ok_or_else(|| {
            HandlerError::ParameterMissing("Public configuration must be provided".to_string())
        })
    }

    /// Protected settings, or why they are unavailable.
    ///
    /// # Errors
    ///
    /// Returns the failure recorded while decrypting them, or
    /// `HandlerError::ParameterMissing` when none were provided.
    pub fn require_protected(&self) -> Result<&ProtectedSettings, HandlerError> {
        match &self.protected {
            Ok(Some(protected)) => Ok(protected),
            Ok(None) => Err(HandlerError::ParameterMissing(
                "Private configuration must be provided".to_string(),
            )),
            Err(e) => Err(e.clone()),
        }
    }
}

impl PublicSettings {
    /// Workspace id, present and GUID-shaped.
    ///
    /// # Errors
    ///
    /// Returns a missing- or invalid-parameter failure.
    pub fn workspace_id(&self) -> Result<&str, HandlerError> {
        let id = self.workspace_id.as_deref().ok_or_else(|| {
            HandlerError::ParameterMissing("Workspace ID must be provided".to_string())
        })?;
        validate_workspace_id(id)?;
        Ok(id)
    }

    /// Whether the caller opted into conflict avoidance. Only an explicit `true` counts.
    #[must_use]
    pub fn stop_on_multiple_connections(&self) -> bool {
        self.stop_on_multiple_connections == Some(true)
    }
}

impl ProtectedSettings {
    /// Workspace key, present and canonical base64.
    ///
    /// # Errors
    ///
    /// Returns a missing- or invalid-parameter failure.
    pub fn workspace_key(&self) -> Result<&str, HandlerError> {
        let key = self.workspace_key.as_deref().ok_or_else(|| {
            HandlerError::ParameterMissing("Workspace key must be provided".to_string())
        })?;
        validate_workspace_key(key)?;
        Ok(key)
    }
}

/// Validates that a workspace id is exactly one GUID.
///
/// # Errors
///
/// Returns `HandlerError::InvalidParameter` otherwise.
pub fn validate_workspace_id(id: &str) -> Result<(), HandlerError> {
    if GUID_ONLY.is_match(id) {
        Ok(())
    } else {
        Err(HandlerError::InvalidParameter("Workspace ID is invalid".to_string()))
    }
}

/// Validates that a workspace key is base64 that re-encodes to itself.
///
/// # Errors
///
/// Returns `HandlerError::InvalidParameter` otherwise.
pub fn validate_workspace_key(key: &str) -> Result<(), HandlerError> {
    let invalid = || HandlerError::InvalidParameter("Workspace key is invalid".to_string());
    let decoded = STANDARD.decode(key).map_err(|_| invalid())?;
    if STANDARD.encode(decoded) == key {
        Ok(())
    } else {
        Err(invalid())
    }
}
