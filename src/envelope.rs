//! External representation of a protected profile
//!
//! `ProtectedEnvelope` is the JSON record attached to collectible metadata:
//! the tier name, the sealed private attributes as base64, optional external
//! fragment references and an optional behavioral privacy configuration.

use crate::crypto::{CipherId, SealedRecord};
use crate::error::{Result, VeilError};
use crate::level::PrivacyLevel;
use crate::trust::{AccessPermission, FieldAccess};
use crate::types::{Attribute, BehaviorField, FieldLevels, ProtectedBundle};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Behavioral privacy settings for an avatar model
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BehaviorPrivacyConfig {
    /// Reference to the avatar model asset
    pub model_reference: String,

    /// Field name → tier name (e.g., "position" → "medium")
    #[serde(default)]
    pub per_field_level: BTreeMap<String, String>,

    /// Field name → access permission
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub per_field_access: BTreeMap<String, AccessPermission>,
}

impl BehaviorPrivacyConfig {
    pub fn new(model_reference: impl Into<String>) -> Self {
        Self {
            model_reference: model_reference.into(),
            per_field_level: BTreeMap::new(),
            per_field_access: BTreeMap::new(),
        }
    }

    pub fn with_field(mut self, field: impl Into<String>, level: PrivacyLevel) -> Self {
        self.per_field_level
            .insert(field.into(), level.as_str().to_string());
        self
    }

    pub fn with_access(mut self, field: BehaviorField, permission: AccessPermission) -> Self {
        self.per_field_access
            .insert(field.as_str().to_string(), permission);
        self
    }

    /// Build from typed field levels
    pub fn from_field_levels(model_reference: impl Into<String>, levels: &FieldLevels) -> Self {
        Self::new(model_reference)
            .with_field("position", levels.position)
            .with_field("rotation", levels.rotation)
            .with_field("voice", levels.voice)
            .with_field("gesture", levels.gesture)
    }

    /// Parse the per-field map; unlisted fields default to `None`
    pub fn field_levels(&self) -> Result<FieldLevels> {
        let mut levels = FieldLevels::default();
        for (field, name) in &self.per_field_level {
            levels.set(field.parse::<BehaviorField>()?, name.parse::<PrivacyLevel>()?);
        }
        Ok(levels)
    }

    /// Parse the per-field permissions; unlisted fields have none
    pub fn field_access(&self) -> Result<FieldAccess> {
        let mut access = FieldAccess::default();
        for (field, permission) in &self.per_field_access {
            access.set(field.parse::<BehaviorField>()?, permission.clone());
        }
        Ok(access)
    }
}

/// Serializable protection record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProtectedEnvelope {
    /// Tier name used to protect the profile
    pub privacy_level: String,

    /// Cipher of the sealed attributes; present whenever they are
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cipher: Option<CipherId>,

    /// Base64 of `[nonce][tag][ciphertext]`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sealed_attributes: Option<String>,

    /// References to externally stored fragments
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fragment_refs: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub behavior: Option<BehaviorPrivacyConfig>,

    pub protected_at: DateTime<Utc>,
}

impl ProtectedEnvelope {
    pub fn with_fragments(mut self, refs: Vec<String>) -> Self {
        self.fragment_refs = Some(refs);
        self
    }

    pub fn with_behavior(mut self, behavior: BehaviorPrivacyConfig) -> Self {
        self.behavior = Some(behavior);
        self
    }

    pub fn level(&self) -> Result<PrivacyLevel> {
        self.privacy_level.parse()
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(Into::into)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(Into::into)
    }
}

impl ProtectedBundle {
    /// External record for this bundle; public attributes travel separately
    pub fn to_envelope(&self) -> ProtectedEnvelope {
        ProtectedEnvelope {
            privacy_level: self.level.as_str().to_string(),
            cipher: self.sealed.as_ref().map(SealedRecord::cipher),
            sealed_attributes: self.sealed.as_ref().map(SealedRecord::to_base64),
            fragment_refs: None,
            behavior: None,
            protected_at: Utc::now(),
        }
    }

    /// Rebuild a bundle from its public attributes and external record
    pub fn from_envelope(public: Vec<Attribute>, envelope: &ProtectedEnvelope) -> Result<Self> {
        let level = envelope.level()?;
        let sealed = match (&envelope.sealed_attributes, envelope.cipher) {
            (None, _) => None,
            (Some(blob), Some(cipher)) => Some(SealedRecord::from_base64(cipher, blob)?),
            (Some(_), None) => {
                return Err(VeilError::Validation(
                    "Sealed attributes present without a cipher identifier".to_string(),
                ))
            }
        };

        Ok(Self {
            level,
            public,
            sealed,
        })
    }
}
