//! Engine configuration
//!
//! Loaded from JSON (camelCase keys). Every field has a default so partial
//! files are accepted.

use crate::crypto::CipherId;
use crate::error::{Result, VeilError};
use crate::level::PrivacyLevel;
use crate::trust::FieldAccess;
use crate::types::FieldLevels;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Configuration for [`PrivacyEngine`](crate::engine::PrivacyEngine)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VeilConfig {
    /// Cipher used when sealing new records
    pub cipher: CipherId,

    /// Tier applied by `protect_profile_default`
    pub default_level: PrivacyLevel,

    /// Per-field tiers used when rendering frames for untrusted viewers
    pub behavior: FieldLevels,

    /// Per-field access permissions; unset fields follow the trusted set
    pub access: FieldAccess,

    /// Iterations for passphrase-derived keys
    pub key_derivation_iterations: u32,
}

impl Default for VeilConfig {
    fn default() -> Self {
        Self {
            cipher: CipherId::ChaCha20Poly1305,
            default_level: PrivacyLevel::Medium,
            behavior: FieldLevels::uniform(PrivacyLevel::Medium),
            access: FieldAccess::default(),
            key_derivation_iterations: 100_000,
        }
    }
}

impl VeilConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| VeilError::Config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            VeilError::Config(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;

        let config = Self::from_json_str(&json)?;
        tracing::debug!(
            path = %path.display(),
            cipher = %config.cipher,
            default_level = %config.default_level,
            "Config loaded"
        );
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.key_derivation_iterations == 0 {
            return Err(VeilError::Config(
                "keyDerivationIterations must be >= 1".to_string(),
            ));
        }
        Ok(())
    }
}
