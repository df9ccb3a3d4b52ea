//! High-level privacy engine built on pluggable collaborators
//!
//! `PrivacyEngine` wires configuration, a key provider and a trusted
//! registry to the policy, crypto, mask and trust components. Randomness
//! comes from the OS RNG per call; use the free functions in `policy` and
//! `mask` directly when a seeded RNG is needed.

use crate::config::VeilConfig;
use crate::error::Result;
use crate::fetch::MetadataFetcher;
use crate::keys::{KeyProvider, PassphraseKeyProvider};
use crate::level::PrivacyLevel;
use crate::mask;
use crate::policy;
use crate::envelope::BehaviorPrivacyConfig;
use crate::trust::{FieldAccess, TrustContext, TrustedRegistry};
use crate::types::{Attribute, BehavioralFrame, FieldLevels, ProtectedBundle};
use rand::rngs::OsRng;
use std::sync::Arc;

/// Privacy engine backed by a key provider and a trusted registry
pub struct PrivacyEngine {
    config: VeilConfig,
    keys: Box<dyn KeyProvider>,
    registry: Arc<dyn TrustedRegistry>,
}

impl PrivacyEngine {
    pub fn new(
        config: VeilConfig,
        keys: impl KeyProvider + 'static,
        registry: Arc<dyn TrustedRegistry>,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            keys: Box::new(keys),
            registry,
        })
    }

    /// Engine whose key is derived from a passphrase with the configured
    /// iteration count
    pub fn with_passphrase(
        config: VeilConfig,
        passphrase: impl Into<String>,
        salt: impl Into<Vec<u8>>,
        registry: Arc<dyn TrustedRegistry>,
    ) -> Result<Self> {
        let keys = PassphraseKeyProvider::from_config(passphrase, salt, &config);
        Self::new(config, keys, registry)
    }

    pub fn config(&self) -> &VeilConfig {
        &self.config
    }

    /// Protect a profile at `level` with the configured cipher
    pub fn protect_profile(
        &self,
        attributes: &[Attribute],
        level: PrivacyLevel,
    ) -> Result<ProtectedBundle> {
        let key = self.keys.provide_key()?;
        policy::protect(attributes, level, &key, self.config.cipher, &mut OsRng)
    }

    /// Protect a profile at the configured default tier
    pub fn protect_profile_default(&self, attributes: &[Attribute]) -> Result<ProtectedBundle> {
        self.protect_profile(attributes, self.config.default_level)
    }

    pub fn reveal_profile(&self, protected: &ProtectedBundle) -> Result<Vec<Attribute>> {
        let key = self.keys.provide_key()?;
        policy::reveal(protected, &key)
    }

    /// Fetch a profile by reference and protect it
    pub async fn fetch_and_protect(
        &self,
        fetcher: &dyn MetadataFetcher,
        reference: &str,
        level: PrivacyLevel,
    ) -> Result<ProtectedBundle> {
        let attributes = fetcher.fetch(reference).await?;
        tracing::debug!(
            reference = %reference,
            count = attributes.len(),
            "Profile fetched"
        );
        self.protect_profile(&attributes, level)
    }

    /// Render a frame for a viewer
    ///
    /// Trusted viewers and the owner get an exact copy; everyone else gets a
    /// frame masked at the configured per-field tiers. Configured access
    /// permissions take precedence for their fields.
    pub fn render_frame(
        &self,
        frame: &BehavioralFrame,
        viewer: Option<&str>,
        owner: Option<&str>,
    ) -> Result<BehavioralFrame> {
        self.render(
            frame,
            viewer,
            owner,
            &self.config.behavior,
            &self.config.access,
        )
    }

    /// Render a frame using the tiers and permissions of an avatar's own
    /// behavior config instead of the engine defaults
    pub fn render_frame_with(
        &self,
        frame: &BehavioralFrame,
        viewer: Option<&str>,
        owner: Option<&str>,
        behavior: &BehaviorPrivacyConfig,
    ) -> Result<BehavioralFrame> {
        let levels = behavior.field_levels()?;
        let access = behavior.field_access()?;
        self.render(frame, viewer, owner, &levels, &access)
    }

    fn render(
        &self,
        frame: &BehavioralFrame,
        viewer: Option<&str>,
        owner: Option<&str>,
        configured: &FieldLevels,
        access: &FieldAccess,
    ) -> Result<BehavioralFrame> {
        frame.validate()?;

        let trusted = self.registry.trusted()?;
        let mut context = TrustContext::new(viewer, &trusted);
        if let Some(owner) = owner {
            context = context.with_owner(owner);
        }

        let levels = context.field_levels(configured, access);
        Ok(mask::mask_fields(frame, &levels, false, &mut OsRng))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::CipherId;
    use crate::error::VeilError;
    use crate::keys::{EncryptionKey, StaticKeyProvider};
    use crate::trust::{AccessPermission, MemoryTrustedRegistry};
    use crate::types::{BehaviorField, Position, Rotation};

    fn engine(registry: Arc<MemoryTrustedRegistry>) -> PrivacyEngine {
        PrivacyEngine::new(
            VeilConfig::default(),
            StaticKeyProvider::new(EncryptionKey::from_bytes([3; 32])),
            registry,
        )
        .unwrap()
    }

    fn frame() -> BehavioralFrame {
        BehavioralFrame::new(Position::new(1.0, 2.0, 3.0), Rotation::identity())
    }

    #[test]
    fn test_rejects_invalid_config() {
        let config = VeilConfig {
            key_derivation_iterations: 0,
            ..VeilConfig::default()
        };
        let result = PrivacyEngine::new(
            config,
            StaticKeyProvider::new(EncryptionKey::from_bytes([3; 32])),
            Arc::new(MemoryTrustedRegistry::new()),
        );
        assert!(matches!(result, Err(VeilError::Config(_))));
    }

    #[test]
    fn test_default_protection_uses_config() {
        let engine = engine(Arc::new(MemoryTrustedRegistry::new()));
        let bundle = vec![
            Attribute::new("Mission", "Extract"),
            Attribute::new("Background", "Grid"),
        ];

        let protected = engine.protect_profile_default(&bundle).unwrap();
        assert_eq!(protected.level, PrivacyLevel::Medium);
        assert_eq!(
            protected.sealed.as_ref().unwrap().cipher(),
            CipherId::ChaCha20Poly1305
        );
        assert_eq!(protected.public, vec![Attribute::new("Background", "Grid")]);
    }

    #[test]
    fn test_render_frame_trust_paths() {
        let registry = Arc::new(MemoryTrustedRegistry::with_ids(["friend"]));
        let engine = engine(registry.clone());
        let frame = frame();

        assert_eq!(engine.render_frame(&frame, Some("friend"), None).unwrap(), frame);
        assert_eq!(engine.render_frame(&frame, Some("me"), Some("me")).unwrap(), frame);
        assert_ne!(engine.render_frame(&frame, Some("stranger"), Some("me")).unwrap(), frame);
        assert_ne!(engine.render_frame(&frame, None, None).unwrap(), frame);

        registry.remove("friend").unwrap();
        assert_ne!(engine.render_frame(&frame, Some("friend"), None).unwrap(), frame);
    }

    #[test]
    fn test_passphrase_engine_follows_configured_iterations() {
        let config = |iterations| VeilConfig {
            key_derivation_iterations: iterations,
            ..VeilConfig::default()
        };
        let registry: Arc<dyn TrustedRegistry> = Arc::new(MemoryTrustedRegistry::new());
        let writer = PrivacyEngine::with_passphrase(config(1), "pw", b"mint-1".to_vec(), registry.clone())
            .unwrap();
        let same = PrivacyEngine::with_passphrase(config(1), "pw", b"mint-1".to_vec(), registry.clone())
            .unwrap();
        let slower = PrivacyEngine::with_passphrase(config(7), "pw", b"mint-1".to_vec(), registry)
            .unwrap();

        let bundle = vec![Attribute::new("Secret Code", "GLITCH-1")];
        let protected = writer.protect_profile(&bundle, PrivacyLevel::Light).unwrap();

        assert_eq!(same.reveal_profile(&protected).unwrap(), bundle);
        assert!(matches!(
            slower.reveal_profile(&protected),
            Err(VeilError::Authentication(_))
        ));
    }

    #[test]
    fn test_render_frame_applies_access_permissions() {
        let config = VeilConfig {
            behavior: FieldLevels::default(),
            access: FieldAccess::default()
                .with(BehaviorField::Position, AccessPermission::OwnerOnly)
                .with(
                    BehaviorField::Rotation,
                    AccessPermission::Restricted(vec!["friend".to_string()]),
                ),
            ..VeilConfig::default()
        };
        let engine = PrivacyEngine::new(
            config,
            StaticKeyProvider::new(EncryptionKey::from_bytes([3; 32])),
            Arc::new(MemoryTrustedRegistry::new()),
        )
        .unwrap();
        let frame = frame();

        let owner = engine.render_frame(&frame, Some("me"), Some("me")).unwrap();
        assert_eq!(owner, frame);

        let friend = engine.render_frame(&frame, Some("friend"), Some("me")).unwrap();
        assert_ne!(friend.position, frame.position);
        assert_eq!(friend.rotation, frame.rotation);

        let stranger = engine.render_frame(&frame, Some("stranger"), Some("me")).unwrap();
        assert_ne!(stranger.position, frame.position);
        assert_ne!(stranger.rotation, frame.rotation);
        assert!(stranger.rotation.is_unit());
    }

    #[test]
    fn test_render_frame_with_behavior_config() {
        let engine = engine(Arc::new(MemoryTrustedRegistry::with_ids(["friend"])));
        let frame = frame();
        let behavior = BehaviorPrivacyConfig::new("ar://avatar.vrm")
            .with_field("rotation", PrivacyLevel::Heavy)
            .with_access(BehaviorField::Position, AccessPermission::Public);

        let stranger = engine
            .render_frame_with(&frame, Some("stranger"), None, &behavior)
            .unwrap();
        assert_eq!(stranger.position, frame.position);
        assert_ne!(stranger.rotation, frame.rotation);

        let friend = engine
            .render_frame_with(&frame, Some("friend"), None, &behavior)
            .unwrap();
        assert_eq!(friend, frame);
    }

    #[test]
    fn test_render_frame_rejects_non_unit_rotation() {
        let engine = engine(Arc::new(MemoryTrustedRegistry::new()));
        let bad = BehavioralFrame::new(Position::default(), Rotation::new(0.0, 0.0, 0.0, 0.0));
        assert!(matches!(
            engine.render_frame(&bad, None, None),
            Err(VeilError::Validation(_))
        ));
    }
}
