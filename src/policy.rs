//! Attribute sensitivity policy for classifying, protecting and revealing profiles
//!
//! The category table below is the single place that decides which profile
//! attributes are sensitive at which tier. Escalation is cumulative: every
//! tier protects a superset of the tier below it.

use crate::crypto::{self, CipherId};
use crate::error::Result;
use crate::keys::EncryptionKey;
use crate::level::PrivacyLevel;
use crate::types::{Attribute, ProtectedBundle};
use rand::{CryptoRng, RngCore};
use std::collections::BTreeSet;
use std::fmt;

/// Attribute categories that can be sealed
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AttributeCategory {
    SecretCode,
    AgentName,
    Mission,
    Origin,
    Accessory,
    Symbols,
}

impl AttributeCategory {
    pub const ALL: [AttributeCategory; 6] = [
        AttributeCategory::SecretCode,
        AttributeCategory::AgentName,
        AttributeCategory::Mission,
        AttributeCategory::Origin,
        AttributeCategory::Accessory,
        AttributeCategory::Symbols,
    ];

    /// Canonical display name as it appears in profile metadata
    pub fn as_str(self) -> &'static str {
        match self {
            AttributeCategory::SecretCode => "Secret Code",
            AttributeCategory::AgentName => "Agent Name",
            AttributeCategory::Mission => "Mission",
            AttributeCategory::Origin => "Origin",
            AttributeCategory::Accessory => "Accessory",
            AttributeCategory::Symbols => "Symbols",
        }
    }

    /// Lowest tier at which this category is sealed
    pub fn sealed_from(self) -> PrivacyLevel {
        match self {
            AttributeCategory::SecretCode | AttributeCategory::AgentName => PrivacyLevel::Light,
            AttributeCategory::Mission | AttributeCategory::Origin => PrivacyLevel::Medium,
            AttributeCategory::Accessory | AttributeCategory::Symbols => PrivacyLevel::Heavy,
        }
    }

    /// Resolve a category string from attribute metadata
    ///
    /// Case, whitespace, `_` and `-` are ignored, so "Secret Code",
    /// "SecretCode" and "secret_code" all resolve to `SecretCode`.
    pub fn lookup(category: &str) -> Option<Self> {
        let folded: String = category
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '_' && *c != '-')
            .flat_map(char::to_lowercase)
            .collect();

        match folded.as_str() {
            "secretcode" => Some(AttributeCategory::SecretCode),
            "agentname" => Some(AttributeCategory::AgentName),
            "mission" => Some(AttributeCategory::Mission),
            "origin" => Some(AttributeCategory::Origin),
            "accessory" => Some(AttributeCategory::Accessory),
            "symbols" => Some(AttributeCategory::Symbols),
            _ => None,
        }
    }
}

impl fmt::Display for AttributeCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Categories sealed at `level`
///
/// Heavy and Complete seal the same set.
pub fn classify(level: PrivacyLevel) -> BTreeSet<AttributeCategory> {
    AttributeCategory::ALL
        .into_iter()
        .filter(|category| level != PrivacyLevel::None && category.sealed_from() <= level)
        .collect()
}

/// Whether an attribute's category is sealed at `level`
pub fn is_sensitive(category: &str, level: PrivacyLevel) -> bool {
    AttributeCategory::lookup(category)
        .map(|c| level != PrivacyLevel::None && c.sealed_from() <= level)
        .unwrap_or(false)
}

/// Split `bundle` by sensitivity and seal the private part
///
/// Public attributes keep their original order. Private attributes are
/// serialized as a JSON array in their original relative order and sealed
/// under `key`. When nothing is sensitive no record is produced.
pub fn protect<R>(
    bundle: &[Attribute],
    level: PrivacyLevel,
    key: &EncryptionKey,
    cipher: CipherId,
    rng: &mut R,
) -> Result<ProtectedBundle>
where
    R: RngCore + CryptoRng + ?Sized,
{
    let (private, public): (Vec<Attribute>, Vec<Attribute>) = bundle
        .iter()
        .cloned()
        .partition(|attr| is_sensitive(&attr.category, level));

    let sealed = if private.is_empty() {
        None
    } else {
        let payload = serde_json::to_vec(&private)?;
        Some(crypto::seal(&payload, key, cipher, rng)?)
    };

    tracing::debug!(
        tier = %level,
        public = public.len(),
        private = private.len(),
        cipher = %cipher,
        "Profile protected"
    );

    Ok(ProtectedBundle {
        level,
        public,
        sealed,
    })
}

/// Restore the full attribute list
///
/// Returns public attributes followed by the unsealed private ones; the
/// original interleaving is not restored.
pub fn reveal(protected: &ProtectedBundle, key: &EncryptionKey) -> Result<Vec<Attribute>> {
    let Some(record) = &protected.sealed else {
        return Ok(protected.public.clone());
    };

    let payload = crypto::open(record, key)?;
    let private: Vec<Attribute> = serde_json::from_slice(&payload)?;

    tracing::debug!(
        tier = %protected.level,
        public = protected.public.len(),
        private = private.len(),
        "Profile revealed"
    );

    let mut attributes = protected.public.clone();
    attributes.extend(private);
    Ok(attributes)
}
