//! Privacy tiers shared by attribute protection and behavior masking

use crate::error::{Result, VeilError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Ordinal privacy tier
///
/// Higher tiers seal more profile attributes and inject more noise into
/// behavioral frames. Ordering follows the numeric value.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "camelCase")]
pub enum PrivacyLevel {
    /// No protection
    #[default]
    None = 0,
    /// Minor obfuscation
    Light = 1,
    /// Noticeable obfuscation
    Medium = 2,
    /// Significant obfuscation
    Heavy = 3,
    /// Full obfuscation
    Complete = 4,
}

impl PrivacyLevel {
    /// All tiers in ascending order
    pub const ALL: [PrivacyLevel; 5] = [
        PrivacyLevel::None,
        PrivacyLevel::Light,
        PrivacyLevel::Medium,
        PrivacyLevel::Heavy,
        PrivacyLevel::Complete,
    ];

    /// Get a tier from its numeric value
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(PrivacyLevel::None),
            1 => Some(PrivacyLevel::Light),
            2 => Some(PrivacyLevel::Medium),
            3 => Some(PrivacyLevel::Heavy),
            4 => Some(PrivacyLevel::Complete),
            _ => None,
        }
    }

    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Canonical lowercase name used on the wire
    pub fn as_str(self) -> &'static str {
        match self {
            PrivacyLevel::None => "none",
            PrivacyLevel::Light => "light",
            PrivacyLevel::Medium => "medium",
            PrivacyLevel::Heavy => "heavy",
            PrivacyLevel::Complete => "complete",
        }
    }

    /// Human-readable description
    pub fn description(self) -> &'static str {
        match self {
            PrivacyLevel::None => "No privacy protection",
            PrivacyLevel::Light => "Light privacy - minor obfuscation",
            PrivacyLevel::Medium => "Medium privacy - noticeable obfuscation",
            PrivacyLevel::Heavy => "Heavy privacy - significant obfuscation",
            PrivacyLevel::Complete => "Complete privacy - full obfuscation",
        }
    }
}

impl fmt::Display for PrivacyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PrivacyLevel {
    type Err = VeilError;

    /// Parse a tier name, case-insensitive
    ///
    /// `low` and `high` are accepted as aliases for `light` and `heavy`;
    /// older behavior configs were written with those names.
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" => Ok(PrivacyLevel::None),
            "light" | "low" => Ok(PrivacyLevel::Light),
            "medium" => Ok(PrivacyLevel::Medium),
            "heavy" | "high" => Ok(PrivacyLevel::Heavy),
            "complete" => Ok(PrivacyLevel::Complete),
            other => Err(VeilError::Validation(format!(
                "Unknown privacy level '{}'",
                other
            ))),
        }
    }
}
