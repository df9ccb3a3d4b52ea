//! Core data types for profile attributes and behavioral frames
//!
//! Serializable types use camelCase JSON, except `Attribute` which keeps the
//! `trait_type` key used by collectible metadata.

use crate::crypto::SealedRecord;
use crate::error::{Result, VeilError};
use crate::level::PrivacyLevel;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// One descriptive profile attribute
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Attribute {
    /// Category name (e.g., "Background", "Secret Code")
    #[serde(rename = "trait_type")]
    pub category: String,

    pub value: String,
}

impl Attribute {
    pub fn new(category: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            value: value.into(),
        }
    }
}

/// Profile attributes after protection
///
/// `public` keeps the original relative order of the non-sensitive entries.
/// `sealed` is present only when at least one entry was sensitive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtectedBundle {
    pub level: PrivacyLevel,
    pub public: Vec<Attribute>,
    pub sealed: Option<SealedRecord>,
}

impl ProtectedBundle {
    pub fn is_sealed(&self) -> bool {
        self.sealed.is_some()
    }
}

/// Position in 3D space
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Position {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn distance(&self, other: &Position) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }
}

/// Orientation as a quaternion (x, y, z, w)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rotation {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub w: f64,
}

impl Rotation {
    /// Tolerance on the norm for a rotation to count as unit length
    pub const UNIT_TOLERANCE: f64 = 1e-6;

    pub fn new(x: f64, y: f64, z: f64, w: f64) -> Self {
        Self { x, y, z, w }
    }

    pub fn identity() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            z: 0.0,
            w: 1.0,
        }
    }

    pub fn norm(&self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z + self.w * self.w).sqrt()
    }

    pub fn is_unit(&self) -> bool {
        (self.norm() - 1.0).abs() <= Self::UNIT_TOLERANCE
    }
}

impl Default for Rotation {
    fn default() -> Self {
        Self::identity()
    }
}

/// Voice parameters
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Voice {
    /// Frequency bins (Hz)
    pub frequency: Vec<f64>,
    /// Amplitude bins, non-negative
    pub amplitude: Vec<f64>,
    pub pitch: f64,
    /// Normalized to [0, 1]
    pub timbre: f64,
}

/// Active gesture state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Gesture {
    pub name: String,
    /// Normalized to [0, 1]
    pub intensity: f64,
    /// Playback speed, always >= 0.1 after masking
    pub speed: f64,
    /// Per-joint rotations driven by this gesture
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub joint_rotations: BTreeMap<String, Rotation>,
}

impl Gesture {
    pub fn new(name: impl Into<String>, intensity: f64, speed: f64) -> Self {
        Self {
            name: name.into(),
            intensity,
            speed,
            joint_rotations: BTreeMap::new(),
        }
    }

    pub fn with_joint(mut self, joint: impl Into<String>, rotation: Rotation) -> Self {
        self.joint_rotations.insert(joint.into(), rotation);
        self
    }
}

/// Snapshot of an avatar's pose, voice and gesture state at one instant
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BehavioralFrame {
    pub position: Position,
    pub rotation: Rotation,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voice: Option<Voice>,
    #[serde(default)]
    pub gestures: Vec<Gesture>,
}

impl BehavioralFrame {
    pub fn new(position: Position, rotation: Rotation) -> Self {
        Self {
            position,
            rotation,
            voice: None,
            gestures: Vec::new(),
        }
    }

    pub fn with_voice(mut self, voice: Voice) -> Self {
        self.voice = Some(voice);
        self
    }

    pub fn with_gesture(mut self, gesture: Gesture) -> Self {
        self.gestures.push(gesture);
        self
    }

    /// Check that every rotation in the frame is unit length
    pub fn validate(&self) -> Result<()> {
        if !self.rotation.is_unit() {
            return Err(VeilError::Validation(format!(
                "Frame rotation is not unit length (norm {})",
                self.rotation.norm()
            )));
        }
        for gesture in &self.gestures {
            for (joint, rotation) in &gesture.joint_rotations {
                if !rotation.is_unit() {
                    return Err(VeilError::Validation(format!(
                        "Joint '{}' of gesture '{}' is not unit length (norm {})",
                        joint,
                        gesture.name,
                        rotation.norm()
                    )));
                }
            }
        }
        Ok(())
    }
}

/// One masked field of a behavioral frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BehaviorField {
    Position,
    Rotation,
    Voice,
    Gesture,
}

impl BehaviorField {
    pub const ALL: [BehaviorField; 4] = [
        BehaviorField::Position,
        BehaviorField::Rotation,
        BehaviorField::Voice,
        BehaviorField::Gesture,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            BehaviorField::Position => "position",
            BehaviorField::Rotation => "rotation",
            BehaviorField::Voice => "voice",
            BehaviorField::Gesture => "gesture",
        }
    }
}

impl fmt::Display for BehaviorField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BehaviorField {
    type Err = VeilError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "position" => Ok(BehaviorField::Position),
            "rotation" => Ok(BehaviorField::Rotation),
            "voice" => Ok(BehaviorField::Voice),
            "gesture" => Ok(BehaviorField::Gesture),
            other => Err(VeilError::Validation(format!(
                "Unknown behavioral field '{}'",
                other
            ))),
        }
    }
}

/// Privacy tier applied to each behavioral field
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldLevels {
    #[serde(default)]
    pub position: PrivacyLevel,
    #[serde(default)]
    pub rotation: PrivacyLevel,
    #[serde(default)]
    pub voice: PrivacyLevel,
    #[serde(default)]
    pub gesture: PrivacyLevel,
}

impl FieldLevels {
    /// Same tier for every field
    pub fn uniform(level: PrivacyLevel) -> Self {
        Self {
            position: level,
            rotation: level,
            voice: level,
            gesture: level,
        }
    }

    pub fn get(&self, field: BehaviorField) -> PrivacyLevel {
        match field {
            BehaviorField::Position => self.position,
            BehaviorField::Rotation => self.rotation,
            BehaviorField::Voice => self.voice,
            BehaviorField::Gesture => self.gesture,
        }
    }

    pub fn set(&mut self, field: BehaviorField, level: PrivacyLevel) {
        match field {
            BehaviorField::Position => self.position = level,
            BehaviorField::Rotation => self.rotation = level,
            BehaviorField::Voice => self.voice = level,
            BehaviorField::Gesture => self.gesture = level,
        }
    }

    /// Highest tier across all fields
    pub fn max_level(&self) -> PrivacyLevel {
        self.position
            .max(self.rotation)
            .max(self.voice)
            .max(self.gesture)
    }
}
