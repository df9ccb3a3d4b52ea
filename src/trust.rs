//! Trust evaluation: who sees an avatar's behavior unmasked
//!
//! `is_trusted` is a pure membership test. The trusted set itself comes from
//! a `TrustedRegistry` and is only read during a call.
//!
//! Individual fields can also carry an [`AccessPermission`]. A permission
//! overrides the trusted set for its field: viewers it admits see the field
//! exactly, everyone else sees it at `Complete` noise.

use crate::error::{Result, VeilError};
use crate::level::PrivacyLevel;
use crate::types::{BehaviorField, FieldLevels};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::sync::RwLock;

/// Whether `viewer` is in `trusted`; an absent viewer is never trusted
pub fn is_trusted(viewer: Option<&str>, trusted: &HashSet<String>) -> bool {
    viewer.map(|id| trusted.contains(id)).unwrap_or(false)
}

/// Per-call trust inputs for rendering a frame
#[derive(Debug, Clone, Copy)]
pub struct TrustContext<'a> {
    /// Identifier of the viewer, if known
    pub viewer: Option<&'a str>,

    /// Read-only trusted identifier set
    pub trusted: &'a HashSet<String>,

    /// Owner of the avatar, who always sees it unmasked
    pub owner: Option<&'a str>,
}

impl<'a> TrustContext<'a> {
    pub fn new(viewer: Option<&'a str>, trusted: &'a HashSet<String>) -> Self {
        Self {
            viewer,
            trusted,
            owner: None,
        }
    }

    pub fn with_owner(mut self, owner: &'a str) -> Self {
        self.owner = Some(owner);
        self
    }

    /// Whether the viewer bypasses all noise
    pub fn allows_unmasked(&self) -> bool {
        if is_trusted(self.viewer, self.trusted) {
            return true;
        }
        matches!((self.viewer, self.owner), (Some(v), Some(o)) if v == o)
    }

    /// Effective tier per field for this viewer
    ///
    /// A field admitted by its permission resolves to `None`, a field denied
    /// by it to `Complete`. Fields without a permission resolve to `None`
    /// when [`allows_unmasked`](Self::allows_unmasked) holds and to the
    /// configured tier otherwise.
    pub fn field_levels(&self, configured: &FieldLevels, access: &FieldAccess) -> FieldLevels {
        let unmasked = self.allows_unmasked();
        let mut levels = FieldLevels::default();
        for field in BehaviorField::ALL {
            let level = match access.get(field) {
                Some(permission) if permission.allows(self.viewer, self.owner) => PrivacyLevel::None,
                Some(_) => PrivacyLevel::Complete,
                None if unmasked => PrivacyLevel::None,
                None => configured.get(field),
            };
            levels.set(field, level);
        }
        levels
    }
}

/// Who may see one behavioral field unmasked
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AccessPermission {
    /// Every viewer, including anonymous ones
    Public,
    /// Listed viewer identifiers and the owner
    Restricted(Vec<String>),
    /// The owner only
    OwnerOnly,
}

impl AccessPermission {
    /// Whether `viewer` is admitted, given the avatar's `owner`
    pub fn allows(&self, viewer: Option<&str>, owner: Option<&str>) -> bool {
        let is_owner = matches!((viewer, owner), (Some(v), Some(o)) if v == o);
        match self {
            AccessPermission::Public => true,
            AccessPermission::Restricted(ids) => {
                is_owner || viewer.map(|v| ids.iter().any(|id| id == v)).unwrap_or(false)
            }
            AccessPermission::OwnerOnly => is_owner,
        }
    }
}

impl fmt::Display for AccessPermission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccessPermission::Public => f.write_str("public"),
            AccessPermission::Restricted(ids) => write!(f, "restricted ({} viewers)", ids.len()),
            AccessPermission::OwnerOnly => f.write_str("owner only"),
        }
    }
}

/// Optional access permission per behavioral field
///
/// Fields without a permission fall back to the trusted set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldAccess {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<AccessPermission>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotation: Option<AccessPermission>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voice: Option<AccessPermission>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gesture: Option<AccessPermission>,
}

impl FieldAccess {
    pub fn get(&self, field: BehaviorField) -> Option<&AccessPermission> {
        match field {
            BehaviorField::Position => self.position.as_ref(),
            BehaviorField::Rotation => self.rotation.as_ref(),
            BehaviorField::Voice => self.voice.as_ref(),
            BehaviorField::Gesture => self.gesture.as_ref(),
        }
    }

    pub fn set(&mut self, field: BehaviorField, permission: AccessPermission) {
        let slot = match field {
            BehaviorField::Position => &mut self.position,
            BehaviorField::Rotation => &mut self.rotation,
            BehaviorField::Voice => &mut self.voice,
            BehaviorField::Gesture => &mut self.gesture,
        };
        *slot = Some(permission);
    }

    pub fn with(mut self, field: BehaviorField, permission: AccessPermission) -> Self {
        self.set(field, permission);
        self
    }

    pub fn is_empty(&self) -> bool {
        BehaviorField::ALL.iter().all(|f| self.get(*f).is_none())
    }
}

/// Supplies the trusted identifier set
pub trait TrustedRegistry: Send + Sync {
    /// Snapshot of the current trusted identifiers
    fn trusted(&self) -> Result<HashSet<String>>;
}

/// In-memory trusted registry for single-process use and tests
#[derive(Default)]
pub struct MemoryTrustedRegistry {
    ids: RwLock<HashSet<String>>,
}

impl MemoryTrustedRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry pre-populated with `ids`
    pub fn with_ids<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            ids: RwLock::new(ids.into_iter().map(Into::into).collect()),
        }
    }

    /// Trust an identifier; returns false if it was already trusted
    pub fn add(&self, id: impl Into<String>) -> Result<bool> {
        let id = id.into();
        let mut ids = self.ids.write().map_err(poisoned)?;
        let added = ids.insert(id.clone());
        if added {
            tracing::info!(id = %id, "Viewer trusted");
        }
        Ok(added)
    }

    /// Stop trusting an identifier; returns false if it was not trusted
    pub fn remove(&self, id: &str) -> Result<bool> {
        let mut ids = self.ids.write().map_err(poisoned)?;
        let removed = ids.remove(id);
        if removed {
            tracing::info!(id = %id, "Viewer trust revoked");
        }
        Ok(removed)
    }

    pub fn len(&self) -> Result<usize> {
        Ok(self.ids.read().map_err(poisoned)?.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }
}

fn poisoned<E: fmt::Display>(e: E) -> VeilError {
    VeilError::Config(format!("Trusted registry lock poisoned: {}", e))
}

impl TrustedRegistry for MemoryTrustedRegistry {
    fn trusted(&self) -> Result<HashSet<String>> {
        let ids = self.ids.read().map_err(poisoned)?;
        Ok(ids.clone())
    }
}
