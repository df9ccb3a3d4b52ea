//! # a3s-veil
//!
//! Privacy protection for digital collectibles: sealed profile attributes and
//! masked avatar behavior.
//!
//! ## Overview
//!
//! `a3s-veil` lets an owner hide sensitive profile attributes behind
//! authenticated encryption and makes an avatar's live behavior unreadable to
//! untrusted observers while staying exact for trusted ones. Both halves share
//! one notion of privacy tier.
//!
//! ## Quick Start
//!
//! ```rust
//! use a3s_veil::{policy, Attribute, CipherId, EncryptionKey, PrivacyLevel};
//! use rand::rngs::OsRng;
//!
//! # fn example() -> a3s_veil::Result<()> {
//! let key = EncryptionKey::generate(&mut OsRng);
//! let profile = vec![
//!     Attribute::new("Background", "Cyber Haze"),
//!     Attribute::new("Secret Code", "GLITCH-1"),
//! ];
//!
//! let protected = policy::protect(&profile, PrivacyLevel::Light, &key, CipherId::default(), &mut OsRng)?;
//! assert_eq!(protected.public.len(), 1);
//!
//! let revealed = policy::reveal(&protected, &key)?;
//! assert_eq!(revealed.len(), 2);
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - **policy** — category sensitivity table, `protect` / `reveal`
//! - **crypto** — AES-256-GCM and ChaCha20-Poly1305 sealed records
//! - **mask** — per-field noise for position, rotation, voice and gestures
//! - **trust** — viewer trust, per-field access permissions and the `TrustedRegistry` trait
//! - **engine** — `PrivacyEngine`, a facade over configured collaborators

pub mod config;
pub mod crypto;
pub mod engine;
pub mod envelope;
pub mod error;
pub mod fetch;
pub mod keys;
pub mod level;
pub mod mask;
pub mod policy;
pub mod trust;
pub mod types;

// Re-export core types
pub use config::VeilConfig;
pub use crypto::{open, seal, CipherId, SealedRecord};
pub use engine::PrivacyEngine;
pub use envelope::{BehaviorPrivacyConfig, ProtectedEnvelope};
pub use error::{Result, VeilError};
pub use fetch::{MemoryMetadataFetcher, MetadataFetcher};
pub use keys::{
    EncryptionKey, KeyProvider, PassphraseKeyProvider, RandomKeyProvider, StaticKeyProvider,
};
pub use level::PrivacyLevel;
pub use mask::{mask, mask_fields, NoiseProfile};
pub use policy::{classify, protect, reveal, AttributeCategory};
pub use trust::{
    is_trusted, AccessPermission, FieldAccess, MemoryTrustedRegistry, TrustContext, TrustedRegistry,
};
pub use types::{
    Attribute, BehaviorField, BehavioralFrame, FieldLevels, Gesture, Position, ProtectedBundle,
    Rotation, Voice,
};
