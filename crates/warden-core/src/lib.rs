//! # warden-core
//!
//! The grant-resolution engine for WARDEN.
//!
//! This crate provides:
//! - The seam traits (`GrantStore`, `Authorizer`, `CacheInvalidator`,
//!   `OwnershipPredicate`, `EntityDirectory`)
//! - The ability matcher and the three-source grant collector
//! - The `Resolver`, which applies forbid-over-allow precedence
//! - The type registry backing owner-gated abilities
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use warden_core::{Resolver, traits::{Authorizer, NoOwnership}};
//!
//! let resolver = Resolver::new(store, Arc::new(NoOwnership));
//! let allowed = resolver.is_allowed(&request)?;
//! ```

pub mod collector;
pub mod matcher;
pub mod ownership;
pub mod resolver;
pub mod traits;

pub use collector::{CollectedGrant, GrantCollector, GrantQuery};
pub use ownership::{RegistryOwnership, TypeRegistration, TypeRegistry};
pub use resolver::Resolver;
