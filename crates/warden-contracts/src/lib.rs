//! # warden-contracts
//!
//! Shared data model and error types for the WARDEN authorization engine.
//!
//! All crates in the workspace import from here. No decision logic lives in
//! this crate, only data definitions and error types.

pub mod ability;
pub mod decision;
pub mod entity;
pub mod error;
pub mod role;
