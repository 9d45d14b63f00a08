//! Docket SDK
//!
//! Shared library providing traits, types, and utilities for Docket components.
//! This crate is used by both the engine and externally written capabilities.

/// Capability trait and result shape
pub mod capability;

/// Error types and handling
pub mod errors;

/// Task types shared with capabilities
pub mod types;

// Re-export commonly used types
pub use capability::{clamp_unit, Capability, CapabilityError, CapabilityOutput};
pub use errors::{DocketErrorExt, EngineError};
pub use types::{Priority, TaskContext};
