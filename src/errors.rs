//! Error Types
//!
//! This module defines the error types used throughout the crate.
//!
//! # Overview
//!
//! The main error type [`AnimationError`] covers all failure modes:
//! - Clip lookups that do not resolve against the rig's library
//! - Clip data that violates a structural invariant
//! - Bone transforms that cannot be decomposed
//!
//! # Usage
//!
//! Fallible public APIs return [`Result<T>`], an alias for
//! `std::result::Result<T, AnimationError>`. None of these errors is fatal:
//! the animator recovers by falling back to the identity pose or by holding
//! the last good pose, and reports the failure through the `log` facade.

use thiserror::Error;

/// The main error type for the animation crate.
///
/// Each variant carries enough context to identify the offending clip or
/// bone in a log line.
#[derive(Error, Debug)]
pub enum AnimationError {
    /// A clip index or name did not resolve against the rig's clip library.
    ///
    /// The animator recovers by clearing the current clip and presenting the
    /// identity pose.
    #[error("invalid clip reference: {context}")]
    InvalidClipReference {
        /// What was looked up and why it failed.
        context: String,
    },

    /// Clip data violates a structural invariant (key ordering, tick range,
    /// bone counts).
    ///
    /// During playback this aborts the current pose update only; the
    /// previous pose is retained.
    #[error("malformed clip {clip:?}: {reason}")]
    MalformedClip {
        /// Name of the offending clip.
        clip: String,
        /// Which invariant was violated.
        reason: String,
    },

    /// A bone transform could not be decomposed into scale, rotation and
    /// translation.
    ///
    /// Recovered per bone by substituting the identity components; never
    /// aborts a pose update.
    #[error("degenerate transform for bone {bone} in clip {clip:?}")]
    DegenerateTransform {
        /// Name of the clip holding the transform.
        clip: String,
        /// Index of the bone slot.
        bone: usize,
    },
}

/// Alias for `Result<T, AnimationError>`.
pub type Result<T> = std::result::Result<T, AnimationError>;
