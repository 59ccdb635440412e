//! Skeletal animation playback: clip selection, looping tick playback,
//! keyframe bracketing and per-bone pose blending.

pub mod animator;
pub mod clip;
pub mod errors;
pub mod pose;
pub mod rig;

pub use animator::SkeletalAnimator;
pub use clip::{AnimationClip, AnimationKey, KeyBracket};
pub use errors::{AnimationError, Result};
pub use pose::Pose;
pub use rig::SkeletonRig;
