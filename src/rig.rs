use std::sync::Arc;

use uuid::Uuid;

use crate::clip::AnimationClip;
use crate::errors::{AnimationError, Result};

/// A skeleton resource: the authoritative bone count plus the ordered clip
/// library recorded against it.
///
/// Rigs are immutable once built and shared read-only across any number of
/// animators via `Arc<SkeletonRig>`; each animator keeps its own mutable
/// playback state. The rig's bone count is the single source of truth for
/// pose length, clip-less states included.
#[derive(Debug)]
pub struct SkeletonRig {
    pub id: Uuid,
    pub name: String,

    bone_count: usize,
    // Ordered library; clips are selected by index or by exact name
    clips: Vec<Arc<AnimationClip>>,
}

impl SkeletonRig {
    #[must_use]
    pub fn new(name: &str, bone_count: usize) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.to_string(),
            bone_count,
            clips: Vec::new(),
        }
    }

    /// Appends a clip to the library after validating it against the rig.
    ///
    /// Rejects clips that fail [`AnimationClip::validate`] or whose bone
    /// count differs from the rig's.
    pub fn push_clip(&mut self, clip: AnimationClip) -> Result<()> {
        clip.validate()?;
        if clip.bone_count() != self.bone_count {
            return Err(AnimationError::MalformedClip {
                clip: clip.name.clone(),
                reason: format!(
                    "clip has {} bones but rig {:?} has {}",
                    clip.bone_count(),
                    self.name,
                    self.bone_count
                ),
            });
        }
        self.clips.push(Arc::new(clip));
        Ok(())
    }

    /// Builder-style [`push_clip`](Self::push_clip).
    pub fn with_clip(mut self, clip: AnimationClip) -> Result<Self> {
        self.push_clip(clip)?;
        Ok(self)
    }

    #[must_use]
    #[inline]
    pub fn bone_count(&self) -> usize {
        self.bone_count
    }

    #[must_use]
    #[inline]
    pub fn clip_count(&self) -> usize {
        self.clips.len()
    }

    #[must_use]
    #[inline]
    pub fn clip(&self, index: usize) -> Option<&Arc<AnimationClip>> {
        self.clips.get(index)
    }

    /// Linear search for an exact name match.
    #[must_use]
    pub fn find_clip(&self, name: &str) -> Option<&Arc<AnimationClip>> {
        self.clips.iter().find(|clip| clip.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clip::AnimationKey;
    use glam::Mat4;

    fn simple_clip(name: &str, bones: usize) -> AnimationClip {
        AnimationClip::new(
            name,
            30.0,
            10.0,
            vec![
                AnimationKey::new(0.0, vec![Mat4::IDENTITY; bones]),
                AnimationKey::new(10.0, vec![Mat4::IDENTITY; bones]),
            ],
        )
    }

    #[test]
    fn test_push_and_find_clip() {
        let mut rig = SkeletonRig::new("biped", 3);
        rig.push_clip(simple_clip("idle", 3)).unwrap();
        rig.push_clip(simple_clip("run", 3)).unwrap();

        assert_eq!(rig.clip_count(), 2);
        assert_eq!(rig.clip(1).unwrap().name, "run");
        assert_eq!(rig.find_clip("idle").unwrap().name, "idle");
        assert!(rig.find_clip("swim").is_none());
    }

    #[test]
    fn test_push_rejects_bone_count_mismatch() {
        let mut rig = SkeletonRig::new("biped", 3);
        let err = rig.push_clip(simple_clip("idle", 4)).unwrap_err();
        assert!(matches!(err, AnimationError::MalformedClip { .. }));
        assert_eq!(rig.clip_count(), 0);
    }

    #[test]
    fn test_push_rejects_non_finite_tick_rate() {
        let mut rig = SkeletonRig::new("biped", 3);
        let mut clip = simple_clip("idle", 3);
        clip.ticks_per_second = f32::NAN;
        assert!(rig.push_clip(clip).is_err());
        assert_eq!(rig.clip_count(), 0);
    }

    #[test]
    fn test_with_clip_builder_chains() {
        let rig = SkeletonRig::new("biped", 3)
            .with_clip(simple_clip("idle", 3))
            .unwrap()
            .with_clip(simple_clip("run", 3))
            .unwrap();
        assert_eq!(rig.clip_count(), 2);
        assert!(rig.with_clip(simple_clip("bad", 2)).is_err());
    }

    #[test]
    fn test_rigs_get_distinct_ids() {
        assert_ne!(SkeletonRig::new("a", 1).id, SkeletonRig::new("b", 1).id);
    }
}
