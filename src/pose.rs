use glam::{Mat4, Quat, Vec3};

use crate::clip::{AnimationClip, KeyBracket};
use crate::errors::{AnimationError, Result};

/// Scale axes shorter than this leave no recoverable rotation.
const MIN_SCALE_AXIS: f32 = 1e-4;

/// The per-bone transform array consumed by mesh skinning.
///
/// The buffer has fixed capacity: one slot per bone of the owning rig,
/// resized only when the bone count changes, and rewritten in place each
/// tick the animator is playing.
#[derive(Debug, Clone)]
pub struct Pose {
    transforms: Vec<Mat4>,
}

impl Pose {
    /// An identity pose with one slot per bone.
    #[must_use]
    pub fn identity(bone_count: usize) -> Self {
        Self {
            transforms: vec![Mat4::IDENTITY; bone_count],
        }
    }

    /// Bone transforms in skeleton order.
    #[must_use]
    #[inline]
    pub fn transforms(&self) -> &[Mat4] {
        &self.transforms
    }

    #[must_use]
    #[inline]
    pub fn bone_count(&self) -> usize {
        self.transforms.len()
    }

    pub(crate) fn fill_identity(&mut self) {
        self.transforms.fill(Mat4::IDENTITY);
    }

    /// Adjusts the buffer to `bone_count` slots. No-op while the count is
    /// unchanged, so steady-state playback never reallocates.
    pub(crate) fn set_bone_count(&mut self, bone_count: usize) {
        if self.transforms.len() != bone_count {
            log::debug!(
                "pose buffer resized: {} -> {bone_count} bones",
                self.transforms.len()
            );
            self.transforms.resize(bone_count, Mat4::IDENTITY);
        }
    }

    /// Copies the clip's first keyframe into the pose verbatim, without
    /// interpolation.
    pub(crate) fn assign_first_key(&mut self, clip: &AnimationClip) -> Result<()> {
        let Some(first) = clip.keys.first() else {
            return Err(AnimationError::MalformedClip {
                clip: clip.name.clone(),
                reason: "clip has no keys".into(),
            });
        };
        if first.bone_count() != self.transforms.len() {
            return Err(AnimationError::MalformedClip {
                clip: clip.name.clone(),
                reason: format!(
                    "first key has {} bone transforms, pose holds {}",
                    first.bone_count(),
                    self.transforms.len()
                ),
            });
        }
        self.transforms.copy_from_slice(&first.bone_transforms);
        Ok(())
    }

    /// Blends the bracketing keyframes into the pose.
    ///
    /// Per bone: decompose both key transforms, lerp scale and translation,
    /// slerp rotation, recompose scale-then-rotate-then-translate. A bone
    /// whose transform is not decomposable is replaced by the identity
    /// components and blending continues. Mismatched bone counts abort the
    /// whole update with [`AnimationError::MalformedClip`], leaving the pose
    /// untouched.
    ///
    /// `bracket` must come from [`AnimationClip::bracket`] on the same clip.
    pub(crate) fn apply_blend(&mut self, clip: &AnimationClip, bracket: KeyBracket) -> Result<()> {
        let prev = &clip.keys[bracket.prev];
        let next = &clip.keys[bracket.next];

        if prev.bone_count() != next.bone_count() || prev.bone_count() != self.transforms.len() {
            return Err(AnimationError::MalformedClip {
                clip: clip.name.clone(),
                reason: format!(
                    "bone counts diverge: key {} has {}, key {} has {}, pose holds {}",
                    bracket.prev,
                    prev.bone_count(),
                    bracket.next,
                    next.bone_count(),
                    self.transforms.len()
                ),
            });
        }

        for (bone, slot) in self.transforms.iter_mut().enumerate() {
            // 1. Decompose both bracketing transforms for this bone
            let (scale_a, rotation_a, translation_a) =
                components_or_identity(&clip.name, bone, &prev.bone_transforms[bone]);
            let (scale_b, rotation_b, translation_b) =
                components_or_identity(&clip.name, bone, &next.bone_transforms[bone]);

            // 2. Interpolate each component independently
            let scale = scale_a.lerp(scale_b, bracket.blend);
            let rotation = rotation_a.slerp(rotation_b, bracket.blend);
            let translation = translation_a.lerp(translation_b, bracket.blend);

            // 3. Recompose: scale, then rotate, then translate
            *slot = Mat4::from_scale_rotation_translation(scale, rotation, translation);
        }

        Ok(())
    }
}

/// Splits a bone transform into scale, rotation and translation.
///
/// Rejects matrices with non-finite entries, a collapsed scale axis or a
/// rotation that does not extract to finite components, which glam would
/// otherwise decompose into garbage. The threshold is per axis, so small
/// but legitimate uniform scales still decompose.
fn decompose(matrix: &Mat4) -> Option<(Vec3, Quat, Vec3)> {
    if !matrix.is_finite() {
        return None;
    }
    let (scale, rotation, translation) = matrix.to_scale_rotation_translation();
    if scale.abs().min_element() < MIN_SCALE_AXIS || !rotation.is_finite() {
        return None;
    }
    Some((scale, rotation, translation))
}

fn components_or_identity(clip: &str, bone: usize, matrix: &Mat4) -> (Vec3, Quat, Vec3) {
    match decompose(matrix) {
        Some(components) => components,
        None => {
            let err = AnimationError::DegenerateTransform {
                clip: clip.to_string(),
                bone,
            };
            log::warn!("{err}, substituting identity");
            (Vec3::ONE, Quat::IDENTITY, Vec3::ZERO)
        }
    }
}
