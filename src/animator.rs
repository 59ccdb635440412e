use std::sync::Arc;

use glam::Mat4;

use crate::clip::AnimationClip;
use crate::errors::{AnimationError, Result};
use crate::pose::Pose;
use crate::rig::SkeletonRig;

/// Plays back one clip at a time from a shared [`SkeletonRig`], producing
/// the per-bone pose consumed by mesh skinning.
///
/// The animator owns its playback state (cursor, flags, pose buffer) and
/// borrows the clip library through the rig handle; several animators can
/// share one rig. It is driven once per simulation tick via
/// [`update`](Self::update); while paused or clip-less the pose is left
/// untouched.
#[derive(Debug, Clone)]
pub struct SkeletalAnimator {
    rig: Arc<SkeletonRig>,
    clip: Option<Arc<AnimationClip>>,

    /// Playback position in ticks, kept within `[0, duration]`.
    cursor: f32,
    playing: bool,
    reversed: bool,
    speed: f32,

    pose: Pose,
}

impl SkeletalAnimator {
    /// Creates an animator bound to `rig`, pre-selecting clip 0 when the
    /// library has one. Starts paused, presenting the first clip's first
    /// keyframe (or the identity pose for an empty library).
    #[must_use]
    pub fn new(rig: Arc<SkeletonRig>) -> Self {
        let mut animator = Self {
            pose: Pose::identity(rig.bone_count()),
            clip: None,
            cursor: 0.0,
            playing: false,
            reversed: false,
            speed: 1.0,
            rig,
        };
        if let Some(clip) = animator.rig.clip(0).cloned() {
            animator.select_clip_handle(clip);
        }
        animator
    }

    /// Selects a clip from the rig's library by index.
    ///
    /// An out-of-range index leaves the animator clip-less on an identity
    /// pose, with the same reset applied as a successful selection.
    pub fn select_clip_index(&mut self, index: usize) -> Result<()> {
        let Some(clip) = self.rig.clip(index).cloned() else {
            let err = AnimationError::InvalidClipReference {
                context: format!(
                    "clip index {index} out of range, rig {:?} holds {} clips",
                    self.rig.name,
                    self.rig.clip_count()
                ),
            };
            log::warn!("{err}");
            self.clear_clip();
            return Err(err);
        };
        self.select_clip_handle(clip);
        Ok(())
    }

    /// Selects a clip from the rig's library by exact name.
    ///
    /// Fails the same way as [`select_clip_index`](Self::select_clip_index)
    /// when no clip matches.
    pub fn select_clip_name(&mut self, name: &str) -> Result<()> {
        let Some(clip) = self.rig.find_clip(name).cloned() else {
            let err = AnimationError::InvalidClipReference {
                context: format!("no clip named {name:?} in rig {:?}", self.rig.name),
            };
            log::warn!("{err}");
            self.clear_clip();
            return Err(err);
        };
        self.select_clip_handle(clip);
        Ok(())
    }

    /// Switches playback to `clip` directly. Always succeeds; the cursor
    /// and speed are reset and the playing flag is left untouched.
    pub fn select_clip_handle(&mut self, clip: Arc<AnimationClip>) {
        self.clip = Some(clip);
        self.reset(false);
    }

    fn clear_clip(&mut self) {
        self.clip = None;
        self.reset(false);
    }

    /// Rewinds playback: cursor to tick 0, speed back to 1.0. Passing
    /// `pause` also clears the playing flag.
    ///
    /// With a clip set the pose becomes a verbatim copy of the clip's first
    /// keyframe (no interpolation); without one it becomes the identity
    /// pose, sized to the rig's bone count.
    pub fn reset(&mut self, pause: bool) {
        if pause {
            self.playing = false;
        }
        self.cursor = 0.0;
        self.speed = 1.0;

        self.pose.set_bone_count(self.rig.bone_count());
        let assigned = match &self.clip {
            Some(clip) => match self.pose.assign_first_key(clip) {
                Ok(()) => true,
                Err(err) => {
                    log::warn!("{err}, presenting identity pose");
                    false
                }
            },
            None => false,
        };
        if !assigned {
            self.pose.fill_identity();
        }
    }

    /// Advances playback by `dt` seconds of wall-clock time and rewrites
    /// the pose in place.
    ///
    /// A no-op unless playing with a clip set. A malformed clip aborts only
    /// this tick's pose update, holding the previous pose; later ticks are
    /// unaffected.
    pub fn update(&mut self, dt: f32) {
        if !self.playing {
            return;
        }
        let Some(clip) = self.clip.clone() else {
            return;
        };
        let playable = !clip.keys.is_empty()
            && clip.ticks_per_second.is_finite()
            && clip.duration.is_finite()
            && clip.duration > 0.0;
        if !playable {
            log::warn!(
                "clip {:?} is not playable (no keys or unusable timing), holding previous pose",
                clip.name
            );
            return;
        }

        self.advance_cursor(&clip, dt);

        let bracket = clip.bracket(self.cursor);
        if let Err(err) = self.pose.apply_blend(&clip, bracket) {
            log::warn!("{err}, holding previous pose");
        }
    }

    /// Scales `dt` into ticks, caps one frame's advance at a single loop,
    /// then wraps the cursor at the clip boundary in the playback direction.
    fn advance_cursor(&mut self, clip: &AnimationClip, dt: f32) {
        let mut elapsed = dt * clip.ticks_per_second * self.speed;
        elapsed %= clip.duration;

        if self.reversed {
            self.cursor -= elapsed;
            if self.cursor < 0.0 {
                self.cursor += clip.duration;
            }
        } else {
            self.cursor += elapsed;
            if self.cursor > clip.duration {
                self.cursor -= clip.duration;
            }
        }
    }

    /// Starts playback from the current cursor.
    #[inline]
    pub fn play(&mut self) {
        self.playing = true;
    }

    /// Freezes playback; the pose keeps its last computed value.
    #[inline]
    pub fn pause(&mut self) {
        self.playing = false;
    }

    /// Flips the playback direction without moving the cursor.
    #[inline]
    pub fn set_reversed(&mut self, reversed: bool) {
        self.reversed = reversed;
    }

    /// Sets the playback speed multiplier, clamped to be non-negative;
    /// reverse playback is expressed through
    /// [`set_reversed`](Self::set_reversed).
    pub fn set_speed(&mut self, speed: f32) {
        self.speed = speed.max(0.0);
    }

    #[must_use]
    #[inline]
    pub fn is_playing(&self) -> bool {
        self.playing
    }

    #[must_use]
    #[inline]
    pub fn is_reversed(&self) -> bool {
        self.reversed
    }

    #[must_use]
    #[inline]
    pub fn speed(&self) -> f32 {
        self.speed
    }

    /// Current playback position in ticks, in `[0, duration]`.
    #[must_use]
    #[inline]
    pub fn tick_cursor(&self) -> f32 {
        self.cursor
    }

    #[must_use]
    #[inline]
    pub fn has_clip(&self) -> bool {
        self.clip.is_some()
    }

    #[must_use]
    #[inline]
    pub fn current_clip(&self) -> Option<&Arc<AnimationClip>> {
        self.clip.as_ref()
    }

    #[must_use]
    pub fn clip_name(&self) -> Option<&str> {
        self.clip.as_deref().map(|clip| clip.name.as_str())
    }

    #[must_use]
    #[inline]
    pub fn clip_count(&self) -> usize {
        self.rig.clip_count()
    }

    /// The current pose, one transform per bone in skeleton order.
    /// Consumers read it once per tick after [`update`](Self::update) and
    /// must not mutate it.
    #[must_use]
    #[inline]
    pub fn pose(&self) -> &[Mat4] {
        self.pose.transforms()
    }

    #[must_use]
    #[inline]
    pub fn rig(&self) -> &Arc<SkeletonRig> {
        &self.rig
    }
}
