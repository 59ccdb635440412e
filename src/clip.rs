use glam::Mat4;

use crate::errors::{AnimationError, Result};

/// Every bone's transform captured at a single tick.
#[derive(Debug, Clone)]
pub struct AnimationKey {
    pub tick: f32,
    /// One matrix per bone, index-stable across all keys of a clip.
    pub bone_transforms: Vec<Mat4>,
}

impl AnimationKey {
    #[must_use]
    pub fn new(tick: f32, bone_transforms: Vec<Mat4>) -> Self {
        Self {
            tick,
            bone_transforms,
        }
    }

    #[must_use]
    #[inline]
    pub fn bone_count(&self) -> usize {
        self.bone_transforms.len()
    }
}

/// A named animation sequence: tick rate, duration and ordered keyframes.
#[derive(Debug, Clone)]
pub struct AnimationClip {
    pub name: String,
    /// Playback rate that converts wall-clock seconds into ticks.
    pub ticks_per_second: f32,
    /// Total length in ticks; at least the last key's tick.
    pub duration: f32,
    /// Keys ordered by strictly ascending tick, first key at tick 0.
    pub keys: Vec<AnimationKey>,
}

/// A bracketing keyframe pair plus the normalized blend position between
/// them.
///
/// `prev` and `next` index into [`AnimationClip::keys`]. In the final
/// segment of a looping clip the bracket wraps around: `prev` is the last
/// key and `next` is key 0.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KeyBracket {
    pub prev: usize,
    pub next: usize,
    /// Normalized interpolation position in `[0, 1]`.
    pub blend: f32,
}

impl AnimationClip {
    #[must_use]
    pub fn new(name: &str, ticks_per_second: f32, duration: f32, keys: Vec<AnimationKey>) -> Self {
        Self {
            name: name.to_string(),
            ticks_per_second,
            duration,
            keys,
        }
    }

    /// Bone count shared by every key of a validated clip.
    #[must_use]
    #[inline]
    pub fn bone_count(&self) -> usize {
        self.keys.first().map_or(0, AnimationKey::bone_count)
    }

    /// Finds the keyframe pair enclosing `cursor` and the blend factor
    /// between them.
    ///
    /// A cursor at or beyond the last key's tick falls into the loop
    /// segment: the bracket becomes `(last key, key 0)` and the blend factor
    /// is computed against `duration` as the upper bound, so the lookup is
    /// circular rather than falling through with stale keys.
    ///
    /// An empty clip yields the zero bracket `(0, 0, 0.0)`; such clips are
    /// unplayable and the indices must not be used against `keys`.
    #[must_use]
    pub fn bracket(&self, cursor: f32) -> KeyBracket {
        if self.keys.is_empty() {
            return KeyBracket {
                prev: 0,
                next: 0,
                blend: 0.0,
            };
        }

        // First key whose tick exceeds the cursor.
        let next = self.keys.partition_point(|key| key.tick <= cursor);

        if next >= self.keys.len() {
            // Loop segment: last key back to key 0, bounded by the clip
            // duration instead of key 0's raw tick.
            let prev = self.keys.len() - 1;
            let span = self.duration - self.keys[prev].tick;
            let blend = if span > f32::EPSILON {
                ((cursor - self.keys[prev].tick) / span).clamp(0.0, 1.0)
            } else {
                0.0
            };
            return KeyBracket {
                prev,
                next: 0,
                blend,
            };
        }

        if next == 0 {
            // Cursor ahead of the first key; clamp onto it.
            return KeyBracket {
                prev: 0,
                next: 0,
                blend: 0.0,
            };
        }

        let prev = next - 1;
        let span = self.keys[next].tick - self.keys[prev].tick;
        let blend = if span > f32::EPSILON {
            ((cursor - self.keys[prev].tick) / span).clamp(0.0, 1.0)
        } else {
            0.0
        };
        KeyBracket { prev, next, blend }
    }

    /// Checks the structural invariants a playable clip must satisfy.
    ///
    /// - finite timing values throughout (key ticks, tick rate, duration)
    /// - at least one key, the first at tick 0
    /// - strictly increasing key ticks
    /// - the same non-zero bone count in every key
    /// - a positive tick rate and a duration covering the last key
    ///
    /// Non-finite values are rejected up front; the ordering and range
    /// checks below them compare finite numbers only, so NaN cannot slip
    /// through a failed comparison.
    pub fn validate(&self) -> Result<()> {
        if !self.ticks_per_second.is_finite() || !self.duration.is_finite() {
            return Err(self.malformed(format!(
                "non-finite timing: {} ticks per second, duration {}",
                self.ticks_per_second, self.duration
            )));
        }

        let Some(first) = self.keys.first() else {
            return Err(self.malformed("clip has no keys"));
        };
        if let Some(index) = self.keys.iter().position(|key| !key.tick.is_finite()) {
            return Err(self.malformed(format!("key {index} has a non-finite tick")));
        }
        if first.tick.abs() > f32::EPSILON {
            return Err(self.malformed(format!(
                "first key starts at tick {}, expected 0",
                first.tick
            )));
        }

        let bone_count = first.bone_count();
        if bone_count == 0 {
            return Err(self.malformed("keys carry no bone transforms"));
        }
        for (index, pair) in self.keys.windows(2).enumerate() {
            if pair[1].tick <= pair[0].tick {
                return Err(self.malformed(format!(
                    "key ticks are not strictly increasing at key {}",
                    index + 1
                )));
            }
        }
        for (index, key) in self.keys.iter().enumerate() {
            if key.bone_count() != bone_count {
                return Err(self.malformed(format!(
                    "key {} has {} bone transforms, expected {}",
                    index,
                    key.bone_count(),
                    bone_count
                )));
            }
        }

        if self.ticks_per_second <= 0.0 {
            return Err(self.malformed(format!(
                "ticks per second must be positive, got {}",
                self.ticks_per_second
            )));
        }
        let last_tick = self.keys[self.keys.len() - 1].tick;
        if self.duration <= 0.0 || self.duration < last_tick {
            return Err(self.malformed(format!(
                "duration {} does not cover the last key at tick {last_tick}",
                self.duration
            )));
        }

        Ok(())
    }

    fn malformed(&self, reason: impl Into<String>) -> AnimationError {
        AnimationError::MalformedClip {
            clip: self.name.clone(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(tick: f32) -> AnimationKey {
        AnimationKey::new(tick, vec![Mat4::IDENTITY])
    }

    fn clip(duration: f32, ticks: &[f32]) -> AnimationClip {
        AnimationClip::new(
            "walk",
            30.0,
            duration,
            ticks.iter().map(|&t| key(t)).collect(),
        )
    }

    #[test]
    fn test_bracket_interior() {
        let clip = clip(10.0, &[0.0, 4.0, 10.0]);
        let bracket = clip.bracket(1.0);
        assert_eq!(bracket.prev, 0);
        assert_eq!(bracket.next, 1);
        assert!((bracket.blend - 0.25).abs() < 1e-6);
    }

    #[test]
    fn test_bracket_on_exact_key() {
        let clip = clip(10.0, &[0.0, 4.0, 10.0]);
        let bracket = clip.bracket(4.0);
        assert_eq!(bracket.prev, 1);
        assert_eq!(bracket.next, 2);
        assert!(bracket.blend.abs() < 1e-6);
    }

    #[test]
    fn test_bracket_wraps_final_segment() {
        // Keys stop at tick 6 while the clip runs to tick 10: the cursor
        // spends ticks 6..10 blending from the last key back to key 0.
        let clip = clip(10.0, &[0.0, 6.0]);
        let bracket = clip.bracket(8.0);
        assert_eq!(bracket.prev, 1);
        assert_eq!(bracket.next, 0);
        assert!((bracket.blend - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_bracket_cursor_at_duration() {
        let clip = clip(10.0, &[0.0, 10.0]);
        let bracket = clip.bracket(10.0);
        assert_eq!(bracket.prev, 1);
        assert_eq!(bracket.next, 0);
        assert!(bracket.blend.abs() < 1e-6);
    }

    #[test]
    fn test_bracket_single_key() {
        let clip = clip(10.0, &[0.0]);
        let bracket = clip.bracket(5.0);
        assert_eq!(bracket.prev, 0);
        assert_eq!(bracket.next, 0);
        assert!((bracket.blend - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_bracket_empty_clip_is_zero() {
        let clip = AnimationClip::new("hollow", 30.0, 10.0, vec![]);
        assert_eq!(
            clip.bracket(3.0),
            KeyBracket {
                prev: 0,
                next: 0,
                blend: 0.0
            }
        );
    }

    #[test]
    fn test_validate_accepts_well_formed_clip() {
        assert!(clip(10.0, &[0.0, 4.0, 10.0]).validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_late_first_key() {
        let err = clip(10.0, &[1.0, 4.0]).validate().unwrap_err();
        assert!(matches!(err, AnimationError::MalformedClip { .. }));
    }

    #[test]
    fn test_validate_rejects_unsorted_keys() {
        assert!(clip(10.0, &[0.0, 4.0, 4.0]).validate().is_err());
        assert!(clip(10.0, &[0.0, 5.0, 3.0]).validate().is_err());
    }

    #[test]
    fn test_validate_rejects_uneven_bone_counts() {
        let mut clip = clip(10.0, &[0.0, 4.0]);
        clip.keys[1].bone_transforms.push(Mat4::IDENTITY);
        assert!(clip.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_short_duration() {
        assert!(clip(3.0, &[0.0, 4.0]).validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_tick_rate() {
        let mut clip = clip(10.0, &[0.0, 4.0]);
        clip.ticks_per_second = 0.0;
        assert!(clip.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_non_finite_tick_rate() {
        let mut clip = clip(10.0, &[0.0, 4.0]);
        clip.ticks_per_second = f32::NAN;
        assert!(clip.validate().is_err());
        clip.ticks_per_second = f32::INFINITY;
        assert!(clip.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_non_finite_duration() {
        assert!(clip(f32::NAN, &[0.0, 4.0]).validate().is_err());
        assert!(clip(f32::INFINITY, &[0.0, 4.0]).validate().is_err());
    }

    #[test]
    fn test_validate_rejects_non_finite_key_tick() {
        let mut clip = clip(10.0, &[0.0, 4.0]);
        clip.keys[1].tick = f32::NAN;
        assert!(clip.validate().is_err());
    }
}
