//! Immutable animation templates. A parsed description is shared; binding
//! clones it per drawable, and edits always go through a copy.

use super::interpolator::Interpolator;
use super::value::{AnimatedValue, ValueType};
use crate::error::{Result, VectorError};
use crate::geometry::{can_morph, nodes_to_string};
use std::sync::Arc;

/// Repeat count meaning "forever".
pub const INFINITE: i32 = -1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RepeatMode {
    #[default]
    Restart,
    Reverse,
}

impl RepeatMode {
    pub fn from_code(code: i32) -> Self {
        match code {
            2 => RepeatMode::Reverse,
            _ => RepeatMode::Restart,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Ordering {
    #[default]
    Together,
    Sequentially,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Keyframe {
    /// Position in normalized time. Negative means "not given" until the
    /// list is normalized.
    pub fraction: f32,
    /// `None` takes the target's value when playback starts.
    pub value: Option<AnimatedValue>,
    /// Curve used on the way into this keyframe.
    pub interpolator: Option<Interpolator>,
}

impl Keyframe {
    pub fn new(fraction: f32, value: Option<AnimatedValue>) -> Self {
        Self {
            fraction,
            value,
            interpolator: None,
        }
    }
}

/// The values one property moves through.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyValues {
    /// Empty for plain value animators that drive nothing.
    pub property: String,
    pub value_type: ValueType,
    pub keyframes: Vec<Keyframe>,
}

impl PropertyValues {
    /// Evenly spaced values. A single value animates from whatever the
    /// target holds at start.
    pub fn of_values(property: &str, values: Vec<AnimatedValue>) -> Self {
        let value_type = values
            .first()
            .map_or(ValueType::Undefined, |v| v.value_type());
        let keyframes = if values.len() == 1 {
            vec![Keyframe::new(0.0, None), Keyframe::new(1.0, values.into_iter().next())]
        } else {
            let last = values.len().saturating_sub(1).max(1) as f32;
            values
                .into_iter()
                .enumerate()
                .map(|(i, v)| Keyframe::new(i as f32 / last, Some(v)))
                .collect()
        };
        Self {
            property: property.to_string(),
            value_type,
            keyframes,
        }
    }

    pub fn of_keyframes(
        property: &str,
        value_type: ValueType,
        mut keyframes: Vec<Keyframe>,
    ) -> Self {
        normalize_keyframes(&mut keyframes);
        if keyframes.len() == 1 {
            keyframes.insert(0, Keyframe::new(0.0, None));
        }
        Self {
            property: property.to_string(),
            value_type,
            keyframes,
        }
    }
}

/// Fills in keyframe fractions the markup left out.
///
/// The last keyframe is pinned to 1 (or a copy is appended at 1), the first
/// to 0 (or a copy is inserted at 0), and runs of unset fractions are spread
/// evenly between their neighbours. Copies keep their neighbour's value, so
/// the padded stretch holds that value instead of reading the target.
pub fn normalize_keyframes(keyframes: &mut Vec<Keyframe>) {
    if keyframes.is_empty() {
        return;
    }

    if let Some(last) = keyframes.last_mut() {
        if last.fraction < 1.0 {
            if last.fraction < 0.0 {
                last.fraction = 1.0;
            } else {
                let mut copy = last.clone();
                copy.fraction = 1.0;
                keyframes.push(copy);
            }
        }
    }

    let first = &mut keyframes[0];
    if first.fraction != 0.0 {
        if first.fraction < 0.0 {
            first.fraction = 0.0;
        } else {
            let mut copy = first.clone();
            copy.fraction = 0.0;
            keyframes.insert(0, copy);
        }
    }

    let count = keyframes.len();
    let mut j = 1;
    while j + 1 < count {
        if keyframes[j].fraction < 0.0 {
            let start = j;
            let mut end = j;
            while end + 2 < count && keyframes[end + 1].fraction < 0.0 {
                end += 1;
            }
            let gap = keyframes[end + 1].fraction - keyframes[start - 1].fraction;
            let increment = gap / (end - start + 2) as f32;
            for i in start..=end {
                keyframes[i].fraction = keyframes[i - 1].fraction + increment;
            }
            j = end + 1;
        } else {
            j += 1;
        }
    }
}

/// A single timed animator.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueAnimatorDescription {
    pub property_values: Vec<PropertyValues>,
    /// Milliseconds.
    pub duration: u64,
    /// Milliseconds.
    pub start_delay: u64,
    /// Extra plays after the first; [`INFINITE`] repeats forever.
    pub repeat_count: i32,
    pub repeat_mode: RepeatMode,
    pub interpolator: Interpolator,
}

impl Default for ValueAnimatorDescription {
    fn default() -> Self {
        Self {
            property_values: Vec::new(),
            duration: 300,
            start_delay: 0,
            repeat_count: 0,
            repeat_mode: RepeatMode::Restart,
            interpolator: Interpolator::default(),
        }
    }
}

impl ValueAnimatorDescription {
    pub fn total_duration(&self) -> Option<u64> {
        if self.repeat_count < 0 {
            return None;
        }
        Some(self.start_delay + self.duration * (self.repeat_count as u64 + 1))
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct AnimatorSetDescription {
    pub ordering: Ordering,
    pub children: Vec<AnimatorDescription>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AnimatorDescription {
    Value(ValueAnimatorDescription),
    Set(AnimatorSetDescription),
}

impl AnimatorDescription {
    /// Milliseconds until every child has finished, or `None` when
    /// something repeats forever.
    pub fn total_duration(&self) -> Option<u64> {
        match self {
            AnimatorDescription::Value(v) => v.total_duration(),
            AnimatorDescription::Set(set) => {
                let mut total = 0u64;
                for child in &set.children {
                    let d = child.total_duration()?;
                    total = match set.ordering {
                        Ordering::Together => total.max(d),
                        Ordering::Sequentially => total + d,
                    };
                }
                Some(total)
            }
        }
    }

    pub fn is_infinite(&self) -> bool {
        self.total_duration().is_none()
    }

    /// Rewrites every holder for `property` to animate through `values`.
    /// Returns how many holders changed.
    pub fn replace_values(&mut self, property: &str, values: &[AnimatedValue]) -> Result<usize> {
        for pair in values.windows(2) {
            if let (AnimatedValue::Path(a), AnimatedValue::Path(b)) = (&pair[0], &pair[1]) {
                if !can_morph(a, b) {
                    return Err(VectorError::IncompatiblePathMorph {
                        from: nodes_to_string(a),
                        to: nodes_to_string(b),
                    });
                }
            }
        }
        Ok(self.replace_values_unchecked(property, values))
    }

    fn replace_values_unchecked(&mut self, property: &str, values: &[AnimatedValue]) -> usize {
        match self {
            AnimatorDescription::Value(v) => {
                let mut changed = 0;
                for holder in v.property_values.iter_mut().filter(|h| h.property == property) {
                    *holder = PropertyValues::of_values(property, values.to_vec());
                    changed += 1;
                }
                changed
            }
            AnimatorDescription::Set(set) => set
                .children
                .iter_mut()
                .map(|c| c.replace_values_unchecked(property, values))
                .sum(),
        }
    }
}

/// An animation and the name of the scene node it drives.
#[derive(Debug, Clone, PartialEq)]
pub struct TargetAnimation {
    pub target_name: String,
    pub animation: Arc<AnimatorDescription>,
}
