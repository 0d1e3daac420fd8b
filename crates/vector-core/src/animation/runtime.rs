//! Animator trees bound to scene nodes.
//!
//! Binding copies everything a leaf needs out of its description, so later
//! edits to a description never reach a running animation.

use super::description::{
    AnimatorDescription, Keyframe, Ordering, PropertyValues, RepeatMode, ValueAnimatorDescription,
};
use super::interpolator::Interpolator;
use super::property::BoundProperty;
use super::value::{AnimatedValue, ValueType};
use crate::error::{Result, VectorError};
use crate::scene::{Shape, Target};
use std::collections::HashSet;
use tracing::warn;

#[derive(Debug, Clone)]
struct ResolvedKeyframe {
    fraction: f32,
    value: AnimatedValue,
    interpolator: Option<Interpolator>,
}

/// One property driven by a leaf.
#[derive(Debug, Clone)]
struct Channel {
    property: BoundProperty,
    template: Vec<Keyframe>,
    resolved: Vec<ResolvedKeyframe>,
}

impl Channel {
    /// Fills keyframes that have no value with the property's current value.
    fn capture(&mut self, shape: &Shape) {
        let mut current = None;
        self.resolved = self
            .template
            .iter()
            .map(|kf| ResolvedKeyframe {
                fraction: kf.fraction,
                value: match &kf.value {
                    Some(v) => v.clone(),
                    None => current.get_or_insert_with(|| self.property.current(shape)).clone(),
                },
                interpolator: kf.interpolator,
            })
            .collect();
    }

    /// Keyframe lookup. Fractions outside `[0, 1]` extrapolate along the
    /// first or last interval.
    fn evaluate(&self, fraction: f32) -> Result<Option<AnimatedValue>> {
        let kfs = &self.resolved;
        match kfs.len() {
            0 => return Ok(None),
            1 => return Ok(Some(kfs[0].value.clone())),
            _ => {}
        }
        let idx = kfs
            .partition_point(|kf| kf.fraction <= fraction)
            .clamp(1, kfs.len() - 1);
        let (prev, next) = (&kfs[idx - 1], &kfs[idx]);
        let span = next.fraction - prev.fraction;
        let mut local = if span > 0.0 {
            (fraction - prev.fraction) / span
        } else {
            1.0
        };
        if let Some(interpolator) = next.interpolator {
            local = interpolator.eval(local);
        }
        prev.value.interpolate(&next.value, local).map(Some)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LeafState {
    Idle,
    Running,
    Settled,
}

#[derive(Debug, Clone)]
pub(crate) struct BoundLeaf {
    duration: u64,
    start_delay: u64,
    repeat_count: i32,
    repeat_mode: RepeatMode,
    interpolator: Interpolator,
    channels: Vec<Channel>,
    captured: bool,
    state: LeafState,
}

impl BoundLeaf {
    fn bind(
        desc: &ValueAnimatorDescription,
        target: Target,
        warned: &mut HashSet<String>,
    ) -> Result<Self> {
        let mut channels = Vec::new();
        for holder in &desc.property_values {
            if let Some(channel) = Self::bind_holder(holder, target, warned)? {
                channels.push(channel);
            }
        }
        Ok(Self {
            duration: desc.duration,
            start_delay: desc.start_delay,
            repeat_count: desc.repeat_count,
            repeat_mode: desc.repeat_mode,
            interpolator: desc.interpolator,
            channels,
            captured: false,
            state: LeafState::Idle,
        })
    }

    fn bind_holder(
        holder: &PropertyValues,
        target: Target,
        warned: &mut HashSet<String>,
    ) -> Result<Option<Channel>> {
        if holder.property.is_empty() {
            return Ok(None);
        }
        if holder.value_type == ValueType::Undefined {
            return Err(VectorError::UndefinedValueType(holder.property.clone()));
        }
        match BoundProperty::resolve(target, &holder.property) {
            Some(property) => Ok(Some(Channel {
                property,
                template: holder.keyframes.clone(),
                resolved: Vec::new(),
            })),
            None => {
                if warned.insert(holder.property.clone()) {
                    warn!(
                        property = %holder.property,
                        "Property is not animatable on this target, ignoring"
                    );
                }
                Ok(None)
            }
        }
    }

    fn total_duration(&self) -> Option<u64> {
        if self.repeat_count < 0 {
            return None;
        }
        Some(self.start_delay + self.duration * (self.repeat_count as u64 + 1))
    }

    /// Where a finished leaf rests: reverse mode with an even number of
    /// plays ends back at the start.
    fn end_fraction(&self) -> f32 {
        let odd_repeats = self.repeat_count > 0 && self.repeat_count % 2 == 1;
        if self.repeat_mode == RepeatMode::Reverse && odd_repeats {
            0.0
        } else {
            1.0
        }
    }

    /// Linear fraction `active` ms after the delay, and whether the leaf
    /// has run out.
    fn linear_fraction(&self, active: f64) -> (f32, bool) {
        if self.duration == 0 {
            return (self.end_fraction(), true);
        }
        let iteration = active / self.duration as f64;
        if self.repeat_count >= 0 && iteration >= (self.repeat_count + 1) as f64 {
            return (self.end_fraction(), true);
        }
        let whole = iteration.floor();
        let mut fraction = (iteration - whole) as f32;
        if self.repeat_mode == RepeatMode::Reverse && (whole as i64) % 2 == 1 {
            fraction = 1.0 - fraction;
        }
        (fraction, false)
    }

    fn ensure_captured(&mut self, shape: &Shape) {
        if !self.captured {
            for channel in &mut self.channels {
                channel.capture(shape);
            }
            self.captured = true;
        }
    }

    fn write(&mut self, shape: &mut Shape, linear: f32) -> Result<()> {
        self.ensure_captured(shape);
        let eased = self.interpolator.eval(linear);
        for channel in &self.channels {
            if let Some(value) = channel.evaluate(eased)? {
                channel.property.apply(shape, &value)?;
            }
        }
        Ok(())
    }

    fn apply_at(&mut self, play: f64, shape: &mut Shape) -> Result<()> {
        if play < self.start_delay as f64 {
            // Playing backwards through the delay leaves the start values.
            if self.state != LeafState::Idle {
                self.write(shape, 0.0)?;
                self.state = LeafState::Idle;
            }
            return Ok(());
        }
        let (fraction, done) = self.linear_fraction(play - self.start_delay as f64);
        if done {
            if self.state != LeafState::Settled {
                self.write(shape, fraction)?;
                self.state = LeafState::Settled;
            }
            return Ok(());
        }
        self.write(shape, fraction)?;
        self.state = LeafState::Running;
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub(crate) struct BoundSet {
    ordering: Ordering,
    children: Vec<BoundAnimator>,
}

/// A description tree bound to a scene.
#[derive(Debug, Clone)]
pub(crate) enum BoundAnimator {
    Leaf(BoundLeaf),
    Set(BoundSet),
}

impl BoundAnimator {
    pub(crate) fn bind(desc: &AnimatorDescription, target: Target) -> Result<Self> {
        let mut warned = HashSet::new();
        Self::bind_with(desc, target, &mut warned)
    }

    fn bind_with(
        desc: &AnimatorDescription,
        target: Target,
        warned: &mut HashSet<String>,
    ) -> Result<Self> {
        Ok(match desc {
            AnimatorDescription::Value(v) => {
                BoundAnimator::Leaf(BoundLeaf::bind(v, target, warned)?)
            }
            AnimatorDescription::Set(set) => BoundAnimator::Set(BoundSet {
                ordering: set.ordering,
                children: set
                    .children
                    .iter()
                    .map(|c| Self::bind_with(c, target, warned))
                    .collect::<Result<_>>()?,
            }),
        })
    }

    pub(crate) fn together(children: Vec<BoundAnimator>) -> Self {
        BoundAnimator::Set(BoundSet {
            ordering: Ordering::Together,
            children,
        })
    }

    pub(crate) fn total_duration(&self) -> Option<u64> {
        match self {
            BoundAnimator::Leaf(leaf) => leaf.total_duration(),
            BoundAnimator::Set(set) => {
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

    /// Forgets captured start values so the next run samples the scene again.
    pub(crate) fn rewind(&mut self) {
        match self {
            BoundAnimator::Leaf(leaf) => {
                leaf.captured = false;
                leaf.state = LeafState::Idle;
            }
            BoundAnimator::Set(set) => set.children.iter_mut().for_each(Self::rewind),
        }
    }

    /// Writes the values at `play` ms into the scene.
    pub(crate) fn apply_at(&mut self, play: f64, shape: &mut Shape) -> Result<()> {
        match self {
            BoundAnimator::Leaf(leaf) => leaf.apply_at(play, shape),
            BoundAnimator::Set(set) => match set.ordering {
                Ordering::Together => {
                    for child in &mut set.children {
                        child.apply_at(play, shape)?;
                    }
                    Ok(())
                }
                Ordering::Sequentially => {
                    let mut offset = 0u64;
                    for child in &mut set.children {
                        child.apply_at(play - offset as f64, shape)?;
                        match child.total_duration() {
                            Some(d) => offset += d,
                            None => break,
                        }
                    }
                    Ok(())
                }
            },
        }
    }

    pub(crate) fn apply_end(&mut self, shape: &mut Shape) -> Result<()> {
        match self {
            BoundAnimator::Leaf(leaf) => {
                let fraction = leaf.end_fraction();
                leaf.write(shape, fraction)?;
                leaf.state = LeafState::Settled;
                Ok(())
            }
            BoundAnimator::Set(set) => {
                for child in &mut set.children {
                    child.apply_end(shape)?;
                }
                Ok(())
            }
        }
    }

    /// Children are visited last to first so the earliest writer of a
    /// property has the final say.
    pub(crate) fn apply_start(&mut self, shape: &mut Shape) -> Result<()> {
        match self {
            BoundAnimator::Leaf(leaf) => {
                leaf.write(shape, 0.0)?;
                leaf.state = LeafState::Idle;
                Ok(())
            }
            BoundAnimator::Set(set) => {
                for child in set.children.iter_mut().rev() {
                    child.apply_start(shape)?;
                }
                Ok(())
            }
        }
    }
}
