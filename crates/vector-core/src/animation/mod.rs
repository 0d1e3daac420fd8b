//! Animation descriptions and their playback.
//!
//! Descriptions ([`AnimatorDescription`]) are plain data produced by the
//! animator parser and shared behind `Arc`. An [`AnimationPlayer`] binds
//! them to a [`Shape`](crate::scene::Shape) by target name and writes
//! interpolated values into it on every frame.

pub mod clock;
pub mod description;
pub mod interpolator;
pub mod player;
pub mod property;
mod runtime;
pub mod value;

pub use clock::{FrameClock, ManualClock, SystemClock};
pub use description::{
    AnimatorDescription, AnimatorSetDescription, Keyframe, Ordering, PropertyValues, RepeatMode,
    TargetAnimation, ValueAnimatorDescription, INFINITE,
};
pub use interpolator::Interpolator;
pub use player::{AnimationPlayer, PlayerState};
pub use property::{BoundProperty, GroupProperty, PathProperty};
pub use value::{AnimatedValue, ValueType};
