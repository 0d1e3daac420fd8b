pub mod animation;
pub mod cache;
pub mod canvas;
pub mod drawable;
pub mod element;
pub mod error;
pub mod geometry;
pub mod parser;
pub mod scene;

pub use animation::{
    AnimatedValue, AnimationPlayer, AnimatorDescription, FrameClock, Interpolator, ManualClock,
    PlayerState, SystemClock, TargetAnimation,
};
pub use cache::DescriptionCache;
pub use canvas::{
    DrawCommand, DrawContext, FillType, LineCap, LineJoin, PaintStyle, PathPaint, RecordingContext,
};
pub use drawable::{
    AnimatedVectorDrawable, AnimatedVectorLoader, Playback, Renderable, VectorDrawable,
    VectorPathContainer,
};
pub use element::{ClipPathElement, DrawMode, PathElement, PathStyle};
pub use error::{Result, VectorError};
pub use geometry::{GeometryPath, PathDataNode, PathMeasure};
pub use scene::{
    ClipPathId, GroupElement, GroupId, GroupMut, GroupTransform, PathId, Shape, ShapeAttributes,
    Target,
};
