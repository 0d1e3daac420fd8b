// vector-data: markup, color and resource plumbing shared by the vector crates

/// Errors raised while reading markup or resolving resources.
pub mod error;
/// A pull-style markup reader and its XML implementation.
pub mod markup;
/// ARGB colors and color literal parsing.
pub mod color;
/// Dimension strings such as `24dp` or `1.5mm`.
pub mod dimension;
/// Screen density configuration.
pub mod metrics;
/// Resolution of `@type/name` references.
pub mod resources;

pub use color::Color;
pub use dimension::{Dimension, DimensionUnit};
pub use error::MarkupError;
pub use markup::{Attributes, MarkupEvent, MarkupReader, Tag, XmlMarkupReader};
pub use metrics::DisplayMetrics;
pub use resources::{MemoryResources, ResourceDirectory, ResourceRef, Resources};
