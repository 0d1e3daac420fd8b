//! Streaming parsers over [`MarkupReader`](vector_data::MarkupReader)
//! events: vector scenes, animator descriptions and animated-vector
//! documents.

pub mod animated;
pub mod animator;
pub mod vector;

pub use animated::{parse_animated_vector, AnimatedVectorDocument, TargetReference};
pub use animator::{parse_animator, AnimatorContext};
pub use vector::{parse_vector, SceneParse};
