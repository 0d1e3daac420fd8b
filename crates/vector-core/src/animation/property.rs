//! Scene properties an animator can drive, by markup name.

use super::value::AnimatedValue;
use crate::element::{float_alpha_to_int, PathElement};
use crate::error::{Result, VectorError};
use crate::scene::{GroupId, GroupTransform, PathId, Shape, Target};
use vector_data::Color;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathProperty {
    FillColor,
    StrokeColor,
    StrokeWidth,
    StrokeAlpha,
    FillAlpha,
    TrimPathStart,
    TrimPathEnd,
    TrimPathOffset,
    PathData,
}

impl PathProperty {
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "fillColor" => PathProperty::FillColor,
            "strokeColor" => PathProperty::StrokeColor,
            "strokeWidth" => PathProperty::StrokeWidth,
            "strokeAlpha" => PathProperty::StrokeAlpha,
            "fillAlpha" => PathProperty::FillAlpha,
            "trimPathStart" => PathProperty::TrimPathStart,
            "trimPathEnd" => PathProperty::TrimPathEnd,
            "trimPathOffset" => PathProperty::TrimPathOffset,
            "pathData" => PathProperty::PathData,
            _ => return None,
        })
    }

    pub fn name(self) -> &'static str {
        match self {
            PathProperty::FillColor => "fillColor",
            PathProperty::StrokeColor => "strokeColor",
            PathProperty::StrokeWidth => "strokeWidth",
            PathProperty::StrokeAlpha => "strokeAlpha",
            PathProperty::FillAlpha => "fillAlpha",
            PathProperty::TrimPathStart => "trimPathStart",
            PathProperty::TrimPathEnd => "trimPathEnd",
            PathProperty::TrimPathOffset => "trimPathOffset",
            PathProperty::PathData => "pathData",
        }
    }

    /// Alphas read back as fractions of one.
    pub fn current(self, path: &PathElement) -> AnimatedValue {
        match self {
            PathProperty::FillColor => AnimatedValue::Color(path.fill_color()),
            PathProperty::StrokeColor => AnimatedValue::Color(path.stroke_color()),
            PathProperty::StrokeWidth => AnimatedValue::Float(path.stroke_width()),
            PathProperty::StrokeAlpha => AnimatedValue::Float(path.stroke_alpha() as f32 / 255.0),
            PathProperty::FillAlpha => AnimatedValue::Float(path.fill_alpha() as f32 / 255.0),
            PathProperty::TrimPathStart => AnimatedValue::Float(path.trim_path_start()),
            PathProperty::TrimPathEnd => AnimatedValue::Float(path.trim_path_end()),
            PathProperty::TrimPathOffset => AnimatedValue::Float(path.trim_path_offset()),
            PathProperty::PathData => AnimatedValue::Path(path.path_data().to_vec()),
        }
    }

    /// Writes `value` into `path`. Alpha accepts a float fraction or an
    /// integer in `0..=255`; colors accept packed ARGB integers.
    pub fn apply(self, path: &mut PathElement, value: &AnimatedValue) -> Result<()> {
        match self {
            PathProperty::FillColor => path.set_fill_color(color_of(self, value)?),
            PathProperty::StrokeColor => path.set_stroke_color(color_of(self, value)?),
            PathProperty::StrokeWidth => path.set_stroke_width(float_of(self.name(), value)?),
            PathProperty::StrokeAlpha => path.set_stroke_alpha(alpha_of(self, value)?),
            PathProperty::FillAlpha => path.set_fill_alpha(alpha_of(self, value)?),
            PathProperty::TrimPathStart => path.set_trim_path_start(float_of(self.name(), value)?),
            PathProperty::TrimPathEnd => path.set_trim_path_end(float_of(self.name(), value)?),
            PathProperty::TrimPathOffset => {
                path.set_trim_path_offset(float_of(self.name(), value)?)
            }
            PathProperty::PathData => match value {
                AnimatedValue::Path(nodes) => path.set_path_data(nodes.clone())?,
                other => return Err(mismatch(self.name(), other)),
            },
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupProperty {
    Rotation,
    PivotX,
    PivotY,
    ScaleX,
    ScaleY,
    TranslateX,
    TranslateY,
}

impl GroupProperty {
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "rotation" => GroupProperty::Rotation,
            "pivotX" => GroupProperty::PivotX,
            "pivotY" => GroupProperty::PivotY,
            "scaleX" => GroupProperty::ScaleX,
            "scaleY" => GroupProperty::ScaleY,
            "translateX" => GroupProperty::TranslateX,
            "translateY" => GroupProperty::TranslateY,
            _ => return None,
        })
    }

    pub fn name(self) -> &'static str {
        match self {
            GroupProperty::Rotation => "rotation",
            GroupProperty::PivotX => "pivotX",
            GroupProperty::PivotY => "pivotY",
            GroupProperty::ScaleX => "scaleX",
            GroupProperty::ScaleY => "scaleY",
            GroupProperty::TranslateX => "translateX",
            GroupProperty::TranslateY => "translateY",
        }
    }

    fn slot(self, t: &mut GroupTransform) -> &mut f32 {
        match self {
            GroupProperty::Rotation => &mut t.rotation,
            GroupProperty::PivotX => &mut t.pivot_x,
            GroupProperty::PivotY => &mut t.pivot_y,
            GroupProperty::ScaleX => &mut t.scale_x,
            GroupProperty::ScaleY => &mut t.scale_y,
            GroupProperty::TranslateX => &mut t.translate_x,
            GroupProperty::TranslateY => &mut t.translate_y,
        }
    }

    pub fn current(self, transform: &GroupTransform) -> f32 {
        let mut copy = *transform;
        *self.slot(&mut copy)
    }
}

/// A property resolved against a concrete scene node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundProperty {
    Path(PathId, PathProperty),
    Group(GroupId, GroupProperty),
}

impl BoundProperty {
    /// `None` when `name` is not animatable on that kind of node.
    pub fn resolve(target: Target, name: &str) -> Option<Self> {
        match target {
            Target::Path(id) => PathProperty::from_name(name).map(|p| BoundProperty::Path(id, p)),
            Target::Group(id) => {
                GroupProperty::from_name(name).map(|p| BoundProperty::Group(id, p))
            }
            Target::Shape | Target::ClipPath(_) => None,
        }
    }

    pub fn current(&self, shape: &Shape) -> AnimatedValue {
        match *self {
            BoundProperty::Path(id, p) => p.current(shape.path(id)),
            BoundProperty::Group(id, p) => {
                AnimatedValue::Float(p.current(shape.group(id).transform()))
            }
        }
    }

    pub fn apply(&self, shape: &mut Shape, value: &AnimatedValue) -> Result<()> {
        match *self {
            BoundProperty::Path(id, p) => p.apply(shape.path_mut(id), value),
            BoundProperty::Group(id, p) => {
                let v = float_of(p.name(), value)?;
                shape.group_mut(id).update(|t| *p.slot(t) = v);
                Ok(())
            }
        }
    }
}

fn mismatch(name: &str, value: &AnimatedValue) -> VectorError {
    VectorError::InvalidAttribute {
        name: name.to_string(),
        message: format!("cannot take a {:?} value", value.value_type()),
    }
}

fn float_of(name: &str, value: &AnimatedValue) -> Result<f32> {
    value.as_f32().ok_or_else(|| mismatch(name, value))
}

fn color_of(p: PathProperty, value: &AnimatedValue) -> Result<Color> {
    value.as_color().ok_or_else(|| mismatch(p.name(), value))
}

fn alpha_of(p: PathProperty, value: &AnimatedValue) -> Result<u8> {
    match value {
        AnimatedValue::Float(f) => Ok(float_alpha_to_int(*f)),
        AnimatedValue::Int(i) => Ok((*i).clamp(0, 255) as u8),
        other => Err(mismatch(p.name(), other)),
    }
}
