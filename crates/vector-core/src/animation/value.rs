use crate::error::Result;
use crate::geometry::{self, PathDataNode};
use vector_data::Color;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    Float,
    Int,
    Path,
    Color,
    Undefined,
}

impl ValueType {
    /// Maps the markup `valueType` code.
    pub fn from_code(code: i32) -> Self {
        match code {
            0 => ValueType::Float,
            1 => ValueType::Int,
            2 => ValueType::Path,
            3 => ValueType::Color,
            _ => ValueType::Undefined,
        }
    }
}

/// A value an animator moves between.
#[derive(Debug, Clone, PartialEq)]
pub enum AnimatedValue {
    Float(f32),
    Int(i32),
    Color(Color),
    Path(Vec<PathDataNode>),
}

impl AnimatedValue {
    pub fn value_type(&self) -> ValueType {
        match self {
            AnimatedValue::Float(_) => ValueType::Float,
            AnimatedValue::Int(_) => ValueType::Int,
            AnimatedValue::Color(_) => ValueType::Color,
            AnimatedValue::Path(_) => ValueType::Path,
        }
    }

    pub fn as_f32(&self) -> Option<f32> {
        match self {
            AnimatedValue::Float(v) => Some(*v),
            AnimatedValue::Int(v) => Some(*v as f32),
            _ => None,
        }
    }

    /// Colors, or integers read as packed ARGB.
    pub fn as_color(&self) -> Option<Color> {
        match self {
            AnimatedValue::Color(c) => Some(*c),
            AnimatedValue::Int(v) => Some(Color(*v as u32)),
            _ => None,
        }
    }

    /// Blends towards `end`. Integers truncate, colors mix in linear light,
    /// paths morph node by node. Mismatched kinds that cannot be blended
    /// hold `self` until the fraction reaches one.
    pub fn interpolate(&self, end: &AnimatedValue, fraction: f32) -> Result<AnimatedValue> {
        use AnimatedValue as V;
        Ok(match (self, end) {
            (V::Float(a), V::Float(b)) => V::Float(a + (b - a) * fraction),
            (V::Int(a), V::Int(b)) => {
                let (a, b) = (f64::from(*a), f64::from(*b));
                V::Int((a + f64::from(fraction) * (b - a)) as i32)
            }
            (V::Float(_), V::Int(_)) | (V::Int(_), V::Float(_)) => {
                let (a, b) = (self.as_f32().unwrap_or(0.0), end.as_f32().unwrap_or(0.0));
                V::Float(a + (b - a) * fraction)
            }
            (V::Color(_), V::Color(_)) | (V::Color(_), V::Int(_)) | (V::Int(_), V::Color(_)) => {
                let a = self.as_color().unwrap_or(Color::TRANSPARENT);
                let b = end.as_color().unwrap_or(Color::TRANSPARENT);
                V::Color(a.lerp_argb(b, fraction))
            }
            (V::Path(a), V::Path(b)) => V::Path(geometry::interpolate(a, b, fraction)?),
            _ => {
                if fraction < 1.0 {
                    self.clone()
                } else {
                    end.clone()
                }
            }
        })
    }
}
