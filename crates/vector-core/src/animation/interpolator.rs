use glam::Vec2;
use keyframe::EasingFunction;
use tracing::warn;
use vector_data::{MarkupEvent, ResourceRef, Resources, Tag};

/// Time interpolation curves.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Interpolator {
    Linear,
    AccelerateDecelerate,
    Accelerate { factor: f32 },
    Decelerate { factor: f32 },
    Anticipate { tension: f32 },
    Overshoot { tension: f32 },
    /// Cubic bezier from (0,0) to (1,1) with two control points.
    CubicBezier { x1: f32, y1: f32, x2: f32, y2: f32 },
}

impl Default for Interpolator {
    fn default() -> Self {
        Interpolator::AccelerateDecelerate
    }
}

impl EasingFunction for Interpolator {
    fn y(&self, x: f64) -> f64 {
        match *self {
            Interpolator::Linear => keyframe::functions::Linear.y(x),
            Interpolator::AccelerateDecelerate => {
                ((x + 1.0) * std::f64::consts::PI).cos() / 2.0 + 0.5
            }
            Interpolator::Accelerate { factor } => {
                if factor == 1.0 {
                    x * x
                } else {
                    x.powf(2.0 * factor as f64)
                }
            }
            Interpolator::Decelerate { factor } => {
                if factor == 1.0 {
                    1.0 - (1.0 - x) * (1.0 - x)
                } else {
                    1.0 - (1.0 - x).powf(2.0 * factor as f64)
                }
            }
            Interpolator::Anticipate { tension } => {
                let t = tension as f64;
                x * x * ((t + 1.0) * x - t)
            }
            Interpolator::Overshoot { tension } => {
                let t = tension as f64;
                let x = x - 1.0;
                x * x * ((t + 1.0) * x + t) + 1.0
            }
            Interpolator::CubicBezier { x1, y1, x2, y2 } => {
                solve_cubic_bezier(Vec2::new(x1, y1), Vec2::new(x2, y2), x as f32) as f64
            }
        }
    }
}

impl Interpolator {
    pub const FAST_OUT_SLOW_IN: Interpolator =
        Interpolator::CubicBezier { x1: 0.4, y1: 0.0, x2: 0.2, y2: 1.0 };
    pub const FAST_OUT_LINEAR_IN: Interpolator =
        Interpolator::CubicBezier { x1: 0.4, y1: 0.0, x2: 1.0, y2: 1.0 };
    pub const LINEAR_OUT_SLOW_IN: Interpolator =
        Interpolator::CubicBezier { x1: 0.0, y1: 0.0, x2: 0.2, y2: 1.0 };

    /// Evaluates the curve at `x`, nominally in 0..=1.
    pub fn eval(&self, x: f32) -> f32 {
        self.y(x as f64) as f32
    }

    /// Well-known interpolator resources by name.
    pub fn builtin(name: &str) -> Option<Interpolator> {
        match name {
            "linear" => Some(Interpolator::Linear),
            "accelerate_decelerate" => Some(Interpolator::AccelerateDecelerate),
            "accelerate_quad" => Some(Interpolator::Accelerate { factor: 1.0 }),
            "accelerate_cubic" => Some(Interpolator::Accelerate { factor: 1.5 }),
            "accelerate_quint" => Some(Interpolator::Accelerate { factor: 2.5 }),
            "decelerate_quad" => Some(Interpolator::Decelerate { factor: 1.0 }),
            "decelerate_cubic" => Some(Interpolator::Decelerate { factor: 1.5 }),
            "decelerate_quint" => Some(Interpolator::Decelerate { factor: 2.5 }),
            "anticipate" => Some(Interpolator::Anticipate { tension: 2.0 }),
            "overshoot" => Some(Interpolator::Overshoot { tension: 2.0 }),
            "fast_out_slow_in" => Some(Interpolator::FAST_OUT_SLOW_IN),
            "fast_out_linear_in" => Some(Interpolator::FAST_OUT_LINEAR_IN),
            "linear_out_slow_in" => Some(Interpolator::LINEAR_OUT_SLOW_IN),
            _ => None,
        }
    }

    /// Resolves an `@interpolator/...` reference. Built-in names win;
    /// anything else is read as an interpolator document. Unresolvable
    /// references fall back to the default curve.
    pub fn from_reference(reference: &str, resources: &dyn Resources) -> Interpolator {
        if let Ok(parsed) = reference.parse::<ResourceRef>() {
            if let Some(builtin) = Interpolator::builtin(&parsed.name) {
                return builtin;
            }
        }
        let mut reader = match resources.open(reference) {
            Ok(r) => r,
            Err(e) => {
                warn!(reference = reference, error = %e, "Unknown interpolator, using default");
                return Interpolator::default();
            }
        };
        loop {
            match reader.next_event() {
                Ok(MarkupEvent::StartTag(tag)) => {
                    return Interpolator::from_tag(&tag).unwrap_or_else(|| {
                        warn!(tag = tag.name.as_str(), "Unsupported interpolator, using default");
                        Interpolator::default()
                    })
                }
                Ok(MarkupEvent::EndTag { .. }) => continue,
                Ok(MarkupEvent::EndDocument) | Err(_) => return Interpolator::default(),
            }
        }
    }

    /// Reads an interpolator element such as `<pathInterpolator .../>`.
    pub fn from_tag(tag: &Tag) -> Option<Interpolator> {
        let attrs = &tag.attributes;
        match tag.name.as_str() {
            "linearInterpolator" => Some(Interpolator::Linear),
            "accelerateDecelerateInterpolator" => Some(Interpolator::AccelerateDecelerate),
            "accelerateInterpolator" => Some(Interpolator::Accelerate {
                factor: attrs.float_or("factor", 1.0),
            }),
            "decelerateInterpolator" => Some(Interpolator::Decelerate {
                factor: attrs.float_or("factor", 1.0),
            }),
            "anticipateInterpolator" => Some(Interpolator::Anticipate {
                tension: attrs.float_or("tension", 2.0),
            }),
            "overshootInterpolator" => Some(Interpolator::Overshoot {
                tension: attrs.float_or("tension", 2.0),
            }),
            "pathInterpolator" => {
                if attrs.contains("pathData") {
                    return None;
                }
                let x1 = attrs.float_or("controlX1", 0.0);
                let y1 = attrs.float_or("controlY1", 0.0);
                // A single control point describes a quadratic curve, which
                // has an exact cubic form.
                let (x1, y1, x2, y2) = match (attrs.float("controlX2"), attrs.float("controlY2")) {
                    (Some(x2), Some(y2)) => (x1, y1, x2, y2),
                    _ => (
                        2.0 / 3.0 * x1,
                        2.0 / 3.0 * y1,
                        1.0 / 3.0 + 2.0 / 3.0 * x1,
                        1.0 / 3.0 + 2.0 / 3.0 * y1,
                    ),
                };
                Some(Interpolator::CubicBezier { x1, y1, x2, y2 })
            }
            _ => None,
        }
    }
}

/// Y of a unit cubic bezier at the parameter whose X equals `x`.
pub fn solve_cubic_bezier(p1: Vec2, p2: Vec2, x: f32) -> f32 {
    if x <= 0.0 {
        return 0.0;
    }
    if x >= 1.0 {
        return 1.0;
    }

    // Newton-Raphson
    let mut t = x;
    for _ in 0..8 {
        let inv = 1.0 - t;
        let x_est = 3.0 * inv * inv * t * p1.x + 3.0 * inv * t * t * p2.x + t * t * t;
        let err = x_est - x;
        if err.abs() < 1e-5 {
            break;
        }
        let slope =
            3.0 * inv * inv * p1.x + 6.0 * inv * t * (p2.x - p1.x) + 3.0 * t * t * (1.0 - p2.x);
        if slope.abs() < 1e-6 {
            break;
        }
        t = (t - err / slope).clamp(0.0, 1.0);
    }

    let inv = 1.0 - t;
    3.0 * inv * inv * t * p1.y + 3.0 * inv * t * t * p2.y + t * t * t
}

#[cfg(test)]
mod tests {
    use super::*;
    use vector_data::{DisplayMetrics, MemoryResources};

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-3
    }

    #[test]
    fn test_endpoints() {
        let all = [
            Interpolator::Linear,
            Interpolator::AccelerateDecelerate,
            Interpolator::Accelerate { factor: 1.0 },
            Interpolator::Accelerate { factor: 1.5 },
            Interpolator::Decelerate { factor: 1.0 },
            Interpolator::Anticipate { tension: 2.0 },
            Interpolator::Overshoot { tension: 2.0 },
            Interpolator::FAST_OUT_SLOW_IN,
        ];
        for i in all {
            assert!(close(i.eval(0.0), 0.0), "{:?} at 0", i);
            assert!(close(i.eval(1.0), 1.0), "{:?} at 1", i);
        }
    }

    #[test]
    fn test_shapes() {
        // 1. Linear
        assert!(close(Interpolator::Linear.eval(0.3), 0.3));
        // 2. Accelerate-decelerate is symmetric about the midpoint
        assert!(close(Interpolator::AccelerateDecelerate.eval(0.5), 0.5));
        assert!(Interpolator::AccelerateDecelerate.eval(0.25) < 0.25);
        // 3. Quadratic accelerate
        assert!(close(Interpolator::Accelerate { factor: 1.0 }.eval(0.5), 0.25));
        assert!(close(Interpolator::Decelerate { factor: 1.0 }.eval(0.5), 0.75));
        // 4. Anticipate dips below zero, overshoot rises above one
        assert!(Interpolator::Anticipate { tension: 2.0 }.eval(0.2) < 0.0);
        assert!(Interpolator::Overshoot { tension: 2.0 }.eval(0.8) > 1.0);
    }

    #[test]
    fn test_cubic_bezier_linear_controls() {
        let linear = Interpolator::CubicBezier { x1: 0.25, y1: 0.25, x2: 0.75, y2: 0.75 };
        for x in [0.1, 0.4, 0.7, 0.95] {
            assert!(close(linear.eval(x), x));
        }
        assert!(Interpolator::FAST_OUT_SLOW_IN.eval(0.5) > 0.5);
    }

    #[test]
    fn test_reference_resolution() {
        let res = MemoryResources::new(DisplayMetrics::default())
            .with_document(
                "@interpolator/custom",
                r#"<pathInterpolator controlX1="0.1" controlY1="0.2" controlX2="0.3" controlY2="0.4"/>"#,
            )
            .with_document("@interpolator/fancy", r#"<bounceInterpolator/>"#);

        assert_eq!(
            Interpolator::from_reference("@android:interpolator/linear", &res),
            Interpolator::Linear
        );
        assert_eq!(
            Interpolator::from_reference("@interpolator/fast_out_slow_in", &res),
            Interpolator::FAST_OUT_SLOW_IN
        );
        assert_eq!(
            Interpolator::from_reference("@interpolator/custom", &res),
            Interpolator::CubicBezier { x1: 0.1, y1: 0.2, x2: 0.3, y2: 0.4 }
        );
        for name in ["@interpolator/fancy", "@interpolator/nope"] {
            assert_eq!(Interpolator::from_reference(name, &res), Interpolator::default());
        }
    }
}
