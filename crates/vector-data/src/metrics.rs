use crate::error::MarkupError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::warn;

/// Environment variable that overrides [`DisplayMetrics::density`].
pub const DENSITY_ENV: &str = "VECTOR_DENSITY";

/// Density information used to turn dimension units into pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayMetrics {
    /// Pixels per dp.
    pub density: f32,
    /// Pixels per sp.
    pub scaled_density: f32,
    /// Physical pixels per inch along x.
    pub xdpi: f32,
}

impl Default for DisplayMetrics {
    fn default() -> Self {
        Self {
            density: 1.0,
            scaled_density: 1.0,
            xdpi: 160.0,
        }
    }
}

impl DisplayMetrics {
    pub fn with_density(density: f32) -> Self {
        Self {
            density,
            scaled_density: density,
            xdpi: 160.0 * density,
        }
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, MarkupError> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Applies the `VECTOR_DENSITY` override when it holds a positive number.
    pub fn with_env_override(mut self) -> Self {
        if let Ok(raw) = std::env::var(DENSITY_ENV) {
            match raw.parse::<f32>() {
                Ok(d) if d > 0.0 => {
                    self.scaled_density = self.scaled_density / self.density * d;
                    self.density = d;
                }
                _ => warn!(value = raw.as_str(), "Ignoring invalid {}", DENSITY_ENV),
            }
        }
        self
    }

    pub fn dp_to_px(&self, dp: f32) -> f32 {
        dp * self.density
    }
}
