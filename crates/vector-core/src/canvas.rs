//! Drawing surface abstraction. Backends implement [`DrawContext`]; the
//! scene only ever talks to the trait.

use kurbo::BezPath;
use vector_data::Color;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FillType {
    #[default]
    NonZero,
    EvenOdd,
    InverseNonZero,
    InverseEvenOdd,
}

impl FillType {
    /// Maps the markup code (0..=3). Unknown codes fall back to non-zero.
    pub fn from_code(code: i32) -> Self {
        match code {
            1 => FillType::EvenOdd,
            2 => FillType::InverseNonZero,
            3 => FillType::InverseEvenOdd,
            _ => FillType::NonZero,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineCap {
    #[default]
    Butt,
    Round,
    Square,
}

impl LineCap {
    pub fn from_code(code: i32) -> Self {
        match code {
            1 => LineCap::Round,
            2 => LineCap::Square,
            _ => LineCap::Butt,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineJoin {
    #[default]
    Miter,
    Round,
    Bevel,
}

impl LineJoin {
    pub fn from_code(code: i32) -> Self {
        match code {
            1 => LineJoin::Round,
            2 => LineJoin::Bevel,
            _ => LineJoin::Miter,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaintStyle {
    Fill,
    Stroke,
}

/// Paint for a single fill or stroke pass.
#[derive(Debug, Clone, PartialEq)]
pub struct PathPaint {
    pub style: PaintStyle,
    pub color: Color,
    pub stroke_width: f32,
    pub cap: LineCap,
    pub join: LineJoin,
    pub miter_limit: f32,
    pub anti_alias: bool,
}

impl PathPaint {
    pub fn fill(color: Color) -> Self {
        Self {
            style: PaintStyle::Fill,
            color,
            stroke_width: 0.0,
            cap: LineCap::Butt,
            join: LineJoin::Miter,
            miter_limit: 4.0,
            anti_alias: true,
        }
    }
}

pub trait DrawContext {
    fn save(&mut self);
    fn restore(&mut self);
    /// Starts an offscreen layer composited with `alpha` on the matching restore.
    fn save_layer_alpha(&mut self, alpha: u8);
    fn translate(&mut self, dx: f32, dy: f32);
    fn clip_path(&mut self, path: &BezPath, fill_type: FillType);
    fn draw_path(&mut self, path: &BezPath, fill_type: FillType, paint: &PathPaint);
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Save,
    Restore,
    SaveLayerAlpha(u8),
    Translate(f32, f32),
    ClipPath {
        path: BezPath,
        fill_type: FillType,
    },
    DrawPath {
        path: BezPath,
        fill_type: FillType,
        paint: PathPaint,
    },
}

/// A [`DrawContext`] that records every call, for tests and tooling.
#[derive(Debug, Default)]
pub struct RecordingContext {
    pub commands: Vec<DrawCommand>,
}

impl RecordingContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Paints issued by draw calls, in order.
    pub fn draw_calls(&self) -> Vec<&PathPaint> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                DrawCommand::DrawPath { paint, .. } => Some(paint),
                _ => None,
            })
            .collect()
    }

    pub fn clip_count(&self) -> usize {
        self.commands
            .iter()
            .filter(|c| matches!(c, DrawCommand::ClipPath { .. }))
            .count()
    }

    pub fn clear(&mut self) {
        self.commands.clear();
    }
}

impl DrawContext for RecordingContext {
    fn save(&mut self) {
        self.commands.push(DrawCommand::Save);
    }

    fn restore(&mut self) {
        self.commands.push(DrawCommand::Restore);
    }

    fn save_layer_alpha(&mut self, alpha: u8) {
        self.commands.push(DrawCommand::SaveLayerAlpha(alpha));
    }

    fn translate(&mut self, dx: f32, dy: f32) {
        self.commands.push(DrawCommand::Translate(dx, dy));
    }

    fn clip_path(&mut self, path: &BezPath, fill_type: FillType) {
        self.commands.push(DrawCommand::ClipPath {
            path: path.clone(),
            fill_type,
        });
    }

    fn draw_path(&mut self, path: &BezPath, fill_type: FillType, paint: &PathPaint) {
        self.commands.push(DrawCommand::DrawPath {
            path: path.clone(),
            fill_type,
            paint: paint.clone(),
        });
    }
}
