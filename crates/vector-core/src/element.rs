use crate::canvas::{DrawContext, FillType, LineCap, LineJoin, PaintStyle, PathPaint};
use crate::error::Result;
use crate::geometry::{GeometryPath, PathDataNode};
use kurbo::{Affine, BezPath};
use vector_data::Color;

pub fn float_alpha_to_int(alpha: f32) -> u8 {
    (255.0 * alpha).clamp(0.0, 255.0) as u8
}

/// Style attributes of a path as written in markup, before any derived
/// state is computed.
#[derive(Debug, Clone, PartialEq)]
pub struct PathStyle {
    pub fill_color: Color,
    pub fill_alpha: f32,
    pub fill_type: FillType,
    pub stroke_color: Color,
    pub stroke_alpha: f32,
    pub stroke_width: f32,
    pub stroke_line_cap: LineCap,
    pub stroke_line_join: LineJoin,
    pub stroke_miter_limit: f32,
    pub trim_path_start: f32,
    pub trim_path_end: f32,
    pub trim_path_offset: f32,
}

impl Default for PathStyle {
    fn default() -> Self {
        Self {
            fill_color: Color::TRANSPARENT,
            fill_alpha: 1.0,
            fill_type: FillType::NonZero,
            stroke_color: Color::TRANSPARENT,
            stroke_alpha: 1.0,
            stroke_width: 0.0,
            stroke_line_cap: LineCap::Butt,
            stroke_line_join: LineJoin::Miter,
            stroke_miter_limit: 4.0,
            trim_path_start: 0.0,
            trim_path_end: 1.0,
            trim_path_offset: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawMode {
    Fill,
    Stroke,
    FillAndStroke,
    Nothing,
}

/// A filled and/or stroked outline.
///
/// Every setter recomputes the derived state it affects, so the render
/// path and paints are always current when [`PathElement::draw`] runs.
#[derive(Debug, Clone)]
pub struct PathElement {
    name: Option<String>,
    geometry: GeometryPath,
    override_geometry: Option<GeometryPath>,
    fill_color: Color,
    fill_alpha: u8,
    stroke_color: Color,
    stroke_alpha: u8,
    stroke_width: f32,
    stroke_line_cap: LineCap,
    stroke_line_join: LineJoin,
    stroke_miter_limit: f32,
    trim_path_start: f32,
    trim_path_end: f32,
    trim_path_offset: f32,
    matrix: Affine,
    stroke_ratio: f32,
    render_path: BezPath,
    mode: DrawMode,
    fill_paint: PathPaint,
    stroke_paint: PathPaint,
}

impl PathElement {
    pub fn new(name: Option<String>, mut geometry: GeometryPath, style: PathStyle) -> Self {
        geometry.set_fill_type(style.fill_type);
        let mut path = Self {
            name,
            geometry,
            override_geometry: None,
            // Markup alpha scales whatever alpha the color literal carries.
            fill_alpha: float_alpha_to_int(
                style.fill_alpha * style.fill_color.alpha() as f32 / 255.0,
            ),
            fill_color: style.fill_color,
            stroke_alpha: float_alpha_to_int(
                style.stroke_alpha * style.stroke_color.alpha() as f32 / 255.0,
            ),
            stroke_color: style.stroke_color,
            stroke_width: style.stroke_width,
            stroke_line_cap: style.stroke_line_cap,
            stroke_line_join: style.stroke_line_join,
            stroke_miter_limit: style.stroke_miter_limit,
            trim_path_start: style.trim_path_start,
            trim_path_end: style.trim_path_end,
            trim_path_offset: style.trim_path_offset,
            matrix: Affine::IDENTITY,
            stroke_ratio: 1.0,
            render_path: BezPath::new(),
            mode: DrawMode::Nothing,
            fill_paint: PathPaint::fill(Color::TRANSPARENT),
            stroke_paint: PathPaint::fill(Color::TRANSPARENT),
        };
        path.update_paint();
        path.update_path();
        path
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn geometry(&self) -> &GeometryPath {
        &self.geometry
    }

    /// Nodes currently shaping the path, including an animated override.
    pub fn path_data(&self) -> &[PathDataNode] {
        self.override_geometry
            .as_ref()
            .unwrap_or(&self.geometry)
            .nodes()
    }

    pub fn fill_type(&self) -> FillType {
        self.geometry.fill_type()
    }

    pub fn fill_color(&self) -> Color {
        self.fill_color
    }

    /// Also resets the fill alpha to the color's own alpha.
    pub fn set_fill_color(&mut self, color: Color) {
        self.fill_color = color;
        self.fill_alpha = color.alpha();
        self.update_paint();
    }

    pub fn fill_alpha(&self) -> u8 {
        self.fill_alpha
    }

    pub fn set_fill_alpha(&mut self, alpha: u8) {
        self.fill_alpha = alpha;
        self.update_paint();
    }

    pub fn stroke_color(&self) -> Color {
        self.stroke_color
    }

    /// Also resets the stroke alpha to the color's own alpha.
    pub fn set_stroke_color(&mut self, color: Color) {
        self.stroke_color = color;
        self.stroke_alpha = color.alpha();
        self.update_paint();
    }

    pub fn stroke_alpha(&self) -> u8 {
        self.stroke_alpha
    }

    pub fn set_stroke_alpha(&mut self, alpha: u8) {
        self.stroke_alpha = alpha;
        self.update_paint();
    }

    pub fn stroke_width(&self) -> f32 {
        self.stroke_width
    }

    pub fn set_stroke_width(&mut self, width: f32) {
        self.stroke_width = width;
        self.update_paint();
    }

    pub fn stroke_line_cap(&self) -> LineCap {
        self.stroke_line_cap
    }

    pub fn stroke_line_join(&self) -> LineJoin {
        self.stroke_line_join
    }

    pub fn stroke_miter_limit(&self) -> f32 {
        self.stroke_miter_limit
    }

    pub fn stroke_ratio(&self) -> f32 {
        self.stroke_ratio
    }

    pub fn set_stroke_ratio(&mut self, ratio: f32) {
        self.stroke_ratio = ratio;
        self.update_paint();
    }

    pub fn trim_path_start(&self) -> f32 {
        self.trim_path_start
    }

    pub fn set_trim_path_start(&mut self, v: f32) {
        self.trim_path_start = v;
        self.override_geometry = None;
        self.update_path();
    }

    pub fn trim_path_end(&self) -> f32 {
        self.trim_path_end
    }

    pub fn set_trim_path_end(&mut self, v: f32) {
        self.trim_path_end = v;
        self.override_geometry = None;
        self.update_path();
    }

    pub fn trim_path_offset(&self) -> f32 {
        self.trim_path_offset
    }

    pub fn set_trim_path_offset(&mut self, v: f32) {
        self.trim_path_offset = v;
        self.override_geometry = None;
        self.update_path();
    }

    /// Replaces the outline with `nodes`, typically a morph in progress.
    /// The override is drawn untrimmed until a trim setter runs again.
    pub fn set_path_data(&mut self, nodes: Vec<PathDataNode>) -> Result<()> {
        let mut geometry = GeometryPath::from_nodes(nodes)?;
        geometry.set_fill_type(self.geometry.fill_type());
        self.override_geometry = Some(geometry);
        self.update_path();
        Ok(())
    }

    pub fn transform(&mut self, matrix: Affine) {
        self.matrix = matrix;
        self.update_path();
    }

    pub fn matrix(&self) -> Affine {
        self.matrix
    }

    pub fn render_path(&self) -> &BezPath {
        &self.render_path
    }

    pub fn draw_mode(&self) -> DrawMode {
        self.mode
    }

    fn update_path(&mut self) {
        self.render_path = match &self.override_geometry {
            Some(geometry) => geometry.transformed(self.matrix),
            None => {
                let mut path = self.geometry.trimmed(
                    self.trim_path_start,
                    self.trim_path_end,
                    self.trim_path_offset,
                );
                path.apply_affine(self.matrix);
                path
            }
        };
    }

    fn update_paint(&mut self) {
        let has_fill = self.fill_color != Color::TRANSPARENT;
        let has_stroke = self.stroke_color != Color::TRANSPARENT;
        self.mode = match (has_fill, has_stroke) {
            (true, true) => DrawMode::FillAndStroke,
            (true, false) => DrawMode::Fill,
            (false, true) => DrawMode::Stroke,
            (false, false) => DrawMode::Nothing,
        };
        self.fill_paint = PathPaint::fill(self.fill_color.with_alpha(self.fill_alpha));
        self.stroke_paint = PathPaint {
            style: PaintStyle::Stroke,
            color: self.stroke_color.with_alpha(self.stroke_alpha),
            stroke_width: self.stroke_width * self.stroke_ratio,
            cap: self.stroke_line_cap,
            join: self.stroke_line_join,
            miter_limit: self.stroke_miter_limit,
            anti_alias: true,
        };
    }

    pub fn draw(&self, ctx: &mut dyn DrawContext) {
        let fill_type = self.fill_type();
        match self.mode {
            DrawMode::Fill => ctx.draw_path(&self.render_path, fill_type, &self.fill_paint),
            DrawMode::Stroke => ctx.draw_path(&self.render_path, fill_type, &self.stroke_paint),
            DrawMode::FillAndStroke => {
                ctx.draw_path(&self.render_path, fill_type, &self.fill_paint);
                ctx.draw_path(&self.render_path, fill_type, &self.stroke_paint);
            }
            DrawMode::Nothing => {}
        }
    }
}

/// Outline used to clip its owning group.
#[derive(Debug, Clone)]
pub struct ClipPathElement {
    name: Option<String>,
    geometry: GeometryPath,
    render_path: BezPath,
}

impl ClipPathElement {
    pub fn new(name: Option<String>, geometry: GeometryPath) -> Self {
        let render_path = geometry.bez_path().clone();
        Self {
            name,
            geometry,
            render_path,
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn geometry(&self) -> &GeometryPath {
        &self.geometry
    }

    /// Resets to the original outline, then applies `matrix`.
    pub fn transform(&mut self, matrix: Affine) {
        self.render_path = self.geometry.transformed(matrix);
    }

    pub fn render_path(&self) -> &BezPath {
        &self.render_path
    }

    pub fn draw(&self, ctx: &mut dyn DrawContext) {
        ctx.clip_path(&self.render_path, self.geometry.fill_type());
    }
}
