//! Skia backend: a [`DrawContext`] over a Skia canvas, plus helpers that
//! render a drawable into a raster image or PNG bytes.

use kurbo::{BezPath, PathEl, Rect as KurboRect};
use skia_safe::{
    canvas::SaveLayerRec, surfaces, Canvas, ClipOp, Color, EncodedImageFormat, Image, Paint, Path,
    PathFillType,
};
use thiserror::Error;
use vector_core::{DrawContext, FillType, LineCap, LineJoin, PaintStyle, PathPaint, Renderable};

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Could not create a {width}x{height} raster surface")]
    Surface { width: i32, height: i32 },
    #[error("PNG encoding failed")]
    Encode,
}

/// Forwards scene drawing calls to a Skia canvas.
pub struct SkiaContext<'a> {
    canvas: &'a Canvas,
}

impl<'a> SkiaContext<'a> {
    pub fn new(canvas: &'a Canvas) -> Self {
        Self { canvas }
    }

    pub fn canvas(&self) -> &Canvas {
        self.canvas
    }
}

impl DrawContext for SkiaContext<'_> {
    fn save(&mut self) {
        self.canvas.save();
    }

    fn restore(&mut self) {
        self.canvas.restore();
    }

    fn save_layer_alpha(&mut self, alpha: u8) {
        let mut paint = Paint::default();
        paint.set_alpha(alpha);
        self.canvas.save_layer(&SaveLayerRec::default().paint(&paint));
    }

    fn translate(&mut self, dx: f32, dy: f32) {
        self.canvas.translate((sanitize(dx), sanitize(dy)));
    }

    fn clip_path(&mut self, path: &BezPath, fill_type: FillType) {
        let mut path = kurbo_to_skia_path(path);
        path.set_fill_type(convert_fill_type(fill_type));
        self.canvas.clip_path(&path, ClipOp::Intersect, true);
    }

    fn draw_path(&mut self, path: &BezPath, fill_type: FillType, paint: &PathPaint) {
        let mut path = kurbo_to_skia_path(path);
        path.set_fill_type(convert_fill_type(fill_type));
        self.canvas.draw_path(&path, &convert_paint(paint));
    }
}

/// Fits `drawable` into a `width`x`height` transparent raster and returns
/// the snapshot.
pub fn render_image(
    drawable: &mut dyn Renderable,
    width: i32,
    height: i32,
) -> Result<Image, RenderError> {
    let mut surface = surfaces::raster_n32_premul((width, height))
        .ok_or(RenderError::Surface { width, height })?;
    drawable.set_bounds(KurboRect::new(0.0, 0.0, width as f64, height as f64));

    let canvas = surface.canvas();
    canvas.clear(Color::TRANSPARENT);
    drawable.draw(&mut SkiaContext::new(canvas));
    Ok(surface.image_snapshot())
}

pub fn encode_png(image: &Image) -> Result<Vec<u8>, RenderError> {
    let data = image
        .encode(None, EncodedImageFormat::PNG, 100)
        .ok_or(RenderError::Encode)?;
    Ok(data.as_bytes().to_vec())
}

pub fn render_png(
    drawable: &mut dyn Renderable,
    width: i32,
    height: i32,
) -> Result<Vec<u8>, RenderError> {
    encode_png(&render_image(drawable, width, height)?)
}

fn convert_paint(paint: &PathPaint) -> Paint {
    let mut skia = Paint::default();
    skia.set_anti_alias(paint.anti_alias);
    skia.set_color(Color::new(paint.color.argb()));
    match paint.style {
        PaintStyle::Fill => {
            skia.set_style(skia_safe::PaintStyle::Fill);
        }
        PaintStyle::Stroke => {
            skia.set_style(skia_safe::PaintStyle::Stroke);
            skia.set_stroke_width(sanitize(paint.stroke_width));
            skia.set_stroke_cap(convert_cap(paint.cap));
            skia.set_stroke_join(convert_join(paint.join));
            skia.set_stroke_miter(sanitize(paint.miter_limit));
        }
    }
    skia
}

fn sanitize(v: f32) -> f32 {
    if v.is_finite() {
        v
    } else {
        0.0
    }
}

fn point(p: kurbo::Point) -> (f32, f32) {
    (sanitize(p.x as f32), sanitize(p.y as f32))
}

fn kurbo_to_skia_path(bez_path: &BezPath) -> Path {
    let mut path = Path::new();
    for el in bez_path.elements() {
        match *el {
            PathEl::MoveTo(p) => {
                path.move_to(point(p));
            }
            PathEl::LineTo(p) => {
                path.line_to(point(p));
            }
            PathEl::QuadTo(p1, p2) => {
                path.quad_to(point(p1), point(p2));
            }
            PathEl::CurveTo(p1, p2, p3) => {
                path.cubic_to(point(p1), point(p2), point(p3));
            }
            PathEl::ClosePath => {
                path.close();
            }
        }
    }
    path
}

fn convert_fill_type(fill_type: FillType) -> PathFillType {
    match fill_type {
        FillType::NonZero => PathFillType::Winding,
        FillType::EvenOdd => PathFillType::EvenOdd,
        FillType::InverseNonZero => PathFillType::InverseWinding,
        FillType::InverseEvenOdd => PathFillType::InverseEvenOdd,
    }
}

fn convert_cap(cap: LineCap) -> skia_safe::PaintCap {
    match cap {
        LineCap::Butt => skia_safe::PaintCap::Butt,
        LineCap::Round => skia_safe::PaintCap::Round,
        LineCap::Square => skia_safe::PaintCap::Square,
    }
}

fn convert_join(join: LineJoin) -> skia_safe::PaintJoin {
    match join {
        LineJoin::Miter => skia_safe::PaintJoin::Miter,
        LineJoin::Round => skia_safe::PaintJoin::Round,
        LineJoin::Bevel => skia_safe::PaintJoin::Bevel,
    }
}
