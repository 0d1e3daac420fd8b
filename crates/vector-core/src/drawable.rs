//! Drawables: a parsed [`Shape`] fitted to bounds, and its animated
//! counterpart.

use crate::animation::{
    AnimatedValue, AnimationPlayer, AnimatorDescription, FrameClock, PlayerState, SystemClock,
    TargetAnimation,
};
use crate::cache::DescriptionCache;
use crate::canvas::DrawContext;
use crate::element::{float_alpha_to_int, PathElement};
use crate::error::Result;
use crate::parser::{
    parse_animated_vector, parse_animator, parse_vector, AnimatorContext, SceneParse,
};
use crate::scene::{GroupId, GroupMut, PathId, Shape};
use glam::{Mat3, Vec2};
use kurbo::Rect;
use std::sync::Arc;
use tracing::{debug, error, instrument, warn};
use vector_data::{Color, DisplayMetrics, Resources};

/// Something that can be fitted to bounds and drawn.
pub trait Renderable {
    fn set_bounds(&mut self, bounds: Rect);
    fn draw(&mut self, ctx: &mut dyn DrawContext);
}

/// Start/stop control over a running animation.
pub trait Playback {
    fn start(&mut self);
    fn stop(&mut self);
    fn is_running(&self) -> bool;
}

/// A vector scene fitted into device-pixel bounds.
///
/// Cloning gives an independent scene; [`new_drawable`](Self::new_drawable)
/// re-reads it from its resource instead.
#[derive(Clone)]
pub struct VectorDrawable {
    shape: Shape,
    metrics: DisplayMetrics,
    bounds: Rect,
    scale_ratio: f32,
    source: Option<(Arc<dyn Resources>, String)>,
}

impl VectorDrawable {
    /// Reads the vector document behind `reference`. A document that breaks
    /// off midway still yields whatever was read before the break.
    #[instrument(level = "debug", skip(resources))]
    pub fn load(resources: Arc<dyn Resources>, reference: &str) -> Result<Self> {
        let mut reader = resources.open(reference)?;
        let SceneParse { shape, aborted } = parse_vector(&mut reader, resources.as_ref());
        if let Some(e) = aborted {
            warn!(reference, error = %e, "Using partially parsed vector");
        }
        let mut drawable = Self::from_shape(shape, resources.metrics());
        drawable.source = Some((resources, reference.to_string()));
        Ok(drawable)
    }

    pub fn from_shape(shape: Shape, metrics: DisplayMetrics) -> Self {
        Self {
            shape,
            metrics,
            bounds: Rect::ZERO,
            scale_ratio: 1.0,
            source: None,
        }
    }

    /// A fresh copy read again from the original resource, fitted to the
    /// same bounds. Drawables built from a shape are cloned instead.
    pub fn new_drawable(&self) -> Result<Self> {
        let mut fresh = match &self.source {
            Some((resources, reference)) => Self::load(resources.clone(), reference)?,
            None => self.clone(),
        };
        if fresh.bounds != self.bounds && self.bounds.area() > 0.0 {
            fresh.set_bounds(self.bounds);
        }
        Ok(fresh)
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    pub fn shape_mut(&mut self) -> &mut Shape {
        &mut self.shape
    }

    pub fn metrics(&self) -> DisplayMetrics {
        self.metrics
    }

    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    /// Device pixels per viewport unit after the last [`set_bounds`](Self::set_bounds).
    pub fn scale_ratio(&self) -> f32 {
        self.scale_ratio
    }

    /// Intrinsic width in pixels.
    pub fn intrinsic_width(&self) -> f32 {
        self.metrics.dp_to_px(self.shape.width())
    }

    /// Intrinsic height in pixels.
    pub fn intrinsic_height(&self) -> f32 {
        self.metrics.dp_to_px(self.shape.height())
    }

    /// Viewport units per whole intrinsic pixel, 1 when either size is unknown.
    pub fn pixel_size(&self) -> f32 {
        let (vw, vh) = (self.shape.viewport_width(), self.shape.viewport_height());
        let iw = self.intrinsic_width() as i32 as f32;
        let ih = self.intrinsic_height() as i32 as f32;
        if vw == 0.0 || vh == 0.0 || iw == 0.0 || ih == 0.0 {
            return 1.0;
        }
        (vw / iw).min(vh / ih)
    }

    pub fn alpha(&self) -> f32 {
        self.shape.alpha()
    }

    pub fn set_alpha(&mut self, alpha: f32) {
        self.shape.set_alpha(alpha);
    }

    /// Fits the viewport into `bounds`, centred and keeping its aspect.
    /// Bounds with no width or height are ignored.
    pub fn set_bounds(&mut self, bounds: Rect) {
        let (w, h) = (bounds.width() as f32, bounds.height() as f32);
        if w == 0.0 || h == 0.0 {
            return;
        }
        self.bounds = bounds;

        let (vw, vh) = (self.shape.viewport_width(), self.shape.viewport_height());
        let ratio = if vw > 0.0 && vh > 0.0 {
            (w / vw).min(h / vh)
        } else {
            1.0
        };
        let center = Vec2::new(w / 2.0, h / 2.0);
        let scale = Mat3::from_translation(center)
            * Mat3::from_scale(Vec2::splat(ratio))
            * Mat3::from_translation(-center)
            * Mat3::from_translation(center - Vec2::new(vw / 2.0, vh / 2.0));
        self.scale_ratio = ratio;
        self.shape.scale_all_paths(scale);

        let (iw, ih) = (self.intrinsic_width(), self.intrinsic_height());
        let stroke_ratio = if iw > 0.0 && ih > 0.0 {
            (w / iw).min(h / ih)
        } else {
            ratio
        };
        self.shape.scale_all_stroke_width(stroke_ratio);
        debug!(ratio, stroke_ratio, "Fitted vector to bounds");
    }

    pub fn draw(&self, ctx: &mut dyn DrawContext) {
        let alpha = float_alpha_to_int(self.shape.alpha());
        if alpha < u8::MAX {
            ctx.save_layer_alpha(alpha);
        } else {
            ctx.save();
        }
        let (left, top) = (self.bounds.x0 as f32, self.bounds.y0 as f32);
        if left != 0.0 || top != 0.0 {
            ctx.translate(left, top);
        }
        self.shape.draw(ctx);
        ctx.restore();
    }

    pub fn find_path(&self, name: &str) -> Option<PathId> {
        self.shape.find_path(name)
    }

    pub fn find_group(&self, name: &str) -> Option<GroupId> {
        self.shape.find_group(name)
    }

    pub fn path(&self, id: PathId) -> &PathElement {
        self.shape.path(id)
    }

    pub fn path_mut(&mut self, id: PathId) -> &mut PathElement {
        self.shape.path_mut(id)
    }

    pub fn group_mut(&mut self, id: GroupId) -> GroupMut<'_> {
        self.shape.group_mut(id)
    }
}

impl Renderable for VectorDrawable {
    fn set_bounds(&mut self, bounds: Rect) {
        VectorDrawable::set_bounds(self, bounds);
    }

    fn draw(&mut self, ctx: &mut dyn DrawContext) {
        VectorDrawable::draw(self, ctx);
    }
}

/// Edits paths by name. Every setter returns whether the path was found.
pub trait VectorPathContainer {
    fn path_by_name(&mut self, name: &str) -> Option<&mut PathElement>;

    /// Called after a path changed so the owner can schedule a redraw.
    fn invalidate_path(&mut self) {}

    fn set_stroke_color(&mut self, name: &str, color: Color) -> bool {
        self.edit_path(name, |p| p.set_stroke_color(color))
    }

    fn set_fill_color(&mut self, name: &str, color: Color) -> bool {
        self.edit_path(name, |p| p.set_fill_color(color))
    }

    /// Sets fill and stroke together.
    fn set_color(&mut self, name: &str, color: Color) -> bool {
        self.edit_path(name, |p| {
            p.set_fill_color(color);
            p.set_stroke_color(color);
        })
    }

    fn set_stroke_alpha(&mut self, name: &str, alpha: u8) -> bool {
        self.edit_path(name, |p| p.set_stroke_alpha(alpha))
    }

    fn set_stroke_width(&mut self, name: &str, width: f32) -> bool {
        self.edit_path(name, |p| p.set_stroke_width(width))
    }

    fn edit_path(&mut self, name: &str, edit: impl FnOnce(&mut PathElement)) -> bool {
        let Some(path) = self.path_by_name(name) else {
            return false;
        };
        edit(path);
        self.invalidate_path();
        true
    }
}

impl VectorPathContainer for VectorDrawable {
    fn path_by_name(&mut self, name: &str) -> Option<&mut PathElement> {
        let id = self.shape.find_path(name)?;
        Some(self.shape.path_mut(id))
    }
}

/// A vector drawable with animations bound to its nodes by name.
///
/// Playback is driven by drawing: while started, every [`draw`](Self::draw)
/// advances the animation to the clock's time and asks for another frame
/// through [`take_invalidation`](Self::take_invalidation).
pub struct AnimatedVectorDrawable {
    drawable: VectorDrawable,
    targets: Vec<TargetAnimation>,
    player: AnimationPlayer,
    clock: Box<dyn FrameClock>,
    invalidated: bool,
}

impl AnimatedVectorDrawable {
    /// Binds `targets` to `drawable`. Fails when a target name matches no
    /// group or path.
    pub fn new(
        drawable: VectorDrawable,
        targets: Vec<TargetAnimation>,
        clock: impl FrameClock + 'static,
    ) -> Result<Self> {
        let mut player = AnimationPlayer::new();
        player.prepare(&targets, drawable.shape())?;
        Ok(Self {
            drawable,
            targets,
            player,
            clock: Box::new(clock),
            invalidated: false,
        })
    }

    pub fn drawable(&self) -> &VectorDrawable {
        &self.drawable
    }

    pub fn drawable_mut(&mut self) -> &mut VectorDrawable {
        &mut self.drawable
    }

    pub fn state(&self) -> PlayerState {
        self.player.state()
    }

    pub fn is_running(&self) -> bool {
        self.player.is_running()
    }

    pub fn is_started(&self) -> bool {
        self.player.is_started()
    }

    pub fn is_infinite(&self) -> bool {
        self.player.is_infinite()
    }

    /// Whether a redraw was requested since the last call.
    pub fn take_invalidation(&mut self) -> bool {
        std::mem::take(&mut self.invalidated)
    }

    pub fn set_bounds(&mut self, bounds: Rect) {
        self.drawable.set_bounds(bounds);
    }

    pub fn draw(&mut self, ctx: &mut dyn DrawContext) {
        if self.player.is_started() {
            let now = self.clock.now();
            if let Err(e) = self.player.on_frame(now, self.drawable.shape_mut()) {
                error!(error = %e, "Animation frame failed, stopping");
                self.settle(|player, shape| player.end(shape));
            }
            if self.player.is_started() {
                self.invalidated = true;
            }
        }
        self.drawable.draw(ctx);
    }

    fn settle(&mut self, f: impl FnOnce(&mut AnimationPlayer, &mut Shape) -> Result<()>) {
        if let Err(e) = f(&mut self.player, self.drawable.shape_mut()) {
            error!(error = %e, "Animation could not be applied");
        }
        self.invalidated = true;
    }

    pub fn start(&mut self) {
        let now = self.clock.now();
        self.settle(|player, shape| player.start(now, shape));
    }

    /// Jumps straight to the end values.
    pub fn stop(&mut self) {
        self.settle(|player, shape| player.end(shape));
    }

    pub fn jump_to_current_state(&mut self) {
        self.stop();
    }

    pub fn pause(&mut self) {
        self.player.pause(self.clock.now());
    }

    pub fn resume(&mut self) {
        self.player.resume(self.clock.now());
        self.invalidated = true;
    }

    /// Only animations that repeat forever are suspended while hidden.
    pub fn set_visible(&mut self, visible: bool) {
        if self.player.is_infinite() && self.player.is_running() {
            if visible {
                self.resume();
            } else {
                self.pause();
            }
        }
    }

    pub fn reverse(&mut self) {
        let now = self.clock.now();
        self.settle(|player, shape| player.reverse(now, shape));
    }

    /// Returns to the start values without playing.
    pub fn reset(&mut self) {
        self.settle(|player, shape| player.reset(shape));
    }

    /// Descriptions bound to the target called `name`.
    pub fn find_animations(&self, name: &str) -> Vec<Arc<AnimatorDescription>> {
        self.targets
            .iter()
            .filter(|t| t.target_name == name)
            .map(|t| t.animation.clone())
            .collect()
    }

    /// Swaps the descriptions for `name`. Nothing changes on screen until
    /// [`invalidate_animations`](Self::invalidate_animations) rebinds.
    pub fn replace_animations(&mut self, name: &str, animation: AnimatorDescription) -> bool {
        let animation = Arc::new(animation);
        let mut found = false;
        for target in self.targets.iter_mut().filter(|t| t.target_name == name) {
            target.animation = animation.clone();
            found = true;
        }
        found
    }

    /// Rebinds every description from scratch. Playback returns to the
    /// prepared state.
    pub fn invalidate_animations(&mut self) -> Result<()> {
        let mut player = AnimationPlayer::new();
        player.prepare(&self.targets, self.drawable.shape())?;
        self.player = player;
        self.invalidated = true;
        Ok(())
    }

    /// Rewrites the values of `property` in every animation of `target`
    /// and rebinds. Returns how many value holders changed.
    pub fn change_animations(
        &mut self,
        target: &str,
        property: &str,
        values: &[AnimatedValue],
    ) -> Result<usize> {
        let mut edits = Vec::new();
        for (idx, t) in self.targets.iter().enumerate().filter(|(_, t)| t.target_name == target) {
            let mut edited = (*t.animation).clone();
            let changed = edited.replace_values(property, values)?;
            if changed > 0 {
                edits.push((idx, edited, changed));
            }
        }
        if edits.is_empty() {
            return Ok(0);
        }
        let mut total = 0;
        for (idx, edited, changed) in edits {
            self.targets[idx].animation = Arc::new(edited);
            total += changed;
        }
        self.invalidate_animations()?;
        Ok(total)
    }

    pub fn find_path(&self, name: &str) -> Option<PathId> {
        self.drawable.find_path(name)
    }

    pub fn find_group(&self, name: &str) -> Option<GroupId> {
        self.drawable.find_group(name)
    }
}

impl Renderable for AnimatedVectorDrawable {
    fn set_bounds(&mut self, bounds: Rect) {
        AnimatedVectorDrawable::set_bounds(self, bounds);
    }

    fn draw(&mut self, ctx: &mut dyn DrawContext) {
        AnimatedVectorDrawable::draw(self, ctx);
    }
}

impl Playback for AnimatedVectorDrawable {
    fn start(&mut self) {
        AnimatedVectorDrawable::start(self);
    }

    fn stop(&mut self) {
        AnimatedVectorDrawable::stop(self);
    }

    fn is_running(&self) -> bool {
        AnimatedVectorDrawable::is_running(self)
    }
}

impl VectorPathContainer for AnimatedVectorDrawable {
    fn path_by_name(&mut self, name: &str) -> Option<&mut PathElement> {
        self.drawable.path_by_name(name)
    }

    fn invalidate_path(&mut self) {
        self.invalidated = true;
    }
}

/// Loads animated vectors, keeping parsed animators for reuse.
pub struct AnimatedVectorLoader {
    resources: Arc<dyn Resources>,
    cache: DescriptionCache,
}

impl AnimatedVectorLoader {
    pub fn new(resources: Arc<dyn Resources>) -> Self {
        Self {
            resources,
            cache: DescriptionCache::default(),
        }
    }

    pub fn resources(&self) -> &Arc<dyn Resources> {
        &self.resources
    }

    pub fn cache(&self) -> &DescriptionCache {
        &self.cache
    }

    pub fn load(&mut self, reference: &str) -> Result<AnimatedVectorDrawable> {
        self.load_with_clock(reference, SystemClock::new())
    }

    /// Reads the animated-vector document, its drawable and each target's
    /// animator, then binds them.
    #[instrument(level = "debug", skip(self, clock))]
    pub fn load_with_clock(
        &mut self,
        reference: &str,
        clock: impl FrameClock + 'static,
    ) -> Result<AnimatedVectorDrawable> {
        let document = {
            let mut reader = self.resources.open(reference)?;
            parse_animated_vector(&mut reader)?
        };
        let drawable = VectorDrawable::load(self.resources.clone(), &document.drawable)?;
        let pixel_size = drawable.pixel_size();

        let mut targets = Vec::with_capacity(document.targets.len());
        for target in &document.targets {
            let resources = self.resources.as_ref();
            let animation = self.cache.get_or_parse(&target.animation, pixel_size, || {
                let mut reader = resources.open(&target.animation)?;
                let ctx = AnimatorContext { resources, pixel_size };
                parse_animator(&mut reader, &ctx)
            })?;
            targets.push(TargetAnimation {
                target_name: target.name.clone(),
                animation,
            });
        }
        AnimatedVectorDrawable::new(drawable, targets, clock)
    }
}
