use crate::canvas::DrawContext;
use crate::element::{ClipPathElement, PathElement};
use crate::geometry::mat3_to_affine;
use glam::{Mat3, Vec2};
use kurbo::BezPath;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GroupId(pub(crate) usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PathId(pub(crate) usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClipPathId(pub(crate) usize);

/// What a name lookup resolved to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Shape,
    Group(GroupId),
    Path(PathId),
    ClipPath(ClipPathId),
}

/// Ordered children of the shape root or of a group.
#[derive(Debug, Clone, Default)]
pub struct ElementHolder {
    groups: Vec<GroupId>,
    paths: Vec<PathId>,
    clip_paths: Vec<ClipPathId>,
}

impl ElementHolder {
    pub fn groups(&self) -> &[GroupId] {
        &self.groups
    }

    pub fn paths(&self) -> &[PathId] {
        &self.paths
    }

    pub fn clip_paths(&self) -> &[ClipPathId] {
        &self.clip_paths
    }
}

/// Local transform parameters of a group.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GroupTransform {
    pub pivot_x: f32,
    pub pivot_y: f32,
    /// Degrees.
    pub rotation: f32,
    pub scale_x: f32,
    pub scale_y: f32,
    pub translate_x: f32,
    pub translate_y: f32,
}

impl Default for GroupTransform {
    fn default() -> Self {
        Self {
            pivot_x: 0.0,
            pivot_y: 0.0,
            rotation: 0.0,
            scale_x: 1.0,
            scale_y: 1.0,
            translate_x: 0.0,
            translate_y: 0.0,
        }
    }
}

impl GroupTransform {
    /// Scale about the pivot, then rotate about the pivot, then translate.
    pub fn local_matrix(&self) -> Mat3 {
        let pivot = Vec2::new(self.pivot_x, self.pivot_y);
        let about_pivot =
            |m: Mat3| Mat3::from_translation(pivot) * m * Mat3::from_translation(-pivot);
        let scale = about_pivot(Mat3::from_scale(Vec2::new(self.scale_x, self.scale_y)));
        let rotate = about_pivot(Mat3::from_angle(self.rotation.to_radians()));
        Mat3::from_translation(Vec2::new(self.translate_x, self.translate_y)) * rotate * scale
    }
}

#[derive(Debug, Clone)]
pub struct GroupElement {
    name: Option<String>,
    transform: GroupTransform,
    parent: Option<GroupId>,
    children: ElementHolder,
    original_matrix: Mat3,
    scale_matrix: Mat3,
    final_matrix: Mat3,
}

impl GroupElement {
    pub fn new(name: Option<String>, transform: GroupTransform) -> Self {
        Self {
            name,
            transform,
            parent: None,
            children: ElementHolder::default(),
            original_matrix: Mat3::IDENTITY,
            scale_matrix: Mat3::IDENTITY,
            final_matrix: Mat3::IDENTITY,
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn transform(&self) -> &GroupTransform {
        &self.transform
    }

    pub fn parent(&self) -> Option<GroupId> {
        self.parent
    }

    pub fn children(&self) -> &ElementHolder {
        &self.children
    }

    /// Local transform composed with every ancestor's.
    pub fn original_matrix(&self) -> Mat3 {
        self.original_matrix
    }

    /// The composed transform with the viewport fit applied on top.
    pub fn final_matrix(&self) -> Mat3 {
        self.final_matrix
    }
}

/// Viewport and size attributes of the `vector` root.
#[derive(Debug, Clone, PartialEq)]
pub struct ShapeAttributes {
    pub name: Option<String>,
    pub viewport_width: f32,
    pub viewport_height: f32,
    pub alpha: f32,
    /// Intrinsic size in dp.
    pub width: f32,
    pub height: f32,
}

impl Default for ShapeAttributes {
    fn default() -> Self {
        Self {
            name: None,
            viewport_width: 0.0,
            viewport_height: 0.0,
            alpha: 1.0,
            width: 0.0,
            height: 0.0,
        }
    }
}

/// The element tree of one drawable.
///
/// Elements live in per-kind arenas and refer to each other by id. A
/// group's `parent` is set when the group is attached.
#[derive(Debug, Clone)]
pub struct Shape {
    attributes: ShapeAttributes,
    root: ElementHolder,
    groups: Vec<GroupElement>,
    paths: Vec<PathElement>,
    clip_paths: Vec<ClipPathElement>,
    scale_matrix: Mat3,
    full_path: BezPath,
}

impl Default for Shape {
    fn default() -> Self {
        Self::new(ShapeAttributes::default())
    }
}

impl Shape {
    pub fn new(attributes: ShapeAttributes) -> Self {
        Self {
            attributes,
            root: ElementHolder::default(),
            groups: Vec::new(),
            paths: Vec::new(),
            clip_paths: Vec::new(),
            scale_matrix: Mat3::IDENTITY,
            full_path: BezPath::new(),
        }
    }

    pub fn attributes(&self) -> &ShapeAttributes {
        &self.attributes
    }

    pub fn set_attributes(&mut self, attributes: ShapeAttributes) {
        self.attributes = attributes;
    }

    pub fn name(&self) -> Option<&str> {
        self.attributes.name.as_deref()
    }

    pub fn viewport_width(&self) -> f32 {
        self.attributes.viewport_width
    }

    pub fn viewport_height(&self) -> f32 {
        self.attributes.viewport_height
    }

    pub fn width(&self) -> f32 {
        self.attributes.width
    }

    pub fn height(&self) -> f32 {
        self.attributes.height
    }

    pub fn alpha(&self) -> f32 {
        self.attributes.alpha
    }

    pub fn set_alpha(&mut self, alpha: f32) {
        self.attributes.alpha = alpha;
    }

    pub fn root(&self) -> &ElementHolder {
        &self.root
    }

    /// Union of every path outline in document order, untransformed.
    pub fn full_path(&self) -> &BezPath {
        &self.full_path
    }

    pub fn scale_matrix(&self) -> Mat3 {
        self.scale_matrix
    }

    pub fn group(&self, id: GroupId) -> &GroupElement {
        &self.groups[id.0]
    }

    pub fn group_mut(&mut self, id: GroupId) -> GroupMut<'_> {
        GroupMut { shape: self, id }
    }

    pub fn path(&self, id: PathId) -> &PathElement {
        &self.paths[id.0]
    }

    pub fn path_mut(&mut self, id: PathId) -> &mut PathElement {
        &mut self.paths[id.0]
    }

    pub fn clip_path(&self, id: ClipPathId) -> &ClipPathElement {
        &self.clip_paths[id.0]
    }

    pub fn paths(&self) -> impl Iterator<Item = (PathId, &PathElement)> {
        self.paths.iter().enumerate().map(|(i, p)| (PathId(i), p))
    }

    /// Stores a group that is not yet part of the tree.
    pub fn insert_group(&mut self, group: GroupElement) -> GroupId {
        self.groups.push(group);
        GroupId(self.groups.len() - 1)
    }

    /// Hangs a stored group under `parent`, or under the root.
    pub fn attach_group(&mut self, id: GroupId, parent: Option<GroupId>) {
        self.groups[id.0].parent = parent;
        self.holder_mut(parent).groups.push(id);
    }

    pub fn add_path(&mut self, parent: Option<GroupId>, path: PathElement) -> PathId {
        self.append_to_full_path(path.geometry().bez_path());
        self.paths.push(path);
        let id = PathId(self.paths.len() - 1);
        self.holder_mut(parent).paths.push(id);
        id
    }

    pub fn add_clip_path(&mut self, parent: Option<GroupId>, clip: ClipPathElement) -> ClipPathId {
        self.clip_paths.push(clip);
        let id = ClipPathId(self.clip_paths.len() - 1);
        self.holder_mut(parent).clip_paths.push(id);
        id
    }

    fn append_to_full_path(&mut self, path: &BezPath) {
        self.full_path.extend(path.elements().iter().copied());
    }

    fn holder(&self, owner: Option<GroupId>) -> &ElementHolder {
        match owner {
            Some(id) => &self.groups[id.0].children,
            None => &self.root,
        }
    }

    fn holder_mut(&mut self, owner: Option<GroupId>) -> &mut ElementHolder {
        match owner {
            Some(id) => &mut self.groups[id.0].children,
            None => &mut self.root,
        }
    }

    /// Recomputes every group matrix from the root down and re-applies
    /// them to the paths and clip paths underneath.
    pub fn build_transform_matrices(&mut self) {
        for id in self.root.groups.clone() {
            self.rebuild_group(id);
        }
    }

    /// Recomposes the subtree rooted at `id`. Ancestors are left alone.
    pub(crate) fn rebuild_group(&mut self, id: GroupId) {
        self.compose(id);
        self.invalidate(id);
    }

    fn compose(&mut self, id: GroupId) {
        let parent = self.groups[id.0]
            .parent
            .map_or(Mat3::IDENTITY, |p| self.groups[p.0].original_matrix);
        let group = &mut self.groups[id.0];
        group.original_matrix = parent * group.transform.local_matrix();
        for child in group.children.groups.clone() {
            self.compose(child);
        }
    }

    fn invalidate(&mut self, id: GroupId) {
        let group = &mut self.groups[id.0];
        group.final_matrix = group.scale_matrix * group.original_matrix;
        let scale = group.scale_matrix;
        let affine = mat3_to_affine(&group.final_matrix);
        let children = group.children.clone();

        for child in children.groups {
            self.groups[child.0].scale_matrix = scale;
            self.invalidate(child);
        }
        for path in children.paths {
            self.paths[path.0].transform(affine);
        }
        for clip in children.clip_paths {
            self.clip_paths[clip.0].transform(affine);
        }
    }

    /// Applies the viewport fit to everything in the tree.
    pub fn scale_all_paths(&mut self, scale: Mat3) {
        self.scale_matrix = scale;
        let affine = mat3_to_affine(&scale);
        let root = self.root.clone();
        for id in root.groups {
            self.groups[id.0].scale_matrix = scale;
            self.invalidate(id);
        }
        for path in root.paths {
            self.paths[path.0].transform(affine);
        }
        for clip in root.clip_paths {
            self.clip_paths[clip.0].transform(affine);
        }
    }

    pub fn scale_all_stroke_width(&mut self, ratio: f32) {
        for path in &mut self.paths {
            path.set_stroke_ratio(ratio);
        }
    }

    /// Looks in the holder itself before descending into its groups.
    fn find_in<T: Copy>(
        &self,
        owner: Option<GroupId>,
        matches: &dyn Fn(&Self, &ElementHolder) -> Option<T>,
    ) -> Option<T> {
        let holder = self.holder(owner);
        if let Some(found) = matches(self, holder) {
            return Some(found);
        }
        holder
            .groups
            .iter()
            .find_map(|g| self.find_in(Some(*g), matches))
    }

    pub fn find_group(&self, name: &str) -> Option<GroupId> {
        self.find_in(None, &|shape, holder| {
            holder
                .groups
                .iter()
                .copied()
                .find(|g| shape.groups[g.0].name() == Some(name))
        })
    }

    pub fn find_path(&self, name: &str) -> Option<PathId> {
        self.find_in(None, &|shape, holder| {
            holder
                .paths
                .iter()
                .copied()
                .find(|p| shape.paths[p.0].name() == Some(name))
        })
    }

    pub fn find_clip_path(&self, name: &str) -> Option<ClipPathId> {
        self.find_in(None, &|shape, holder| {
            holder
                .clip_paths
                .iter()
                .copied()
                .find(|c| shape.clip_paths[c.0].name() == Some(name))
        })
    }

    /// Resolves a name against the shape itself, then groups, paths and
    /// clip paths in that order.
    pub fn find_target(&self, name: &str) -> Option<Target> {
        if self.name() == Some(name) {
            return Some(Target::Shape);
        }
        self.find_group(name)
            .map(Target::Group)
            .or_else(|| self.find_path(name).map(Target::Path))
            .or_else(|| self.find_clip_path(name).map(Target::ClipPath))
    }

    /// Clip paths first, then groups (each in its own save/restore), then
    /// paths.
    pub fn draw(&self, ctx: &mut dyn DrawContext) {
        self.draw_holder(&self.root, ctx);
    }

    fn draw_holder(&self, holder: &ElementHolder, ctx: &mut dyn DrawContext) {
        for clip in &holder.clip_paths {
            self.clip_paths[clip.0].draw(ctx);
        }
        for group in &holder.groups {
            ctx.save();
            self.draw_holder(&self.groups[group.0].children, ctx);
            ctx.restore();
        }
        for path in &holder.paths {
            self.paths[path.0].draw(ctx);
        }
    }
}

/// Mutable view of one group. Every setter rebuilds the group's subtree.
pub struct GroupMut<'a> {
    shape: &'a mut Shape,
    id: GroupId,
}

impl GroupMut<'_> {
    pub fn id(&self) -> GroupId {
        self.id
    }

    pub fn transform(&self) -> GroupTransform {
        self.shape.groups[self.id.0].transform
    }

    pub fn update(&mut self, f: impl FnOnce(&mut GroupTransform)) {
        f(&mut self.shape.groups[self.id.0].transform);
        self.shape.rebuild_group(self.id);
    }

    pub fn set_rotation(&mut self, v: f32) {
        self.update(|t| t.rotation = v);
    }

    pub fn set_pivot_x(&mut self, v: f32) {
        self.update(|t| t.pivot_x = v);
    }

    pub fn set_pivot_y(&mut self, v: f32) {
        self.update(|t| t.pivot_y = v);
    }

    pub fn set_scale_x(&mut self, v: f32) {
        self.update(|t| t.scale_x = v);
    }

    pub fn set_scale_y(&mut self, v: f32) {
        self.update(|t| t.scale_y = v);
    }

    pub fn set_translate_x(&mut self, v: f32) {
        self.update(|t| t.translate_x = v);
    }

    pub fn set_translate_y(&mut self, v: f32) {
        self.update(|t| t.translate_y = v);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::{DrawCommand, RecordingContext};
    use crate::element::PathStyle;
    use crate::geometry::GeometryPath;
    use vector_data::Color;

    fn approx(a: Mat3, b: Mat3) -> bool {
        a.abs_diff_eq(b, 1e-5)
    }

    fn filled(name: &str) -> PathElement {
        PathElement::new(
            Some(name.to_string()),
            GeometryPath::parse("M0,0 L1,0 L1,1 Z").unwrap(),
            PathStyle {
                fill_color: Color::RED,
                ..Default::default()
            },
        )
    }

    #[test]
    fn test_local_matrix_identity_by_default() {
        assert!(approx(GroupTransform::default().local_matrix(), Mat3::IDENTITY));
    }

    #[test]
    fn test_local_matrix_rotates_about_pivot() {
        let t = GroupTransform {
            pivot_x: 5.0,
            pivot_y: 5.0,
            rotation: 90.0,
            ..Default::default()
        };
        let p = t.local_matrix().transform_point2(Vec2::new(10.0, 5.0));
        assert!((p - Vec2::new(5.0, 10.0)).length() < 1e-4);
        // The pivot itself stays put.
        let p = t.local_matrix().transform_point2(Vec2::new(5.0, 5.0));
        assert!((p - Vec2::new(5.0, 5.0)).length() < 1e-4);
    }

    #[test]
    fn test_composed_matrix_is_parent_times_local() {
        let mut shape = Shape::default();
        let parent_t = GroupTransform {
            translate_x: 10.0,
            rotation: 30.0,
            ..Default::default()
        };
        let child_t = GroupTransform {
            scale_x: 2.0,
            pivot_x: 3.0,
            ..Default::default()
        };
        let parent = shape.insert_group(GroupElement::new(Some("parent".into()), parent_t));
        let child = shape.insert_group(GroupElement::new(Some("child".into()), child_t));
        shape.attach_group(child, Some(parent));
        shape.attach_group(parent, None);
        shape.build_transform_matrices();

        let expected = parent_t.local_matrix() * child_t.local_matrix();
        assert!(approx(shape.group(child).original_matrix(), expected));
        assert_eq!(shape.group(child).parent(), Some(parent));
    }

    #[test]
    fn test_group_setter_rebuilds_descendants_only() {
        let mut shape = Shape::default();
        let a = shape.insert_group(GroupElement::new(Some("a".into()), GroupTransform::default()));
        let b = shape.insert_group(GroupElement::new(Some("b".into()), GroupTransform::default()));
        let p = shape.add_path(Some(b), filled("p"));
        shape.attach_group(b, Some(a));
        shape.attach_group(a, None);
        shape.build_transform_matrices();

        shape.group_mut(a).set_translate_x(7.0);
        assert_eq!(
            shape.group(b).original_matrix(),
            Mat3::from_translation(Vec2::new(7.0, 0.0))
        );
        assert_eq!(
            shape.path(p).render_path().elements()[0],
            kurbo::PathEl::MoveTo(kurbo::Point::new(7.0, 0.0))
        );
    }

    #[test]
    fn test_scale_all_paths_reaches_nested_paths() {
        let mut shape = Shape::default();
        let g = shape.insert_group(GroupElement::new(None, GroupTransform::default()));
        let inner = shape.add_path(Some(g), filled("inner"));
        shape.attach_group(g, None);
        let outer = shape.add_path(None, filled("outer"));
        shape.build_transform_matrices();

        shape.scale_all_paths(Mat3::from_scale(Vec2::splat(2.0)));
        let end = kurbo::PathEl::LineTo(kurbo::Point::new(2.0, 0.0));
        assert_eq!(shape.path(inner).render_path().elements()[1], end);
        assert_eq!(shape.path(outer).render_path().elements()[1], end);
        assert_eq!(shape.group(g).final_matrix(), Mat3::from_scale(Vec2::splat(2.0)));
    }

    #[test]
    fn test_find_order_and_targets() {
        let mut shape = Shape::new(ShapeAttributes {
            name: Some("root".into()),
            ..Default::default()
        });
        let outer =
            shape.insert_group(GroupElement::new(Some("outer".into()), GroupTransform::default()));
        let inner =
            shape.insert_group(GroupElement::new(Some("dup".into()), GroupTransform::default()));
        shape.attach_group(inner, Some(outer));
        shape.attach_group(outer, None);
        let path = shape.add_path(None, filled("dup"));
        let clip = shape.add_clip_path(
            None,
            ClipPathElement::new(Some("clip".into()), GeometryPath::default()),
        );

        assert_eq!(shape.find_target("root"), Some(Target::Shape));
        // Groups win over paths with the same name.
        assert_eq!(shape.find_target("dup"), Some(Target::Group(inner)));
        assert_eq!(shape.find_path("dup"), Some(path));
        assert_eq!(shape.find_target("clip"), Some(Target::ClipPath(clip)));
        assert_eq!(shape.find_target("missing"), None);
    }

    #[test]
    fn test_draw_order_clips_groups_paths() {
        let mut shape = Shape::default();
        shape.add_path(None, filled("top"));
        let g = shape.insert_group(GroupElement::new(None, GroupTransform::default()));
        shape.add_path(Some(g), filled("nested"));
        shape.attach_group(g, None);
        shape.add_clip_path(None, ClipPathElement::new(None, GeometryPath::default()));
        shape.build_transform_matrices();

        let mut ctx = RecordingContext::new();
        shape.draw(&mut ctx);
        let kinds: Vec<&str> = ctx
            .commands
            .iter()
            .map(|c| match c {
                DrawCommand::ClipPath { .. } => "clip",
                DrawCommand::Save => "save",
                DrawCommand::Restore => "restore",
                DrawCommand::DrawPath { .. } => "draw",
                _ => "other",
            })
            .collect();
        assert_eq!(kinds, vec!["clip", "save", "draw", "restore", "draw"]);
    }

    #[test]
    fn test_full_path_accumulates() {
        let mut shape = Shape::default();
        shape.add_path(None, filled("a"));
        shape.add_path(None, filled("b"));
        assert_eq!(shape.full_path().elements().len(), 8);
    }
}
