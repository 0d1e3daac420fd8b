use crate::canvas::{FillType, LineCap, LineJoin};
use crate::element::{ClipPathElement, PathElement, PathStyle};
use crate::geometry::GeometryPath;
use crate::scene::{GroupElement, GroupId, GroupTransform, Shape, ShapeAttributes};
use tracing::{debug, error, instrument, warn};
use vector_data::dimension::dimension_value;
use vector_data::{Attributes, MarkupError, MarkupEvent, MarkupReader, Resources, Tag};

const FILL_TYPES: &[&str] = &["nonZero", "evenOdd", "inverseWinding", "inverseEvenOdd"];
const LINE_CAPS: &[&str] = &["butt", "round", "square"];
const LINE_JOINS: &[&str] = &["miter", "round", "bevel"];

/// Outcome of reading a vector document.
///
/// A read error stops the parse but keeps everything built so far; the
/// error is reported in `aborted`.
#[derive(Debug)]
pub struct SceneParse {
    pub shape: Shape,
    pub aborted: Option<MarkupError>,
}

/// Builds a [`Shape`] from `vector` markup.
#[instrument(level = "debug", skip_all)]
pub fn parse_vector(reader: &mut dyn MarkupReader, resources: &dyn Resources) -> SceneParse {
    let mut shape = Shape::default();
    let mut groups: Vec<GroupId> = Vec::new();
    let mut pending_path: Option<PathElement> = None;
    let mut pending_clip: Option<ClipPathElement> = None;
    let mut aborted = None;

    loop {
        let event = match reader.next_event() {
            Ok(event) => event,
            Err(e) => {
                error!(error = %e, "Vector markup unreadable, keeping partial shape");
                aborted = Some(e);
                break;
            }
        };
        match event {
            MarkupEvent::StartTag(tag) => match tag.name.as_str() {
                "vector" => shape.set_attributes(shape_attributes(&tag.attributes)),
                "group" => {
                    let group = GroupElement::new(name_of(&tag), group_transform(&tag.attributes));
                    groups.push(shape.insert_group(group));
                }
                "path" => pending_path = Some(path_element(&tag, resources)),
                "clip-path" => {
                    let geometry = geometry_of(&tag.attributes);
                    pending_clip = Some(ClipPathElement::new(name_of(&tag), geometry));
                }
                other => warn!(tag = other, "Skipping unknown vector element"),
            },
            MarkupEvent::EndTag { name, .. } => match name.as_str() {
                "group" => {
                    if let Some(id) = groups.pop() {
                        shape.attach_group(id, groups.last().copied());
                    }
                }
                "path" => {
                    if let Some(path) = pending_path.take() {
                        shape.add_path(groups.last().copied(), path);
                    }
                }
                "clip-path" => {
                    if let Some(clip) = pending_clip.take() {
                        shape.add_clip_path(groups.last().copied(), clip);
                    }
                }
                _ => {}
            },
            MarkupEvent::EndDocument => break,
        }
    }

    // Groups left open by a truncated document still hang off the root.
    while let Some(id) = groups.pop() {
        shape.attach_group(id, groups.last().copied());
    }
    shape.build_transform_matrices();
    debug!(
        paths = shape.paths().count(),
        partial = aborted.is_some(),
        "Parsed vector"
    );
    SceneParse { shape, aborted }
}

fn name_of(tag: &Tag) -> Option<String> {
    tag.attributes.get("name").map(str::to_string)
}

fn dimension(attrs: &Attributes, name: &str) -> f32 {
    match attrs.get(name) {
        Some(raw) => dimension_value(raw).unwrap_or_else(|| {
            warn!(attribute = name, value = raw, "Ignoring malformed dimension");
            0.0
        }),
        None => 0.0,
    }
}

fn shape_attributes(attrs: &Attributes) -> ShapeAttributes {
    ShapeAttributes {
        name: attrs.get("name").map(str::to_string),
        viewport_width: attrs.float_or("viewportWidth", 0.0),
        viewport_height: attrs.float_or("viewportHeight", 0.0),
        alpha: attrs.float_or("alpha", 1.0),
        width: dimension(attrs, "width"),
        height: dimension(attrs, "height"),
    }
}

fn group_transform(attrs: &Attributes) -> GroupTransform {
    let d = GroupTransform::default();
    GroupTransform {
        pivot_x: attrs.float_or("pivotX", d.pivot_x),
        pivot_y: attrs.float_or("pivotY", d.pivot_y),
        rotation: attrs.float_or("rotation", d.rotation),
        scale_x: attrs.float_or("scaleX", d.scale_x),
        scale_y: attrs.float_or("scaleY", d.scale_y),
        translate_x: attrs.float_or("translateX", d.translate_x),
        translate_y: attrs.float_or("translateY", d.translate_y),
    }
}

/// Unparseable path data leaves an empty outline.
fn geometry_of(attrs: &Attributes) -> GeometryPath {
    match attrs.get("pathData") {
        Some(data) => GeometryPath::parse(data).unwrap_or_else(|e| {
            warn!(error = %e, "Ignoring malformed pathData");
            GeometryPath::default()
        }),
        None => GeometryPath::default(),
    }
}

fn path_element(tag: &Tag, resources: &dyn Resources) -> PathElement {
    let attrs = &tag.attributes;
    let d = PathStyle::default();
    let color = |name: &str| {
        attrs.get(name).and_then(|raw| {
            let resolved = resources.resolve_color(raw);
            if resolved.is_none() {
                warn!(attribute = name, value = raw, "Unresolved color");
            }
            resolved
        })
    };
    let style = PathStyle {
        fill_color: color("fillColor").unwrap_or(d.fill_color),
        fill_alpha: attrs.float_or("fillAlpha", d.fill_alpha),
        fill_type: attrs
            .enum_index("fillType", FILL_TYPES)
            .map_or(d.fill_type, FillType::from_code),
        stroke_color: color("strokeColor").unwrap_or(d.stroke_color),
        stroke_alpha: attrs.float_or("strokeAlpha", d.stroke_alpha),
        stroke_width: attrs.float_or("strokeWidth", d.stroke_width),
        stroke_line_cap: attrs
            .enum_index("strokeLineCap", LINE_CAPS)
            .map_or(d.stroke_line_cap, LineCap::from_code),
        stroke_line_join: attrs
            .enum_index("strokeLineJoin", LINE_JOINS)
            .map_or(d.stroke_line_join, LineJoin::from_code),
        stroke_miter_limit: attrs.float_or("strokeMiterLimit", d.stroke_miter_limit),
        trim_path_start: attrs.float_or("trimPathStart", d.trim_path_start),
        trim_path_end: attrs.float_or("trimPathEnd", d.trim_path_end),
        trim_path_offset: attrs.float_or("trimPathOffset", d.trim_path_offset),
    };
    PathElement::new(name_of(tag), geometry_of(attrs), style)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::RecordingContext;
    use vector_data::{Color, DisplayMetrics, MemoryResources, XmlMarkupReader};

    const ICON: &str = r##"<vector xmlns:android="http://schemas.android.com/apk/res/android"
        android:name="icon" android:width="24dp" android:height="24dp"
        android:viewportWidth="24" android:viewportHeight="24">
        <clip-path android:name="mask" android:pathData="M0,0 H24 V24 H0 Z"/>
        <group android:name="outer" android:translateX="2">
            <group android:name="inner" android:rotation="90" android:pivotX="12" android:pivotY="12">
                <path android:name="tick" android:pathData="M4,12 L10,18 L20,6"
                    android:strokeColor="@color/accent" android:strokeWidth="2"
                    android:strokeLineCap="round" android:fillType="evenOdd"/>
            </group>
        </group>
        <path android:name="dot" android:pathData="M12,12 m-2,0 a2,2 0 1,0 4,0 a2,2 0 1,0 -4,0"
            android:fillColor="#FF0000" android:fillAlpha="0.5"/>
        <unknown android:name="ignored"/>
    </vector>"##;

    fn parse(text: &str) -> SceneParse {
        let resources =
            MemoryResources::new(DisplayMetrics::default()).with_color("accent", "#0000FF");
        let mut reader = XmlMarkupReader::new(text);
        parse_vector(&mut reader, &resources)
    }

    #[test]
    fn test_tree_structure() {
        let SceneParse { shape, aborted } = parse(ICON);
        assert!(aborted.is_none());
        assert_eq!(shape.name(), Some("icon"));
        assert_eq!(shape.width(), 24.0);
        assert_eq!(shape.viewport_width(), 24.0);

        let outer = shape.find_group("outer").unwrap();
        let inner = shape.find_group("inner").unwrap();
        assert_eq!(shape.group(inner).parent(), Some(outer));
        assert_eq!(shape.group(outer).parent(), None);
        assert_eq!(shape.root().groups(), &[outer]);
        assert_eq!(shape.root().clip_paths().len(), 1);
        assert_eq!(shape.root().paths().len(), 1);

        let tick = shape.path(shape.find_path("tick").unwrap());
        assert_eq!(tick.stroke_color(), Color::BLUE);
        assert_eq!(tick.stroke_line_cap(), LineCap::Round);
        assert_eq!(tick.fill_type(), FillType::EvenOdd);

        let dot = shape.path(shape.find_path("dot").unwrap());
        assert_eq!(dot.fill_alpha(), 127);
    }

    #[test]
    fn test_group_matrices_are_composed() {
        let shape = parse(ICON).shape;
        let inner = shape.find_group("inner").unwrap();
        let m = shape.group(inner).original_matrix();
        // (12, 0) rotates about (12, 12) to (24, 12), then shifts by 2.
        let p = m.transform_point2(glam::Vec2::new(12.0, 0.0));
        assert!((p.x - 26.0).abs() < 1e-4 && (p.y - 12.0).abs() < 1e-4, "{p:?}");
    }

    #[test]
    fn test_truncated_document_keeps_partial_shape() {
        let text = r##"<vector android:viewportWidth="10" android:viewportHeight="10">
            <group android:name="g">
                <path android:name="a" android:pathData="M0,0 L5,5" android:fillColor="#F00"/>
            </group>
            <path android:name="b" android:pathData="M0,0 L5,5"></oops>"##;
        let SceneParse { shape, aborted } = parse(text);
        assert!(aborted.is_some());
        assert!(shape.find_path("a").is_some());
        assert!(shape.find_group("g").is_some());

        let mut ctx = RecordingContext::new();
        shape.draw(&mut ctx);
        assert_eq!(ctx.draw_calls().len(), 1);
    }

    #[test]
    fn test_bad_path_data_is_empty_outline() {
        let text = r##"<vector>
            <path android:name="p" android:pathData="M0,0 L" android:fillColor="#F00"/>
        </vector>"##;
        let shape = parse(text).shape;
        assert!(shape.path(shape.find_path("p").unwrap()).geometry().is_empty());
    }
}
