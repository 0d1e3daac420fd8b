use crate::animation::description::{
    AnimatorDescription, AnimatorSetDescription, Keyframe, Ordering, PropertyValues, RepeatMode,
    ValueAnimatorDescription, INFINITE,
};
use crate::animation::interpolator::Interpolator;
use crate::animation::value::{AnimatedValue, ValueType};
use crate::error::{Result, VectorError};
use crate::geometry::{can_morph, nodes_to_string, parse_path_data, GeometryPath, PathMeasure};
use tracing::{debug, instrument, warn};
use vector_data::dimension::dimension_value;
use vector_data::{
    Attributes, Color, MarkupError, MarkupEvent, MarkupReader, ResourceRef, Resources, Tag,
};

/// Upper bound on samples taken along a motion path.
const MAX_MOTION_POINTS: usize = 100;

/// What animator parsing needs from its surroundings.
pub struct AnimatorContext<'a> {
    pub resources: &'a dyn Resources,
    /// Viewport units per device pixel of the drawable being animated.
    /// Motion paths are sampled at half this spacing.
    pub pixel_size: f32,
}

/// Reads one animator document: a `set`, `objectAnimator` or `animator`.
#[instrument(level = "debug", skip_all)]
pub fn parse_animator(
    reader: &mut dyn MarkupReader,
    ctx: &AnimatorContext,
) -> Result<AnimatorDescription> {
    loop {
        match next(reader)? {
            MarkupEvent::StartTag(tag) => {
                let description = parse_element(reader, tag, ctx)?;
                debug!(total = ?description.total_duration(), "Parsed animator");
                return Ok(description);
            }
            MarkupEvent::EndTag { .. } => continue,
            MarkupEvent::EndDocument => {
                return Err(VectorError::MalformedMarkup("animator document is empty".into()))
            }
        }
    }
}

fn next(reader: &mut dyn MarkupReader) -> Result<MarkupEvent> {
    reader.next_event().map_err(|e| match e {
        MarkupError::Malformed { .. } | MarkupError::UnexpectedEnd => {
            VectorError::MalformedMarkup(e.to_string())
        }
        other => VectorError::Resource(other),
    })
}

fn unterminated(tag: &Tag) -> VectorError {
    VectorError::MalformedMarkup(format!("<{}> is never closed", tag.name))
}

/// Consumes events up to the end of `tag`.
fn skip_element(reader: &mut dyn MarkupReader, tag: &Tag) -> Result<()> {
    loop {
        match next(reader)? {
            MarkupEvent::EndTag { depth, .. } if depth == tag.depth => return Ok(()),
            MarkupEvent::EndDocument => return Err(unterminated(tag)),
            _ => {}
        }
    }
}

fn parse_element(
    reader: &mut dyn MarkupReader,
    tag: Tag,
    ctx: &AnimatorContext,
) -> Result<AnimatorDescription> {
    match tag.name.as_str() {
        "set" => parse_set(reader, tag, ctx),
        "objectAnimator" | "animator" => {
            parse_value_animator(reader, tag, ctx).map(AnimatorDescription::Value)
        }
        other => Err(VectorError::MalformedMarkup(format!("unknown animator element <{other}>"))),
    }
}

fn parse_set(
    reader: &mut dyn MarkupReader,
    tag: Tag,
    ctx: &AnimatorContext,
) -> Result<AnimatorDescription> {
    let ordering = match tag.attributes.enum_index("ordering", &["together", "sequentially"]) {
        Some(1) => Ordering::Sequentially,
        _ => Ordering::Together,
    };
    let mut children = Vec::new();
    loop {
        match next(reader)? {
            MarkupEvent::StartTag(child) => children.push(parse_element(reader, child, ctx)?),
            MarkupEvent::EndTag { depth, .. } if depth == tag.depth => break,
            MarkupEvent::EndTag { .. } => {}
            MarkupEvent::EndDocument => return Err(unterminated(&tag)),
        }
    }
    Ok(AnimatorDescription::Set(AnimatorSetDescription { ordering, children }))
}

fn parse_value_animator(
    reader: &mut dyn MarkupReader,
    tag: Tag,
    ctx: &AnimatorContext,
) -> Result<ValueAnimatorDescription> {
    let attrs = &tag.attributes;
    let mut animator = timing(attrs, ctx);

    let has_xy = attrs.contains("propertyXName") || attrs.contains("propertyYName");
    if attrs.contains("pathData") && has_xy {
        animator.property_values = motion_path(attrs, ctx)?;
    } else {
        let property = attrs.get("propertyName").unwrap_or("");
        if let Some(holder) = holder_from_range(property, attrs, ctx)? {
            animator.property_values.push(holder);
        }
    }

    loop {
        match next(reader)? {
            MarkupEvent::StartTag(child) if child.name == "propertyValuesHolder" => {
                if let Some(holder) = parse_holder(reader, child, ctx)? {
                    animator.property_values.push(holder);
                }
            }
            MarkupEvent::StartTag(child) => {
                warn!(tag = child.name.as_str(), "Skipping unknown animator child");
                skip_element(reader, &child)?;
            }
            MarkupEvent::EndTag { depth, .. } if depth == tag.depth => break,
            MarkupEvent::EndTag { .. } => {}
            MarkupEvent::EndDocument => return Err(unterminated(&tag)),
        }
    }
    Ok(animator)
}

fn timing(attrs: &Attributes, ctx: &AnimatorContext) -> ValueAnimatorDescription {
    let d = ValueAnimatorDescription::default();
    let duration = match attrs.get("duration") {
        Some(_) => attrs.int("duration").unwrap_or(0).max(0) as u64,
        None => d.duration,
    };
    let repeat_count = match attrs.get("repeatCount") {
        Some(raw) if raw.trim().eq_ignore_ascii_case("infinite") => INFINITE,
        Some(_) => match attrs.int("repeatCount").unwrap_or(0) {
            n if n < 0 => INFINITE,
            n => n,
        },
        None => d.repeat_count,
    };
    ValueAnimatorDescription {
        property_values: Vec::new(),
        duration,
        start_delay: attrs.int_or("startOffset", 0).max(0) as u64,
        repeat_count,
        repeat_mode: attrs
            .enum_index("repeatMode", &["", "restart", "reverse"])
            .map_or(d.repeat_mode, RepeatMode::from_code),
        interpolator: attrs
            .get("interpolator")
            .map_or(d.interpolator, |r| Interpolator::from_reference(r, ctx.resources)),
    }
}

/// `valueType` as written, by code or by name.
fn declared_type(attrs: &Attributes) -> ValueType {
    attrs
        .enum_index("valueType", &["floatType", "intType", "pathType", "colorType", "undefined"])
        .map_or(ValueType::Undefined, ValueType::from_code)
}

fn looks_like_color(raw: &str) -> bool {
    Color::is_literal(raw) || raw.parse::<ResourceRef>().is_ok_and(|r| r.kind == "color")
}

/// A declared `valueType` wins. Otherwise colors are recognised by their
/// literal or reference form, and anything else numeric is a float.
fn resolve_value_type(attrs: &Attributes, from: Option<&str>, to: Option<&str>) -> ValueType {
    let declared = declared_type(attrs);
    if declared != ValueType::Undefined {
        return declared;
    }
    if from.is_some_and(looks_like_color) || to.is_some_and(looks_like_color) {
        ValueType::Color
    } else if from.is_none() && to.is_none() {
        ValueType::Undefined
    } else {
        ValueType::Float
    }
}

fn parse_value(
    raw: &str,
    value_type: ValueType,
    ctx: &AnimatorContext,
) -> Result<Option<AnimatedValue>> {
    let value = match value_type {
        ValueType::Float => dimension_value(raw).map(AnimatedValue::Float),
        ValueType::Int => {
            if looks_like_color(raw) {
                ctx.resources.resolve_color(raw).map(|c| AnimatedValue::Int(c.argb() as i32))
            } else {
                let trimmed = raw.trim();
                trimmed
                    .parse::<i32>()
                    .ok()
                    .or_else(|| dimension_value(trimmed).map(|f| f as i32))
                    .map(AnimatedValue::Int)
            }
        }
        ValueType::Color => ctx.resources.resolve_color(raw).map(AnimatedValue::Color),
        ValueType::Path => Some(AnimatedValue::Path(parse_path_data(raw)?)),
        ValueType::Undefined => return Err(VectorError::UndefinedValueType(raw.to_string())),
    };
    if value.is_none() {
        warn!(value = raw, kind = ?value_type, "Ignoring unreadable animation value");
    }
    Ok(value)
}

/// Holder from `valueFrom`/`valueTo`. A named property with neither value
/// keeps an undefined type, which binding rejects.
fn holder_from_range(
    property: &str,
    attrs: &Attributes,
    ctx: &AnimatorContext,
) -> Result<Option<PropertyValues>> {
    let from_raw = attrs.get("valueFrom");
    let to_raw = attrs.get("valueTo");
    let value_type = resolve_value_type(attrs, from_raw, to_raw);

    if value_type == ValueType::Undefined || (from_raw.is_none() && to_raw.is_none()) {
        if property.is_empty() {
            return Ok(None);
        }
        return Ok(Some(PropertyValues {
            property: property.to_string(),
            value_type: ValueType::Undefined,
            keyframes: Vec::new(),
        }));
    }

    let from = from_raw.map(|r| parse_value(r, value_type, ctx)).transpose()?.flatten();
    let to = to_raw.map(|r| parse_value(r, value_type, ctx)).transpose()?.flatten();

    if let (Some(AnimatedValue::Path(a)), Some(AnimatedValue::Path(b))) = (&from, &to) {
        if !can_morph(a, b) {
            return Err(VectorError::IncompatiblePathMorph {
                from: nodes_to_string(a),
                to: nodes_to_string(b),
            });
        }
    }

    let values: Vec<AnimatedValue> = from.into_iter().chain(to).collect();
    if values.is_empty() {
        return Ok(None);
    }
    let mut holder = PropertyValues::of_values(property, values);
    holder.value_type = value_type;
    Ok(Some(holder))
}

fn parse_holder(
    reader: &mut dyn MarkupReader,
    tag: Tag,
    ctx: &AnimatorContext,
) -> Result<Option<PropertyValues>> {
    let property = tag.attributes.get("propertyName").unwrap_or("").to_string();
    let mut raw_keyframes: Vec<Tag> = Vec::new();
    loop {
        match next(reader)? {
            MarkupEvent::StartTag(child) if child.name == "keyframe" => raw_keyframes.push(child),
            MarkupEvent::StartTag(child) => {
                warn!(tag = child.name.as_str(), "Skipping unknown holder child");
                skip_element(reader, &child)?;
            }
            MarkupEvent::EndTag { depth, .. } if depth == tag.depth => break,
            MarkupEvent::EndTag { .. } => {}
            MarkupEvent::EndDocument => return Err(unterminated(&tag)),
        }
    }

    if raw_keyframes.is_empty() {
        return holder_from_range(&property, &tag.attributes, ctx);
    }

    let declared = declared_type(&tag.attributes);
    let value_type = if declared != ValueType::Undefined {
        declared
    } else {
        infer_keyframe_type(&raw_keyframes)
    };

    let mut keyframes = Vec::with_capacity(raw_keyframes.len());
    for kf in &raw_keyframes {
        let attrs = &kf.attributes;
        let value = match attrs.get("value") {
            Some(raw) => parse_value(raw, value_type, ctx)?,
            None => None,
        };
        keyframes.push(Keyframe {
            fraction: attrs.float_or("fraction", -1.0),
            value,
            interpolator: attrs
                .get("interpolator")
                .map(|r| Interpolator::from_reference(r, ctx.resources)),
        });
    }
    Ok(Some(PropertyValues::of_keyframes(&property, value_type, keyframes)))
}

fn infer_keyframe_type(keyframes: &[Tag]) -> ValueType {
    for kf in keyframes {
        let declared = declared_type(&kf.attributes);
        if declared != ValueType::Undefined {
            return declared;
        }
        if let Some(raw) = kf.attributes.get("value") {
            return if looks_like_color(raw) {
                ValueType::Color
            } else {
                ValueType::Float
            };
        }
    }
    ValueType::Float
}

/// Samples `pathData` into x and y float holders for `propertyXName` and
/// `propertyYName`.
fn motion_path(attrs: &Attributes, ctx: &AnimatorContext) -> Result<Vec<PropertyValues>> {
    let x_name = attrs.get("propertyXName").unwrap_or("");
    let y_name = attrs.get("propertyYName").unwrap_or("");
    if x_name.is_empty() && y_name.is_empty() {
        return Err(VectorError::InvalidAttribute {
            name: "propertyXName".into(),
            message: "motion path needs propertyXName or propertyYName".into(),
        });
    }
    let geometry = GeometryPath::parse(attrs.get("pathData").unwrap_or(""))?;
    let measure = PathMeasure::new(geometry.bez_path());
    if measure.contour_count() == 0 {
        warn!("Motion path has no length, ignoring");
        return Ok(Vec::new());
    }

    let total = measure.length();
    let precision = (0.5 * ctx.pixel_size as f64).max(f64::EPSILON);
    let points = ((total / precision) as usize + 1).clamp(2, MAX_MOTION_POINTS);
    let step = total / (points - 1) as f64;

    let mut xs = Vec::with_capacity(points);
    let mut ys = Vec::with_capacity(points);
    let mut contour = 0;
    let mut contour_start = 0.0;
    for i in 0..points {
        let distance = step * i as f64;
        while contour + 1 < measure.contour_count()
            && distance > contour_start + measure.contour_length(contour)
        {
            contour_start += measure.contour_length(contour);
            contour += 1;
        }
        let p = measure.point_at(contour, distance - contour_start).unwrap_or_default();
        xs.push(AnimatedValue::Float(p.x as f32));
        ys.push(AnimatedValue::Float(p.y as f32));
    }

    let mut holders = Vec::new();
    if !x_name.is_empty() {
        holders.push(PropertyValues::of_values(x_name, xs));
    }
    if !y_name.is_empty() {
        holders.push(PropertyValues::of_values(y_name, ys));
    }
    Ok(holders)
}

#[cfg(test)]
mod tests {
    use super::*;
    use vector_data::{DisplayMetrics, MemoryResources, XmlMarkupReader};

    fn parse_with(text: &str, resources: &MemoryResources) -> Result<AnimatorDescription> {
        let ctx = AnimatorContext {
            resources,
            pixel_size: 1.0,
        };
        parse_animator(&mut XmlMarkupReader::new(text), &ctx)
    }

    fn parse(text: &str) -> Result<AnimatorDescription> {
        parse_with(text, &MemoryResources::new(DisplayMetrics::default()))
    }

    fn leaf(desc: &AnimatorDescription) -> &ValueAnimatorDescription {
        match desc {
            AnimatorDescription::Value(v) => v,
            AnimatorDescription::Set(_) => panic!("expected a value animator"),
        }
    }

    #[test]
    fn test_object_animator_defaults() {
        let desc = parse(r#"<objectAnimator android:propertyName="rotation" android:valueFrom="0" android:valueTo="360"/>"#).unwrap();
        let v = leaf(&desc);
        assert_eq!(v.duration, 300);
        assert_eq!(v.start_delay, 0);
        assert_eq!(v.repeat_count, 0);
        assert_eq!(v.repeat_mode, RepeatMode::Restart);
        assert_eq!(v.interpolator, Interpolator::AccelerateDecelerate);
        let holder = &v.property_values[0];
        assert_eq!(holder.property, "rotation");
        assert_eq!(holder.value_type, ValueType::Float);
        assert_eq!(holder.keyframes[1].value, Some(AnimatedValue::Float(360.0)));
    }

    #[test]
    fn test_timing_attributes() {
        let desc = parse(
            r#"<objectAnimator android:propertyName="rotation" android:valueTo="1"
                android:duration="1000" android:startOffset="50" android:repeatCount="infinite"
                android:repeatMode="reverse" android:interpolator="@android:interpolator/linear"/>"#,
        )
        .unwrap();
        let v = leaf(&desc);
        assert_eq!(v.duration, 1000);
        assert_eq!(v.start_delay, 50);
        assert_eq!(v.repeat_count, INFINITE);
        assert_eq!(v.repeat_mode, RepeatMode::Reverse);
        assert_eq!(v.interpolator, Interpolator::Linear);
        assert!(desc.is_infinite());
    }

    #[test]
    fn test_value_type_resolution() {
        let desc = parse(
            r##"<objectAnimator android:propertyName="fillColor" android:valueFrom="#F00"
                android:valueTo="#00F"/>"##,
        )
        .unwrap();
        assert_eq!(leaf(&desc).property_values[0].value_type, ValueType::Color);

        let desc = parse(
            r##"<objectAnimator android:propertyName="fillColor" android:valueType="intType"
                android:valueFrom="#FF0000" android:valueTo="0"/>"##,
        )
        .unwrap();
        let holder = &leaf(&desc).property_values[0];
        assert_eq!(holder.value_type, ValueType::Int);
        assert_eq!(holder.keyframes[0].value, Some(AnimatedValue::Int(0xFFFF_0000u32 as i32)));
        assert_eq!(holder.keyframes[1].value, Some(AnimatedValue::Int(0)));

        let desc = parse(r#"<objectAnimator android:propertyName="scaleX" android:valueType="1" android:valueFrom="2" android:valueTo="4"/>"#).unwrap();
        let holder = &leaf(&desc).property_values[0];
        assert_eq!(holder.value_type, ValueType::Int);
        assert_eq!(holder.keyframes[0].value, Some(AnimatedValue::Int(2)));
    }

    #[test]
    fn test_incompatible_morph_fails() {
        let err = parse(
            r#"<objectAnimator android:propertyName="pathData" android:valueType="2"
                android:valueFrom="M0,0 L10,10" android:valueTo="M0,0 C1,1 2,2 3,3"/>"#,
        )
        .unwrap_err();
        assert!(matches!(err, VectorError::IncompatiblePathMorph { .. }));
    }

    #[test]
    fn test_set_ordering_and_children() {
        let desc = parse(
            r#"<set android:ordering="sequentially">
                <objectAnimator android:propertyName="translateX" android:valueTo="10" android:duration="100"/>
                <set>
                    <objectAnimator android:propertyName="translateY" android:valueTo="10" android:duration="200"/>
                    <animator android:duration="50"/>
                </set>
            </set>"#,
        )
        .unwrap();
        let AnimatorDescription::Set(set) = &desc else {
            panic!("expected a set");
        };
        assert_eq!(set.ordering, Ordering::Sequentially);
        assert_eq!(set.children.len(), 2);
        assert_eq!(desc.total_duration(), Some(300));
    }

    #[test]
    fn test_keyframes_are_normalized() {
        let desc = parse(
            r#"<objectAnimator android:duration="100">
                <propertyValuesHolder android:propertyName="alpha">
                    <keyframe android:fraction="0.5" android:value="1"/>
                    <keyframe android:value="2"/>
                    <keyframe android:value="3" android:interpolator="@android:interpolator/linear"/>
                    <keyframe android:fraction="1" android:value="4"/>
                </propertyValuesHolder>
            </objectAnimator>"#,
        )
        .unwrap();
        let holder = &leaf(&desc).property_values[0];
        let fractions: Vec<f32> = holder.keyframes.iter().map(|k| k.fraction).collect();
        assert_eq!(fractions.len(), 5);
        assert!((fractions[2] - 2.0 / 3.0).abs() < 1e-6);
        assert!((fractions[3] - 5.0 / 6.0).abs() < 1e-6);
        assert_eq!(holder.keyframes[3].interpolator, Some(Interpolator::Linear));
    }

    #[test]
    fn test_motion_path_samples_both_axes() {
        let desc = parse(
            r#"<objectAnimator android:propertyXName="translateX" android:propertyYName="translateY"
                android:pathData="M0,0 L10,0"/>"#,
        )
        .unwrap();
        let v = leaf(&desc);
        assert_eq!(v.property_values.len(), 2);
        let xs = &v.property_values[0];
        assert_eq!(xs.property, "translateX");
        // 10 units at 0.5 spacing needs 21 samples.
        assert_eq!(xs.keyframes.len(), 21);
        assert_eq!(xs.keyframes.last().unwrap().value, Some(AnimatedValue::Float(10.0)));
        assert_eq!(v.property_values[1].keyframes[7].value, Some(AnimatedValue::Float(0.0)));
    }

    fn samples(holder: &PropertyValues) -> Vec<f32> {
        holder
            .keyframes
            .iter()
            .map(|k| k.value.as_ref().and_then(AnimatedValue::as_f32).unwrap_or(f32::NAN))
            .collect()
    }

    #[test]
    fn test_long_motion_path_is_capped() {
        let desc = parse(
            r#"<objectAnimator android:propertyXName="translateX" android:propertyYName="translateY"
                android:pathData="M0,0 L1000,0"/>"#,
        )
        .unwrap();
        let xs = samples(&leaf(&desc).property_values[0]);
        assert_eq!(xs.len(), MAX_MOTION_POINTS);
        assert_eq!(xs[0], 0.0);
        assert!((xs[99] - 1000.0).abs() < 1e-3, "{}", xs[99]);
        assert!((xs[1] - 1000.0 / 99.0).abs() < 1e-3);
    }

    #[test]
    fn test_motion_path_walks_contours_in_order() {
        let desc = parse(
            r#"<objectAnimator android:propertyXName="translateX" android:propertyYName="translateY"
                android:pathData="M0,0 L10,0 M0,10 L10,10"/>"#,
        )
        .unwrap();
        let v = leaf(&desc);
        let (xs, ys) = (samples(&v.property_values[0]), samples(&v.property_values[1]));
        // 20 units at 0.5 spacing; sample 20 sits on the end of the first line.
        assert_eq!(xs.len(), 41);
        assert!((xs[20] - 10.0).abs() < 1e-3 && ys[20].abs() < 1e-3);
        assert!((xs[21] - 0.5).abs() < 1e-3 && (ys[21] - 10.0).abs() < 1e-3);
        assert!((xs[40] - 10.0).abs() < 1e-3 && (ys[40] - 10.0).abs() < 1e-3);
    }

    #[test]
    fn test_motion_path_needs_a_name() {
        let err = parse(r#"<objectAnimator android:propertyXName="" android:pathData="M0,0 L10,0"/>"#).unwrap_err();
        assert!(matches!(err, VectorError::InvalidAttribute { .. }));
    }

    #[test]
    fn test_missing_values_leave_undefined_holder() {
        let desc = parse(r#"<objectAnimator android:propertyName="rotation"/>"#).unwrap();
        assert_eq!(leaf(&desc).property_values[0].value_type, ValueType::Undefined);
    }

    #[test]
    fn test_color_resource_values() {
        let resources =
            MemoryResources::new(DisplayMetrics::default()).with_color("accent", "#00FF00");
        let desc = parse_with(
            r#"<objectAnimator android:propertyName="strokeColor" android:valueTo="@color/accent"/>"#,
            &resources,
        )
        .unwrap();
        let holder = &leaf(&desc).property_values[0];
        assert_eq!(holder.keyframes[0].value, None);
        assert_eq!(holder.keyframes[1].value, Some(AnimatedValue::Color(Color::GREEN)));
    }

    #[test]
    fn test_unknown_root_is_malformed() {
        assert!(matches!(parse("<bogus/>"), Err(VectorError::MalformedMarkup(_))));
    }
}
