use crate::error::{Result, VectorError};
use tracing::{debug, instrument, warn};
use vector_data::{MarkupEvent, MarkupReader};

/// A `target` entry: which node to animate, and with which animator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetReference {
    pub name: String,
    pub animation: String,
}

/// The references an `animated-vector` document is made of. Resolving them
/// is left to the loader, since animator sampling depends on the drawable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnimatedVectorDocument {
    pub drawable: String,
    pub targets: Vec<TargetReference>,
}

#[instrument(level = "debug", skip_all)]
pub fn parse_animated_vector(reader: &mut dyn MarkupReader) -> Result<AnimatedVectorDocument> {
    let mut drawable = None;
    let mut targets = Vec::new();
    loop {
        match reader.next_event()? {
            MarkupEvent::StartTag(tag) => match tag.name.as_str() {
                "animated-vector" => drawable = tag.attributes.get("drawable").map(str::to_string),
                "target" => {
                    let attrs = &tag.attributes;
                    match (attrs.get("name"), attrs.get("animation")) {
                        (Some(name), Some(animation)) => targets.push(TargetReference {
                            name: name.to_string(),
                            animation: animation.to_string(),
                        }),
                        _ => warn!("Skipping target without name or animation"),
                    }
                }
                other => warn!(tag = other, "Skipping unknown animated-vector element"),
            },
            MarkupEvent::EndTag { .. } => {}
            MarkupEvent::EndDocument => break,
        }
    }
    let drawable = drawable.ok_or(VectorError::MissingDrawable)?;
    debug!(drawable = drawable.as_str(), targets = targets.len(), "Parsed animated-vector");
    Ok(AnimatedVectorDocument { drawable, targets })
}

#[cfg(test)]
mod tests {
    use super::*;
    use vector_data::XmlMarkupReader;

    #[test]
    fn test_targets_in_order() {
        let text = r#"<animated-vector xmlns:android="http://schemas.android.com/apk/res/android"
                android:drawable="@drawable/icon">
            <target android:name="spinner" android:animation="@animator/spin"/>
            <target android:name="tick" android:animation="@animator/draw"/>
            <target android:name="orphan"/>
        </animated-vector>"#;
        let doc = parse_animated_vector(&mut XmlMarkupReader::new(text)).unwrap();
        assert_eq!(doc.drawable, "@drawable/icon");
        assert_eq!(
            doc.targets,
            vec![
                TargetReference {
                    name: "spinner".into(),
                    animation: "@animator/spin".into()
                },
                TargetReference {
                    name: "tick".into(),
                    animation: "@animator/draw".into()
                },
            ]
        );
    }

    #[test]
    fn test_missing_drawable() {
        let text = r#"<animated-vector><target android:name="a" android:animation="@animator/b"/></animated-vector>"#;
        assert!(matches!(
            parse_animated_vector(&mut XmlMarkupReader::new(text)),
            Err(VectorError::MissingDrawable)
        ));
    }
}
