use crate::error::MarkupError;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::VecDeque;
use tracing::warn;

/// One attribute of a start tag. The namespace prefix is kept but lookups
/// go through the local name, so `android:pathData` answers to `pathData`.
#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    pub prefix: Option<String>,
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Attributes(Vec<Attribute>);

impl Attributes {
    pub fn new(attributes: Vec<Attribute>) -> Self {
        Self(attributes)
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.value.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Attribute> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Reads a float attribute. A value that does not parse is reported and
    /// treated as absent.
    pub fn float(&self, name: &str) -> Option<f32> {
        let raw = self.get(name)?;
        match raw.trim().parse::<f32>() {
            Ok(v) => Some(v),
            Err(_) => {
                warn!(attribute = name, value = raw, "Ignoring non-numeric attribute");
                None
            }
        }
    }

    pub fn float_or(&self, name: &str, default: f32) -> f32 {
        self.float(name).unwrap_or(default)
    }

    pub fn int(&self, name: &str) -> Option<i32> {
        let raw = self.get(name)?;
        let trimmed = raw.trim();
        let parsed = match trimmed.strip_prefix("0x") {
            Some(hex) => i64::from_str_radix(hex, 16).ok().map(|v| v as i32),
            None => trimmed.parse::<i32>().ok(),
        };
        if parsed.is_none() {
            warn!(attribute = name, value = raw, "Ignoring non-integer attribute");
        }
        parsed
    }

    pub fn int_or(&self, name: &str, default: i32) -> i32 {
        self.int(name).unwrap_or(default)
    }

    /// Reads an attribute that may be written either as a number or as one of
    /// the named constants in `names`, which map to their index.
    pub fn enum_index(&self, name: &str, names: &[&str]) -> Option<i32> {
        let raw = self.get(name)?.trim();
        if let Some(idx) = names.iter().position(|n| n.eq_ignore_ascii_case(raw)) {
            return Some(idx as i32);
        }
        self.int(name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Tag {
    pub name: String,
    pub attributes: Attributes,
    /// Nesting depth, 1 for the document element.
    pub depth: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MarkupEvent {
    StartTag(Tag),
    EndTag { name: String, depth: usize },
    EndDocument,
}

/// Pull-style access to a markup document.
///
/// Implementations hand out events in document order and keep answering
/// `EndDocument` once the document is exhausted. Any handle held on the
/// underlying resource is released when the reader is dropped.
pub trait MarkupReader {
    fn next_event(&mut self) -> Result<MarkupEvent, MarkupError>;
}

impl<R: MarkupReader + ?Sized> MarkupReader for Box<R> {
    fn next_event(&mut self) -> Result<MarkupEvent, MarkupError> {
        (**self).next_event()
    }
}

/// XML backed [`MarkupReader`].
///
/// The text is tokenized up front. Events that precede a syntax error are
/// still delivered, and the error surfaces at the point where it occurred.
pub struct XmlMarkupReader {
    events: VecDeque<Result<MarkupEvent, MarkupError>>,
}

impl XmlMarkupReader {
    pub fn new(text: &str) -> Self {
        Self {
            events: tokenize(text),
        }
    }
}

impl MarkupReader for XmlMarkupReader {
    fn next_event(&mut self) -> Result<MarkupEvent, MarkupError> {
        self.events.pop_front().unwrap_or(Ok(MarkupEvent::EndDocument))
    }
}

fn malformed(reader: &Reader<&[u8]>, message: impl ToString) -> MarkupError {
    MarkupError::Malformed {
        position: format!("byte {}", reader.buffer_position()),
        message: message.to_string(),
    }
}

fn start_tag(reader: &Reader<&[u8]>, start: &BytesStart, depth: usize) -> Result<Tag, MarkupError> {
    let mut attributes = Vec::new();
    for attr in start.attributes() {
        let attr = attr.map_err(|e| malformed(reader, e))?;
        let prefix = attr.key.prefix().map(|p| String::from_utf8_lossy(p.as_ref()).into_owned());
        let name = String::from_utf8_lossy(attr.key.local_name().as_ref()).into_owned();
        // Namespace declarations are not attributes of the element.
        if prefix.as_deref() == Some("xmlns") || (prefix.is_none() && name == "xmlns") {
            continue;
        }
        let value = attr.unescape_value().map_err(|e| malformed(reader, e))?.into_owned();
        attributes.push(Attribute { prefix, name, value });
    }
    Ok(Tag {
        name: String::from_utf8_lossy(start.local_name().as_ref()).into_owned(),
        attributes: Attributes::new(attributes),
        depth,
    })
}

fn tokenize(text: &str) -> VecDeque<Result<MarkupEvent, MarkupError>> {
    let mut events = VecDeque::new();
    let mut open: Vec<String> = Vec::new();
    let mut reader = Reader::from_str(text);

    loop {
        let event = match reader.read_event() {
            Ok(event) => event,
            Err(e) => {
                events.push_back(Err(malformed(&reader, e)));
                return events;
            }
        };
        match event {
            Event::Start(ref start) | Event::Empty(ref start) => {
                let empty = matches!(event, Event::Empty(_));
                let depth = open.len() + 1;
                let tag = match start_tag(&reader, start, depth) {
                    Ok(tag) => tag,
                    Err(e) => {
                        events.push_back(Err(e));
                        return events;
                    }
                };
                let name = tag.name.clone();
                events.push_back(Ok(MarkupEvent::StartTag(tag)));
                if empty {
                    events.push_back(Ok(MarkupEvent::EndTag { name, depth }));
                } else {
                    open.push(name);
                }
            }
            Event::End(end) => {
                let local = String::from_utf8_lossy(end.local_name().as_ref()).into_owned();
                let depth = open.len();
                match open.pop() {
                    Some(name) if name == local => {
                        events.push_back(Ok(MarkupEvent::EndTag { name, depth }));
                    }
                    other => {
                        let message = format!(
                            "closing tag '{}' does not match '{}'",
                            local,
                            other.unwrap_or_default()
                        );
                        events.push_back(Err(malformed(&reader, message)));
                        return events;
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !open.is_empty() {
        events.push_back(Err(MarkupError::UnexpectedEnd));
        return events;
    }
    events.push_back(Ok(MarkupEvent::EndDocument));
    events
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect(reader: &mut dyn MarkupReader) -> Vec<Result<MarkupEvent, MarkupError>> {
        let mut out = Vec::new();
        loop {
            let ev = reader.next_event();
            let done = matches!(ev, Ok(MarkupEvent::EndDocument) | Err(_));
            out.push(ev);
            if done {
                break;
            }
        }
        out
    }

    #[test]
    fn test_events_in_document_order() {
        let mut reader = XmlMarkupReader::new(
            r#"<vector xmlns:android="http://schemas.android.com/apk/res/android" android:width="24dp">
                 <group android:name="g"><path android:pathData="M0,0 L1,1"/></group>
               </vector>"#,
        );
        let events = collect(&mut reader);
        let names: Vec<String> = events
            .iter()
            .map(|e| match e {
                Ok(MarkupEvent::StartTag(t)) => format!("+{}@{}", t.name, t.depth),
                Ok(MarkupEvent::EndTag { name, depth }) => format!("-{}@{}", name, depth),
                Ok(MarkupEvent::EndDocument) => "end".to_string(),
                Err(_) => "err".to_string(),
            })
            .collect();
        assert_eq!(
            names,
            vec!["+vector@1", "+group@2", "+path@3", "-path@3", "-group@2", "-vector@1", "end"]
        );
    }

    #[test]
    fn test_attributes_resolve_by_local_name() {
        let mut reader =
            XmlMarkupReader::new(r##"<path android:fillColor="#FF0000" strokeWidth="2.5" a="x &amp; y"/>"##);
        match reader.next_event().unwrap() {
            MarkupEvent::StartTag(tag) => {
                assert_eq!(tag.attributes.len(), 3);
                assert_eq!(tag.attributes.get("fillColor"), Some("#FF0000"));
                assert_eq!(tag.attributes.float("strokeWidth"), Some(2.5));
                assert_eq!(tag.attributes.get("a"), Some("x & y"));
                assert_eq!(tag.attributes.get("missing"), None);
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[test]
    fn test_malformed_document_delivers_prefix_then_error() {
        let mut reader = XmlMarkupReader::new("<vector><group></vector>");
        let events = collect(&mut reader);
        assert!(matches!(events[0], Ok(MarkupEvent::StartTag(ref t)) if t.name == "vector"));
        assert!(matches!(events[1], Ok(MarkupEvent::StartTag(ref t)) if t.name == "group"));
        assert!(events.last().unwrap().is_err());
        // The reader stays exhausted after the failure.
        assert!(matches!(reader.next_event(), Ok(MarkupEvent::EndDocument)));
    }

    #[test]
    fn test_enum_index_accepts_names_and_numbers() {
        let attrs = Attributes::new(vec![
            Attribute { prefix: None, name: "ordering".into(), value: "sequentially".into() },
            Attribute { prefix: None, name: "fillType".into(), value: "1".into() },
        ]);
        assert_eq!(attrs.enum_index("ordering", &["together", "sequentially"]), Some(1));
        assert_eq!(attrs.enum_index("fillType", &["nonZero", "evenOdd"]), Some(1));
        assert_eq!(attrs.int("nope"), None);
    }
}
