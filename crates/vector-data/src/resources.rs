use crate::color::Color;
use crate::error::MarkupError;
use crate::markup::{MarkupReader, XmlMarkupReader};
use crate::metrics::DisplayMetrics;
use quick_xml::events::Event;
use quick_xml::Reader;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, instrument, warn};

/// A parsed `@[package:]type/name` reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceRef {
    pub package: Option<String>,
    pub kind: String,
    pub name: String,
}

impl FromStr for ResourceRef {
    type Err = MarkupError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || MarkupError::InvalidReference(s.to_string());
        let body = s.trim().strip_prefix('@').ok_or_else(invalid)?;
        let (package, rest) = match body.split_once(':') {
            Some((pkg, rest)) => (Some(pkg.to_string()), rest),
            None => (None, body),
        };
        let (kind, name) = rest.split_once('/').ok_or_else(invalid)?;
        if kind.is_empty() || name.is_empty() {
            return Err(invalid());
        }
        Ok(ResourceRef {
            package,
            kind: kind.to_string(),
            name: name.to_string(),
        })
    }
}

impl ResourceRef {
    pub fn is_reference(value: &str) -> bool {
        value.trim_start().starts_with('@')
    }
}

/// Supplies markup documents, named colors and density for a load.
pub trait Resources: Send + Sync {
    /// Opens the document a reference such as `@drawable/icon` points to.
    fn open(&self, reference: &str) -> Result<Box<dyn MarkupReader>, MarkupError>;

    /// Looks up a color resource such as `@color/accent`.
    fn color(&self, reference: &str) -> Option<Color>;

    fn metrics(&self) -> DisplayMetrics;

    /// Reads a color attribute that is either a literal or a reference.
    fn resolve_color(&self, value: &str) -> Option<Color> {
        if Color::is_literal(value) {
            Some(Color::parse_literal(value))
        } else if ResourceRef::is_reference(value) {
            self.color(value)
        } else {
            None
        }
    }
}

fn system_color(name: &str) -> Option<Color> {
    match name {
        "black" => Some(Color::BLACK),
        "white" => Some(Color::WHITE),
        "transparent" => Some(Color::TRANSPARENT),
        _ => None,
    }
}

/// Resources laid out on disk as `<root>/<type>/<name>.xml`, with colors
/// read from `<root>/values/colors.xml`.
pub struct ResourceDirectory {
    root: PathBuf,
    metrics: DisplayMetrics,
    colors: HashMap<String, String>,
}

impl ResourceDirectory {
    pub fn new(root: impl Into<PathBuf>, metrics: DisplayMetrics) -> Result<Self, MarkupError> {
        let root = root.into();
        let colors_path = root.join("values").join("colors.xml");
        let colors = if colors_path.exists() {
            load_color_table(&std::fs::read_to_string(&colors_path)?)?
        } else {
            HashMap::new()
        };
        debug!(root = ?root, colors = colors.len(), "Opened resource directory");
        Ok(Self {
            root,
            metrics,
            colors,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, reference: &ResourceRef) -> PathBuf {
        self.root
            .join(&reference.kind)
            .join(format!("{}.xml", reference.name))
    }
}

impl Resources for ResourceDirectory {
    #[instrument(level = "debug", skip(self), fields(reference = reference))]
    fn open(&self, reference: &str) -> Result<Box<dyn MarkupReader>, MarkupError> {
        let parsed: ResourceRef = reference.parse()?;
        let path = self.path_for(&parsed);
        if !path.exists() {
            return Err(MarkupError::ResourceNotFound(reference.to_string()));
        }
        let text = std::fs::read_to_string(&path)?;
        Ok(Box::new(XmlMarkupReader::new(&text)))
    }

    fn color(&self, reference: &str) -> Option<Color> {
        resolve_named_color(&self.colors, reference)
    }

    fn metrics(&self) -> DisplayMetrics {
        self.metrics
    }
}

/// In-memory resources keyed by reference string.
#[derive(Default)]
pub struct MemoryResources {
    documents: HashMap<String, String>,
    colors: HashMap<String, String>,
    metrics: DisplayMetrics,
}

impl MemoryResources {
    pub fn new(metrics: DisplayMetrics) -> Self {
        Self {
            metrics,
            ..Default::default()
        }
    }

    pub fn with_document(mut self, reference: &str, text: &str) -> Self {
        self.documents.insert(reference.to_string(), text.to_string());
        self
    }

    pub fn with_color(mut self, name: &str, value: &str) -> Self {
        self.colors.insert(name.to_string(), value.to_string());
        self
    }

    pub fn insert_document(&mut self, reference: &str, text: &str) {
        self.documents.insert(reference.to_string(), text.to_string());
    }
}

impl Resources for MemoryResources {
    fn open(&self, reference: &str) -> Result<Box<dyn MarkupReader>, MarkupError> {
        let text = self
            .documents
            .get(reference)
            .ok_or_else(|| MarkupError::ResourceNotFound(reference.to_string()))?;
        Ok(Box::new(XmlMarkupReader::new(text)))
    }

    fn color(&self, reference: &str) -> Option<Color> {
        resolve_named_color(&self.colors, reference)
    }

    fn metrics(&self) -> DisplayMetrics {
        self.metrics
    }
}

fn resolve_named_color(table: &HashMap<String, String>, reference: &str) -> Option<Color> {
    let mut current = reference.to_string();
    // Aliases may chain; a short bound keeps cycles from looping.
    for _ in 0..8 {
        let parsed: ResourceRef = match current.parse() {
            Ok(r) => r,
            Err(_) => return None,
        };
        if parsed.kind != "color" {
            warn!(reference = reference, "Not a color reference");
            return None;
        }
        if parsed.package.as_deref() == Some("android") {
            return system_color(&parsed.name);
        }
        let value = table.get(&parsed.name)?;
        if Color::is_literal(value) {
            return Some(Color::parse_literal(value));
        }
        current = value.trim().to_string();
    }
    warn!(reference = reference, "Color reference chain too deep");
    None
}

/// Reads `<color name="...">value</color>` entries.
fn load_color_table(text: &str) -> Result<HashMap<String, String>, MarkupError> {
    let mut table = HashMap::new();
    let mut reader = Reader::from_str(text);
    let mut current: Option<String> = None;

    loop {
        let event = reader.read_event().map_err(|e| MarkupError::Malformed {
            position: format!("byte {}", reader.buffer_position()),
            message: e.to_string(),
        })?;
        match event {
            Event::Start(e) if e.local_name().as_ref() == b"color" => {
                current = e
                    .attributes()
                    .flatten()
                    .find(|a| a.key.local_name().as_ref() == b"name")
                    .map(|a| String::from_utf8_lossy(&a.value).into_owned());
            }
            Event::Text(t) => {
                if let Some(name) = current.take() {
                    let value = t.unescape().map_err(|e| MarkupError::Malformed {
                        position: format!("byte {}", reader.buffer_position()),
                        message: e.to_string(),
                    })?;
                    table.insert(name, value.trim().to_string());
                }
            }
            Event::End(_) | Event::Empty(_) => current = None,
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_parsing() {
        let r: ResourceRef = "@drawable/icon".parse().unwrap();
        assert_eq!(r.kind, "drawable");
        assert_eq!(r.name, "icon");
        assert_eq!(r.package, None);
        let r: ResourceRef = "@android:interpolator/linear".parse().unwrap();
        assert_eq!(r.package.as_deref(), Some("android"));
        assert!("drawable/icon".parse::<ResourceRef>().is_err());
        assert!("@drawable".parse::<ResourceRef>().is_err());
    }

    #[test]
    fn test_color_table_and_aliases() {
        let table = load_color_table(
            r##"<resources>
                 <color name="accent">#FF0000</color>
                 <color name="brand">@color/accent</color>
               </resources>"##,
        )
        .unwrap();
        assert_eq!(resolve_named_color(&table, "@color/accent"), Some(Color::RED));
        assert_eq!(resolve_named_color(&table, "@color/brand"), Some(Color::RED));
        assert_eq!(resolve_named_color(&table, "@android:color/white"), Some(Color::WHITE));
        assert_eq!(resolve_named_color(&table, "@color/missing"), None);
    }

    #[test]
    fn test_memory_resources() {
        let res = MemoryResources::new(DisplayMetrics::default())
            .with_document("@drawable/a", "<vector/>")
            .with_color("accent", "#00FF00");
        assert!(res.open("@drawable/a").is_ok());
        assert!(matches!(res.open("@drawable/b"), Err(MarkupError::ResourceNotFound(_))));
        assert_eq!(res.resolve_color("@color/accent"), Some(Color::GREEN));
        assert_eq!(res.resolve_color("#F00"), Some(Color::RED));
        assert_eq!(res.resolve_color("12"), None);
    }
}
