//! XML element tree for the project descriptor, with dotted-path lookup.
//!
//! Parsing is done with `quick-xml` events folded into an owned tree.
//! Comments, processing instructions, the XML declaration and the doctype
//! are dropped on the way in, so nothing downstream ever sees them.

use std::path::{Path, PathBuf};

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::errors::{PomfixError, PomfixResult};

/// A piece of an element's content, in document order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Content {
    /// Raw character data between two markup items.
    Text(String),
    /// Index into [`XmlElement::children`].
    Child(usize),
}

/// One element of a parsed document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlElement {
    /// Local tag name, used for lookups.
    pub tag: String,
    /// Qualified name as written (`x:item`), used when serializing.
    pub name: String,
    /// Attributes in declaration order, values unescaped.
    pub attributes: Vec<(String, String)>,
    /// Character data directly inside this element, concatenated and trimmed.
    pub text: String,
    pub children: Vec<XmlElement>,
    /// Text and child elements interleaved as they appeared.
    pub content: Vec<Content>,
}

impl XmlElement {
    fn from_start(start: &BytesStart<'_>, origin: &Path) -> PomfixResult<Self> {
        let tag = String::from_utf8_lossy(start.local_name().as_ref()).to_string();
        let name = String::from_utf8_lossy(start.name().as_ref()).to_string();
        let mut attributes = Vec::new();
        for attr in start.attributes() {
            let attr = attr.map_err(|e| PomfixError::parse(origin, format!("<{tag}>: {e}")))?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).to_string();
            let value = attr
                .unescape_value()
                .map_err(|e| PomfixError::parse(origin, format!("<{tag} {key}>: {e}")))?
                .to_string();
            attributes.push((key, value));
        }
        Ok(XmlElement {
            tag,
            name,
            attributes,
            text: String::new(),
            children: Vec::new(),
            content: Vec::new(),
        })
    }

    /// First direct child with the given tag.
    pub fn child(&self, tag: &str) -> Option<&XmlElement> {
        self.children.iter().find(|c| c.tag == tag)
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Whether any non-blank text sits next to child elements.
    pub fn is_mixed(&self) -> bool {
        !self.children.is_empty() && !self.text.is_empty()
    }

    fn push_text(&mut self, raw: &str) {
        if raw.is_empty() {
            return;
        }
        self.text.push_str(raw);
        match self.content.last_mut() {
            Some(Content::Text(last)) => last.push_str(raw),
            _ => self.content.push(Content::Text(raw.to_string())),
        }
    }

    fn push_child(&mut self, child: XmlElement) {
        self.content.push(Content::Child(self.children.len()));
        self.children.push(child);
    }

    fn finish(&mut self) {
        let trimmed = self.text.trim();
        if trimmed.len() != self.text.len() {
            self.text = trimmed.to_string();
        }
    }

    fn collect<'a>(&'a self, tag: &str, out: &mut Vec<&'a XmlElement>) {
        if self.tag == tag {
            out.push(self);
        }
        for child in &self.children {
            child.collect(tag, out);
        }
    }
}

/// Parse a complete XML document and return its root element.
///
/// `origin` is only used to label errors.
pub fn parse_document(text: &str, origin: &Path) -> PomfixResult<XmlElement> {
    let mut reader = Reader::from_str(text);
    let mut stack: Vec<XmlElement> = Vec::new();
    let mut root: Option<XmlElement> = None;

    loop {
        let event = reader.read_event().map_err(|e| {
            PomfixError::parse(
                origin,
                format!("at byte {}: {e}", reader.buffer_position()),
            )
        })?;
        match event {
            Event::Start(start) => {
                if root.is_some() && stack.is_empty() {
                    return Err(PomfixError::parse(origin, "more than one root element"));
                }
                stack.push(XmlElement::from_start(&start, origin)?);
            }
            Event::Empty(start) => {
                let element = XmlElement::from_start(&start, origin)?;
                attach(&mut stack, &mut root, element, origin)?;
            }
            Event::End(_) => {
                // quick-xml already rejects mismatched end names.
                let element = stack.pop().ok_or_else(|| {
                    PomfixError::parse(origin, "closing tag without a matching opening tag")
                })?;
                attach(&mut stack, &mut root, element, origin)?;
            }
            Event::Text(t) => {
                let unescaped = t
                    .unescape()
                    .map_err(|e| PomfixError::parse(origin, e.to_string()))?;
                match stack.last_mut() {
                    Some(current) => current.push_text(&unescaped),
                    None if unescaped.trim().is_empty() => {}
                    None => {
                        return Err(PomfixError::parse(
                            origin,
                            "character data outside the root element",
                        ))
                    }
                }
            }
            Event::CData(c) => {
                if let Some(current) = stack.last_mut() {
                    current.push_text(&String::from_utf8_lossy(&c));
                }
            }
            Event::Eof => break,
            // Declaration, comments, doctype, processing instructions.
            _ => {}
        }
    }

    if let Some(open) = stack.last() {
        return Err(PomfixError::parse(
            origin,
            format!("unexpected end of document inside <{}>", open.tag),
        ));
    }
    root.ok_or_else(|| PomfixError::parse(origin, "document has no root element"))
}

fn attach(
    stack: &mut [XmlElement],
    root: &mut Option<XmlElement>,
    mut element: XmlElement,
    origin: &Path,
) -> PomfixResult<()> {
    element.finish();
    match stack.last_mut() {
        Some(parent) => parent.push_child(element),
        None if root.is_none() => *root = Some(element),
        None => return Err(PomfixError::parse(origin, "more than one root element")),
    }
    Ok(())
}

/// A parsed project descriptor (POM).
#[derive(Debug, Clone)]
pub struct ProjectDescriptor {
    path: PathBuf,
    root: XmlElement,
}

impl ProjectDescriptor {
    /// Read and parse the descriptor at `path`.
    pub fn parse(path: &Path) -> PomfixResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| PomfixError::from_io(path, e))?;
        Self::parse_str(&text, path)
    }

    pub fn parse_str(text: &str, origin: &Path) -> PomfixResult<Self> {
        let root = parse_document(text, origin)?;
        tracing::debug!(path = %origin.display(), root = %root.tag, "parsed project descriptor");
        Ok(Self {
            path: origin.to_path_buf(),
            root,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn root(&self) -> &XmlElement {
        &self.root
    }

    /// Look up an element by dotted path, e.g. `project.developers.developer.name`.
    pub fn get(&self, dotted: &str) -> Option<&XmlElement> {
        let segments: Vec<&str> = dotted.split('.').collect();
        self.get_path(&segments)
    }

    /// Look up an element by explicit path segments. The first segment names
    /// the root element; each following one selects the first direct child
    /// with that tag. Segments may themselves contain dots.
    pub fn get_path(&self, segments: &[&str]) -> Option<&XmlElement> {
        let (first, rest) = segments.split_first()?;
        if *first != self.root.tag {
            return None;
        }
        let mut current = &self.root;
        for segment in rest {
            current = current.child(segment)?;
        }
        Some(current)
    }

    pub fn text(&self, dotted: &str) -> Option<String> {
        self.get(dotted).map(|e| e.text.clone())
    }

    /// Every element with this tag anywhere in the tree, in document order.
    pub fn find_all(&self, tag: &str) -> Vec<&XmlElement> {
        let mut out = Vec::new();
        self.root.collect(tag, &mut out);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const POM: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<!-- top comment -->
<project xmlns="http://maven.apache.org/POM/4.0.0">
    <modelVersion>4.0.0</modelVersion>
    <groupId>com.mitsuki</groupId>
    <artifactId>jmatrix</artifactId>
    <version>1.2.0</version>
    <name>JMatrix</name>
    <developers>
        <developer>
            <id>mitsuki31</id>
            <name>Ryuu Mitsuki</name>
        </developer>
        <developer>
            <name>Second Dev</name>
        </developer>
    </developers>
    <properties>
        <!-- custom keys -->
        <package.mainClass>com.mitsuki.jmatrix.Main</package.mainClass>
    </properties>
</project>
"#;

    fn descriptor() -> ProjectDescriptor {
        ProjectDescriptor::parse_str(POM, Path::new("pom.xml")).unwrap()
    }

    #[test]
    fn test_get_dotted_path() {
        let d = descriptor();
        assert_eq!(d.text("project.version").as_deref(), Some("1.2.0"));
        assert_eq!(d.text("project.name").as_deref(), Some("JMatrix"));
    }

    #[test]
    fn test_get_first_sibling_wins() {
        let d = descriptor();
        assert_eq!(
            d.text("project.developers.developer.name").as_deref(),
            Some("Ryuu Mitsuki")
        );
    }

    #[test]
    fn test_get_missing_segment_is_none() {
        let d = descriptor();
        assert!(d.get("project.licenses.license.name").is_none());
        assert!(d.get("pom.version").is_none());
    }

    #[test]
    fn test_get_path_segment_with_dots() {
        let d = descriptor();
        let main = d.get_path(&["project", "properties", "package.mainClass"]);
        assert_eq!(main.map(|e| e.text.as_str()), Some("com.mitsuki.jmatrix.Main"));
    }

    #[test]
    fn test_comments_are_stripped() {
        let d = descriptor();
        let props = d.get("project.properties").unwrap();
        assert_eq!(props.children.len(), 1);
        assert!(props.text.is_empty());
    }

    #[test]
    fn test_find_all_document_order() {
        let d = descriptor();
        let names: Vec<&str> = d.find_all("name").iter().map(|e| e.text.as_str()).collect();
        assert_eq!(names, vec!["JMatrix", "Ryuu Mitsuki", "Second Dev"]);
    }

    #[test]
    fn test_attributes_and_entities() {
        let root = parse_document(
            r#"<config><version type="beta">1.0 &amp; up</version><flag/></config>"#,
            Path::new("config.xml"),
        )
        .unwrap();
        let version = root.child("version").unwrap();
        assert_eq!(version.attribute("type"), Some("beta"));
        assert_eq!(version.text, "1.0 & up");
        assert!(root.child("flag").unwrap().is_leaf());
    }

    #[test]
    fn test_qualified_name_kept_lookup_by_local_name() {
        let root = parse_document(
            r#"<c xmlns:x="urn:x"><x:item>1</x:item></c>"#,
            Path::new("config.xml"),
        )
        .unwrap();
        let item = root.child("item").unwrap();
        assert_eq!(item.tag, "item");
        assert_eq!(item.name, "x:item");
    }

    #[test]
    fn test_text_split_by_comment_is_joined() {
        let root = parse_document("<v>foo<!--c-->bar</v>", Path::new("pom.xml")).unwrap();
        assert_eq!(root.text, "foobar");
    }

    #[test]
    fn test_mixed_content_order() {
        let root = parse_document("<c>hello <b>bold</b> world</c>", Path::new("config.xml")).unwrap();
        assert!(root.is_mixed());
        assert_eq!(
            root.content,
            vec![
                Content::Text("hello ".to_string()),
                Content::Child(0),
                Content::Text(" world".to_string()),
            ]
        );
    }

    #[test]
    fn test_malformed_is_parse_error() {
        let err = parse_document("<project><name>x</project>", Path::new("pom.xml")).unwrap_err();
        assert!(matches!(err, PomfixError::Parse { .. }));
    }

    #[test]
    fn test_unclosed_root_is_parse_error() {
        let err = parse_document("<project><name>x</name>", Path::new("pom.xml")).unwrap_err();
        assert!(matches!(err, PomfixError::Parse { .. }));
    }

    #[test]
    fn test_two_roots_is_parse_error() {
        let err = parse_document("<a/><b/>", Path::new("pom.xml")).unwrap_err();
        assert!(matches!(err, PomfixError::Parse { .. }));
    }

    #[test]
    fn test_empty_document_is_parse_error() {
        let err = parse_document("  \n", Path::new("pom.xml")).unwrap_err();
        assert!(matches!(err, PomfixError::Parse { .. }));
    }

    #[test]
    fn test_parse_missing_file_is_not_found() {
        let dir = tempfile::TempDir::new().unwrap();
        let err = ProjectDescriptor::parse(&dir.path().join("pom.xml")).unwrap_err();
        assert!(matches!(err, PomfixError::NotFound { .. }));
    }
}
