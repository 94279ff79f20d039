//! XML configuration targets: substitute, re-parse, pretty-print.
//!
//! The output style is fixed: 4-space indentation, leaf elements kept on a
//! single line (`<tag>value</tag>`), no `<?xml ...?>` declaration, no
//! comments or doctype.

use std::path::Path;

use quick_xml::escape::{escape, partial_escape};

use crate::descriptor::reader::{parse_document, Content, XmlElement};
use crate::errors::PomfixResult;
use crate::models::ProjectNamespace;
use crate::rewrite::placeholder::{rewrite, Resolution};

const INDENT: &str = "    ";

/// Resolve every placeholder in an XML template and return the normalized
/// document body. Any unresolved key is fatal.
pub fn render_xml_target(
    template: &str,
    namespace: &ProjectNamespace,
    origin: &Path,
) -> PomfixResult<String> {
    let label = origin.display().to_string();
    let substituted = rewrite(template, namespace, Resolution::Strict, &label)?;
    let root = parse_document(&substituted, origin)?;
    Ok(render_element(&root))
}

/// Pretty-print an element tree.
pub fn render_element(root: &XmlElement) -> String {
    let mut out = String::new();
    write_element(&mut out, root, 0);
    out
}

fn write_element(out: &mut String, element: &XmlElement, depth: usize) {
    let indent = INDENT.repeat(depth);
    out.push_str(&indent);
    out.push('<');
    out.push_str(&element.name);
    for (key, value) in &element.attributes {
        out.push(' ');
        out.push_str(key);
        out.push_str("=\"");
        out.push_str(&escape(value.as_str()));
        out.push('"');
    }

    if element.is_leaf() {
        if element.text.is_empty() {
            out.push_str("/>\n");
        } else {
            out.push('>');
            out.push_str(&partial_escape(element.text.as_str()));
            out.push_str("</");
            out.push_str(&element.name);
            out.push_str(">\n");
        }
        return;
    }

    out.push_str(">\n");
    // Mixed content keeps its order; each text run gets its own line.
    for item in &element.content {
        match item {
            Content::Text(raw) => {
                let text = raw.trim();
                if text.is_empty() {
                    continue;
                }
                out.push_str(&indent);
                out.push_str(INDENT);
                out.push_str(&partial_escape(text));
                out.push('\n');
            }
            Content::Child(index) => write_element(out, &element.children[*index], depth + 1),
        }
    }
    out.push_str(&indent);
    out.push_str("</");
    out.push_str(&element.name);
    out.push_str(">\n");
}
