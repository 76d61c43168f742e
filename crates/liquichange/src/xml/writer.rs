//! Document rendering: prolog, indentation, escaping and character checks.

use crate::error::{ChangelogError, Result};

use super::{Element, Encoding};

/// Options controlling how a document is rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOptions {
    encoding: Encoding,
    indent: Option<usize>,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            encoding: Encoding::Utf8,
            indent: Some(2),
        }
    }
}

impl RenderOptions {
    /// Creates the default options: UTF-8, two-space indentation.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the declared and actual text encoding.
    #[must_use]
    pub fn encoding(mut self, encoding: Encoding) -> Self {
        self.encoding = encoding;
        self
    }

    /// Indents nested elements by `width` spaces per level.
    #[must_use]
    pub fn indent(mut self, width: usize) -> Self {
        self.indent = Some(width);
        self
    }

    /// Renders the whole document body on one line.
    #[must_use]
    pub fn compact(mut self) -> Self {
        self.indent = None;
        self
    }

    /// Returns the configured encoding.
    #[must_use]
    pub fn get_encoding(&self) -> Encoding {
        self.encoding
    }

    /// Returns the indentation width, or `None` for compact output.
    #[must_use]
    pub fn get_indent(&self) -> Option<usize> {
        self.indent
    }
}

/// Renders `root` as a complete XML document with a prolog.
///
/// Characters the chosen encoding cannot represent are written as numeric
/// character references, so the returned text can be encoded losslessly
/// with [`Encoding::encode`].
///
/// Fails with [`ChangelogError::Serialization`] if any text or attribute
/// value holds a character that XML 1.0 does not allow.
pub fn render_document(root: &Element, options: &RenderOptions) -> Result<String> {
    check_characters(root)?;

    let mut out = format!(
        "<?xml version=\"1.0\" encoding=\"{}\"?>\n",
        options.encoding.label()
    );
    write_element(&mut out, root, options.indent, 0);
    out.push('\n');

    Ok(options.encoding.escape_unrepresentable(&out).into_owned())
}

/// Writes one element and its subtree.
///
/// With an indent width, each child starts on its own line. An element with
/// a text body is written compactly, children included, so indentation
/// never adds whitespace to its character data.
pub(super) fn write_element(out: &mut String, element: &Element, indent: Option<usize>, depth: usize) {
    out.push('<');
    out.push_str(element.tag());
    for (name, value) in element.attributes() {
        out.push(' ');
        out.push_str(name);
        out.push_str("=\"");
        escape_attribute(out, value);
        out.push('"');
    }

    let text = element.text_content();
    let children = element.child_elements();
    if text.is_none() && children.is_empty() {
        out.push_str(" />");
        return;
    }
    out.push('>');

    if let Some(text) = text {
        escape_text(out, text);
    }

    // Mixed content stays on one line.
    let indent = if text.is_some() { None } else { indent };
    if !children.is_empty() {
        for child in children {
            newline(out, indent, depth + 1);
            write_element(out, child, indent, depth + 1);
        }
        newline(out, indent, depth);
    }

    out.push_str("</");
    out.push_str(element.tag());
    out.push('>');
}

fn newline(out: &mut String, indent: Option<usize>, depth: usize) {
    if let Some(width) = indent {
        out.push('\n');
        out.extend(std::iter::repeat(' ').take(width * depth));
    }
}

/// Escapes character data.
pub(super) fn escape_text(out: &mut String, text: &str) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
}

/// Escapes a double-quoted attribute value.
///
/// Whitespace control characters are written as references so attribute
/// value normalization does not turn them into spaces.
pub(super) fn escape_attribute(out: &mut String, value: &str) {
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\n' => out.push_str("&#10;"),
            '\r' => out.push_str("&#13;"),
            '\t' => out.push_str("&#09;"),
            _ => out.push(c),
        }
    }
}

fn is_xml_char(c: char) -> bool {
    matches!(c, '\t' | '\n' | '\r' | '\u{20}'..='\u{D7FF}' | '\u{E000}'..='\u{FFFD}' | '\u{10000}'..='\u{10FFFF}')
}

fn check_characters(element: &Element) -> Result<()> {
    let check = |value: &str, location: &str| -> Result<()> {
        match value.chars().find(|c| !is_xml_char(*c)) {
            Some(c) => Err(ChangelogError::serialization(
                "document",
                format!(
                    "{} of <{}> contains U+{:04X}, which XML 1.0 does not allow",
                    location,
                    element.tag(),
                    u32::from(c)
                ),
            )),
            None => Ok(()),
        }
    };

    for (name, value) in element.attributes() {
        check(value, &format!("attribute '{}'", name))?;
    }
    if let Some(text) = element.text_content() {
        check(text, "text")?;
    }
    element.child_elements().iter().try_for_each(check_characters)
}
