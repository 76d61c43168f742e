//! An owned XML element with ordered attributes and children.

use std::fmt;

use super::writer;

/// An XML element that has not yet been embedded in a document.
///
/// Attributes keep their insertion order so rendered output is stable.
/// Setting an attribute that already exists replaces its value in place.
///
/// # Example
///
/// ```
/// use liquichange::xml::Element;
///
/// let element = Element::new("column")
///     .attr("name", "email")
///     .opt_attr("remarks", None::<&str>)
///     .flag("autoIncrement", Some(false));
/// assert_eq!(element.to_string(), r#"<column name="email" autoIncrement="false" />"#);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    tag: String,
    attributes: Vec<(String, String)>,
    text: Option<String>,
    children: Vec<Element>,
}

impl Element {
    /// Creates an empty element with the given tag.
    #[must_use]
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attributes: Vec::new(),
            text: None,
            children: Vec::new(),
        }
    }

    /// Sets an attribute.
    #[must_use]
    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attr(name, value);
        self
    }

    /// Sets an attribute only when a value is present.
    #[must_use]
    pub fn opt_attr(mut self, name: impl Into<String>, value: Option<impl Into<String>>) -> Self {
        if let Some(value) = value {
            self.set_attr(name, value);
        }
        self
    }

    /// Sets a boolean attribute (`true` / `false`) only when a value is present.
    #[must_use]
    pub fn flag(self, name: impl Into<String>, value: Option<bool>) -> Self {
        self.opt_attr(name, value.map(|v| if v { "true" } else { "false" }))
    }

    /// Sets the text body. Empty text leaves the element without a body.
    #[must_use]
    pub fn text(mut self, text: impl Into<String>) -> Self {
        let text = text.into();
        self.text = if text.is_empty() { None } else { Some(text) };
        self
    }

    /// Appends a child element.
    #[must_use]
    pub fn child(mut self, child: Element) -> Self {
        self.children.push(child);
        self
    }

    /// Appends several child elements, in order.
    #[must_use]
    pub fn children(mut self, children: impl IntoIterator<Item = Element>) -> Self {
        self.children.extend(children);
        self
    }

    /// Sets an attribute on an existing element.
    pub fn set_attr(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.attributes.iter_mut().find(|(n, _)| *n == name) {
            Some(existing) => existing.1 = value,
            None => self.attributes.push((name, value)),
        }
    }

    /// Appends a child to an existing element.
    pub fn push_child(&mut self, child: Element) {
        self.children.push(child);
    }

    /// Returns the tag name.
    #[must_use]
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Returns the attributes in render order.
    pub fn attributes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attributes
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }

    /// Returns the value of an attribute.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, value)| value.as_str())
    }

    /// Returns the text body, if any.
    #[must_use]
    pub fn text_content(&self) -> Option<&str> {
        self.text.as_deref()
    }

    /// Returns the child elements in order.
    #[must_use]
    pub fn child_elements(&self) -> &[Element] {
        &self.children
    }

    /// Returns the first direct child with the given tag.
    #[must_use]
    pub fn find(&self, tag: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.tag == tag)
    }

    /// Returns every direct child with the given tag.
    pub fn find_all<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
        self.children.iter().filter(move |c| c.tag == tag)
    }
}

/// Renders the element compactly, without a prolog or indentation.
impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = String::new();
        writer::write_element(&mut out, self, None, 0);
        f.write_str(&out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attribute_order_is_insertion_order() {
        let element = Element::new("changeSet")
            .attr("id", "1")
            .attr("author", "nelson")
            .attr("runAlways", "true");
        let names: Vec<&str> = element.attributes().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["id", "author", "runAlways"]);
    }

    #[test]
    fn test_set_attr_replaces_in_place() {
        let element = Element::new("x").attr("a", "1").attr("b", "2").attr("a", "3");
        assert_eq!(element.to_string(), r#"<x a="3" b="2" />"#);
    }

    #[test]
    fn test_absent_attributes_are_omitted() {
        let element = Element::new("dropTable")
            .opt_attr("schemaName", None::<String>)
            .attr("tableName", "users")
            .flag("cascadeConstraints", None);
        assert_eq!(element.to_string(), r#"<dropTable tableName="users" />"#);
    }

    #[test]
    fn test_empty_text_is_no_body() {
        let element = Element::new("comment").text("");
        assert_eq!(element.text_content(), None);
        assert_eq!(element.to_string(), "<comment />");
    }

    #[test]
    fn test_nested_compact() {
        let element = Element::new("createIndex")
            .attr("indexName", "idx_email")
            .child(Element::new("column").attr("name", "email"))
            .child(Element::new("column").attr("name", "tenant"));
        assert_eq!(
            element.to_string(),
            r#"<createIndex indexName="idx_email"><column name="email" /><column name="tenant" /></createIndex>"#
        );
        assert_eq!(element.find_all("column").count(), 2);
        assert_eq!(element.find("column").unwrap().attribute("name"), Some("email"));
    }

    #[test]
    fn test_text_is_escaped_but_quotes_are_kept() {
        let element = Element::new("neo4j:cypher").text("MATCH (n) WHERE n.x < 3 & n.name = 'a' RETURN n");
        assert_eq!(
            element.to_string(),
            "<neo4j:cypher>MATCH (n) WHERE n.x &lt; 3 &amp; n.name = 'a' RETURN n</neo4j:cypher>"
        );
    }
}
