use std::borrow::Cow;

use quick_xml::escape::unescape;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use thiserror::Error;

/// Index of a [`Node`] inside its [`Document`].
pub type NodeId = usize;

/// Errors that can occur while parsing an OPML document.
#[derive(Debug, Error)]
pub enum OpmlError {
    /// The XML tokenizer rejected the input.
    #[error("XML parse error at byte {position}: {message}")]
    XmlParse { position: u64, message: String },

    /// The token stream does not form a single well-formed element tree.
    #[error("Malformed XML document: {0}")]
    Structure(String),
}

/// A single XML element with its attributes and child elements.
#[derive(Debug, Clone)]
pub struct Node {
    name: String,
    attributes: Vec<(String, String)>,
    children: Vec<NodeId>,
}

impl Node {
    /// Element name as written in the document, prefix included.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns true for `<outline>` elements.
    pub fn is_outline(&self) -> bool {
        self.name == "outline"
    }

    /// Unescaped value of the attribute with exactly this name.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }
}

/// An element tree parsed from XML text.
///
/// Nodes live in an arena in document order: the root element is always
/// node 0 and every node is stored after all of its ancestors.
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Node>,
}

impl Document {
    /// Parses XML text into an element tree.
    ///
    /// The text is taken as UTF-8 whatever its XML declaration says; use
    /// [`Document::parse_bytes`] for raw file contents.
    pub fn parse(content: &str) -> Result<Self, OpmlError> {
        parse_events(Reader::from_str(content))
    }

    /// Parses raw XML bytes into an element tree.
    ///
    /// The encoding comes from the byte order mark or the `encoding` of the
    /// XML declaration, defaulting to UTF-8. Bytes that are invalid in that
    /// encoding are a parse error.
    ///
    /// Text, comments, processing instructions and the DOCTYPE are dropped;
    /// only elements and their attributes are kept. Text content is still
    /// unescaped so undefined entities inside it are rejected.
    ///
    /// # Errors
    ///
    /// Returns [`OpmlError::XmlParse`] when quick-xml rejects the input
    /// (unclosed tags, mismatched end tags, duplicate attributes, unknown
    /// entities, undecodable bytes) and [`OpmlError::Structure`] when the
    /// document has no root element, more than one, or elements left open at
    /// end of input.
    ///
    /// # Security
    ///
    /// SEC-002: quick-xml (0.37) never parses `<!ENTITY>` declarations.
    /// Attribute values and text go through quick-xml's unescaping, which
    /// only resolves the 5 XML builtins and character references; any other
    /// entity reference is an error. Nothing is fetched or expanded.
    pub fn parse_bytes(content: &[u8]) -> Result<Self, OpmlError> {
        parse_events(Reader::from_reader(content))
    }

    pub fn root(&self) -> NodeId {
        0
    }

    /// Returns the node with the given id.
    ///
    /// # Panics
    ///
    /// Panics if `id` did not come from this document.
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id]
    }

    /// Number of elements in the document, root included.
    pub(crate) fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Every element below the root, in document (pre-order) order.
    pub fn descendants(&self) -> impl Iterator<Item = NodeId> + '_ {
        (self.root() + 1)..self.nodes.len()
    }
}

fn parse_events(mut reader: Reader<&[u8]>) -> Result<Document, OpmlError> {
    reader.config_mut().trim_text(true);

    let mut nodes: Vec<Node> = Vec::new();
    // Ancestors of the next element; top is its parent.
    let mut open: Vec<NodeId> = Vec::new();
    let mut buf = Vec::new();

    loop {
        let event = reader
            .read_event_into(&mut buf)
            .map_err(|e| xml_error(&reader, e))?;

        match event {
            Event::Start(e) => {
                let id = push_element(&mut nodes, &open, &e, &reader)?;
                open.push(id);
            }
            Event::Empty(e) => {
                push_element(&mut nodes, &open, &e, &reader)?;
            }
            // quick-xml checks end names, so an end tag always has an open match
            Event::End(_) => {
                open.pop();
            }
            Event::Text(_) | Event::CData(_) if open.is_empty() => {
                return Err(OpmlError::Structure(
                    "text content outside the root element".to_string(),
                ));
            }
            Event::Text(e) => {
                e.unescape().map_err(|err| xml_error(&reader, err))?;
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    if let Some(&id) = open.last() {
        return Err(OpmlError::Structure(format!(
            "element <{}> is never closed",
            nodes[id].name
        )));
    }
    if nodes.is_empty() {
        return Err(OpmlError::Structure("no root element found".to_string()));
    }

    Ok(Document { nodes })
}

fn xml_error(reader: &Reader<&[u8]>, err: impl std::fmt::Display) -> OpmlError {
    OpmlError::XmlParse {
        position: reader.buffer_position() as u64,
        message: err.to_string(),
    }
}

/// Appends a new element under the current parent and returns its id.
fn push_element(
    nodes: &mut Vec<Node>,
    open: &[NodeId],
    e: &BytesStart<'_>,
    reader: &Reader<&[u8]>,
) -> Result<NodeId, OpmlError> {
    let parent = open.last().copied();
    if parent.is_none() && !nodes.is_empty() {
        return Err(OpmlError::Structure(
            "content after the root element".to_string(),
        ));
    }

    let decoder = reader.decoder();
    let name = decoder
        .decode(e.name().as_ref())
        .map_err(|err| xml_error(reader, err))?
        .into_owned();

    let mut attributes = Vec::new();
    for attr_result in e.attributes() {
        let attr = attr_result.map_err(|err| xml_error(reader, err))?;
        let key = decoder
            .decode(attr.key.as_ref())
            .map_err(|err| xml_error(reader, err))?
            .into_owned();
        let raw = decoder
            .decode(&attr.value)
            .map_err(|err| xml_error(reader, err))?;
        let value = unescape(&normalize_attribute_whitespace(&raw))
            .map_err(|err| xml_error(reader, err))?
            .into_owned();
        attributes.push((key, value));
    }

    let id = nodes.len();
    nodes.push(Node {
        name,
        attributes,
        children: Vec::new(),
    });
    if let Some(parent) = parent {
        nodes[parent].children.push(id);
    }
    Ok(id)
}

/// Turns literal tabs and line breaks in a raw attribute value into spaces.
///
/// Runs before unescaping, so `&#10;` and friends keep their real character.
/// A `\r\n` pair counts as one line break.
fn normalize_attribute_whitespace(raw: &str) -> Cow<'_, str> {
    if !raw.contains(['\t', '\n', '\r']) {
        return Cow::Borrowed(raw);
    }
    Cow::Owned(
        raw.replace("\r\n", " ")
            .replace(['\t', '\n', '\r'], " "),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_builds_nested_tree() {
        let content = r#"<?xml version="1.0" encoding="UTF-8"?>
<opml version="2.0">
  <head><title>Test Feeds</title></head>
  <body>
    <outline text="Blogs">
      <outline text="Example" xmlUrl="https://example.com/feed.xml"/>
    </outline>
  </body>
</opml>"#;

        let doc = Document::parse(content).expect("Failed to parse nested OPML");
        assert_eq!(doc.len(), 6);

        let root = doc.node(doc.root());
        assert_eq!(root.name(), "opml");
        assert_eq!(root.attribute("version"), Some("2.0"));
        assert_eq!(root.children().len(), 2);

        let body = doc.node(root.children()[1]);
        assert_eq!(body.name(), "body");
        let folder = doc.node(body.children()[0]);
        assert!(folder.is_outline());
        assert_eq!(folder.attribute("xmlUrl"), None);
        let feed = doc.node(folder.children()[0]);
        assert_eq!(
            feed.attribute("xmlUrl"),
            Some("https://example.com/feed.xml")
        );
        assert!(feed.children().is_empty());
    }

    #[test]
    fn test_descendants_in_document_order() {
        let content = r#"<opml><body>
            <outline text="a"><outline text="b"/></outline>
            <outline text="c"/>
        </body></opml>"#;

        let doc = Document::parse(content).unwrap();
        let texts: Vec<_> = doc
            .descendants()
            .filter_map(|id| doc.node(id).attribute("text"))
            .collect();
        assert_eq!(texts, vec!["a", "b", "c"]);
        assert!(!doc.descendants().any(|id| id == doc.root()));
    }

    #[test]
    fn test_attribute_names_are_case_sensitive() {
        let doc = Document::parse(r#"<outline xmlurl="https://lower.example/feed"/>"#).unwrap();
        let node = doc.node(doc.root());
        assert_eq!(node.attribute("xmlUrl"), None);
        assert_eq!(node.attribute("xmlurl"), Some("https://lower.example/feed"));
    }

    #[test]
    fn test_attribute_values_unescaped() {
        let doc =
            Document::parse(r#"<outline xmlUrl="https://example.com/feed?a=1&amp;b=&#50;"/>"#)
                .unwrap();
        assert_eq!(
            doc.node(doc.root()).attribute("xmlUrl"),
            Some("https://example.com/feed?a=1&b=2")
        );
    }

    #[test]
    fn test_attribute_line_breaks_become_spaces() {
        let doc = Document::parse(
            "<outline xmlUrl=\"http://a\nb\" title=\"one\r\ntwo\tthree\" text=\"x&#10;y&#9;z\"/>",
        )
        .unwrap();
        let node = doc.node(doc.root());
        assert_eq!(node.attribute("xmlUrl"), Some("http://a b"));
        assert_eq!(node.attribute("title"), Some("one two three"));
        // Character references keep their real value
        assert_eq!(node.attribute("text"), Some("x\ny\tz"));
    }

    #[test]
    fn test_latin1_declaration_decoded() {
        let content: &[u8] = b"<?xml version=\"1.0\" encoding=\"ISO-8859-1\"?>\
<opml><body><outline text=\"caf\xE9\" xmlUrl=\"http://a.example/caf\xE9\"/></body></opml>";

        let doc = Document::parse_bytes(content).expect("Failed to parse Latin-1 OPML");
        let outline = doc.node(doc.descendants().last().unwrap());
        assert_eq!(outline.attribute("text"), Some("caf\u{e9}"));
        assert_eq!(outline.attribute("xmlUrl"), Some("http://a.example/caf\u{e9}"));
    }

    #[test]
    fn test_invalid_utf8_without_declaration_error() {
        let content: &[u8] = b"<opml><body><outline text=\"caf\xE9\"/></body></opml>";
        let result = Document::parse_bytes(content);
        assert!(matches!(result, Err(OpmlError::XmlParse { .. })));
    }

    #[test]
    fn test_undefined_entity_in_text_error() {
        let result = Document::parse("<opml><head><title>a&nbsp;b</title></head><body/></opml>");
        assert!(
            matches!(result, Err(OpmlError::XmlParse { .. })),
            "Undefined entity in text should be rejected: {:?}",
            result
        );
    }

    #[test]
    fn test_predefined_entities_in_text_accepted() {
        let doc = Document::parse("<opml><head><title>a &amp; b &#233;</title></head></opml>")
            .expect("Builtin entities in text should parse");
        assert_eq!(doc.len(), 3);
    }

    #[test]
    fn test_malformed_xml_error() {
        let result = Document::parse("<not valid xml");
        assert!(result.is_err());
    }

    #[test]
    fn test_mismatched_end_tag_error() {
        let result = Document::parse("<opml><body></opml></body>");
        assert!(matches!(result, Err(OpmlError::XmlParse { .. })));
    }

    #[test]
    fn test_unclosed_element_error() {
        let err = Document::parse("<opml><body>").unwrap_err();
        assert!(matches!(err, OpmlError::Structure(_)));
        assert!(err.to_string().contains("never closed"), "{}", err);
    }

    #[test]
    fn test_empty_input_error() {
        let err = Document::parse("   ").unwrap_err();
        assert!(err.to_string().contains("no root element"), "{}", err);
    }

    #[test]
    fn test_second_root_element_error() {
        let err = Document::parse("<opml/><opml/>").unwrap_err();
        assert!(matches!(err, OpmlError::Structure(_)));
    }

    #[test]
    fn test_text_after_root_error() {
        let err = Document::parse("<opml/>junk").unwrap_err();
        assert!(matches!(err, OpmlError::Structure(_)));
    }

    #[test]
    fn test_duplicate_attribute_error() {
        let result = Document::parse(r#"<outline url="a" url="b"/>"#);
        assert!(matches!(result, Err(OpmlError::XmlParse { .. })));
    }

    #[test]
    fn test_xxe_entity_not_expanded() {
        // SEC-002: entity declarations are never parsed, so a reference to a
        // declared entity is an unknown entity and must be rejected.
        let malicious_opml = r#"<?xml version="1.0"?>
<!DOCTYPE opml [<!ENTITY xxe SYSTEM "file:///etc/passwd">]>
<opml version="2.0">
    <body>
        <outline text="Legit Feed" xmlUrl="&xxe;"/>
    </body>
</opml>"#;

        let result = Document::parse(malicious_opml);
        assert!(
            matches!(result, Err(OpmlError::XmlParse { .. })),
            "Entity reference should be rejected: {:?}",
            result
        );
    }

    #[test]
    fn test_deep_nesting_parses() {
        let mut opml = String::from("<opml><body>");
        for _ in 0..5_000 {
            opml.push_str(r#"<outline text="level">"#);
        }
        for _ in 0..5_000 {
            opml.push_str("</outline>");
        }
        opml.push_str("</body></opml>");

        let doc = Document::parse(&opml).expect("Deeply nested OPML should parse");
        assert_eq!(doc.len(), 5_002);
    }
}
