//! Document parsing on top of the `quick-xml` pull reader.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use super::{Attribute, Declaration, Document, Element, Node, XmlError, XmlResult};

/// Parse a complete document.
pub(crate) fn parse_document(xml: &str) -> XmlResult<Document> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(false);

    let mut declaration = None;
    let mut prolog = Vec::new();
    let mut epilog = Vec::new();
    let mut root: Option<Element> = None;
    // Open elements, innermost last
    let mut stack: Vec<Element> = Vec::new();

    loop {
        let event = reader.read_event()?;
        let node = match event {
            Event::Decl(decl) => {
                let version = String::from_utf8_lossy(&decl.version()?).into_owned();
                let encoding = decl
                    .encoding()
                    .transpose()
                    .map_err(quick_xml::Error::from)?
                    .map(|e| String::from_utf8_lossy(&e).into_owned());
                let standalone = decl
                    .standalone()
                    .transpose()
                    .map_err(quick_xml::Error::from)?
                    .map(|s| String::from_utf8_lossy(&s).into_owned());
                declaration = Some(Declaration {
                    version,
                    encoding,
                    standalone,
                });
                continue;
            }
            Event::Start(start) => {
                stack.push(element_from_start(&start)?);
                continue;
            }
            Event::End(_) => {
                let closed = stack
                    .pop()
                    .ok_or_else(|| XmlError::Malformed("unexpected closing tag".into()))?;
                Node::Element(closed)
            }
            Event::Empty(start) => Node::Element(element_from_start(&start)?),
            Event::Text(text) => Node::Text(text.unescape()?.into_owned()),
            Event::CData(data) => Node::CData(String::from_utf8_lossy(&data.into_inner()).into_owned()),
            Event::Comment(comment) => Node::Comment(String::from_utf8_lossy(&comment).into_owned()),
            Event::PI(pi) => Node::ProcessingInstruction(String::from_utf8_lossy(&pi).into_owned()),
            Event::DocType(doctype) => Node::DocType(String::from_utf8_lossy(&doctype).into_owned()),
            Event::Eof => break,
        };

        if let Some(parent) = stack.last_mut() {
            parent.children.push(node);
            continue;
        }

        // Top level: outside the document element
        match node {
            Node::Element(element) => {
                if root.is_some() {
                    return Err(XmlError::Malformed("multiple root elements".into()));
                }
                root = Some(element);
            }
            Node::Text(text) if text.trim().is_empty() => {}
            Node::Text(_) | Node::CData(_) => {
                return Err(XmlError::Malformed("character data outside root element".into()));
            }
            other if root.is_none() => prolog.push(other),
            other => epilog.push(other),
        }
    }

    if let Some(open) = stack.last() {
        return Err(XmlError::Malformed(format!("unclosed element <{}>", open.name)));
    }

    let root = root.ok_or_else(|| XmlError::Malformed("document has no root element".into()))?;

    Ok(Document {
        declaration,
        prolog,
        root,
        epilog,
    })
}

fn element_from_start(start: &BytesStart<'_>) -> XmlResult<Element> {
    let mut element = Element::new(String::from_utf8_lossy(start.name().as_ref()).into_owned());
    for attr in start.attributes() {
        let attr = attr.map_err(quick_xml::Error::from)?;
        element.attributes.push(Attribute {
            name: String::from_utf8_lossy(attr.key.as_ref()).into_owned(),
            value: attr.unescape_value()?.into_owned(),
        });
    }
    Ok(element)
}
