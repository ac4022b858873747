//! Document serialization on top of the `quick-xml` writer.

use quick_xml::events::{BytesCData, BytesDecl, BytesEnd, BytesPI, BytesStart, BytesText, Event};
use quick_xml::Writer;

use super::{Document, Element, Node, XmlResult};

pub(crate) fn write_document(doc: &Document) -> XmlResult<String> {
    let mut writer = Writer::new(Vec::new());

    if let Some(decl) = &doc.declaration {
        writer.write_event(Event::Decl(BytesDecl::new(
            &decl.version,
            decl.encoding.as_deref(),
            decl.standalone.as_deref(),
        )))?;
        write_newline(&mut writer)?;
    }

    for node in &doc.prolog {
        write_node(&mut writer, node)?;
        write_newline(&mut writer)?;
    }

    write_element(&mut writer, &doc.root)?;

    for node in &doc.epilog {
        write_newline(&mut writer)?;
        write_node(&mut writer, node)?;
    }
    write_newline(&mut writer)?;

    Ok(String::from_utf8(writer.into_inner())?)
}

fn write_newline(writer: &mut Writer<Vec<u8>>) -> XmlResult<()> {
    writer.write_event(Event::Text(BytesText::new("\n")))?;
    Ok(())
}

fn write_node(writer: &mut Writer<Vec<u8>>, node: &Node) -> XmlResult<()> {
    match node {
        Node::Element(element) => write_element(writer, element)?,
        Node::Text(text) => writer.write_event(Event::Text(BytesText::new(text)))?,
        Node::CData(data) => writer.write_event(Event::CData(BytesCData::new(data.as_str())))?,
        Node::Comment(comment) => {
            writer.write_event(Event::Comment(BytesText::from_escaped(comment.as_str())))?
        }
        Node::ProcessingInstruction(pi) => writer.write_event(Event::PI(BytesPI::new(pi.as_str())))?,
        Node::DocType(doctype) => {
            writer.write_event(Event::DocType(BytesText::from_escaped(doctype.as_str())))?
        }
    }
    Ok(())
}

fn write_element(writer: &mut Writer<Vec<u8>>, element: &Element) -> XmlResult<()> {
    let mut start = BytesStart::new(element.name.as_str());
    for attr in &element.attributes {
        start.push_attribute((attr.name.as_str(), attr.value.as_str()));
    }

    if element.children.is_empty() {
        writer.write_event(Event::Empty(start))?;
        return Ok(());
    }

    writer.write_event(Event::Start(start))?;
    for child in &element.children {
        write_node(writer, child)?;
    }
    writer.write_event(Event::End(BytesEnd::new(element.name.as_str())))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::xml::Document;

    #[test]
    fn test_round_trip_preserves_structure() {
        let source = r#"<?xml version="1.0" encoding="UTF-8"?>
<ClinicalDocument xmlns="urn:hl7-org:v3">
  <!-- header -->
  <title>A &amp; B</title>
  <id root="1.2" extension=""/>
</ClinicalDocument>
"#;
        let doc = Document::parse(source).unwrap();
        let written = doc.to_xml().unwrap();

        assert_eq!(written, source);
    }

    #[test]
    fn test_escapes_attribute_values() {
        let mut doc = Document::parse("<a/>").unwrap();
        doc.root.set_attr("displayName", "Straight (not gay or lesbian) & \"other\"");
        let written = doc.to_xml().unwrap();

        assert!(written.contains("displayName=\"Straight (not gay or lesbian) &amp; &quot;other&quot;\""));
        let reparsed = Document::parse(&written).unwrap();
        assert_eq!(
            reparsed.root.attr("displayName"),
            Some("Straight (not gay or lesbian) & \"other\"")
        );
    }

    #[test]
    fn test_empty_elements_self_close() {
        let doc = Document::parse("<a><b></b></a>").unwrap();
        assert_eq!(doc.to_xml().unwrap(), "<a><b/></a>\n");
    }
}
