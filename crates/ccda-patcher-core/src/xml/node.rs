//! Document, element and node types.

use super::{reader, writer, XmlResult};

/// A parsed XML document.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    /// XML declaration, if the source had one
    pub declaration: Option<Declaration>,
    /// Comments, processing instructions and doctype before the root
    pub prolog: Vec<Node>,
    /// Document element
    pub root: Element,
    /// Comments and processing instructions after the root
    pub epilog: Vec<Node>,
}

/// The `<?xml ...?>` declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct Declaration {
    pub version: String,
    pub encoding: Option<String>,
    pub standalone: Option<String>,
}

/// A single node in an element's content.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Element(Element),
    /// Unescaped character data
    Text(String),
    CData(String),
    Comment(String),
    ProcessingInstruction(String),
    DocType(String),
}

/// An attribute with its qualified name and unescaped value.
#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    pub name: String,
    pub value: String,
}

/// An element with its qualified name, ordered attributes and ordered content.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub name: String,
    pub attributes: Vec<Attribute>,
    pub children: Vec<Node>,
}

impl Document {
    /// Parse a document from text.
    pub fn parse(xml: &str) -> XmlResult<Self> {
        reader::parse_document(xml)
    }

    /// Serialize the document back to text.
    pub fn to_xml(&self) -> XmlResult<String> {
        writer::write_document(self)
    }

    /// Wrap a root element in a document with a standard declaration.
    pub fn from_root(root: Element) -> Self {
        Self {
            declaration: Some(Declaration {
                version: "1.0".into(),
                encoding: Some("UTF-8".into()),
                standalone: None,
            }),
            prolog: Vec::new(),
            root,
            epilog: Vec::new(),
        }
    }
}

impl Element {
    /// Create an empty element.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Builder: add or replace an attribute.
    pub fn with_attr(mut self, name: &str, value: impl Into<String>) -> Self {
        self.set_attr(name, value);
        self
    }

    /// Builder: append a child element.
    pub fn with_child(mut self, child: Element) -> Self {
        self.push(child);
        self
    }

    /// Builder: append a text node.
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.children.push(Node::Text(text.into()));
        self
    }

    /// Name without any namespace prefix.
    pub fn local_name(&self) -> &str {
        match self.name.rsplit_once(':') {
            Some((_, local)) => local,
            None => &self.name,
        }
    }

    /// Exact local-name match.
    pub fn is(&self, name: &str) -> bool {
        self.local_name() == name
    }

    /// Case-insensitive local-name match, for narrative markup emitted in mixed case.
    pub fn is_ignore_case(&self, name: &str) -> bool {
        self.local_name().eq_ignore_ascii_case(name)
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.value.as_str())
    }

    pub fn set_attr(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self.attributes.iter_mut().find(|a| a.name == name) {
            Some(existing) => existing.value = value,
            None => self.attributes.push(Attribute {
                name: name.to_string(),
                value,
            }),
        }
    }

    /// Remove an attribute, returning its value.
    pub fn remove_attr(&mut self, name: &str) -> Option<String> {
        let idx = self.attributes.iter().position(|a| a.name == name)?;
        Some(self.attributes.remove(idx).value)
    }

    pub fn push(&mut self, child: Element) {
        self.children.push(Node::Element(child));
    }

    pub fn child_elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|n| match n {
            Node::Element(e) => Some(e),
            _ => None,
        })
    }

    pub fn child_elements_mut(&mut self) -> impl Iterator<Item = &mut Element> {
        self.children.iter_mut().filter_map(|n| match n {
            Node::Element(e) => Some(e),
            _ => None,
        })
    }

    /// First direct child with the given local name.
    pub fn child(&self, name: &str) -> Option<&Element> {
        self.child_elements().find(|e| e.is(name))
    }

    pub fn child_mut(&mut self, name: &str) -> Option<&mut Element> {
        self.child_elements_mut().find(|e| e.is(name))
    }

    pub fn has_child(&self, name: &str) -> bool {
        self.child(name).is_some()
    }

    pub fn has_element_children(&self) -> bool {
        self.child_elements().next().is_some()
    }

    /// True when the element holds no elements and no non-whitespace character data.
    pub fn is_blank(&self) -> bool {
        self.children.iter().all(|n| match n {
            Node::Element(_) => false,
            Node::Text(t) | Node::CData(t) => t.trim().is_empty(),
            _ => true,
        })
    }

    /// Concatenated character data of this element and its descendants.
    pub fn text(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        for child in &self.children {
            match child {
                Node::Text(t) | Node::CData(t) => out.push_str(t),
                Node::Element(e) => e.collect_text(out),
                _ => {}
            }
        }
    }

    /// First element in document order (self included) matching `pred`.
    pub fn find<P>(&self, pred: &P) -> Option<&Element>
    where
        P: Fn(&Element) -> bool,
    {
        if pred(self) {
            return Some(self);
        }
        self.child_elements().find_map(|child| child.find(pred))
    }

    pub fn find_mut<P>(&mut self, pred: &P) -> Option<&mut Element>
    where
        P: Fn(&Element) -> bool,
    {
        if pred(self) {
            return Some(self);
        }
        for child in self.child_elements_mut() {
            if let Some(found) = child.find_mut(pred) {
                return Some(found);
            }
        }
        None
    }

    /// Every element in document order (self included) matching `pred`.
    pub fn find_all<'a, P>(&'a self, pred: &P) -> Vec<&'a Element>
    where
        P: Fn(&Element) -> bool,
    {
        let mut out = Vec::new();
        self.collect_matching(pred, &mut out);
        out
    }

    fn collect_matching<'a, P>(&'a self, pred: &P, out: &mut Vec<&'a Element>)
    where
        P: Fn(&Element) -> bool,
    {
        if pred(self) {
            out.push(self);
        }
        for child in self.child_elements() {
            child.collect_matching(pred, out);
        }
    }

    /// Visit every element in document order (self included).
    pub fn for_each_mut<F>(&mut self, f: &mut F)
    where
        F: FnMut(&mut Element),
    {
        f(self);
        for child in self.child_elements_mut() {
            child.for_each_mut(f);
        }
    }

    /// Remove descendant elements matching `pred`, deepest first.
    ///
    /// Children are pruned before their parent is tested, so a parent emptied by the
    /// removal of its children is itself eligible in the same call. Returns the number of
    /// elements removed.
    pub fn remove_descendants<F>(&mut self, pred: &mut F) -> usize
    where
        F: FnMut(&Element) -> bool,
    {
        let mut removed = 0;
        for child in self.child_elements_mut() {
            removed += child.remove_descendants(pred);
        }

        let before = self.children.len();
        self.children.retain(|n| match n {
            Node::Element(e) => !pred(e),
            _ => true,
        });
        removed + (before - self.children.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Element {
        Element::new("root")
            .with_child(
                Element::new("component").with_child(
                    Element::new("section")
                        .with_child(Element::new("title").with_text("Social History")),
                ),
            )
            .with_child(Element::new("component"))
    }

    #[test]
    fn test_local_name_strips_prefix() {
        let el = Element::new("sdtc:raceCode");
        assert_eq!(el.local_name(), "raceCode");
        assert!(el.is("raceCode"));
        assert!(!el.is("sdtc:raceCode"));
    }

    #[test]
    fn test_set_attr_replaces_existing() {
        let mut el = Element::new("id").with_attr("root", "1.2.3");
        el.set_attr("root", "4.5.6");
        assert_eq!(el.attributes.len(), 1);
        assert_eq!(el.attr("root"), Some("4.5.6"));
        assert_eq!(el.remove_attr("root"), Some("4.5.6".into()));
        assert_eq!(el.attr("root"), None);
    }

    #[test]
    fn test_text_concatenates_descendants() {
        let el = Element::new("td")
            .with_text("Birth ")
            .with_child(Element::new("content").with_text("Sex"));
        assert_eq!(el.text(), "Birth Sex");
    }

    #[test]
    fn test_find_and_find_all() {
        let root = sample();
        let title = root.find(&|e: &Element| e.is("title")).unwrap();
        assert_eq!(title.text(), "Social History");
        assert_eq!(root.find_all(&|e: &Element| e.is("component")).len(), 2);
    }

    #[test]
    fn test_remove_descendants_bottom_up() {
        let mut root = Element::new("root").with_child(
            Element::new("component").with_child(Element::new("component")),
        );

        let removed = root.remove_descendants(&mut |e: &Element| e.is("component") && e.is_blank());

        assert_eq!(removed, 2);
        assert!(!root.has_element_children());
    }

    #[test]
    fn test_is_blank() {
        assert!(Element::new("component").with_text("\n  ").is_blank());
        assert!(!Element::new("component").with_text("x").is_blank());
        assert!(!Element::new("component").with_child(Element::new("a")).is_blank());
    }
}
