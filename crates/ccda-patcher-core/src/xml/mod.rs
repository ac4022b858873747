//! Owned XML tree for clinical documents.
//!
//! Documents are read with `quick-xml` into a small mutable element tree, patched in place,
//! and written back out. Whitespace text nodes are preserved so untouched regions of a
//! document round-trip unchanged.

mod node;
mod reader;
mod writer;

pub use node::*;

use thiserror::Error;

/// XML errors.
#[derive(Error, Debug)]
pub enum XmlError {
    #[error("XML parse error: {0}")]
    Parse(#[from] quick_xml::Error),

    #[error("XML write error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialized document is not UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    #[error("Malformed document: {0}")]
    Malformed(String),
}

pub type XmlResult<T> = Result<T, XmlError>;

/// Namespace bound to the `xsi` prefix used by coded `value` elements.
pub const XSI_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema-instance";
