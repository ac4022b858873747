//! Document patching operations.
//!
//! - [`locator`]: find a section by semantic kind
//! - [`social_history`]: table skeleton plus orientation, gender identity and birth-sex facts
//! - [`encounters`]: CPT annotations from per-visit billing forms
//! - [`repair`]: stateless schema-repair passes
//!
//! Missing sections and lookup misses are logged and skipped. Only host-data failures
//! (missing document, missing patient, store errors) surface as [`PatchError`].

mod dates;
mod encounters;
mod locator;
mod repair;
mod social_history;

pub use dates::*;
pub use encounters::*;
pub use locator::*;
pub use repair::*;
pub use social_history::*;

use thiserror::Error;

use crate::db::DbError;
use crate::xml::{Element, XmlError, XSI_NAMESPACE};

/// Patching errors.
#[derive(Error, Debug)]
pub enum PatchError {
    #[error("Database error: {0}")]
    Database(#[from] DbError),

    #[error("XML error: {0}")]
    Xml(#[from] XmlError),

    #[error("Save event for patient {0} carries no document")]
    DocumentMissing(String),
}

pub type PatchResult<T> = Result<T, PatchError>;

/// Declare the `xsi` prefix on the document element if it is not already bound.
pub fn ensure_xsi_namespace(root: &mut Element) {
    if root.attr("xmlns:xsi").is_none() {
        root.set_attr("xmlns:xsi", XSI_NAMESPACE);
    }
}
