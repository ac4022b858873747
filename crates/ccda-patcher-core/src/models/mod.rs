//! Domain models for the C-CDA patcher.

mod billing;
mod event;
mod intake;
mod patient;

pub use billing::*;
pub use event::*;
pub use intake::*;
pub use patient::*;
