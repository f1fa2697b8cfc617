//! Validated configuration newtypes and entity references.

mod domain_types;
mod refs;

pub use domain_types::*;
pub use refs::*;
