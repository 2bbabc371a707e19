//! Common definitions (errors and result plumbing), relied upon by all brindex-* crates.

pub mod error;
pub mod result;

pub use error::Error;
pub use result::Result;
