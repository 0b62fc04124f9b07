//! EAP-config document handling.
//!
//! - [`document`] parses the XML into candidates
//! - [`methods`] holds the outer/inner method codes and compatibility rules
//! - [`resolve`] picks the first workable candidate

pub mod document;
pub mod methods;
pub mod resolve;

pub use document::{ConfigDocument, ParseOptions, parse, parse_with};
pub use methods::{EapMethod, InnerAuth};
pub use resolve::resolve;
