//! Helper functions shared by the generators, templates and server
//!
//! URL building, date formatting and HTML/XML escaping.

mod date;
mod html;
mod url;

pub use date::*;
pub use html::*;
pub use url::*;
