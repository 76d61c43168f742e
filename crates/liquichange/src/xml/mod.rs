//! XML fragments and document rendering.
//!
//! Every changelog element renders itself into an [`Element`]; the
//! [`render_document`] function turns a root element into a complete,
//! encoded XML document.

mod element;
mod encoding;
mod writer;

pub use element::Element;
pub use encoding::Encoding;
pub use writer::{render_document, RenderOptions};
