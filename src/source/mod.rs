//! Source resolution and path access control

pub mod access;
pub mod resolver;

pub use access::AccessPolicy;
pub use resolver::{resolve_base64, resolve_path, ResolvedPdf};
