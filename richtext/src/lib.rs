pub mod convert;
pub mod document;

pub use convert::text_to_document;
pub use document::{BlockNode, Document, NodeKind};
