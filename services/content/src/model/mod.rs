//! Content data model.
//!
//! # Purpose
//! Re-exports the content record, its write-side attribute sets, and the
//! resource envelope returned to callers and published on the bus.
mod content;
mod envelope;

pub use content::{Content, ContentUpdate, NewContent};
pub use envelope::{ContentAttributes, ContentData, ContentEnvelope, Links};
