//! Plain-text reporting of fitted relationships.

pub mod format;

pub use format::*;
