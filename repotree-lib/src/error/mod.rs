//! Error types

mod api;
mod tree;

pub use api::*;
pub use tree::*;
