//! Data model types

mod analysis;
mod node;
mod repository;

pub use analysis::*;
pub use node::*;
pub use repository::*;
