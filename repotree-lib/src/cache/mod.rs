//! Per-path caches backing the lazy tree
//!
//! Two pieces of state are kept per path: whether it is expanded, and what
//! has been loaded for it. They are deliberately independent: collapsing a
//! node never evicts what was loaded for it, and nothing is ever evicted
//! while the owning tree is alive.

mod expansion;
mod path;

pub use expansion::*;
pub use path::*;

/// Load progress of a single path.
///
/// `Unloaded → Loading → {Loaded | Failed}`. A failed path goes back to
/// `Loading` only when something asks for it again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadState {
    #[default]
    Unloaded,
    Loading,
    Loaded,
    Failed,
}

impl LoadState {
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self, Self::Loaded)
    }
}
