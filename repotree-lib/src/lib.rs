//! Repository tree client library
//!
//! An async client for the repository dashboard backend, and a lazily loaded,
//! per-path memoizing file tree built on top of it.

pub mod api;
pub mod cache;
pub mod error;
pub mod model;
pub mod redirect;
pub mod render;
pub mod response;
pub mod tree;

mod client;

pub use client::*;
pub use response::CacheStatus;
pub use response::Response;
pub use tree::RepoTree;
