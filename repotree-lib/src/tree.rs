//! Lazily loaded repository tree
//!
//! A [`RepoTree`] is the state of one tree view: the root listing, the
//! children of every directory that has been opened, the analysis of every
//! file that has been opened, and which paths are currently expanded.
//! Directory listings and file analyses are requested at most once per path
//! for the lifetime of the tree.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use repotree_lib::{DashboardClient, RepoTree};
//! use repotree_lib::model::RepoRef;
//! use repotree_lib::redirect::BrowserRedirect;
//!
//! let client = DashboardClient::builder().url("http://localhost:5000").build();
//! let tree = RepoTree::mount(
//!     Arc::new(client),
//!     RepoRef::new("acme", "widgets"),
//!     Arc::new(BrowserRedirect),
//! )
//! .await?;
//!
//! tree.toggle_directory("src").await;
//! println!("{}", repotree_lib::render::render_text(&tree.snapshot()));
//! ```

use std::collections::HashSet;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::api::RepoBackend;
use crate::cache::Begin;
use crate::cache::Claim;
use crate::cache::ExpansionState;
use crate::cache::LoadState;
use crate::cache::PathCache;
use crate::error::Error;
use crate::model::visible;
use crate::model::AnalysisRecord;
use crate::model::Node;
use crate::model::NodeKind;
use crate::model::RepoRef;
use crate::redirect::LogRedirect;
use crate::redirect::LoginRedirect;
use crate::render::SnapshotNode;
use crate::render::TreeSnapshot;
use crate::response::CacheStatus;
use crate::response::Response;

/// Path of the repository root.
pub const ROOT: &str = "";

/// The state of one repository tree view.
///
/// Cheap to clone; clones share the same caches. All operations need a
/// tokio runtime: loads run as spawned tasks and settle even if the caller
/// stops waiting.
#[derive(Clone)]
pub struct RepoTree {
    inner: Arc<TreeInner>,
}

struct TreeInner {
    ctx: LoadContext,
    expansion: ExpansionState,
    children: Arc<PathCache<Vec<Node>>>,
    analysis: Arc<PathCache<AnalysisRecord>>,
}

/// Everything a spawned load needs, detached from the tree itself.
#[derive(Clone)]
struct LoadContext {
    repo: RepoRef,
    backend: Arc<dyn RepoBackend>,
    redirect: Arc<dyn LoginRedirect>,
    unmounted: CancellationToken,
}

impl RepoTree {
    /// Creates an empty tree for `repo`. Auth failures are only logged.
    pub fn new(backend: Arc<dyn RepoBackend>, repo: RepoRef) -> Self {
        Self::with_redirect(backend, repo, Arc::new(LogRedirect))
    }

    /// Creates an empty tree for `repo` that sends auth failures to `redirect`.
    pub fn with_redirect(
        backend: Arc<dyn RepoBackend>,
        repo: RepoRef,
        redirect: Arc<dyn LoginRedirect>,
    ) -> Self {
        Self {
            inner: Arc::new(TreeInner {
                ctx: LoadContext {
                    repo,
                    backend,
                    redirect,
                    unmounted: CancellationToken::new(),
                },
                expansion: ExpansionState::new(),
                children: Arc::new(PathCache::new()),
                analysis: Arc::new(PathCache::new()),
            }),
        }
    }

    /// Creates a tree and loads its root listing.
    ///
    /// # Errors
    ///
    /// [`Error::NotAuthenticated`] if the backend answered 401 (the redirect
    /// has already been triggered), [`Error::Fetch`] for any other failure.
    pub async fn mount(
        backend: Arc<dyn RepoBackend>,
        repo: RepoRef,
        redirect: Arc<dyn LoginRedirect>,
    ) -> Result<Self, Error> {
        let tree = Self::with_redirect(backend, repo, redirect);
        tree.load_root().await?;
        Ok(tree)
    }

    /// Fetches the root listing and replaces the current one.
    ///
    /// Unlike directory loads this always hits the backend and reports its
    /// error to the caller. The root reads as loading until the request
    /// settles; if it fails, a previously loaded listing is kept.
    ///
    /// # Errors
    ///
    /// [`Error::Unmounted`] if the tree was unmounted before the listing
    /// arrived, otherwise as for [`mount`](Self::mount).
    pub async fn load_root(&self) -> Result<Response<Arc<Vec<Node>>>, Error> {
        if !self.is_mounted() {
            return Err(Error::Unmounted);
        }
        let ctx = &self.inner.ctx;
        log::debug!("Loading root of {}", ctx.repo);

        let previous = self.roots();
        let claim = self.inner.children.restart(ROOT);
        let result = tokio::select! {
            biased;
            _ = ctx.unmounted.cancelled() => return Err(Error::Unmounted),
            result = ctx.list_visible(ROOT) => result,
        };

        match result {
            Ok(nodes) => {
                let nodes = Arc::new(nodes);
                // A stale claim on a live tree means a newer reload took over.
                if !claim.store(nodes.clone()) && !self.is_mounted() {
                    log::debug!("Tree for {} unmounted, discarding root", ctx.repo);
                    return Err(Error::Unmounted);
                }
                Ok(Response::new(nodes))
            }
            Err(e) => {
                match previous {
                    Some(previous) => {
                        ctx.report(ROOT, &e);
                        claim.store(previous);
                    }
                    None => ctx.reject(claim, &e),
                }
                Err(e)
            }
        }
    }

    /// The repository this tree shows.
    pub fn repo(&self) -> &RepoRef {
        &self.inner.ctx.repo
    }

    /// The root listing, once loaded.
    pub fn roots(&self) -> Option<Arc<Vec<Node>>> {
        self.children(ROOT)
    }

    /// The cached children of a directory. Hidden entries are never included.
    pub fn children(&self, path: &str) -> Option<Arc<Vec<Node>>> {
        self.inner.children.get(path)
    }

    /// The cached analysis of a file.
    pub fn analysis(&self, path: &str) -> Option<Arc<AnalysisRecord>> {
        self.inner.analysis.get(path)
    }

    pub fn is_expanded(&self, path: &str) -> bool {
        self.inner.expansion.is_expanded(path)
    }

    /// Returns `true` while a listing or analysis for `path` is outstanding.
    pub fn is_loading(&self, path: &str) -> bool {
        self.inner.children.is_loading(path) || self.inner.analysis.is_loading(path)
    }

    /// Every path with an outstanding load, in no particular order.
    pub fn loading_paths(&self) -> Vec<String> {
        let mut paths = self.inner.children.loading_paths();
        paths.extend(self.inner.analysis.loading_paths());
        paths
    }

    /// Load progress of `path`, whichever cache it lives in.
    pub fn load_state(&self, path: &str) -> LoadState {
        match self.inner.children.state(path) {
            LoadState::Unloaded => self.inner.analysis.state(path),
            state => state,
        }
    }

    /// Finds a node by path among the listings loaded so far.
    pub fn node(&self, path: &str) -> Option<Node> {
        let parent = path.rsplit_once('/').map_or(ROOT, |(parent, _)| parent);
        self.children(parent)?
            .iter()
            .find(|node| node.path == path)
            .cloned()
    }

    /// Returns `false` once [`unmount`](Self::unmount) has been called.
    pub fn is_mounted(&self) -> bool {
        !self.inner.ctx.unmounted.is_cancelled()
    }

    /// Tears the view down.
    ///
    /// Outstanding loads are abandoned and their results discarded; all
    /// cached state is dropped. Further operations are no-ops.
    pub fn unmount(&self) {
        log::debug!("Unmounting tree for {}", self.inner.ctx.repo);
        self.inner.ctx.unmounted.cancel();
        self.inner.children.clear();
        self.inner.analysis.clear();
        self.inner.expansion.clear();
    }

    /// Sets the expansion state of `path` without loading anything.
    ///
    /// Returns the previous state.
    pub fn set_expanded(&self, path: &str, expanded: bool) -> bool {
        if !self.is_mounted() {
            return false;
        }
        self.inner.expansion.set(path, expanded)
    }

    /// Toggles `node`, dispatching on its kind. Other kinds are inert.
    ///
    /// Returns whether the node is now expanded.
    pub async fn toggle(&self, node: &Node) -> bool {
        match node.kind {
            NodeKind::Dir => self.toggle_directory(&node.path).await,
            NodeKind::File => self.toggle_file(&node.path).await,
            NodeKind::Other(_) => false,
        }
    }

    /// Expands `node` and waits for its content. Other kinds are inert.
    pub async fn expand(&self, node: &Node) {
        if !node.kind.is_expandable() || !self.is_mounted() {
            return;
        }
        self.inner.expansion.set(&node.path, true);
        match node.kind {
            NodeKind::Dir => {
                self.load_children(&node.path).await;
            }
            NodeKind::File => {
                self.load_analysis(&node.path).await;
            }
            NodeKind::Other(_) => {}
        }
    }

    /// Toggles a directory, loading its children the first time it opens.
    ///
    /// Failures are logged, never returned: the directory just stays empty.
    /// Returns whether the directory is now expanded.
    pub async fn toggle_directory(&self, path: &str) -> bool {
        if !self.is_mounted() {
            return false;
        }
        let expanded = self.inner.expansion.toggle(path);
        if expanded {
            self.load_children(path).await;
        }
        expanded
    }

    /// Toggles a file, fetching and analyzing it the first time it opens.
    ///
    /// Failures are logged, never returned: the file just shows no analysis.
    /// Returns whether the file is now expanded.
    pub async fn toggle_file(&self, path: &str) -> bool {
        if !self.is_mounted() {
            return false;
        }
        let expanded = self.inner.expansion.toggle(path);
        if expanded {
            self.load_analysis(path).await;
        }
        expanded
    }

    /// Returns the children of `path`, fetching them if nobody has yet.
    ///
    /// Concurrent callers for the same path share one request. Returns `None`
    /// if the load failed or the tree was unmounted.
    pub async fn load_children(&self, path: &str) -> Option<Response<Arc<Vec<Node>>>> {
        if !self.is_mounted() {
            return None;
        }
        let status = match self.inner.children.begin(path) {
            Begin::Cached(children) => {
                return Some(Response::with_status(children, CacheStatus::Hit));
            }
            Begin::Joined(done) => {
                done.await;
                CacheStatus::Joined
            }
            Begin::Started { claim, done } => {
                tokio::spawn(fetch_children(self.inner.ctx.clone(), claim));
                done.await;
                CacheStatus::Miss
            }
        };
        self.children(path)
            .map(|children| Response::with_status(children, status))
    }

    /// Returns the analysis of the file at `path`, fetching it if nobody has yet.
    ///
    /// Concurrent callers for the same path share one fetch-and-analyze.
    /// Returns `None` if either step failed or the tree was unmounted.
    pub async fn load_analysis(&self, path: &str) -> Option<Response<Arc<AnalysisRecord>>> {
        if !self.is_mounted() {
            return None;
        }
        let status = match self.inner.analysis.begin(path) {
            Begin::Cached(record) => {
                return Some(Response::with_status(record, CacheStatus::Hit));
            }
            Begin::Joined(done) => {
                done.await;
                CacheStatus::Joined
            }
            Begin::Started { claim, done } => {
                tokio::spawn(fetch_analysis(self.inner.ctx.clone(), claim));
                done.await;
                CacheStatus::Miss
            }
        };
        self.analysis(path)
            .map(|record| Response::with_status(record, status))
    }

    /// Takes an immutable copy of everything currently visible.
    pub fn snapshot(&self) -> TreeSnapshot {
        let mut seen = HashSet::new();
        let roots = self
            .roots()
            .map(|roots| self.snapshot_nodes(&roots, &mut seen))
            .unwrap_or_default();

        TreeSnapshot {
            repo: self.repo().clone(),
            root_state: self.load_state(ROOT),
            roots,
        }
    }

    fn snapshot_nodes(&self, nodes: &[Node], seen: &mut HashSet<String>) -> Vec<SnapshotNode> {
        let mut out = Vec::with_capacity(nodes.len());
        for node in nodes {
            // A listing that points back at an ancestor would recurse forever.
            if node.is_hidden() || !seen.insert(node.path.clone()) {
                continue;
            }

            let expanded = self.is_expanded(&node.path);
            let mut snapshot = SnapshotNode {
                node: node.clone(),
                expanded,
                state: self.load_state(&node.path),
                children: Vec::new(),
                analysis: None,
            };
            if expanded {
                match node.kind {
                    NodeKind::Dir => {
                        if let Some(children) = self.children(&node.path) {
                            snapshot.children = self.snapshot_nodes(&children, seen);
                        }
                    }
                    NodeKind::File => snapshot.analysis = self.analysis(&node.path),
                    NodeKind::Other(_) => {}
                }
            }
            out.push(snapshot);
        }
        out
    }
}

impl std::fmt::Debug for RepoTree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RepoTree")
            .field("repo", &self.inner.ctx.repo)
            .field("mounted", &self.is_mounted())
            .field("directories", &self.inner.children.len())
            .field("analyses", &self.inner.analysis.len())
            .finish()
    }
}

impl LoadContext {
    /// Logs a failed load; on 401 also triggers the login redirect.
    fn report(&self, path: &str, error: &Error) {
        match error {
            Error::NotAuthenticated { login_url } => {
                log::warn!("{}: not authenticated while loading '{}'", self.repo, path);
                self.redirect.redirect(login_url);
            }
            other => log::error!("{}: failed to load '{}': {}", self.repo, path, other),
        }
    }

    /// Settles a claim with the outcome of a load.
    fn settle<T>(&self, claim: Claim<T>, result: Result<T, Error>) {
        if self.unmounted.is_cancelled() {
            return;
        }
        match result {
            Ok(value) => {
                claim.complete(value);
            }
            Err(e) => self.reject(claim, &e),
        }
    }

    /// Reports a failed load and settles its claim. Auth failures leave the
    /// path unloaded.
    fn reject<T>(&self, claim: Claim<T>, error: &Error) {
        self.report(claim.path(), error);
        if error.is_not_authenticated() {
            claim.release();
        } else {
            claim.fail();
        }
    }

    async fn list_visible(&self, path: &str) -> Result<Vec<Node>, Error> {
        let nodes = self.backend.list_files(&self.repo, path).await?;
        Ok(visible(nodes))
    }

    async fn fetch_and_analyze(&self, path: &str) -> Result<AnalysisRecord, Error> {
        let content = self.backend.get_file(&self.repo, path).await?;
        self.backend.analyze_file(&content).await
    }
}

async fn fetch_children(ctx: LoadContext, claim: Claim<Vec<Node>>) {
    let path = claim.path().to_string();
    log::debug!("{}: listing '{}'", ctx.repo, path);

    let result = tokio::select! {
        biased;
        _ = ctx.unmounted.cancelled() => return,
        result = ctx.list_visible(&path) => result,
    };
    ctx.settle(claim, result);
}

async fn fetch_analysis(ctx: LoadContext, claim: Claim<AnalysisRecord>) {
    let path = claim.path().to_string();
    log::debug!("{}: analyzing '{}'", ctx.repo, path);

    let result = tokio::select! {
        biased;
        _ = ctx.unmounted.cancelled() => return,
        result = ctx.fetch_and_analyze(&path) => result,
    };
    ctx.settle(claim, result);
}
